//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build proxy client → Start function host
//!     → Start routes watcher
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop admitting invocations → Drain in-flight → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then host, then listeners
//! - Ordered shutdown: stop admitting, drain, close
//! - Drain has timeout: remaining invocations are abandoned at the deadline

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{InFlightGuard, Shutdown, TeardownGate};
pub use startup::{build_host, load_host_config, start, Startup, StartupError};
