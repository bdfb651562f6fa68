//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → request.rs (buffer body, invocation ID, route params)
//!     → slot.rs (response slot attached to the request)
//!     → [function host dispatches to a proxy invoker]
//!     → response.rs (dispatch errors → status codes)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod slot;

pub use request::{buffer_request, BodyTooLarge, RequestIdExt, RouteParams, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
pub use slot::{ResponseSlot, ResponseSlotExt, SlotError};
