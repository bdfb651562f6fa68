//! Per-request response slot.
//!
//! The invocation path returns no payload; the proxy client hands the
//! response back by writing it into the slot attached to the request's
//! extensions. The `ResponseSlot` type is the well-known key.
//!
//! # Ordering
//! The caller keeps a clone of the slot, awaits the invocation future, and
//! only then calls [`ResponseSlot::take`]. The write happens before the
//! client's future resolves, and the mutex publishes it to the reader.
//! Reading before completion observes `None`.
//!
//! # Design Decisions
//! - Single assignment: a second write fails even after the value was taken
//! - One slot per request; nested calls build their own request and slot

use std::sync::{Arc, Mutex, MutexGuard};

use axum::body::Body;
use axum::http::{Request, Response};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("response slot already written")]
    AlreadyWritten,
}

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    Empty,
    Filled(Response<Body>),
    Taken,
}

/// Single-assignment cell for the outbound response of one request.
#[derive(Debug, Clone, Default)]
pub struct ResponseSlot {
    state: Arc<Mutex<SlotState>>,
}

impl ResponseSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // A panic while holding the lock cannot leave the state half-written.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store the response. Fails if a response was ever stored before.
    pub fn set(&self, response: Response<Body>) -> Result<(), SlotError> {
        let mut state = self.lock();
        match *state {
            SlotState::Empty => {
                *state = SlotState::Filled(response);
                Ok(())
            }
            _ => Err(SlotError::AlreadyWritten),
        }
    }

    /// Remove the stored response, if any.
    pub fn take(&self) -> Option<Response<Body>> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, SlotState::Taken) {
            SlotState::Filled(response) => Some(response),
            SlotState::Empty => {
                *state = SlotState::Empty;
                None
            }
            SlotState::Taken => None,
        }
    }

    /// True once a response has been written (taken or not).
    pub fn is_written(&self) -> bool {
        !matches!(*self.lock(), SlotState::Empty)
    }

    /// True if both handles refer to the same slot.
    pub fn same_slot(&self, other: &ResponseSlot) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

/// Access to the response slot carried by a request.
pub trait ResponseSlotExt {
    /// The slot attached to this request, if any.
    fn response_slot(&self) -> Option<&ResponseSlot>;

    /// Attach a fresh slot and return a handle to it, replacing any previous one.
    fn attach_response_slot(&mut self) -> ResponseSlot;
}

impl<B> ResponseSlotExt for Request<B> {
    fn response_slot(&self) -> Option<&ResponseSlot> {
        self.extensions().get::<ResponseSlot>()
    }

    fn attach_response_slot(&mut self) -> ResponseSlot {
        let slot = ResponseSlot::new();
        self.extensions_mut().insert(slot.clone());
        slot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn ok() -> Response<Body> {
        Response::builder()
            .status(StatusCode::OK)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_single_assignment() {
        let slot = ResponseSlot::new();
        assert!(!slot.is_written());
        slot.set(ok()).unwrap();
        assert!(slot.is_written());
        assert_eq!(slot.set(ok()), Err(SlotError::AlreadyWritten));

        assert!(slot.take().is_some());
        assert!(slot.take().is_none());
        // Still refuses a write after the value was taken.
        assert_eq!(slot.set(ok()), Err(SlotError::AlreadyWritten));
    }

    #[test]
    fn test_take_on_empty_slot_keeps_it_writable() {
        let slot = ResponseSlot::new();
        assert!(slot.take().is_none());
        slot.set(ok()).unwrap();
        assert_eq!(slot.take().unwrap().status(), StatusCode::OK);
    }

    #[test]
    fn test_request_extension_roundtrip() {
        let mut req = Request::new(());
        assert!(req.response_slot().is_none());

        let handle = req.attach_response_slot();
        let attached = req.response_slot().unwrap();
        assert!(handle.same_slot(attached));

        attached.set(ok()).unwrap();
        assert!(handle.take().is_some());
    }

    #[test]
    fn test_attach_replaces_previous_slot() {
        let mut req = Request::new(());
        let first = req.attach_response_slot();
        let second = req.attach_response_slot();
        assert!(!first.same_slot(&second));
        assert!(second.same_slot(req.response_slot().unwrap()));
    }
}
