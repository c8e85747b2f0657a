//! Typed request/response envelopes exchanged across worker ports.
//!
//! Every message carries a monotonically assigned `rid`; responses echo it
//! so a multiplexed channel can route replies back to the right waiter even
//! when requests complete out of order.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Error;

static NEXT_RID: AtomicU64 = AtomicU64::new(1);

pub fn next_rid() -> u64 {
    NEXT_RID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub rid: u64,
    pub payload: T,
}

impl<T> Envelope<T> {
    pub fn new(payload: T) -> Self {
        Envelope { rid: next_rid(), payload }
    }
}

/// A response is either a terminal result or a progress update (`done =
/// false`) used by long-running requests such as training.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub rid: u64,
    pub done: bool,
    pub result: std::result::Result<T, Error>,
}

impl<T> Response<T> {
    pub fn terminal(rid: u64, result: std::result::Result<T, Error>) -> Self {
        Response { rid, done: true, result }
    }

    pub fn progress(rid: u64, value: T) -> Self {
        Response { rid, done: false, result: Ok(value) }
    }
}
