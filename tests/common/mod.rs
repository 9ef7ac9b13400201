//! Test utilities for libcursor integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use libcursor::{Cursor, CursorOptions, Error, Response, Result, Token, Transport};
use serde_json::json;
use tokio::sync::Notify;

/// A mock transport that answers reads with pre-defined responses.
///
/// Responses are returned in order, then reads fail with
/// [`Error::ConnectionClosed`]. Every request is counted.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<Response>>>,
    gate: Mutex<Option<(usize, Arc<Notify>)>>,
    reads: AtomicUsize,
    continues: AtomicUsize,
    stops: AtomicUsize,
    open: AtomicBool,
}

impl MockTransport {
    /// Create a mock transport with the given responses.
    pub fn new(responses: Vec<Response>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            gate: Mutex::new(None),
            reads: AtomicUsize::new(0),
            continues: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
            open: AtomicBool::new(true),
        })
    }

    /// Create a mock transport whose reads fail with `error` after `responses`.
    pub fn with_error(responses: Vec<Response>, error: Error) -> Arc<Self> {
        let transport = Self::new(responses);
        transport.responses.lock().unwrap().push_back(Err(error));
        transport
    }

    /// Block the `nth` read (counting from 1) until the returned handle is
    /// notified.
    pub fn hold_read(&self, nth: usize) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some((nth, Arc::clone(&gate)));
        gate
    }

    pub fn set_open(&self, open: bool) {
        self.open.store(open, Ordering::SeqCst);
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn continues(&self) -> usize {
        self.continues.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }

    /// Yield until `count` reads have started.
    pub async fn wait_for_reads(&self, count: usize) {
        while self.reads() < count {
            tokio::task::yield_now().await;
        }
    }
}

impl Transport for MockTransport {
    async fn read_next_batch(&self, _token: Token) -> Result<Response> {
        let nth = self.reads.fetch_add(1, Ordering::SeqCst) + 1;

        let gate = {
            let mut held = self.gate.lock().unwrap();
            match held.as_ref() {
                Some((at, _)) if *at == nth => held.take().map(|(_, gate)| gate),
                _ => None,
            }
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        // Responses never arrive in the same poll as the request
        tokio::task::yield_now().await;

        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or(Err(Error::ConnectionClosed))
    }

    fn send_continue(&self, _token: Token) -> Result<()> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }
        self.continues.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn send_stop(&self, _token: Token) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Token every test cursor reads.
pub const TOKEN: Token = Token(7);

/// Create a cursor over `transport` with default options.
pub fn cursor(transport: &Arc<MockTransport>) -> Cursor<MockTransport> {
    cursor_with(transport, CursorOptions::default())
}

/// Create a cursor over `transport` with the given options.
pub fn cursor_with(transport: &Arc<MockTransport>, options: CursorOptions) -> Cursor<MockTransport> {
    Cursor::new(
        Arc::clone(transport),
        TOKEN,
        json!([1, [15, [[14, ["test"]], "users"]]]),
        options,
    )
}
