//! Fake transport for unit testing session handling and orchestration.
//!
//! Provides an in-memory transport for testing the client without the
//! vendor endpoint. Replies are scripted in FIFO order and every posted
//! body is captured for inspection.
//!
//! # Example
//!
//! ```ignore
//! let (transport, controller) = FakeTransportBuilder::new()
//!     .respond(json!({ "status": 0, "data": { "sid": "s1" } }))
//!     .build();
//! let client = ElectraClient::builder("imei", "token")
//!     .with_transport(Arc::new(transport))
//!     .build()?;
//! // ... drive the client ...
//! let sent = controller.take_sent();
//! assert_eq!(sent[0]["cmd"], "VALIDATE_TOKEN");
//! ```

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::transport::Transport;

#[derive(Default)]
struct FakeState {
    replies: VecDeque<Result<Value>>,
    sent: Vec<Value>,
}

/// Builder for creating fake transport instances.
#[derive(Default)]
pub struct FakeTransportBuilder {
    replies: VecDeque<Result<Value>>,
}

impl FakeTransportBuilder {
    /// Create a new fake transport builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a successful reply body.
    pub fn respond(mut self, body: Value) -> Self {
        self.replies.push_back(Ok(body));
        self
    }

    /// Script a transport failure.
    pub fn fail(mut self, error: Error) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    /// Build the fake transport and return both it and a controller for
    /// scripting further replies and inspecting sent bodies.
    pub fn build(self) -> (FakeTransport, FakeTransportController) {
        let state = Arc::new(Mutex::new(FakeState {
            replies: self.replies,
            sent: Vec::new(),
        }));
        (
            FakeTransport {
                state: Arc::clone(&state),
            },
            FakeTransportController { state },
        )
    }
}

/// Controller for scripting replies and inspecting posted bodies.
pub struct FakeTransportController {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransportController {
    /// Queue a successful reply body.
    pub fn push_response(&self, body: Value) {
        self.state.lock().replies.push_back(Ok(body));
    }

    /// Queue a transport failure.
    pub fn push_error(&self, error: Error) {
        self.state.lock().replies.push_back(Err(error));
    }

    /// Number of bodies posted so far.
    pub fn sent_count(&self) -> usize {
        self.state.lock().sent.len()
    }

    /// Take all posted bodies, clearing the buffer.
    pub fn take_sent(&self) -> Vec<Value> {
        std::mem::take(&mut self.state.lock().sent)
    }
}

/// In-memory [`Transport`] that replays scripted replies in order.
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl Transport for FakeTransport {
    fn post(&self, body: Value) -> Pin<Box<dyn Future<Output = Result<Value>> + Send + '_>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let mut state = state.lock();
            state.sent.push(body);
            state
                .replies
                .pop_front()
                .unwrap_or_else(|| Err(Error::Connection("fake transport: no scripted reply".to_string())))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn replays_replies_in_order_and_captures_bodies() {
        let (transport, controller) = FakeTransportBuilder::new()
            .respond(json!({ "status": 0 }))
            .respond(json!({ "status": 7 }))
            .build();

        let first = transport.post(json!({ "cmd": "A" })).await.unwrap();
        let second = transport.post(json!({ "cmd": "B" })).await.unwrap();
        assert_eq!(first["status"], 0);
        assert_eq!(second["status"], 7);

        let sent = controller.take_sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["cmd"], "A");
        assert_eq!(sent[1]["cmd"], "B");
    }

    #[tokio::test]
    async fn scripted_errors_and_exhaustion_surface_as_errors() {
        let (transport, controller) = FakeTransportBuilder::new()
            .fail(Error::Timeout("deadline".to_string()))
            .build();

        let err = transport.post(json!({})).await.unwrap_err();
        assert!(err.is_timeout());

        let err = transport.post(json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Connection(_)));
        assert_eq!(controller.sent_count(), 2);
    }
}
