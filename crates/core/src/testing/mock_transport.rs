//! Scripted HTTP transport for controller tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::Notify;

use crate::client::{ApiTransport, ClientError};

#[derive(Debug, Clone)]
struct MockReply {
    result: Result<Value, StatusCode>,
    gate: Option<Arc<Notify>>,
}

/// Handle that releases a gated reply.
#[derive(Debug, Clone)]
pub struct MockGate(Arc<Notify>);

impl MockGate {
    pub fn release(&self) {
        self.0.notify_one();
    }
}

/// Transport that answers from a script instead of the network.
///
/// Each route has an optional queue of one-shot replies, consumed in order,
/// and a fallback reply used once the queue is empty. Routes with neither
/// answer `404`.
#[derive(Debug, Default)]
pub struct MockTransport {
    queued: Mutex<HashMap<String, VecDeque<MockReply>>>,
    fallback: Mutex<HashMap<String, MockReply>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every request to `route` with `body`.
    pub fn respond(&self, route: &str, body: Value) {
        self.set_fallback(route, Ok(body));
    }

    /// Answer every request to `route` with an HTTP error.
    pub fn fail(&self, route: &str, status: StatusCode) {
        self.set_fallback(route, Err(status));
    }

    /// Queue a single reply for `route` that is held back until the returned
    /// gate is released.
    pub fn respond_gated(&self, route: &str, body: Value) -> MockGate {
        self.push_gated(route, Ok(body))
    }

    /// Queue a single gated HTTP error for `route`.
    pub fn fail_gated(&self, route: &str, status: StatusCode) -> MockGate {
        self.push_gated(route, Err(status))
    }

    /// Every request seen so far, as (route, body).
    pub fn requests(&self) -> Vec<(String, Value)> {
        lock(&self.requests).clone()
    }

    fn set_fallback(&self, route: &str, result: Result<Value, StatusCode>) {
        lock(&self.fallback).insert(route.to_string(), MockReply { result, gate: None });
    }

    fn push_gated(&self, route: &str, result: Result<Value, StatusCode>) -> MockGate {
        let notify = Arc::new(Notify::new());
        lock(&self.queued)
            .entry(route.to_string())
            .or_default()
            .push_back(MockReply {
                result,
                gate: Some(Arc::clone(&notify)),
            });
        MockGate(notify)
    }

    fn next_reply(&self, route: &str) -> Option<MockReply> {
        if let Some(reply) = lock(&self.queued).get_mut(route).and_then(VecDeque::pop_front) {
            return Some(reply);
        }
        lock(&self.fallback).get(route).cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ApiTransport for MockTransport {
    async fn post_json(&self, route: &str, body: &Value) -> Result<Value, ClientError> {
        lock(&self.requests).push((route.to_string(), body.clone()));

        let Some(reply) = self.next_reply(route) else {
            return Err(ClientError::Http {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            });
        };

        if let Some(gate) = reply.gate {
            gate.notified().await;
        }

        reply.result.map_err(|status| ClientError::Http {
            status,
            body: String::new(),
        })
    }
}
