//! In-memory transport for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::TransportError;

use super::transport::{Method, Request, Transport};

type Handler = Box<dyn Fn(&Request) -> Result<Value, TransportError> + Send + Sync>;

type Latency = Box<dyn Fn(&Request) -> Duration + Send + Sync>;

/// Transport that answers from a closure and records every request.
///
/// The answer is computed when the request arrives and delivered after the
/// request's latency, like a server replying over a slow link.
pub struct MockTransport {
  handler: Handler,
  latency: Latency,
  requests: Mutex<Vec<Request>>,
}

impl MockTransport {
  pub fn new<F>(handler: F) -> Self
  where
    F: Fn(&Request) -> Result<Value, TransportError> + Send + Sync + 'static,
  {
    Self {
      handler: Box::new(handler),
      latency: Box::new(|_: &Request| Duration::from_millis(10)),
      requests: Mutex::new(Vec::new()),
    }
  }

  /// Delay each reply by `latency(request)` instead of a flat 10ms.
  pub fn with_latency<L>(mut self, latency: L) -> Self
  where
    L: Fn(&Request) -> Duration + Send + Sync + 'static,
  {
    self.latency = Box::new(latency);
    self
  }

  /// Every request seen so far, rendered as `METHOD /path`.
  pub fn calls(&self) -> Vec<String> {
    self
      .requests
      .lock()
      .unwrap()
      .iter()
      .map(ToString::to_string)
      .collect()
  }

  pub fn call_count(&self) -> usize {
    self.requests.lock().unwrap().len()
  }

  pub fn count(&self, method: Method, path: &str) -> usize {
    self
      .requests
      .lock()
      .unwrap()
      .iter()
      .filter(|r| r.method == method && r.path() == path)
      .count()
  }

  pub fn last_body(&self) -> Option<Value> {
    self
      .requests
      .lock()
      .unwrap()
      .last()
      .and_then(|r| r.body.clone())
  }
}

#[async_trait]
impl Transport for MockTransport {
  async fn send(&self, request: Request) -> Result<Value, TransportError> {
    self.requests.lock().unwrap().push(request.clone());
    let reply = (self.handler)(&request);
    tokio::time::sleep((self.latency)(&request)).await;
    reply
  }
}

pub fn not_found() -> TransportError {
  TransportError::Status {
    status: 404,
    body: None,
  }
}
