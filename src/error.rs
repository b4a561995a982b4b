//! Failure taxonomy for the book API.
//!
//! The transport reports what went wrong on the wire ([`TransportError`]);
//! every operation surfaces it to callers as an [`ApiError`] with a
//! human-readable message and the original cause attached.

use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by a [`Transport`](crate::books::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
  /// The server responded with a non-success status.
  #[error("server responded with status {status}")]
  Status { status: u16, body: Option<Value> },
  /// The request was sent but nothing came back (connect failure, timeout).
  #[error("no response from server: {0}")]
  NoResponse(String),
  /// Anything else, e.g. an invalid URL or an undecodable body.
  #[error("{0}")]
  Unexpected(String),
}

/// Classification of an [`ApiError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// HTTP 400
  InvalidRequest,
  /// HTTP 404
  NotFound,
  /// HTTP 500
  ServerError,
  /// Any other HTTP status
  OtherStatus(u16),
  /// No response arrived
  NoResponse,
  /// Failure before or after the exchange itself
  Unexpected,
}

/// Error returned by every book API operation.
///
/// Cloneable so that one settled request can be handed to every caller
/// that was waiting on it.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ApiError {
  kind: ErrorKind,
  message: String,
  #[source]
  cause: Arc<TransportError>,
}

impl ApiError {
  /// Build an `Unexpected` error from a free-form reason.
  pub fn unexpected(reason: impl Into<String>) -> Self {
    TransportError::Unexpected(reason.into()).into()
  }

  pub fn kind(&self) -> ErrorKind {
    self.kind
  }

  pub fn message(&self) -> &str {
    &self.message
  }

  pub fn cause(&self) -> &TransportError {
    &self.cause
  }
}

impl From<TransportError> for ApiError {
  fn from(cause: TransportError) -> Self {
    let (kind, message) = match &cause {
      TransportError::Status { status, body } => match status {
        400 => (ErrorKind::InvalidRequest, "Invalid request.".to_string()),
        404 => (ErrorKind::NotFound, "Resource not found.".to_string()),
        500 => (ErrorKind::ServerError, "Server error.".to_string()),
        other => (
          ErrorKind::OtherStatus(*other),
          server_message(body.as_ref()).unwrap_or_else(|| "Unknown error occurred.".to_string()),
        ),
      },
      TransportError::NoResponse(_) => (
        ErrorKind::NoResponse,
        "No response from server.".to_string(),
      ),
      TransportError::Unexpected(_) => (
        ErrorKind::Unexpected,
        "An unexpected error occurred.".to_string(),
      ),
    };

    Self {
      kind,
      message,
      cause: Arc::new(cause),
    }
  }
}

/// Pull a message out of an error body: a bare string, or the `message`
/// (then `error`) field of an object.
fn server_message(body: Option<&Value>) -> Option<String> {
  match body? {
    Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
    Value::Object(map) => ["message", "error"]
      .iter()
      .filter_map(|field| map.get(*field).and_then(Value::as_str))
      .find(|s| !s.trim().is_empty())
      .map(String::from),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn status(status: u16, body: Option<Value>) -> ApiError {
    TransportError::Status { status, body }.into()
  }

  #[test]
  fn test_known_statuses() {
    let err = status(400, None);
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(err.message(), "Invalid request.");

    let err = status(404, Some(json!({"message": "ignored"})));
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), "Resource not found.");

    let err = status(500, None);
    assert_eq!(err.kind(), ErrorKind::ServerError);
    assert_eq!(err.message(), "Server error.");
  }

  #[test]
  fn test_other_status_uses_server_message() {
    let err = status(409, Some(json!({"message": "Title already exists"})));
    assert_eq!(err.kind(), ErrorKind::OtherStatus(409));
    assert_eq!(err.message(), "Title already exists");

    let err = status(503, Some(json!("Maintenance")));
    assert_eq!(err.message(), "Maintenance");

    let err = status(502, Some(json!({"error": "Bad Gateway"})));
    assert_eq!(err.message(), "Bad Gateway");
  }

  #[test]
  fn test_other_status_without_message() {
    let err = status(418, None);
    assert_eq!(err.message(), "Unknown error occurred.");

    let err = status(418, Some(json!({"message": ""})));
    assert_eq!(err.message(), "Unknown error occurred.");
  }

  #[test]
  fn test_no_response_and_unexpected() {
    let err: ApiError = TransportError::NoResponse("connection refused".into()).into();
    assert_eq!(err.kind(), ErrorKind::NoResponse);
    assert_eq!(err.message(), "No response from server.");
    assert!(matches!(err.cause(), TransportError::NoResponse(_)));

    let err = ApiError::unexpected("bad url");
    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert_eq!(err.to_string(), "An unexpected error occurred.");
  }
}
