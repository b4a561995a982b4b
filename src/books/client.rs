use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::Value;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::config::ServerConfig;
use crate::error::TransportError;

use super::transport::{Method, Request, Transport};

/// HTTP transport for the catalog server
#[derive(Clone)]
pub struct HttpTransport {
  client: reqwest::Client,
  base_url: Url,
}

impl HttpTransport {
  pub fn new(config: &ServerConfig) -> Result<Self> {
    let base_url =
      Url::parse(&config.url).map_err(|e| eyre!("Invalid server URL {}: {}", config.url, e))?;

    if base_url.cannot_be_a_base() {
      return Err(eyre!("Server URL {} cannot be used as a base", config.url));
    }

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { client, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn send(&self, request: Request) -> Result<Value, TransportError> {
    let url = request.url(&self.base_url)?;
    info!("{} {}", request.method, url);

    let method = match request.method {
      Method::Get => reqwest::Method::GET,
      Method::Post => reqwest::Method::POST,
      Method::Put => reqwest::Method::PUT,
      Method::Delete => reqwest::Method::DELETE,
    };

    let mut builder = self.client.request(method, url);
    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    let response = builder.send().await.map_err(classify)?;
    let status = response.status();
    let bytes = response.bytes().await.map_err(classify)?;

    if status.is_success() {
      parse_body(&bytes)
        .map_err(|e| TransportError::Unexpected(format!("Failed to decode response body: {}", e)))
    } else {
      // Error bodies are often plain text; keep them for the message lookup.
      let body = parse_body(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
      Err(TransportError::Status {
        status: status.as_u16(),
        body: (!body.is_null()).then_some(body),
      })
    }
  }
}

/// Decode a response body, treating an empty body as `null`.
fn parse_body(bytes: &[u8]) -> serde_json::Result<Value> {
  if bytes.iter().all(u8::is_ascii_whitespace) {
    return Ok(Value::Null);
  }
  serde_json::from_slice(bytes)
}

/// Sort a reqwest failure into "never got an answer" and everything else.
fn classify(e: reqwest::Error) -> TransportError {
  if e.is_builder() || e.is_decode() {
    TransportError::Unexpected(e.to_string())
  } else if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
    TransportError::NoResponse(e.to_string())
  } else {
    TransportError::Unexpected(e.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn server(url: &str) -> ServerConfig {
    ServerConfig {
      url: url.to_string(),
      timeout_secs: 5,
    }
  }

  #[test]
  fn test_new_rejects_bad_urls() {
    assert!(HttpTransport::new(&server("not a url")).is_err());
    assert!(HttpTransport::new(&server("mailto:me@example.com")).is_err());
  }

  #[test]
  fn test_new_accepts_base_with_prefix() {
    let transport = HttpTransport::new(&server("http://localhost:8080/api/")).unwrap();
    assert_eq!(transport.base_url().as_str(), "http://localhost:8080/api/");
  }

  #[test]
  fn test_parse_body() {
    assert_eq!(parse_body(b"").unwrap(), Value::Null);
    assert_eq!(parse_body(b"  \n").unwrap(), Value::Null);
    assert_eq!(parse_body(b"true").unwrap(), json!(true));
    assert_eq!(parse_body(br#"{"id":1}"#).unwrap(), json!({"id": 1}));
    assert!(parse_body(b"<html>").is_err());
  }

  #[tokio::test]
  async fn test_unreachable_server_is_no_response() {
    // Port 9 (discard) on localhost is expected to refuse connections.
    let transport = HttpTransport::new(&server("http://127.0.0.1:9")).unwrap();
    let err = transport.send(Request::get(["books"])).await.unwrap_err();
    assert!(matches!(err, TransportError::NoResponse(_)));
  }
}
