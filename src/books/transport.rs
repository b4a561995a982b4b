//! Transport contract between the book API and the wire.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use url::Url;

use crate::error::TransportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  Get,
  Post,
  Put,
  Delete,
}

impl fmt::Display for Method {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Self::Get => "GET",
      Self::Post => "POST",
      Self::Put => "PUT",
      Self::Delete => "DELETE",
    };
    f.write_str(name)
  }
}

/// A single REST call.
///
/// The path is kept as raw segments; each one is percent-encoded when the
/// URL is built, so titles and authors may contain `/`, `?` or spaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
  pub method: Method,
  pub segments: Vec<String>,
  pub body: Option<Value>,
}

impl Request {
  fn new<I, S>(method: Method, segments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self {
      method,
      segments: segments.into_iter().map(Into::into).collect(),
      body: None,
    }
  }

  pub fn get<I, S>(segments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::new(Method::Get, segments)
  }

  pub fn post<I, S>(segments: I, body: Value) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::new(Method::Post, segments).with_body(body)
  }

  pub fn put<I, S>(segments: I, body: Value) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::new(Method::Put, segments).with_body(body)
  }

  pub fn delete<I, S>(segments: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::new(Method::Delete, segments)
  }

  fn with_body(mut self, body: Value) -> Self {
    self.body = Some(body);
    self
  }

  /// Resolve the request path against `base`, keeping any path prefix the
  /// base already has.
  pub fn url(&self, base: &Url) -> Result<Url, TransportError> {
    let mut url = base.clone();
    url
      .path_segments_mut()
      .map_err(|_| TransportError::Unexpected(format!("{} cannot be a base URL", base)))?
      .pop_if_empty()
      .extend(&self.segments);
    Ok(url)
  }

  /// Encoded absolute path, e.g. `/books/title/War%20and%20Peace`.
  pub fn path(&self) -> String {
    Url::parse("http://localhost/")
      .ok()
      .and_then(|base| self.url(&base).ok())
      .map(|url| url.path().to_string())
      .unwrap_or_default()
  }
}

impl fmt::Display for Request {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.method, self.path())
  }
}

/// Something that can carry a [`Request`] to the catalog server.
///
/// Success yields the decoded JSON body (`Value::Null` for an empty body).
#[async_trait]
pub trait Transport: Send + Sync + 'static {
  async fn send(&self, request: Request) -> Result<Value, TransportError>;
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_path_encodes_segments() {
    let request = Request::get(["books", "title", "War and Peace"]);
    assert_eq!(request.path(), "/books/title/War%20and%20Peace");

    let request = Request::get(["books", "author", "AC/DC?"]);
    assert_eq!(request.path(), "/books/author/AC%2FDC%3F");
  }

  #[test]
  fn test_url_keeps_base_prefix() {
    let base = Url::parse("http://example.com/api/").unwrap();
    let url = Request::delete(["books", "delete", "5"]).url(&base).unwrap();
    assert_eq!(url.as_str(), "http://example.com/api/books/delete/5");

    let base = Url::parse("http://example.com").unwrap();
    let url = Request::get(["books"]).url(&base).unwrap();
    assert_eq!(url.as_str(), "http://example.com/books");
  }

  #[test]
  fn test_cannot_be_base_url() {
    let base = Url::parse("mailto:someone@example.com").unwrap();
    let err = Request::get(["books"]).url(&base).unwrap_err();
    assert!(matches!(err, TransportError::Unexpected(_)));
  }

  #[test]
  fn test_display() {
    let request = Request::put(["books", "update", "5"], json!({"title": "T"}));
    assert_eq!(request.to_string(), "PUT /books/update/5");
    assert_eq!(request.body, Some(json!({"title": "T"})));
  }
}
