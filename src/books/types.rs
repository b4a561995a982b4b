use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry as returned by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
  pub id: u64,
  pub title: String,
  pub author: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub link: Option<String>,
  /// Last modification, stored by the server as epoch milliseconds
  #[serde(
    default,
    with = "chrono::serde::ts_milliseconds_option",
    skip_serializing_if = "Option::is_none"
  )]
  pub updated_at: Option<DateTime<Utc>>,
}

/// Fields sent when creating or updating a book. Ids are assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
  pub title: String,
  pub author: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub link: Option<String>,
}

impl BookDraft {
  pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
    Self {
      title: title.into(),
      author: author.into(),
      link: None,
    }
  }

  pub fn with_link(mut self, link: impl Into<String>) -> Self {
    self.link = Some(link.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_book_from_server_json() {
    let book: Book = serde_json::from_value(json!({
      "id": 5,
      "title": "Dune",
      "author": "Frank Herbert",
      "link": "https://example.com/dune",
      "updatedAt": 1700000000000i64
    }))
    .unwrap();

    assert_eq!(book.id, 5);
    assert_eq!(book.link.as_deref(), Some("https://example.com/dune"));
    assert_eq!(book.updated_at.unwrap().timestamp(), 1_700_000_000);
  }

  #[test]
  fn test_book_optional_fields_missing_or_null() {
    let book: Book = serde_json::from_value(json!({
      "id": 1,
      "title": "T",
      "author": "A",
      "updatedAt": null
    }))
    .unwrap();

    assert!(book.link.is_none());
    assert!(book.updated_at.is_none());
  }

  #[test]
  fn test_draft_omits_missing_link() {
    let body = serde_json::to_value(BookDraft::new("T", "A")).unwrap();
    assert_eq!(body, json!({"title": "T", "author": "A"}));
  }
}
