//! Cache keys for catalog reads.

use crate::cache::QueryKey;

/// Query key types for catalog reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookQueryKey {
  /// Every book
  All,
  /// A single book by id
  ById { id: u64 },
  /// A single book by exact title
  ByTitle { title: String },
  /// Every book by an author
  ByAuthor { author: String },
}

impl QueryKey for BookQueryKey {
  fn cache_key(&self) -> String {
    match self {
      Self::All => "all-books".to_string(),
      Self::ById { id } => format!("book-{}", id),
      Self::ByTitle { title } => format!("book-title-{}", title),
      Self::ByAuthor { author } => format!("books-author-{}", author),
    }
  }

  fn description(&self) -> String {
    match self {
      Self::All => "all books".to_string(),
      Self::ById { id } => format!("book {}", id),
      Self::ByTitle { title } => format!("book titled {:?}", title),
      Self::ByAuthor { author } => format!("books by {:?}", author),
    }
  }
}
