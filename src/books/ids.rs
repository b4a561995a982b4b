use std::collections::HashSet;

use super::types::Book;

/// Smallest positive id not used by any of `books`.
///
/// Only a hint for display: the server assigns the real id on add.
pub fn next_available_id(books: &[Book]) -> u64 {
  let taken: HashSet<u64> = books.iter().map(|book| book.id).collect();

  (1..)
    .find(|id| !taken.contains(id))
    .unwrap_or(1)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn books(ids: &[u64]) -> Vec<Book> {
    ids
      .iter()
      .map(|&id| Book {
        id,
        title: format!("Book {}", id),
        author: "Author".to_string(),
        link: None,
        updated_at: None,
      })
      .collect()
  }

  #[test]
  fn test_fills_first_gap() {
    assert_eq!(next_available_id(&books(&[1, 2, 4])), 3);
  }

  #[test]
  fn test_empty_starts_at_one() {
    assert_eq!(next_available_id(&[]), 1);
  }

  #[test]
  fn test_missing_one() {
    assert_eq!(next_available_id(&books(&[2, 3])), 1);
  }

  #[test]
  fn test_unordered_and_dense() {
    assert_eq!(next_available_id(&books(&[3, 1, 2])), 4);
  }
}
