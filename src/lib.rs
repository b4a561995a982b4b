//! Client for a remote book catalog with a read cache that coalesces
//! concurrent requests and invalidates entries on writes.

pub mod books;
pub mod cache;
pub mod commands;
pub mod config;
pub mod error;

pub use books::{next_available_id, Book, BookApi, BookDraft, HttpTransport, Transport};
pub use error::{ApiError, ErrorKind, TransportError};
