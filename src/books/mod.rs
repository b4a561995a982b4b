//! Book catalog API: transport, caching client and helpers.

mod cache;
mod cached_client;
mod client;
mod ids;
mod transport;
mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use cache::BookQueryKey;
pub use cached_client::BookApi;
pub use client::HttpTransport;
pub use ids::next_available_id;
pub use transport::{Method, Request, Transport};
pub use types::{Book, BookDraft};
