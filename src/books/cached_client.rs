//! Book API client with transparent caching and request coalescing.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::{CacheLayer, CacheStorage, Cacheable, MemoryStorage, NoopStorage, QueryKey};
use crate::config::Config;
use crate::error::ApiError;

use super::cache::BookQueryKey;
use super::client::HttpTransport;
use super::transport::{Request, Transport};
use super::types::{Book, BookDraft};

/// Catalog client that caches reads and invalidates them on writes.
///
/// Reads check the cache, then join any identical request already in
/// flight, then go to the server. Writes always go to the server and, on
/// success only, drop every cache entry they may have made stale.
pub struct BookApi<T: Transport = HttpTransport> {
  inner: Arc<T>,
  cache: CacheLayer<Box<dyn CacheStorage>>,
}

impl BookApi<HttpTransport> {
  /// Create a client for the server and cache policy in `config`.
  pub fn from_config(config: &Config) -> color_eyre::Result<Self> {
    let transport = HttpTransport::new(&config.server)?;
    let storage: Box<dyn CacheStorage> = if config.cache.enabled {
      Box::new(MemoryStorage::new())
    } else {
      Box::new(NoopStorage)
    };

    Ok(Self::with_storage(transport, storage, config.cache.ttl()))
  }
}

impl<T: Transport> BookApi<T> {
  /// Create a client with in-memory caching and the default freshness window.
  pub fn new(transport: T) -> Self {
    Self::with_storage(
      transport,
      Box::new(MemoryStorage::new()),
      crate::cache::DEFAULT_TTL,
    )
  }

  pub fn with_storage(transport: T, storage: Box<dyn CacheStorage>, ttl: Duration) -> Self {
    Self {
      inner: Arc::new(transport),
      cache: CacheLayer::new(storage).with_ttl(ttl),
    }
  }

  pub fn transport(&self) -> &T {
    &self.inner
  }

  /// Whether a fresh entry exists under `key` (e.g. `"book-5"`).
  pub fn is_cached(&self, key: &str) -> bool {
    self.cache.is_cached(key)
  }

  /// Drop every cached entry and in-flight registration.
  pub fn clear(&self) {
    info!("Clearing book cache");
    self.cache.clear();
  }

  /// Get every book.
  pub async fn list_all(&self) -> Result<Vec<Book>, ApiError> {
    self
      .read(BookQueryKey::All, Request::get(["books"]))
      .await
  }

  /// Get a single book by id.
  pub async fn get_by_id(&self, id: u64) -> Result<Book, ApiError> {
    self
      .read(
        BookQueryKey::ById { id },
        Request::get(["books".to_string(), id.to_string()]),
      )
      .await
  }

  /// Get a single book by exact title.
  pub async fn get_by_title(&self, title: &str) -> Result<Book, ApiError> {
    self
      .read(
        BookQueryKey::ByTitle {
          title: title.to_string(),
        },
        Request::get(["books", "title", title]),
      )
      .await
  }

  /// Get every book by an author.
  pub async fn list_by_author(&self, author: &str) -> Result<Vec<Book>, ApiError> {
    self
      .read(
        BookQueryKey::ByAuthor {
          author: author.to_string(),
        },
        Request::get(["books", "author", author]),
      )
      .await
  }

  /// Create a book. The server assigns its id.
  pub async fn add(&self, draft: &BookDraft) -> Result<Book, ApiError> {
    let request = Request::post(["books", "add"], encode(draft)?);
    self.write(request, vec![BookQueryKey::All]).await
  }

  /// Create several books in one call.
  pub async fn add_many(&self, drafts: &[BookDraft]) -> Result<Vec<Book>, ApiError> {
    let request = Request::post(["books", "addMany"], encode(drafts)?);
    self.write(request, vec![BookQueryKey::All]).await
  }

  /// Delete a book by id. Returns the server's acknowledgement.
  pub async fn delete_by_id(&self, id: u64) -> Result<bool, ApiError> {
    let request = Request::delete(["books".to_string(), "delete".to_string(), id.to_string()]);
    let ack: Value = self
      .write(request, vec![BookQueryKey::All, BookQueryKey::ById { id }])
      .await?;
    acknowledgement(ack)
  }

  /// Delete a book by exact title. Returns the server's acknowledgement.
  pub async fn delete_by_title(&self, title: &str) -> Result<bool, ApiError> {
    let request = Request::delete(["books", "delete", "title", title]);
    let ack: Value = self
      .write(
        request,
        vec![
          BookQueryKey::All,
          BookQueryKey::ByTitle {
            title: title.to_string(),
          },
        ],
      )
      .await?;
    acknowledgement(ack)
  }

  /// Replace the fields of the book with `id`.
  pub async fn update_by_id(&self, id: u64, draft: &BookDraft) -> Result<Book, ApiError> {
    let request = Request::put(
      ["books".to_string(), "update".to_string(), id.to_string()],
      encode(draft)?,
    );
    self
      .write(request, vec![BookQueryKey::All, BookQueryKey::ById { id }])
      .await
  }

  /// Replace the fields of the book titled `title`, possibly renaming it.
  pub async fn update_by_title(&self, title: &str, draft: &BookDraft) -> Result<Book, ApiError> {
    let request = Request::put(["books", "update", "title", title], encode(draft)?);

    let mut stale = vec![
      BookQueryKey::All,
      BookQueryKey::ByTitle {
        title: title.to_string(),
      },
    ];
    if draft.title != title {
      stale.push(BookQueryKey::ByTitle {
        title: draft.title.clone(),
      });
    }

    self.write(request, stale).await
  }

  async fn read<R: Cacheable>(&self, key: BookQueryKey, request: Request) -> Result<R, ApiError> {
    let inner = Arc::clone(&self.inner);

    let result = self
      .cache
      .fetch(&key, move || async move {
        let value = inner.send(request).await.map_err(ApiError::from)?;
        decode::<R>(value)
      })
      .await?;

    Ok(result.data)
  }

  async fn write<R: DeserializeOwned>(
    &self,
    request: Request,
    stale: Vec<BookQueryKey>,
  ) -> Result<R, ApiError> {
    let description = request.to_string();

    let value = match self.inner.send(request).await {
      Ok(value) => value,
      Err(e) => {
        let e = ApiError::from(e);
        warn!("{} failed: {}", description, e);
        return Err(e);
      }
    };

    for key in &stale {
      self.cache.invalidate(&key.cache_key());
    }
    info!("{} succeeded, invalidated {} cache keys", description, stale.len());

    decode(value)
  }
}

fn encode<B: serde::Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
  serde_json::to_value(body)
    .map_err(|e| ApiError::unexpected(format!("failed to encode request body: {}", e)))
}

fn decode<R: DeserializeOwned>(value: Value) -> Result<R, ApiError> {
  serde_json::from_value(value)
    .map_err(|e| ApiError::unexpected(format!("failed to decode response: {}", e)))
}

/// Deletion endpoints answer with a JSON boolean or the text `true`/`false`.
fn acknowledgement(value: Value) -> Result<bool, ApiError> {
  match value {
    Value::Bool(deleted) => Ok(deleted),
    Value::String(s) => s
      .trim()
      .parse()
      .map_err(|_| ApiError::unexpected(format!("unexpected deletion response {:?}", s))),
    // An empty 2xx body still means the delete went through.
    Value::Null => Ok(true),
    other => Err(ApiError::unexpected(format!(
      "unexpected deletion response {}",
      other
    ))),
  }
}
