//! # Discographer Service
//!
//! Thread-dispatched facade over the library engine. Synchronous search
//! is a direct call-through; background search runs on its own task and
//! reports back through a completion callback. There is no queueing,
//! backpressure, or cancellation: overlapping background searches each
//! get their own task and may complete in any order, so callers that
//! issue a newer search are responsible for ignoring stale callbacks
//! (the original request is handed back for exactly that check).

pub mod import;

pub use import::{MetadataSource, PlayerMetadata};

use discographer_library::{Library, MediaEntry, Result, SearchRequest};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Facade wrapping a shared [`Library`] engine.
pub struct DiscographerSystem {
    library: Arc<Library>,
}

impl DiscographerSystem {
    pub fn new(library: Arc<Library>) -> Self {
        Self { library }
    }

    /// The wrapped engine, for direct access to its full API.
    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    /// Run a search to completion on the caller's task.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<MediaEntry>> {
        self.library.search_database(request).await
    }

    /// Run a search on a fresh task and hand the outcome to `on_complete`
    /// along with the original request and the elapsed time.
    ///
    /// Errors are delivered through the callback, never dropped. The
    /// returned handle can be awaited but does not cancel the search.
    pub fn search_in_background<F>(&self, request: SearchRequest, on_complete: F) -> JoinHandle<()>
    where
        F: FnOnce(SearchRequest, Result<Vec<MediaEntry>>, Duration) + Send + 'static,
    {
        let library = Arc::clone(&self.library);
        tokio::spawn(async move {
            let started = Instant::now();
            let result = library.search_database(&request).await;
            let elapsed = started.elapsed();
            match &result {
                Ok(entries) => debug!(hits = entries.len(), ?elapsed, "background search finished"),
                Err(error) => warn!(%error, "background search failed"),
            }
            on_complete(request, result, elapsed);
        })
    }
}
