//! Paginated listing walk
//!
//! [`ListingCursor`] walks the bucket listing page by page, carrying the
//! opaque token from one page into the request for the next.
//!
//! ## Design Notes
//!
//! - No retries here: a failed listing call ends the walk and the run
//!   reports what it processed so far.
//! - Every token handed out by the service is remembered for the duration
//!   of the walk. A repeated token, or an unfinished page without one,
//!   would otherwise loop forever.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, warn};

use bucketsync_core::domain::{CursorToken, ListingPage};
use bucketsync_core::ports::IRemoteStorage;

use crate::SyncError;

/// Parameters forwarded to every listing call of a walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingOptions {
    /// Key prefix; empty lists the whole bucket
    pub prefix: String,
    /// Objects requested per page
    pub page_limit: u32,
    /// Hierarchy delimiter; empty requests a flat listing
    pub delimiter: String,
}

impl Default for ListingOptions {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            page_limit: 1000,
            delimiter: String::new(),
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Stateful walk over the pages of one bucket listing
pub struct ListingCursor {
    remote: Arc<dyn IRemoteStorage + Send + Sync>,
    options: ListingOptions,
    next_token: Option<CursorToken>,
    seen_tokens: HashSet<CursorToken>,
    finished: bool,
    pages: u64,
}

impl ListingCursor {
    pub fn new(remote: Arc<dyn IRemoteStorage + Send + Sync>, options: ListingOptions) -> Self {
        Self {
            remote,
            options,
            next_token: None,
            seen_tokens: HashSet::new(),
            finished: false,
            pages: 0,
        }
    }

    /// Fetches the next page of the walk
    ///
    /// Returns `Ok(None)` once the last page has been returned.
    ///
    /// # Errors
    ///
    /// - [`SyncError::RemoteUnavailable`] if the listing call fails
    /// - [`SyncError::MalformedCursor`] if the service returns a token that
    ///   cannot advance the walk
    ///
    /// Either error finishes the walk.
    pub async fn next_page(&mut self) -> Result<Option<ListingPage>, SyncError> {
        if self.finished {
            return Ok(None);
        }

        let page = match self
            .remote
            .list_page(
                non_empty(&self.options.prefix),
                self.next_token.as_ref(),
                self.options.page_limit,
                non_empty(&self.options.delimiter),
            )
            .await
        {
            Ok(page) => page,
            Err(e) => {
                self.finished = true;
                return Err(SyncError::RemoteUnavailable(format!("{e:#}")));
            }
        };
        self.pages += 1;

        if page.is_last {
            debug!(page = self.pages, items = page.len(), "Reached last listing page");
            self.finished = true;
            self.next_token = None;
            return Ok(Some(page));
        }

        let token = match &page.cursor {
            Some(token) => token.clone(),
            None => {
                self.finished = true;
                return Err(SyncError::MalformedCursor(format!(
                    "page {} is not the last page but carries no cursor",
                    self.pages
                )));
            }
        };

        if !self.seen_tokens.insert(token.clone()) {
            warn!(token = %token, page = self.pages, "Listing returned a cursor already visited");
            self.finished = true;
            return Err(SyncError::MalformedCursor(format!(
                "cursor '{token}' was already visited in this walk"
            )));
        }

        debug!(page = self.pages, items = page.len(), "Fetched listing page");
        self.next_token = Some(token);
        Ok(Some(page))
    }

    /// Rewinds to the first page
    pub fn restart(&mut self) {
        self.next_token = None;
        self.seen_tokens.clear();
        self.finished = false;
        self.pages = 0;
    }

    /// Pages fetched so far in this walk
    pub fn pages_fetched(&self) -> u64 {
        self.pages
    }

    /// Returns true once the walk cannot yield more pages
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
