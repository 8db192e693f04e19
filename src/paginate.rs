//! Cursor-based pagination over open-ended table result streams.
//!
//! The protocol is forward-only: fetch a page, and while it is non-empty,
//! feed its last row id back as the next cursor. Termination is the first
//! empty page; no total-count header is consulted. Concurrent writes on the
//! server can surface duplicate or skipped rows, so consumers get
//! at-least-once semantics and the paginator performs no deduplication.

use futures::stream::{self, Stream};
use tracing::{debug, warn};

use crate::client::TableQuery;
use crate::decode::ResultPage;
use crate::descriptor::TableEntity;
use crate::errors::TzQueryError;

/// Drives a [`TableQuery`] forward page by page.
///
/// Restartable from any previously observed cursor via
/// [`Paginator::resume_from`]; earlier pages are never replayed.
pub struct Paginator<T: TableEntity> {
    query: TableQuery<T>,
    cursor: u64,
    done: bool,
}

impl<T: TableEntity> Paginator<T> {
    pub fn new(query: TableQuery<T>) -> Self {
        let cursor = query.spec().cursor();
        Self {
            query,
            cursor,
            done: false,
        }
    }

    /// Restarts pagination from a previously observed cursor.
    pub fn resume_from(mut self, cursor: u64) -> Self {
        self.cursor = cursor;
        self.done = false;
        self
    }

    /// The cursor the next fetch will use.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Whether the stream has hit its first empty page.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetches the next page, or `None` once an empty page was seen. After
    /// the first `None`, no further request is issued.
    pub async fn next_page(&mut self) -> Result<Option<ResultPage<T>>, TzQueryError> {
        if self.done {
            return Ok(None);
        }

        let page = self.query.clone().with_cursor(self.cursor).run().await?;
        if page.is_empty() {
            debug!(table = T::TABLE, cursor = self.cursor, "pagination drained");
            self.done = true;
            return Ok(None);
        }

        let next = page.cursor();
        if next <= self.cursor {
            // A non-advancing cursor would refetch the same page forever.
            warn!(
                table = T::TABLE,
                cursor = self.cursor,
                "cursor did not advance; stopping pagination"
            );
            self.done = true;
        } else {
            self.cursor = next;
        }
        Ok(Some(page))
    }

    /// Adapts the paginator into a stream of pages.
    pub fn into_stream(self) -> impl Stream<Item = Result<ResultPage<T>, TzQueryError>> {
        stream::try_unfold(self, |mut paginator| async move {
            Ok(paginator.next_page().await?.map(|page| (page, paginator)))
        })
    }
}
