//! Cursor pagination over Slack listing endpoints.
//!
//! [`Paginator::fetch_all`] keeps calling an endpoint with the cursor of the
//! previous page until the cursor is absent or empty. That is the only
//! termination condition: without `max_pages`, an endpoint that always
//! returns a cursor is followed forever.

use std::future::Future;

use crate::domain::{AppError, Page, Result};

use super::gate::CallGate;

/// Items accumulated by a pagination run.
#[derive(Debug)]
pub struct Paginated<T> {
    /// Items of every fetched page, in page order.
    pub items: Vec<T>,
    /// Pages fetched successfully.
    pub pages: usize,
    /// Failure that stopped the run early; `items` holds what came before it.
    pub failure: Option<AppError>,
    /// The page ceiling was reached while a cursor was still pending.
    pub truncated: bool,
}

impl<T> Paginated<T> {
    /// Every page up to the end of the listing was fetched.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.failure.is_none() && !self.truncated
    }

    /// Applies the failure policy: in fail-fast mode a failure becomes an
    /// error, otherwise the partial result is kept.
    ///
    /// # Errors
    /// Returns the pagination failure when `fail_fast` is set.
    pub fn into_result(self, fail_fast: bool) -> Result<Self> {
        match self.failure {
            Some(err) if fail_fast => Err(err),
            failure => Ok(Self { failure, ..self }),
        }
    }
}

/// Fetches every page of a cursor-paginated endpoint through a [`CallGate`].
#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    gate: CallGate,
    max_pages: Option<usize>,
}

impl Paginator {
    /// Unbounded paginator.
    #[must_use]
    pub const fn new(gate: CallGate) -> Self {
        Self {
            gate,
            max_pages: None,
        }
    }

    /// Stop after `max_pages` pages even if the endpoint returns a cursor.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Calls `fetch_page` with `None`, then with each returned cursor, and
    /// concatenates the items.
    ///
    /// Each call gets a cursor scoped to this run; nothing is shared between
    /// runs. A failed page stops the run and keeps the items fetched so far.
    pub async fn fetch_all<T, F, Fut>(&self, label: &str, mut fetch_page: F) -> Paginated<T>
    where
        F: FnMut(Option<String>) -> Fut,
        Fut: Future<Output = Result<Page<T>>>,
    {
        let mut result = Paginated {
            items: Vec::new(),
            pages: 0,
            failure: None,
            truncated: false,
        };
        let mut cursor: Option<String> = None;

        loop {
            let page = match self.gate.invoke(label, fetch_page(cursor.take())).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(
                        call = label,
                        pages = result.pages,
                        items = result.items.len(),
                        "Pagination stopped early, keeping partial results"
                    );
                    result.failure = Some(err);
                    return result;
                }
            };

            result.pages += 1;
            result.items.extend(page.items);

            let Some(next) = page.next_cursor.filter(|c| !c.is_empty()) else {
                break;
            };

            if self.max_pages.is_some_and(|max| result.pages >= max) {
                tracing::warn!(
                    call = label,
                    pages = result.pages,
                    "Page ceiling reached, listing truncated"
                );
                result.truncated = true;
                break;
            }

            tracing::debug!(call = label, next_cursor = %next, "Next page");
            cursor = Some(next);
        }

        tracing::debug!(
            call = label,
            pages = result.pages,
            items = result.items.len(),
            "Pagination complete"
        );

        result
    }
}
