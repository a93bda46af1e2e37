//! Exhaustive coin collection with a descending `maxId` cursor
//!
//! The service returns pages newest-first. After the first full page the
//! collector asks for `maxId = min_seen - 1` until a page comes back empty or
//! the cursor reaches the origin. Pages are merged into a [`CoinSnapshot`]
//! keyed by id, so overlapping pages collapse harmlessly.

use crate::client::CoinService;
use crate::error::{Error, Result};
use crate::models::CoinSnapshot;

/// Sequential paginated collector over a [`CoinService`]
pub struct PaginatedCollector<'a, S: CoinService + ?Sized> {
    service: &'a S,
}

impl<'a, S: CoinService + ?Sized> PaginatedCollector<'a, S> {
    #[must_use]
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Fetch every coin the service holds
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for a zero page size and propagates any
    /// service error unchanged; nothing is retried here.
    pub async fn collect_all(&self, page_size: usize) -> Result<CoinSnapshot> {
        if page_size == 0 {
            return Err(Error::config("page_size must be greater than 0"));
        }

        let mut snapshot = CoinSnapshot::new();

        tracing::debug!(limit = page_size, "Fetching first coin page");
        let first = self.service.list_coins(page_size, None).await?;
        let first_len = first.len();
        snapshot.merge_page(first);

        // a short first page means the service has nothing older
        if first_len < page_size {
            tracing::info!(coins = snapshot.len(), pages = 1, "Collected all coins");
            return Ok(snapshot);
        }

        let mut pages = 1;
        let mut min_id = snapshot.min_id().unwrap_or(0);

        while min_id > 0 {
            let cursor = min_id - 1;
            tracing::debug!(limit = page_size, max_id = cursor, "Fetching coin page");

            let page = self.service.list_coins(page_size, Some(cursor)).await?;
            pages += 1;

            let Some(page_min) = page.iter().map(|c| c.id).min() else {
                tracing::debug!(pages, "Empty page, stopping pagination");
                break;
            };

            let fetched = page.len();
            let added = snapshot.merge_page(page);
            tracing::debug!(
                page = pages,
                fetched,
                added,
                total = snapshot.len(),
                "Merged coin page"
            );

            if page_min >= min_id {
                // the service ignored the cursor; asking again would loop forever
                tracing::warn!(
                    max_id = cursor,
                    page_min,
                    "Page did not advance the cursor, stopping pagination"
                );
                break;
            }
            min_id = page_min;
        }

        tracing::info!(coins = snapshot.len(), pages, "Collected all coins");
        Ok(snapshot)
    }
}
