use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Locale, ReviewRecord, Sort};
use crate::store::ReviewFeed;

/// Retrieves a bounded number of newest-first reviews for one package
pub struct ReviewFetcher<F: ReviewFeed> {
    feed: F,
}

impl<F: ReviewFeed> ReviewFetcher<F> {
    pub fn new(feed: F) -> Self {
        Self { feed }
    }

    /// Ask the feed for `target_count` reviews and return at most that many.
    /// Failures carry the package identifier and are not retried.
    pub async fn fetch(
        &self,
        package_id: &str,
        target_count: u32,
        locale: &Locale,
    ) -> Result<Vec<ReviewRecord>> {
        let page = self
            .feed
            .reviews(package_id, locale, Sort::Newest, target_count)
            .await
            .map_err(|source| Error::Fetch {
                package_id: package_id.to_string(),
                source,
            })?;

        let mut records = page.records;
        records.truncate(target_count as usize);

        info!(package_id, count = records.len(), "Fetched reviews");

        Ok(records)
    }
}
