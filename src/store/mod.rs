pub mod play;

pub use play::PlayStoreClient;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::models::{Locale, ReviewPage, SearchHit, Sort};

/// Store search capability
#[async_trait]
pub trait StoreSearch: Send + Sync {
    /// Search apps by free text, best match first
    async fn search(&self, query: &str, locale: &Locale) -> Result<Vec<SearchHit>, StoreError>;
}

/// Store review feed capability
#[async_trait]
pub trait ReviewFeed: Send + Sync {
    /// Retrieve up to `count` reviews for `app_id` in `sort` order
    async fn reviews(
        &self,
        app_id: &str,
        locale: &Locale,
        sort: Sort,
        count: u32,
    ) -> Result<ReviewPage, StoreError>;
}
