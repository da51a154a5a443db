use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{AppReference, Locale, ResolvedApp};
use crate::store::StoreSearch;

/// Turns an app reference into a display name and package identifier
pub struct AppResolver<S: StoreSearch> {
    search: S,
    locale: Locale,
}

impl<S: StoreSearch> AppResolver<S> {
    pub fn new(search: S, locale: Locale) -> Self {
        Self { search, locale }
    }

    /// Resolve a reference. Search references take the store's top match and its canonical
    /// title; direct references are passed through.
    pub async fn resolve(&self, reference: &AppReference) -> Result<ResolvedApp> {
        match reference {
            AppReference::Direct {
                display_name,
                package_id,
            } => {
                debug!(app = %display_name, package_id = %package_id, "Using direct reference");
                Ok(ResolvedApp {
                    display_name: display_name.trim().to_string(),
                    package_id: package_id.trim().to_string(),
                    icon_url: None,
                })
            }
            AppReference::Search { query } => {
                let query = query.trim();
                let hits = self
                    .search
                    .search(query, &self.locale)
                    .await
                    .map_err(|source| Error::Search {
                        query: query.to_string(),
                        source,
                    })?;

                let top = hits.into_iter().next().ok_or_else(|| Error::NotFound {
                    query: query.to_string(),
                })?;

                info!(query, title = %top.title, package_id = %top.app_id, "Resolved search query");

                Ok(ResolvedApp {
                    display_name: top.title,
                    package_id: top.app_id,
                    icon_url: top.icon,
                })
            }
        }
    }
}
