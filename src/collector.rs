use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::fetcher::ReviewFetcher;
use crate::models::{AppReference, Column, Locale, NormalizedReview, ResolvedApp, ReviewBatch};
use crate::normalizer::normalize;
use crate::progress::CollectProgress;
use crate::resolver::AppResolver;
use crate::store::{ReviewFeed, StoreSearch};

const BATCH_LABEL: &str = "scraped";
const PREVIEW_CONTENT_CHARS: usize = 60;

/// An app that was collected, in processing order
#[derive(Debug, Clone)]
pub struct AppOutcome {
    pub app: ResolvedApp,
    pub review_count: usize,
}

/// Warning record for an app that was skipped
#[derive(Debug)]
pub struct AppFailure {
    pub label: String,
    pub error: Error,
}

/// Result of one collection run
#[derive(Debug, Default)]
pub struct Collection {
    pub batch: ReviewBatch,
    pub outcomes: Vec<AppOutcome>,
    pub failures: Vec<AppFailure>,
}

impl Collection {
    /// Label for the export file: the app's name when the run covered exactly one app
    pub fn export_label(&self) -> &str {
        match (self.outcomes.as_slice(), self.failures.is_empty()) {
            ([only], true) => &only.app.display_name,
            _ => BATCH_LABEL,
        }
    }
}

/// Runs resolve, fetch and normalize for each app in turn
pub struct BatchCollector<S: StoreSearch, F: ReviewFeed> {
    resolver: AppResolver<S>,
    fetcher: ReviewFetcher<F>,
    locale: Locale,
}

impl<S: StoreSearch, F: ReviewFeed> BatchCollector<S, F> {
    pub fn new(search: S, feed: F, locale: Locale) -> Self {
        Self {
            resolver: AppResolver::new(search, locale.clone()),
            fetcher: ReviewFetcher::new(feed),
            locale,
        }
    }

    /// Collect up to `target_count` reviews per app.
    ///
    /// Every reference is validated before any network call and a validation failure aborts
    /// the run. After that the run always succeeds: an app that fails to resolve or fetch is
    /// recorded in `failures` and contributes no rows.
    pub async fn collect(
        &self,
        references: &[AppReference],
        target_count: u32,
        progress: &mut dyn CollectProgress,
    ) -> Result<Collection> {
        for reference in references {
            reference.validate()?;
        }

        info!(apps = references.len(), target_count, "Starting review collection");

        let total = references.len();
        let mut collection = Collection::default();
        progress.begin(total);

        for (index, reference) in references.iter().enumerate() {
            progress.app_started(reference.label());

            match self.collect_one(reference, target_count).await {
                Ok((app, rows)) => {
                    info!(app = %app.display_name, reviews = rows.len(), "Collected app");
                    collection.outcomes.push(AppOutcome {
                        app,
                        review_count: rows.len(),
                    });
                    collection.batch.extend(rows);
                }
                Err(error) => {
                    warn!(app = reference.label(), error = %error, "Could not scrape app");
                    let failure = AppFailure {
                        label: reference.label().to_string(),
                        error,
                    };
                    progress.warning(&failure);
                    collection.failures.push(failure);
                }
            }

            progress.app_done(index + 1, total);
        }

        progress.finish();

        info!(
            reviews = collection.batch.len(),
            succeeded = collection.outcomes.len(),
            failed = collection.failures.len(),
            "Review collection complete"
        );

        Ok(collection)
    }

    async fn collect_one(
        &self,
        reference: &AppReference,
        target_count: u32,
    ) -> Result<(ResolvedApp, Vec<NormalizedReview>)> {
        let app = self.resolver.resolve(reference).await?;
        let records = self
            .fetcher
            .fetch(&app.package_id, target_count, &self.locale)
            .await?;
        let rows = normalize(&records, &app.display_name);
        Ok((app, rows))
    }
}

/// Generate a plain-text report of a run with a preview of the first rows
pub fn generate_summary(collection: &Collection, columns: &[Column], preview_rows: usize) -> String {
    let mut out = String::new();

    if collection.batch.is_empty() {
        out.push_str("No reviews found.\n");
    } else {
        out.push_str(&format!(
            "Successfully scraped {} reviews!\n",
            collection.batch.len()
        ));
    }

    if !collection.outcomes.is_empty() {
        out.push_str("\nApps:\n");
        for outcome in &collection.outcomes {
            out.push_str(&format!(
                "  {} ({}): {} reviews\n",
                outcome.app.display_name, outcome.app.package_id, outcome.review_count
            ));
        }
    }

    if !collection.failures.is_empty() {
        out.push_str("\nWarnings:\n");
        for failure in &collection.failures {
            out.push_str(&format!(
                "  Could not scrape {}: {}\n",
                failure.label, failure.error
            ));
        }
    }

    let preview: Vec<_> = collection.batch.rows().iter().take(preview_rows).collect();
    if !preview.is_empty() && !columns.is_empty() {
        out.push_str("\nPreview:\n");
        let header: Vec<_> = columns.iter().map(|c| c.header()).collect();
        out.push_str(&format!("  {}\n", header.join(" | ")));
        for row in preview {
            let cells: Vec<_> = columns
                .iter()
                .map(|&c| preview_cell(&row.cell(c)))
                .collect();
            out.push_str(&format!("  {}\n", cells.join(" | ")));
        }
    }

    out
}

fn preview_cell(cell: &str) -> String {
    let flat = cell.replace(['\n', '\r'], " ");
    if flat.chars().count() <= PREVIEW_CONTENT_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(PREVIEW_CONTENT_CHARS).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReviewRecord;
    use crate::progress::NullProgress;
    use crate::store::testing::FakeStore;

    fn records(prefix: &str, n: usize) -> Vec<ReviewRecord> {
        (0..n)
            .map(|i| ReviewRecord {
                review_id: Some(format!("{}-{}", prefix, i)),
                score: Some(4),
                content: Some(format!("review {} from {}", i, prefix)),
                thumbs_up_count: Some(i as u64),
                ..ReviewRecord::default()
            })
            .collect()
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl CollectProgress for Recorder {
        fn begin(&mut self, total: usize) {
            self.events.push(format!("begin:{}", total));
        }

        fn app_started(&mut self, label: &str) {
            self.events.push(format!("start:{}", label));
        }

        fn app_done(&mut self, completed: usize, total: usize) {
            self.events.push(format!("done:{}/{}", completed, total));
        }

        fn warning(&mut self, failure: &AppFailure) {
            self.events.push(format!("warn:{}", failure.label));
        }

        fn finish(&mut self) {
            self.events.push("finish".to_string());
        }
    }

    #[tokio::test]
    async fn test_collect_keeps_app_order() {
        let store = FakeStore::default()
            .with_reviews("com.a", records("a", 2))
            .with_reviews("com.b", records("b", 3));
        let collector = BatchCollector::new(&store, &store, Locale::default());

        let refs = [
            AppReference::direct("App A", "com.a"),
            AppReference::direct("App B", "com.b"),
        ];
        let collection = collector.collect(&refs, 100, &mut NullProgress).await.unwrap();

        assert_eq!(collection.batch.len(), 5);
        let names: Vec<_> = collection
            .batch
            .rows()
            .iter()
            .map(|r| r.app_name.as_str())
            .collect();
        assert_eq!(names, ["App A", "App A", "App B", "App B", "App B"]);
        assert_eq!(collection.batch.rows()[2].review_id.as_deref(), Some("b-0"));
        assert_eq!(collection.outcomes.len(), 2);
        assert!(collection.failures.is_empty());
    }

    #[tokio::test]
    async fn test_failing_app_is_isolated() {
        let store = FakeStore::default()
            .failing_on("com.a")
            .with_reviews("com.b", records("b", 5));
        let collector = BatchCollector::new(&store, &store, Locale::default());

        let refs = [
            AppReference::direct("A", "com.a"),
            AppReference::direct("B", "com.b"),
        ];
        let mut progress = Recorder::default();
        let collection = collector.collect(&refs, 100, &mut progress).await.unwrap();

        assert_eq!(collection.batch.len(), 5);
        assert!(collection.batch.rows().iter().all(|r| r.app_name == "B"));
        assert_eq!(collection.failures.len(), 1);
        assert_eq!(collection.failures[0].label, "A");
        assert!(matches!(collection.failures[0].error, Error::Fetch { .. }));
        assert_eq!(
            progress.events,
            ["begin:2", "start:A", "warn:A", "done:1/2", "start:B", "done:2/2", "finish"]
        );
    }

    #[tokio::test]
    async fn test_search_failure_is_isolated() {
        let store = FakeStore::default()
            .failing_search_on("broken")
            .with_reviews("com.b", records("b", 3));
        let collector = BatchCollector::new(&store, &store, Locale::default());

        let refs = [AppReference::search("broken"), AppReference::direct("B", "com.b")];
        let mut progress = Recorder::default();
        let collection = collector.collect(&refs, 100, &mut progress).await.unwrap();

        assert_eq!(store.calls(), ["search:broken", "reviews:com.b:100"]);
        assert_eq!(collection.failures.len(), 1);
        assert_eq!(collection.failures[0].label, "broken");
        assert!(matches!(collection.failures[0].error, Error::Search { .. }));
        assert_eq!(collection.batch.len(), 3);
        assert!(collection.batch.rows().iter().all(|r| r.app_name == "B"));
        assert_eq!(
            progress.events,
            ["begin:2", "start:broken", "warn:broken", "done:1/2", "start:B", "done:2/2", "finish"]
        );
    }

    #[tokio::test]
    async fn test_unresolved_search_skips_fetch() {
        let store = FakeStore::default()
            .with_hit("gemini", "Gemini", "com.google.android.apps.bard")
            .with_reviews("com.google.android.apps.bard", records("g", 2));
        let collector = BatchCollector::new(&store, &store, Locale::default());

        let refs = [AppReference::search("nothing"), AppReference::search("gemini")];
        let collection = collector.collect(&refs, 250, &mut NullProgress).await.unwrap();

        assert_eq!(
            store.calls(),
            [
                "search:nothing",
                "search:gemini",
                "reviews:com.google.android.apps.bard:250"
            ]
        );
        assert!(matches!(collection.failures[0].error, Error::NotFound { .. }));
        assert!(collection.batch.rows().iter().all(|r| r.app_name == "Gemini"));
    }

    #[tokio::test]
    async fn test_validation_fails_before_network() {
        let store = FakeStore::default().with_reviews("com.a", records("a", 1));
        let collector = BatchCollector::new(&store, &store, Locale::default());

        let refs = [
            AppReference::direct("A", "com.a"),
            AppReference::direct("Broken", ""),
        ];
        let err = collector
            .collect(&refs, 100, &mut NullProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_zero_reviews_is_empty_batch() {
        let store = FakeStore::default().with_reviews("com.quiet", Vec::new());
        let collector = BatchCollector::new(&store, &store, Locale::default());

        let refs = [AppReference::direct("Quiet", "com.quiet")];
        let collection = collector.collect(&refs, 100, &mut NullProgress).await.unwrap();

        assert!(collection.batch.is_empty());
        assert!(collection.failures.is_empty());
        assert_eq!(collection.outcomes[0].review_count, 0);
    }

    #[test]
    fn test_export_label() {
        let mut collection = Collection::default();
        assert_eq!(collection.export_label(), "scraped");

        collection.outcomes.push(AppOutcome {
            app: ResolvedApp {
                display_name: "Gemini (Google)".to_string(),
                package_id: "com.google.android.apps.bard".to_string(),
                icon_url: None,
            },
            review_count: 3,
        });
        assert_eq!(collection.export_label(), "Gemini (Google)");

        collection.failures.push(AppFailure {
            label: "Other".to_string(),
            error: Error::NotFound {
                query: "Other".to_string(),
            },
        });
        assert_eq!(collection.export_label(), "scraped");
    }

    #[test]
    fn test_generate_summary_empty() {
        let summary = generate_summary(&Collection::default(), &Column::CANONICAL, 5);
        assert!(summary.contains("No reviews found."));
        assert!(!summary.contains("Preview"));
    }

    #[test]
    fn test_generate_summary_with_rows() {
        let mut collection = Collection::default();
        collection
            .batch
            .extend(normalize(&records("a", 8), "App A"));
        collection.failures.push(AppFailure {
            label: "App B".to_string(),
            error: Error::NotFound {
                query: "App B".to_string(),
            },
        });

        let summary = generate_summary(&collection, &[Column::AppName, Column::Content], 5);

        assert!(summary.contains("Successfully scraped 8 reviews!"));
        assert!(summary.contains("Could not scrape App B"));
        assert!(summary.contains("app_name | content"));
        assert!(summary.contains("review 4 from a"));
        assert!(!summary.contains("review 5 from a"));
    }

    #[test]
    fn test_preview_cell_truncates() {
        let long = "x".repeat(100);
        let cell = preview_cell(&long);
        assert_eq!(cell.chars().count(), PREVIEW_CONTENT_CHARS + 3);
        assert_eq!(preview_cell("line\nbreak"), "line break");
    }
}
