pub mod collector;
pub mod config;
pub mod error;
pub mod export;
pub mod fetcher;
pub mod input;
pub mod models;
pub mod normalizer;
pub mod progress;
pub mod resolver;
pub mod store;

pub use collector::{generate_summary, AppFailure, AppOutcome, BatchCollector, Collection};
pub use config::{clamp_target_count, Config};
pub use error::{Error, Result, StoreError};
pub use export::{file_name, ExportOptions, Exporter};
pub use fetcher::ReviewFetcher;
pub use input::{read_app_list, read_app_list_file};
pub use models::*;
pub use normalizer::{normalize, project_columns};
pub use progress::{progress_fraction, CollectProgress, NullProgress};
pub use resolver::AppResolver;
pub use store::{PlayStoreClient, ReviewFeed, StoreSearch};
