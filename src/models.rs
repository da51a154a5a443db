use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Language and region sent with every store request. The pipeline always runs with the
/// default `en`/`us`; other values exist for adapter tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    pub lang: String,
    pub country: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            lang: "en".to_string(),
            country: "us".to_string(),
        }
    }
}

/// Review feed ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
    MostRelevant,
    Newest,
    Rating,
}

impl Sort {
    /// Numeric code used on the wire
    pub fn code(self) -> u8 {
        match self {
            Sort::MostRelevant => 1,
            Sort::Newest => 2,
            Sort::Rating => 3,
        }
    }
}

/// What to scrape: a known package or a free-text query to resolve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppReference {
    Direct {
        display_name: String,
        package_id: String,
    },
    Search {
        query: String,
    },
}

impl AppReference {
    pub fn direct(display_name: impl Into<String>, package_id: impl Into<String>) -> Self {
        AppReference::Direct {
            display_name: display_name.into(),
            package_id: package_id.into(),
        }
    }

    pub fn search(query: impl Into<String>) -> Self {
        AppReference::Search {
            query: query.into(),
        }
    }

    /// Human-readable name used in progress and warning messages
    pub fn label(&self) -> &str {
        match self {
            AppReference::Direct { display_name, .. } => display_name,
            AppReference::Search { query } => query,
        }
    }

    /// Check required fields are present and non-blank
    pub fn validate(&self) -> Result<()> {
        match self {
            AppReference::Direct {
                display_name,
                package_id,
            } => {
                if display_name.trim().is_empty() {
                    return Err(Error::Validation(format!(
                        "app reference for '{}' is missing a display name",
                        package_id
                    )));
                }
                if package_id.trim().is_empty() {
                    return Err(Error::Validation(format!(
                        "app reference '{}' is missing a package identifier",
                        display_name
                    )));
                }
                Ok(())
            }
            AppReference::Search { query } => {
                if query.trim().is_empty() {
                    return Err(Error::Validation("search query is empty".to_string()));
                }
                Ok(())
            }
        }
    }
}

/// An app reference after resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedApp {
    pub display_name: String,
    pub package_id: String,
    /// Display only; not used by the pipeline
    pub icon_url: Option<String>,
}

/// One result from the store search capability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub app_id: String,
    pub icon: Option<String>,
}

/// A raw review as returned by the feed. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub review_id: Option<String>,
    pub user_name: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub score: Option<u8>,
    pub content: Option<String>,
    pub thumbs_up_count: Option<u64>,
    pub reply_content: Option<String>,
    pub replied_at: Option<DateTime<Utc>>,
    pub app_version: Option<String>,
}

/// Reviews from one feed request plus the continuation cursor, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewPage {
    pub records: Vec<ReviewRecord>,
    pub cursor: Option<String>,
}

/// Exported columns, declared in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Timestamp,
    AppName,
    Score,
    Content,
    ThumbsUpCount,
    ReviewId,
}

impl Column {
    /// Canonical export columns, excluding the optional review id
    pub const CANONICAL: [Column; 5] = [
        Column::Timestamp,
        Column::AppName,
        Column::Score,
        Column::Content,
        Column::ThumbsUpCount,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Timestamp => "timestamp",
            Column::AppName => "app_name",
            Column::Score => "score",
            Column::Content => "content",
            Column::ThumbsUpCount => "thumbs_up_count",
            Column::ReviewId => "review_id",
        }
    }
}

/// How the exported header is chosen for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnProjection {
    /// Every column present on at least one row
    #[default]
    Observed,
    /// Only the columns present on the first row. A column missing there is dropped for the
    /// whole export even if later rows carry it.
    FirstRecord,
}

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A review reshaped into the fixed export schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReview {
    pub timestamp: Option<DateTime<Utc>>,
    pub app_name: String,
    pub score: Option<u8>,
    pub content: Option<String>,
    pub thumbs_up_count: Option<u64>,
    pub review_id: Option<String>,
}

impl NormalizedReview {
    /// Whether this row carries a value for `column`
    pub fn has(&self, column: Column) -> bool {
        match column {
            Column::Timestamp => self.timestamp.is_some(),
            Column::AppName => true,
            Column::Score => self.score.is_some(),
            Column::Content => self.content.is_some(),
            Column::ThumbsUpCount => self.thumbs_up_count.is_some(),
            Column::ReviewId => self.review_id.is_some(),
        }
    }

    /// Text cell for `column`; absent values are empty
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Timestamp => self
                .timestamp
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
            Column::AppName => self.app_name.clone(),
            Column::Score => self.score.map(|s| s.to_string()).unwrap_or_default(),
            Column::Content => self.content.clone().unwrap_or_default(),
            Column::ThumbsUpCount => self
                .thumbs_up_count
                .map(|n| n.to_string())
                .unwrap_or_default(),
            Column::ReviewId => self.review_id.clone().unwrap_or_default(),
        }
    }
}

/// Rows collected across one run: app processing order, then feed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReviewBatch {
    rows: Vec<NormalizedReview>,
}

impl ReviewBatch {
    pub fn extend(&mut self, rows: impl IntoIterator<Item = NormalizedReview>) {
        self.rows.extend(rows);
    }

    pub fn rows(&self) -> &[NormalizedReview] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<NormalizedReview>> for ReviewBatch {
    fn from(rows: Vec<NormalizedReview>) -> Self {
        Self { rows }
    }
}
