use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::{Client, Response};
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use super::{ReviewFeed, StoreSearch};
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::models::{Locale, ReviewPage, ReviewRecord, SearchHit, Sort};

const REVIEWS_RPC: &str = "UsvDTd";
const RESPONSE_GUARD: &str = ")]}'";
const SEARCH_DATASET: &str = "ds:4";

static DATASET_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"AF_initDataCallback\(\{key: '(ds:\d+)'[\s\S]*?data:([\s\S]*?), sideChannel: \{\}\}\);")
        .expect("dataset pattern is a valid regex")
});

/// Client for the public Google Play store
#[derive(Debug, Clone)]
pub struct PlayStoreClient {
    client: Client,
    base_url: String,
    page_size: u32,
}

impl Default for PlayStoreClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayStoreClient {
    pub fn new() -> Self {
        let defaults = StoreConfig::default();
        Self {
            client: Client::new(),
            base_url: defaults.base_url,
            page_size: defaults.page_size,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size.max(1),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn fetch_page(
        &self,
        app_id: &str,
        locale: &Locale,
        sort: Sort,
        count: u32,
        token: Option<&str>,
    ) -> Result<ReviewPage, StoreError> {
        let url = format!("{}/_/PlayStoreUi/data/batchexecute", self.base_url);
        let payload = reviews_request(app_id, sort, count, token);

        debug!(app_id, count, has_token = token.is_some(), "Requesting review page");

        let response = self
            .client
            .post(&url)
            .query(&[("hl", locale.lang.as_str()), ("gl", locale.country.as_str())])
            .form(&[("f.req", payload.as_str())])
            .send()
            .await?;

        let body = success_body(response).await?;
        parse_reviews_response(&body)
    }
}

#[async_trait]
impl ReviewFeed for PlayStoreClient {
    #[instrument(skip(self, locale), fields(lang = %locale.lang, country = %locale.country))]
    async fn reviews(
        &self,
        app_id: &str,
        locale: &Locale,
        sort: Sort,
        count: u32,
    ) -> Result<ReviewPage, StoreError> {
        let target = count as usize;
        let mut records = Vec::new();
        let mut cursor: Option<String> = None;

        while records.len() < target {
            let remaining = (target - records.len()).min(self.page_size as usize) as u32;
            let page = self
                .fetch_page(app_id, locale, sort, remaining, cursor.as_deref())
                .await?;

            let fetched = page.records.len();
            records.extend(page.records);
            cursor = page.cursor;

            debug!(fetched, total = records.len(), "Received review page");

            if fetched == 0 || cursor.is_none() {
                break;
            }
        }

        records.truncate(target);
        info!(app_id, count = records.len(), "Review feed complete");

        Ok(ReviewPage { records, cursor })
    }
}

#[async_trait]
impl StoreSearch for PlayStoreClient {
    #[instrument(skip(self, locale), fields(lang = %locale.lang, country = %locale.country))]
    async fn search(&self, query: &str, locale: &Locale) -> Result<Vec<SearchHit>, StoreError> {
        let url = format!("{}/store/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", query),
                ("c", "apps"),
                ("hl", locale.lang.as_str()),
                ("gl", locale.country.as_str()),
            ])
            .send()
            .await?;

        let html = success_body(response).await?;
        let hits = parse_search_page(&html);

        info!(count = hits.len(), "Store search complete");

        Ok(hits)
    }
}

async fn success_body(response: Response) -> Result<String, StoreError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.text().await?)
}

/// Build the `f.req` form value for one review page
fn reviews_request(app_id: &str, sort: Sort, count: u32, token: Option<&str>) -> String {
    let inner = json!([
        null,
        null,
        [2, sort.code(), [count, null, token], null, []],
        [app_id, 7]
    ]);
    json!([[[REVIEWS_RPC, inner.to_string(), null, "generic"]]]).to_string()
}

fn parse_reviews_response(body: &str) -> Result<ReviewPage, StoreError> {
    let envelope = body
        .trim_start()
        .strip_prefix(RESPONSE_GUARD)
        .ok_or_else(|| StoreError::Malformed("missing response guard".to_string()))?;
    let envelope: Value = serde_json::from_str(envelope.trim())?;

    // A null payload is how the feed says "no reviews"
    let payload = match envelope.pointer("/0/2") {
        None | Some(Value::Null) => return Ok(ReviewPage::default()),
        Some(Value::String(s)) => s,
        Some(other) => {
            return Err(StoreError::Malformed(format!(
                "unexpected review payload: {}",
                other
            )))
        }
    };
    let data: Value = serde_json::from_str(payload)?;

    let records = data
        .get(0)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(parse_review).collect())
        .unwrap_or_default();

    let cursor = data
        .as_array()
        .and_then(|parts| parts.len().checked_sub(2).and_then(|i| parts.get(i)))
        .and_then(Value::as_array)
        .and_then(|tail| tail.last())
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ReviewPage { records, cursor })
}

fn parse_review(value: &Value) -> ReviewRecord {
    ReviewRecord {
        review_id: text_at(value, "/0"),
        user_name: text_at(value, "/1/0"),
        timestamp: seconds_at(value, "/5/0"),
        score: value
            .pointer("/2")
            .and_then(Value::as_u64)
            .and_then(|s| u8::try_from(s).ok()),
        content: text_at(value, "/4"),
        thumbs_up_count: value.pointer("/6").and_then(Value::as_u64),
        reply_content: text_at(value, "/7/1"),
        replied_at: seconds_at(value, "/7/2/0"),
        app_version: text_at(value, "/10"),
    }
}

fn text_at(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn seconds_at(value: &Value, pointer: &str) -> Option<DateTime<Utc>> {
    value
        .pointer(pointer)
        .and_then(Value::as_i64)
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}

/// Pull the `AF_initDataCallback` datasets out of a store page
fn extract_datasets(html: &str) -> HashMap<String, Value> {
    let mut datasets = HashMap::new();
    for caps in DATASET_PATTERN.captures_iter(html) {
        match serde_json::from_str::<Value>(&caps[2]) {
            Ok(data) => {
                datasets.insert(caps[1].to_string(), data);
            }
            Err(e) => debug!(key = &caps[1], error = %e, "Skipping unparsable dataset"),
        }
    }
    datasets
}

fn parse_search_page(html: &str) -> Vec<SearchHit> {
    let datasets = extract_datasets(html);

    let Some(sections) = datasets
        .get(SEARCH_DATASET)
        .and_then(|ds| ds.pointer("/0/1"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut hits: Vec<SearchHit> = Vec::new();
    for cluster in sections.iter().filter_map(|s| s.pointer("/22/0")) {
        let found: Vec<SearchHit> = match featured_result(cluster) {
            Some(hit) => vec![hit],
            None => cluster
                .as_array()
                .map(|items| items.iter().filter_map(listed_result).collect())
                .unwrap_or_default(),
        };

        for hit in found {
            if !hits.iter().any(|h| h.app_id == hit.app_id) {
                hits.push(hit);
            }
        }
    }

    hits
}

fn featured_result(value: &Value) -> Option<SearchHit> {
    Some(SearchHit {
        app_id: text_at(value, "/11/0/0")?,
        title: text_at(value, "/2/0/0")?,
        icon: text_at(value, "/2/95/0/3/2"),
    })
}

fn listed_result(value: &Value) -> Option<SearchHit> {
    Some(SearchHit {
        app_id: text_at(value, "/0/0/0")?,
        title: text_at(value, "/0/3")?,
        icon: text_at(value, "/0/1/3/2"),
    })
}
