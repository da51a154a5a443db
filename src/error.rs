use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the review pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// A free-text search returned no store results
    #[error("no store results for query '{query}'")]
    NotFound { query: String },

    /// The store search itself failed
    #[error("search for '{query}' failed: {source}")]
    Search {
        query: String,
        #[source]
        source: StoreError,
    },

    /// Retrieving reviews for a package failed
    #[error("failed to fetch reviews for {package_id}: {source}")]
    Fetch {
        package_id: String,
        #[source]
        source: StoreError,
    },

    /// Malformed input reference or input table
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Transport and parse failures talking to the store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON from store: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed store response: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_names_package() {
        let err = Error::Fetch {
            package_id: "com.example.app".to_string(),
            source: StoreError::Status {
                status: 503,
                body: "unavailable".to_string(),
            },
        };

        let msg = err.to_string();
        assert!(msg.contains("com.example.app"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_not_found_names_query() {
        let err = Error::NotFound {
            query: "nothing matches".to_string(),
        };
        assert_eq!(err.to_string(), "no store results for query 'nothing matches'");
    }
}
