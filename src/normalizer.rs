use crate::models::{Column, ColumnProjection, NormalizedReview, ReviewRecord};

/// Reshape raw feed records into export rows tagged with `app_name`
pub fn normalize(records: &[ReviewRecord], app_name: &str) -> Vec<NormalizedReview> {
    records
        .iter()
        .map(|r| NormalizedReview {
            timestamp: r.timestamp,
            app_name: app_name.to_string(),
            score: r.score,
            content: r.content.clone(),
            thumbs_up_count: r.thumbs_up_count,
            review_id: r.review_id.clone(),
        })
        .collect()
}

/// Choose the exported header for a batch, in canonical order.
///
/// An empty batch gets the full canonical header since there is nothing to project against.
pub fn project_columns(
    rows: &[NormalizedReview],
    projection: ColumnProjection,
    include_review_id: bool,
) -> Vec<Column> {
    let candidates = Column::CANONICAL
        .into_iter()
        .chain(include_review_id.then_some(Column::ReviewId));

    let Some(first) = rows.first() else {
        return candidates.collect();
    };

    candidates
        .filter(|&column| match projection {
            ColumnProjection::Observed => rows.iter().any(|r| r.has(column)),
            ColumnProjection::FirstRecord => first.has(column),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn full(id: &str) -> ReviewRecord {
        ReviewRecord {
            review_id: Some(id.to_string()),
            user_name: Some("someone".to_string()),
            timestamp: DateTime::from_timestamp(1_700_000_000, 0),
            score: Some(5),
            content: Some("great".to_string()),
            thumbs_up_count: Some(2),
            ..ReviewRecord::default()
        }
    }

    fn without_thumbs(id: &str) -> ReviewRecord {
        ReviewRecord {
            thumbs_up_count: None,
            ..full(id)
        }
    }

    #[test]
    fn test_normalize_tags_app_name() {
        let rows = normalize(&[full("a"), full("b")], "Gemini");

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.app_name == "Gemini"));
        assert_eq!(rows[0].review_id.as_deref(), Some("a"));
        assert_eq!(rows[1].score, Some(5));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let records = vec![full("a"), without_thumbs("b"), ReviewRecord::default()];
        assert_eq!(normalize(&records, "App"), normalize(&records, "App"));
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(&[], "App").is_empty());
    }

    #[test]
    fn test_projection_drops_unobserved_column() {
        let rows = normalize(&[without_thumbs("a"), without_thumbs("b")], "App");

        for projection in [ColumnProjection::Observed, ColumnProjection::FirstRecord] {
            assert_eq!(
                project_columns(&rows, projection, false),
                [Column::Timestamp, Column::AppName, Column::Score, Column::Content]
            );
        }
    }

    #[test]
    fn test_projection_modes_differ_on_sparse_first_row() {
        let mut rows = normalize(&[without_thumbs("a")], "First");
        rows.extend(normalize(&[full("b")], "Second"));

        let observed = project_columns(&rows, ColumnProjection::Observed, false);
        assert!(observed.contains(&Column::ThumbsUpCount));

        let first = project_columns(&rows, ColumnProjection::FirstRecord, false);
        assert!(!first.contains(&Column::ThumbsUpCount));
    }

    #[test]
    fn test_projection_review_id_opt_in() {
        let rows = normalize(&[full("a")], "App");

        assert!(!project_columns(&rows, ColumnProjection::Observed, false).contains(&Column::ReviewId));
        assert_eq!(
            project_columns(&rows, ColumnProjection::Observed, true).last(),
            Some(&Column::ReviewId)
        );
    }

    #[test]
    fn test_projection_empty_batch_uses_canonical() {
        assert_eq!(project_columns(&[], ColumnProjection::Observed, false), Column::CANONICAL);
        assert_eq!(project_columns(&[], ColumnProjection::FirstRecord, true).len(), 6);
    }
}
