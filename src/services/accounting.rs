use crate::error::{handle_store_error, AppError};
use crate::models::file::FileRecord;
use crate::models::summary::StorageSummary;
use crate::models::user::Principal;
use crate::services::query_builder;
use crate::state::AppState;

/// Folds records into per-category usage. Order of `files` does not matter.
pub fn summarize(files: &[FileRecord]) -> StorageSummary {
    files.iter().collect()
}

pub async fn compute_storage_summary(
    state: &AppState,
    principal: &Principal,
) -> Result<StorageSummary, AppError> {
    let files = state
        .documents
        .list_documents(
            &state.config.files_collection_id,
            &query_builder::owned_files_query(principal),
        )
        .await
        .map_err(|e| handle_store_error(e, "Failed to list files for storage summary"))?;

    let summary = summarize(&files);
    tracing::debug!(
        owner = %principal.id,
        files = files.len(),
        used = summary.used,
        "Storage summary computed"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::file::FileType;
    use crate::models::summary::TOTAL_QUOTA_BYTES;
    use chrono::{Duration, TimeZone, Utc};

    fn record(file_type: FileType, size: u64, minutes: i64) -> FileRecord {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes);
        FileRecord {
            id: format!("{file_type}-{size}-{minutes}"),
            name: "f".into(),
            extension: String::new(),
            file_type,
            url: String::new(),
            size,
            owner: "u1".into(),
            account_id: "a1".into(),
            users: Vec::new(),
            bucket_file_id: "b".into(),
            created_at: at,
            updated_at: at,
        }
    }

    fn sample() -> Vec<FileRecord> {
        vec![
            record(FileType::Image, 100, 5),
            record(FileType::Image, 50, 10),
            record(FileType::Document, 10, 1),
            record(FileType::Video, 4096, 3),
            record(FileType::Audio, 7, 2),
            record(FileType::Other, 1, 0),
            record(FileType::Document, 20, 0),
        ]
    }

    #[test]
    fn empty_input_reports_only_quota() {
        let summary = summarize(&[]);
        assert_eq!(summary.used, 0);
        assert_eq!(summary.all, TOTAL_QUOTA_BYTES);
        assert_eq!(summary.image.latest_date, None);
    }

    #[test]
    fn categories_sum_to_used() {
        let summary = summarize(&sample());
        let total: u64 = FileType::ALL
            .iter()
            .map(|t| summary.category(*t).size)
            .sum();
        assert_eq!(total, summary.used);
        assert_eq!(summary.used, 4284);
        assert_eq!(summary.image.size, 150);
        assert_eq!(summary.document.size, 30);
    }

    #[test]
    fn latest_date_is_newest_update() {
        let summary = summarize(&sample());
        assert_eq!(summary.image.latest_date, Some(record(FileType::Image, 0, 10).updated_at));
        assert_eq!(
            summary.document.latest_date,
            Some(record(FileType::Document, 0, 1).updated_at)
        );
    }

    #[test]
    fn order_does_not_matter() {
        let forward = sample();
        let mut backward = sample();
        backward.reverse();
        let mut rotated = sample();
        rotated.rotate_left(3);

        assert_eq!(summarize(&forward), summarize(&backward));
        assert_eq!(summarize(&forward), summarize(&rotated));
    }
}
