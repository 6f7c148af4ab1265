use chrono::{DateTime, Utc};
use serde::Serialize;

use super::file::{FileRecord, FileType};

/// Bucket storage available to every account.
pub const TOTAL_QUOTA_BYTES: u64 = 2 * 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryUsage {
    pub size: u64,
    pub latest_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageSummary {
    pub image: CategoryUsage,
    pub document: CategoryUsage,
    pub video: CategoryUsage,
    pub audio: CategoryUsage,
    pub other: CategoryUsage,
    pub used: u64,
    pub all: u64,
}

impl Default for StorageSummary {
    fn default() -> Self {
        Self {
            image: CategoryUsage::default(),
            document: CategoryUsage::default(),
            video: CategoryUsage::default(),
            audio: CategoryUsage::default(),
            other: CategoryUsage::default(),
            used: 0,
            all: TOTAL_QUOTA_BYTES,
        }
    }
}

impl StorageSummary {
    pub fn category(&self, file_type: FileType) -> &CategoryUsage {
        match file_type {
            FileType::Image => &self.image,
            FileType::Document => &self.document,
            FileType::Video => &self.video,
            FileType::Audio => &self.audio,
            FileType::Other => &self.other,
        }
    }

    fn category_mut(&mut self, file_type: FileType) -> &mut CategoryUsage {
        match file_type {
            FileType::Image => &mut self.image,
            FileType::Document => &mut self.document,
            FileType::Video => &mut self.video,
            FileType::Audio => &mut self.audio,
            FileType::Other => &mut self.other,
        }
    }

    pub fn record(&mut self, file: &FileRecord) {
        let bucket = self.category_mut(file.file_type);
        bucket.size += file.size;
        if bucket.latest_date.map_or(true, |latest| file.updated_at > latest) {
            bucket.latest_date = Some(file.updated_at);
        }
        self.used += file.size;
    }

    pub fn remaining(&self) -> u64 {
        self.all.saturating_sub(self.used)
    }
}

impl<'a> FromIterator<&'a FileRecord> for StorageSummary {
    fn from_iter<I: IntoIterator<Item = &'a FileRecord>>(iter: I) -> Self {
        let mut summary = StorageSummary::default();
        for file in iter {
            summary.record(file);
        }
        summary
    }
}
