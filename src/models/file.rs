use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category a file is filed under. Derived once from the extension at
/// upload time and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Document,
    Video,
    Audio,
    Other,
}

impl FileType {
    pub const ALL: [FileType; 5] = [
        FileType::Image,
        FileType::Document,
        FileType::Video,
        FileType::Audio,
        FileType::Other,
    ];

    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" => FileType::Image,
            "pdf" | "doc" | "docx" | "txt" | "xls" | "xlsx" | "csv" | "rtf" | "ods" | "ppt"
            | "odp" | "md" | "html" | "htm" | "epub" | "pages" | "fig" | "psd" | "ai"
            | "indd" | "xd" | "sketch" | "afdesign" | "afphoto" => FileType::Document,
            "mp4" | "avi" | "mov" | "mkv" | "webm" => FileType::Video,
            "mp3" | "wav" | "ogg" | "flac" => FileType::Audio,
            _ => FileType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Document => "document",
            FileType::Video => "video",
            FileType::Audio => "audio",
            FileType::Other => "other",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown file type: {0}")]
pub struct ParseFileTypeError(pub String);

impl FromStr for FileType {
    type Err = ParseFileTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ParseFileTypeError(s.to_string()))
    }
}

/// Lower-cased extension of a file name, without the dot. Empty when the
/// name has no extension (or is a dotfile such as `.env`).
pub fn file_extension(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub extension: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub url: String,
    pub size: u64,
    pub owner: String,
    pub account_id: String,
    pub users: Vec<String>,
    pub bucket_file_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A borrowed view of one record attribute, used by document stores to
/// evaluate clauses without knowing the record layout.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue<'a> {
    Text(&'a str),
    Number(u64),
    Time(DateTime<Utc>),
    List(&'a [String]),
}

impl FileRecord {
    /// Attribute names a document store can filter and sort on.
    pub const ATTRIBUTES: [&'static str; 12] = [
        "id",
        "name",
        "extension",
        "type",
        "url",
        "size",
        "owner",
        "account_id",
        "users",
        "bucket_file_id",
        "created_at",
        "updated_at",
    ];

    pub fn attribute(&self, field: &str) -> Option<AttributeValue<'_>> {
        let value = match field {
            "id" => AttributeValue::Text(&self.id),
            "name" => AttributeValue::Text(&self.name),
            "extension" => AttributeValue::Text(&self.extension),
            "type" => AttributeValue::Text(self.file_type.as_str()),
            "url" => AttributeValue::Text(&self.url),
            "size" => AttributeValue::Number(self.size),
            "owner" => AttributeValue::Text(&self.owner),
            "account_id" => AttributeValue::Text(&self.account_id),
            "users" => AttributeValue::List(&self.users),
            "bucket_file_id" => AttributeValue::Text(&self.bucket_file_id),
            "created_at" => AttributeValue::Time(self.created_at),
            "updated_at" => AttributeValue::Time(self.updated_at),
            _ => return None,
        };
        Some(value)
    }

    pub fn is_visible_to(&self, owner_id: &str, email: &str) -> bool {
        self.owner == owner_id || self.users.iter().any(|u| u == email)
    }
}

/// Fields supplied by the caller when creating a record. Timestamps are
/// stamped by the document store.
#[derive(Debug, Clone, Serialize)]
pub struct NewFileRecord {
    pub name: String,
    pub extension: String,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub url: String,
    pub size: u64,
    pub owner: String,
    pub account_id: String,
    pub users: Vec<String>,
    pub bucket_file_id: String,
}

/// Mutable fields of a record. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct FileUpdate {
    pub name: Option<String>,
    pub users: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesQuery {
    /// Comma separated list of file types.
    pub types: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct RenameFileRequest {
    pub name: String,
    #[serde(default)]
    pub extension: String,
}

#[derive(Debug, Deserialize)]
pub struct ShareFileRequest {
    pub emails: Vec<String>,
}
