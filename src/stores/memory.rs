use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::cmp::Ordering;
use uuid::Uuid;

use super::{Blob, BlobRef, BlobStore, DocumentStore, StoreError, StoreResult};
use crate::models::file::{AttributeValue, FileRecord, FileUpdate, NewFileRecord};
use crate::models::query::{Clause, SortDirection};

/// Document store keeping every collection in memory. Collections are
/// created on first write.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, DashMap<String, FileRecord>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

fn check_attribute(field: &str) -> StoreResult<()> {
    if FileRecord::ATTRIBUTES.contains(&field) {
        Ok(())
    } else {
        Err(StoreError::UnknownAttribute(field.to_string()))
    }
}

fn validate_clause(clause: &Clause, nested: bool) -> StoreResult<()> {
    match clause {
        Clause::Equal { field, .. } | Clause::Contains { field, .. } => check_attribute(field),
        Clause::Or { clauses } => {
            if clauses.is_empty() {
                return Err(StoreError::InvalidQuery("or() needs at least one clause".into()));
            }
            clauses.iter().try_for_each(|c| validate_clause(c, true))
        }
        Clause::Limit { .. } | Clause::Order { .. } if nested => Err(StoreError::InvalidQuery(
            "limit and order are not allowed inside or()".into(),
        )),
        Clause::Limit { .. } => Ok(()),
        Clause::Order { field, .. } => check_attribute(field),
    }
}

fn matches(record: &FileRecord, clause: &Clause) -> bool {
    match clause {
        Clause::Equal { field, values } => match record.attribute(field) {
            Some(AttributeValue::Text(s)) => values.iter().any(|v| v == s),
            Some(AttributeValue::Number(n)) => values.iter().any(|v| v.parse::<u64>() == Ok(n)),
            Some(AttributeValue::Time(t)) => values
                .iter()
                .any(|v| DateTime::parse_from_rfc3339(v).is_ok_and(|parsed| parsed == t)),
            Some(AttributeValue::List(items)) => items.iter().any(|i| values.contains(i)),
            None => false,
        },
        Clause::Contains { field, value } => match record.attribute(field) {
            Some(AttributeValue::Text(s)) => s.contains(value.as_str()),
            Some(AttributeValue::List(items)) => items.iter().any(|i| i == value),
            _ => false,
        },
        Clause::Or { clauses } => clauses.iter().any(|c| matches(record, c)),
        Clause::Limit { .. } | Clause::Order { .. } => true,
    }
}

fn compare(a: Option<AttributeValue<'_>>, b: Option<AttributeValue<'_>>) -> Ordering {
    match (a, b) {
        (Some(AttributeValue::Text(x)), Some(AttributeValue::Text(y))) => x.cmp(y),
        (Some(AttributeValue::Number(x)), Some(AttributeValue::Number(y))) => x.cmp(&y),
        (Some(AttributeValue::Time(x)), Some(AttributeValue::Time(y))) => x.cmp(&y),
        (Some(AttributeValue::List(x)), Some(AttributeValue::List(y))) => x.len().cmp(&y.len()),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn list_documents(
        &self,
        collection: &str,
        clauses: &[Clause],
    ) -> StoreResult<Vec<FileRecord>> {
        let mut limit: Option<usize> = None;
        let mut orders: Vec<(&str, SortDirection)> = Vec::new();
        for clause in clauses {
            validate_clause(clause, false)?;
            match clause {
                Clause::Limit { count } => {
                    limit = Some(limit.map_or(*count, |l| l.min(*count)));
                }
                Clause::Order { field, direction } => orders.push((field.as_str(), *direction)),
                _ => {}
            }
        }

        let mut records: Vec<FileRecord> = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|entry| clauses.iter().all(|c| matches(entry.value(), c)))
                    .map(|entry| entry.value().clone())
                    .collect()
            })
            .unwrap_or_default();

        records.sort_by(|a, b| {
            for (field, direction) in &orders {
                let ord = compare(a.attribute(field), b.attribute(field));
                let ord = match direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn get_document(&self, collection: &str, id: &str) -> StoreResult<FileRecord> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.get(id).map(|d| d.clone()))
            .ok_or_else(|| StoreError::NotFound(format!("Document {} not found", id)))
    }

    async fn create_document(
        &self,
        collection: &str,
        id: &str,
        fields: NewFileRecord,
    ) -> StoreResult<FileRecord> {
        let docs = self
            .collections
            .entry(collection.to_string())
            .or_insert_with(DashMap::new);

        if docs.contains_key(id) {
            return Err(StoreError::Conflict(format!("Document {} already exists", id)));
        }

        let now = Utc::now();
        let record = FileRecord {
            id: id.to_string(),
            name: fields.name,
            extension: fields.extension,
            file_type: fields.file_type,
            url: fields.url,
            size: fields.size,
            owner: fields.owner,
            account_id: fields.account_id,
            users: fields.users,
            bucket_file_id: fields.bucket_file_id,
            created_at: now,
            updated_at: now,
        };
        docs.insert(id.to_string(), record.clone());
        Ok(record)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        fields: FileUpdate,
    ) -> StoreResult<FileRecord> {
        let docs = self
            .collections
            .get(collection)
            .ok_or_else(|| StoreError::NotFound(format!("Document {} not found", id)))?;
        let mut record = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(format!("Document {} not found", id)))?;

        if let Some(name) = fields.name {
            record.name = name;
        }
        if let Some(users) = fields.users {
            record.users = users;
        }
        record.updated_at = Utc::now();

        Ok(record.clone())
    }

    async fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        self.collections
            .get(collection)
            .and_then(|docs| docs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Document {} not found", id)))
    }
}

/// Blob store keeping object bytes in memory, one map per bucket.
#[derive(Default)]
pub struct MemoryBlobStore {
    buckets: DashMap<String, DashMap<String, Blob>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blob_count(&self, bucket: &str) -> usize {
        self.buckets.get(bucket).map(|b| b.len()).unwrap_or(0)
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put_blob(&self, bucket: &str, data: Bytes, name: &str) -> StoreResult<BlobRef> {
        let id = Uuid::new_v4().simple().to_string();
        let content_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .to_string();
        let blob_ref = BlobRef {
            id: id.clone(),
            name: name.to_string(),
            size: data.len() as u64,
        };

        self.buckets
            .entry(bucket.to_string())
            .or_insert_with(DashMap::new)
            .insert(
                id.clone(),
                Blob {
                    id,
                    name: name.to_string(),
                    content_type,
                    data,
                },
            );

        Ok(blob_ref)
    }

    async fn get_blob(&self, bucket: &str, id: &str) -> StoreResult<Blob> {
        self.buckets
            .get(bucket)
            .and_then(|blobs| blobs.get(id).map(|b| b.clone()))
            .ok_or_else(|| StoreError::NotFound(format!("Blob {} not found", id)))
    }

    async fn delete_blob(&self, bucket: &str, id: &str) -> StoreResult<()> {
        self.buckets
            .get(bucket)
            .and_then(|blobs| blobs.remove(id))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Blob {} not found", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::file::FileType;

    fn new_record(name: &str, owner: &str, size: u64) -> NewFileRecord {
        NewFileRecord {
            name: name.to_string(),
            extension: "txt".into(),
            file_type: FileType::Document,
            url: String::new(),
            size,
            owner: owner.to_string(),
            account_id: "acct".into(),
            users: Vec::new(),
            bucket_file_id: format!("blob-{name}"),
        }
    }

    #[tokio::test]
    async fn unknown_attribute_is_rejected() {
        let store = MemoryDocumentStore::new();
        let err = store
            .list_documents(
                "files",
                &[Clause::Order {
                    field: "colour".into(),
                    direction: SortDirection::Asc,
                }],
            )
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownAttribute("colour".into()));
    }

    #[tokio::test]
    async fn sorts_and_limits() {
        let store = MemoryDocumentStore::new();
        for (i, size) in [30u64, 10, 20].into_iter().enumerate() {
            store
                .create_document("files", &i.to_string(), new_record(&format!("f{i}"), "u1", size))
                .await
                .unwrap();
        }

        let clauses = [
            Clause::Limit { count: 2 },
            Clause::Order {
                field: "size".into(),
                direction: SortDirection::Asc,
            },
        ];
        let sizes: Vec<u64> = store
            .list_documents("files", &clauses)
            .await
            .unwrap()
            .iter()
            .map(|r| r.size)
            .collect();
        assert_eq!(sizes, vec![10, 20]);
    }

    #[tokio::test]
    async fn or_matches_either_branch() {
        let store = MemoryDocumentStore::new();
        store
            .create_document("files", "a", new_record("a", "u1", 1))
            .await
            .unwrap();
        store
            .create_document("files", "b", new_record("b", "u2", 1))
            .await
            .unwrap();
        store
            .update_document(
                "files",
                "b",
                FileUpdate {
                    users: Some(vec!["me@example.com".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        store
            .create_document("files", "c", new_record("c", "u3", 1))
            .await
            .unwrap();

        let clause = Clause::Or {
            clauses: vec![
                Clause::equal("owner", ["u1"]),
                Clause::contains("users", "me@example.com"),
            ],
        };
        let mut ids: Vec<String> = store
            .list_documents("files", &[clause])
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn blob_round_trip() {
        let store = MemoryBlobStore::new();
        let blob = store
            .put_blob("bucket", Bytes::from_static(b"hello"), "hello.txt")
            .await
            .unwrap();
        assert_eq!(blob.size, 5);

        let fetched = store.get_blob("bucket", &blob.id).await.unwrap();
        assert_eq!(fetched.content_type, "text/plain");

        store.delete_blob("bucket", &blob.id).await.unwrap();
        assert_eq!(store.blob_count("bucket"), 0);
        assert!(matches!(
            store.delete_blob("bucket", &blob.id).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
