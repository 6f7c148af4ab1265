//! Turns a caller's filter, sort and pagination intent into the ordered
//! clause list a [`DocumentStore`](crate::stores::DocumentStore) executes.
//!
//! Every list of files starts with [`visibility_clause`]: it is the only
//! access-control boundary for reads.

use crate::models::file::{FileType, ListFilesQuery, ParseFileTypeError};
use crate::models::query::{Clause, SortSpec};
use crate::models::user::Principal;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQuery {
    /// Empty means every type.
    pub types: Vec<FileType>,
    /// `None` and `Some("")` both mean no name filter.
    pub search_text: Option<String>,
    pub sort: SortSpec,
    pub limit: Option<usize>,
}

impl FileQuery {
    pub fn from_params(params: &ListFilesQuery) -> Result<Self, ParseFileTypeError> {
        let types = params
            .types
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::parse::<FileType>)
            .collect::<Result<Vec<FileType>, _>>()?;

        Ok(Self {
            types,
            search_text: params.search.clone(),
            sort: SortSpec::parse(params.sort.as_deref().unwrap_or("")),
            limit: params.limit,
        })
    }
}

/// Records the principal owns, or that were shared with their email.
pub fn visibility_clause(principal: &Principal) -> Clause {
    Clause::Or {
        clauses: vec![
            Clause::equal("owner", [principal.id.as_str()]),
            Clause::contains("users", principal.email.as_str()),
        ],
    }
}

pub fn build_file_query(principal: &Principal, query: &FileQuery) -> Vec<Clause> {
    let mut clauses = vec![visibility_clause(principal)];

    if !query.types.is_empty() {
        clauses.push(Clause::equal("type", query.types.iter().map(FileType::as_str)));
    }
    if let Some(text) = query.search_text.as_deref().filter(|t| !t.is_empty()) {
        clauses.push(Clause::contains("name", text));
    }
    if let Some(limit) = query.limit.filter(|l| *l > 0) {
        clauses.push(Clause::Limit { count: limit });
    }
    clauses.push(query.sort.clone().into_clause());

    clauses
}

/// Records counted against the principal's quota. Shared files are not.
pub fn owned_files_query(principal: &Principal) -> Vec<Clause> {
    vec![Clause::equal("owner", [principal.id.as_str()])]
}

/// The visible record pointing at `blob_id`, if any.
pub fn blob_lookup_query(principal: &Principal, blob_id: &str) -> Vec<Clause> {
    vec![
        visibility_clause(principal),
        Clause::equal("bucket_file_id", [blob_id]),
        Clause::Limit { count: 1 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::query::SortDirection;

    fn principal() -> Principal {
        Principal {
            id: "user-1".into(),
            email: "ada@example.com".into(),
            account_id: "acct-1".into(),
        }
    }

    #[test]
    fn bare_query_is_visibility_then_default_sort() {
        let clauses = build_file_query(&principal(), &FileQuery::default());
        assert_eq!(
            clauses,
            vec![
                visibility_clause(&principal()),
                Clause::Order {
                    field: "created_at".into(),
                    direction: SortDirection::Desc
                },
            ]
        );
    }

    #[test]
    fn clauses_follow_fixed_order() {
        let query = FileQuery {
            types: vec![FileType::Image, FileType::Video],
            search_text: Some("cat".into()),
            sort: SortSpec::parse("name-asc"),
            limit: Some(10),
        };
        let clauses = build_file_query(&principal(), &query);

        assert_eq!(
            clauses,
            vec![
                visibility_clause(&principal()),
                Clause::equal("type", ["image", "video"]),
                Clause::contains("name", "cat"),
                Clause::Limit { count: 10 },
                Clause::Order {
                    field: "name".into(),
                    direction: SortDirection::Asc
                },
            ]
        );
    }

    #[test]
    fn empty_search_adds_no_name_clause() {
        for search_text in [None, Some(String::new())] {
            let query = FileQuery {
                search_text,
                ..Default::default()
            };
            let clauses = build_file_query(&principal(), &query);
            assert!(!clauses
                .iter()
                .any(|c| matches!(c, Clause::Contains { field, .. } if field == "name")));
        }
    }

    #[test]
    fn zero_limit_is_ignored() {
        let query = FileQuery {
            limit: Some(0),
            ..Default::default()
        };
        let clauses = build_file_query(&principal(), &query);
        assert!(!clauses.iter().any(|c| matches!(c, Clause::Limit { .. })));
    }

    #[test]
    fn visibility_names_owner_and_email() {
        let Clause::Or { clauses } = visibility_clause(&principal()) else {
            panic!("expected or()");
        };
        assert_eq!(clauses[0], Clause::equal("owner", ["user-1"]));
        assert_eq!(clauses[1], Clause::contains("users", "ada@example.com"));
    }

    #[test]
    fn params_parse_types_and_sort() {
        let params = ListFilesQuery {
            types: Some("image, video,".into()),
            search: None,
            sort: Some("size-asc".into()),
            limit: None,
        };
        let query = FileQuery::from_params(&params).unwrap();
        assert_eq!(query.types, vec![FileType::Image, FileType::Video]);
        assert_eq!(query.sort.direction, SortDirection::Asc);

        let bad = ListFilesQuery {
            types: Some("image,spreadsheet".into()),
            search: None,
            sort: None,
            limit: None,
        };
        assert!(FileQuery::from_params(&bad).is_err());
    }
}
