use serde::Serialize;

pub const DEFAULT_SORT_FIELD: &str = "created_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One directive passed to a document store's list operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Clause {
    /// Attribute equals any of `values`.
    Equal { field: String, values: Vec<String> },
    /// Text attribute contains `value` as a substring, or list attribute
    /// contains `value` as an element.
    Contains { field: String, value: String },
    Or { clauses: Vec<Clause> },
    Limit { count: usize },
    Order { field: String, direction: SortDirection },
}

impl Clause {
    pub fn equal<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Clause::Equal {
            field: field.to_string(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(field: &str, value: impl Into<String>) -> Self {
        Clause::Contains {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn is_predicate(&self) -> bool {
        matches!(
            self,
            Clause::Equal { .. } | Clause::Contains { .. } | Clause::Or { .. }
        )
    }
}

/// Parsed `"<field>-<asc|desc>"` sort specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: DEFAULT_SORT_FIELD.to_string(),
            direction: SortDirection::Desc,
        }
    }
}

impl SortSpec {
    /// Splits on the last `-`. Only a literal `asc` suffix sorts ascending;
    /// every other suffix, or none at all, sorts descending. The field name
    /// is passed through unchecked.
    pub fn parse(spec: &str) -> Self {
        if spec.is_empty() {
            return Self::default();
        }
        match spec.rsplit_once('-') {
            Some((field, "asc")) => Self {
                field: field.to_string(),
                direction: SortDirection::Asc,
            },
            Some((field, _)) => Self {
                field: field.to_string(),
                direction: SortDirection::Desc,
            },
            None => Self {
                field: spec.to_string(),
                direction: SortDirection::Desc,
            },
        }
    }

    pub fn into_clause(self) -> Clause {
        Clause::Order {
            field: self.field,
            direction: self.direction,
        }
    }
}
