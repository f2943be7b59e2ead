//! Operation specifications attached to a dialog.

use super::DialogError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// QUERY TYPE
// =============================================================================

/// Operation kind of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum QueryType {
    Create,
    ReadList,
    AggregatedReadList,
    ReadByKey,
    UpdateByKey,
    Delete,
    DeleteByKey,
    Procedure,
    TableFunction,
    ScalarFunction,
}

impl QueryType {
    /// Every operation kind, in declaration order.
    pub const ALL: [Self; 10] = [
        Self::Create,
        Self::ReadList,
        Self::AggregatedReadList,
        Self::ReadByKey,
        Self::UpdateByKey,
        Self::Delete,
        Self::DeleteByKey,
        Self::Procedure,
        Self::TableFunction,
        Self::ScalarFunction,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::ReadList => "ReadList",
            Self::AggregatedReadList => "AggregatedReadList",
            Self::ReadByKey => "ReadByKey",
            Self::UpdateByKey => "UpdateByKey",
            Self::Delete => "Delete",
            Self::DeleteByKey => "DeleteByKey",
            Self::Procedure => "Procedure",
            Self::TableFunction => "TableFunction",
            Self::ScalarFunction => "ScalarFunction",
        }
    }

    /// Name given to the query when it is generated with the standard set.
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Procedure => "Exec",
            Self::TableFunction => "Select",
            Self::ScalarFunction => "Calculate",
            other => other.as_str(),
        }
    }

    /// Types that can be added on demand to an existing dialog.
    #[must_use]
    pub const fn is_creatable(self) -> bool {
        matches!(
            self,
            Self::Create
                | Self::ReadList
                | Self::AggregatedReadList
                | Self::ReadByKey
                | Self::UpdateByKey
        )
    }

    /// Keyed operations carry a WHERE on the primary key.
    #[must_use]
    pub const fn is_keyed(self) -> bool {
        matches!(self, Self::ReadByKey | Self::UpdateByKey | Self::DeleteByKey)
    }

    /// Parse an operation keyword (case-insensitive), reporting `site` on failure.
    pub fn parse(keyword: &str, site: &str) -> Result<Self, DialogError> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(keyword))
            .ok_or_else(|| DialogError::UnsupportedQueryType {
                query_type: keyword.to_string(),
                site: site.to_string(),
            })
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryType {
    type Err = DialogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, "QueryType::from_str")
    }
}

// =============================================================================
// PARAMETERS
// =============================================================================

/// Server-side computed value of a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueExpression {
    /// Current timestamp.
    Now,
    /// A value from the caller's context (e.g. the acting user id).
    Context { key: String },
    /// A thumbnail resized from another image column.
    Resize { source: String, size: u32 },
}

impl fmt::Display for ValueExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Now => f.write_str("#Now"),
            Self::Context { key } => write!(f, "#Context:{}", key),
            Self::Resize { source, size } => write!(f, "#Resize:{},{}", source, size),
        }
    }
}

/// A query or routine parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub db_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default = "default_true")]
    pub allow_null: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_expression: Option<ValueExpression>,
}

fn default_true() -> bool {
    true
}

impl Param {
    #[must_use]
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.into(),
            size: None,
            allow_null: true,
            value_expression: None,
        }
    }

    #[must_use]
    pub fn with_expression(mut self, expression: ValueExpression) -> Self {
        self.value_expression = Some(expression);
        self
    }
}

// =============================================================================
// COLUMNS, WHERE, AGGREGATIONS
// =============================================================================

/// Projection of a foreign-key target's display columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefTo {
    pub target_table: String,
    pub target_column: String,
    pub columns: Vec<QueryColumn>,
}

/// A column selected or written by a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryColumn {
    pub name: String,
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_to: Option<RefTo>,
}

impl QueryColumn {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            ref_to: None,
        }
    }

    #[must_use]
    pub fn aliased(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            alias: Some(alias.into()),
            ..Self::new(name)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOperator {
    Equal,
}

/// `column <operator> param`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparePhrase {
    pub column: String,
    pub operator: CompareOperator,
    pub param: String,
}

/// Conjunction of simple comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Where {
    pub simple_clauses: Vec<ComparePhrase>,
}

impl Where {
    /// `Object.Pk = @Pk`.
    #[must_use]
    pub fn by_key(object: &str, primary_key: &str) -> Self {
        Self {
            simple_clauses: vec![ComparePhrase {
                column: format!("{}.{}", object, primary_key),
                operator: CompareOperator::Equal,
                param: format!("@{}", primary_key),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregation {
    pub name: String,
    pub phrase: String,
}

// =============================================================================
// QUERY
// =============================================================================

/// One named operation specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub name: String,
    pub query_type: QueryType,
    #[serde(default)]
    pub columns: Vec<QueryColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<Where>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregations: Option<Vec<Aggregation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination_max_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_table: Option<String>,
}

impl Query {
    #[must_use]
    pub fn new(name: impl Into<String>, query_type: QueryType) -> Self {
        Self {
            name: name.into(),
            query_type,
            columns: Vec::new(),
            params: Vec::new(),
            where_clause: None,
            relations: None,
            aggregations: None,
            pagination_max_size: None,
            log_table: None,
        }
    }

    /// Names of the selected/written columns, in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Case-insensitive column membership.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Remove a column and any parameter bound to it. Returns whether anything was removed.
    pub fn remove_column(&mut self, name: &str) -> bool {
        let before = self.columns.len() + self.params.len();
        self.columns.retain(|c| !c.name.eq_ignore_ascii_case(name));
        self.params.retain(|p| !p.name.eq_ignore_ascii_case(name));
        before != self.columns.len() + self.params.len()
    }

    /// Parameter carrying the given computed value kind, if any.
    #[must_use]
    pub fn param_with(&self, matches: impl Fn(&ValueExpression) -> bool) -> Option<&Param> {
        self.params
            .iter()
            .find(|p| p.value_expression.as_ref().is_some_and(&matches))
    }
}

// =============================================================================
// TESTS
// =============================================================================
