use blueprint_config::RelationKind;
use indexmap::IndexMap;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DatastoreError {
    #[error("no row of `{table}` matches the filter")]
    NotFound { table: String },
    #[error("datastore error: {0}")]
    Backend(String),
}

/// Conditions on columns, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Filter {
    pub conditions: IndexMap<String, Condition>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Eq(Value),
    In(Vec<Value>),
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, column: impl Into<String>, value: Value) -> Self {
        self.conditions.insert(column.into(), Condition::Eq(value));
        self
    }

    #[must_use]
    pub fn any_of(mut self, column: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.insert(column.into(), Condition::In(values));
        self
    }

    /// Whether a row, keyed by column, satisfies every condition.
    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|(column, condition)| {
            let value = row.get(column).unwrap_or(&Value::Null);
            match condition {
                Condition::Eq(expected) => value == expected,
                Condition::In(expected) => expected.contains(value),
            }
        })
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FindOptions {
    pub filter: Filter,
    /// Column and direction, by priority.
    pub order: Vec<(String, OrderDirection)>,
    pub skip: Option<usize>,
    pub take: Option<usize>,
}

/// A relation between two tables, in storage terms.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationQuery {
    pub kind: RelationKind,
    pub owner_table: String,
    pub owner_key: String,
    pub target_table: String,
    pub target_key: String,
    /// Column of the owner holding target ids.
    pub join_column: Option<String>,
    /// Column of the target holding owner ids.
    pub inverse_column: Option<String>,
}

/// Storage behind entity bindings. Rows are JSON objects keyed by column.
#[async_trait::async_trait]
pub trait Datastore: Send + Sync {
    async fn find_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>, DatastoreError>;

    async fn find(&self, table: &str, options: &FindOptions) -> Result<Vec<Value>, DatastoreError>;

    async fn count(&self, table: &str, filter: &Filter) -> Result<u64, DatastoreError>;

    /// Inserts the row, or updates the row with the same primary key. Returns the stored row.
    async fn save(&self, table: &str, primary_key: &str, row: Value) -> Result<Value, DatastoreError>;

    /// Returns how many rows were removed.
    async fn remove(&self, table: &str, filter: &Filter) -> Result<u64, DatastoreError>;

    /// For each owner id, the ids of the related targets, in the order of `owner_ids`.
    async fn load_relation_ids(
        &self,
        relation: &RelationQuery,
        owner_ids: &[Value],
    ) -> Result<Vec<Vec<Value>>, DatastoreError>;
}
