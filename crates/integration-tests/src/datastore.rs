use std::{
    cmp::Ordering,
    collections::BTreeMap,
    sync::{Mutex, PoisonError},
};

use blueprint_engine::{Datastore, DatastoreError, Filter, FindOptions, OrderDirection, RelationQuery};
use serde_json::Value;

/// Tables of JSON rows kept in memory. Every call is recorded, see [`MemoryDatastore::calls`].
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    tables: Mutex<BTreeMap<String, Vec<Value>>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_rows(self, table: &str, rows: impl IntoIterator<Item = Value>) -> Self {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(table.to_owned())
            .or_default()
            .extend(rows);
        self
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }

    fn table(&self, table: &str) -> Vec<Value> {
        self.rows(table)
    }
}

#[async_trait::async_trait]
impl Datastore for MemoryDatastore {
    async fn find_one(&self, table: &str, filter: &Filter) -> Result<Option<Value>, DatastoreError> {
        self.record(format!("find_one {table}"));
        Ok(self.table(table).into_iter().find(|row| filter.matches(row)))
    }

    async fn find(&self, table: &str, options: &FindOptions) -> Result<Vec<Value>, DatastoreError> {
        self.record(format!("find {table}"));

        let mut rows = self
            .table(table)
            .into_iter()
            .filter(|row| options.filter.matches(row))
            .collect::<Vec<_>>();

        rows.sort_by(|left, right| {
            options
                .order
                .iter()
                .map(|(column, direction)| {
                    let ordering = compare(&left[column.as_str()], &right[column.as_str()]);
                    match direction {
                        OrderDirection::Asc => ordering,
                        OrderDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        Ok(rows
            .into_iter()
            .skip(options.skip.unwrap_or_default())
            .take(options.take.unwrap_or(usize::MAX))
            .collect())
    }

    async fn count(&self, table: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        self.record(format!("count {table}"));
        Ok(self.table(table).iter().filter(|row| filter.matches(row)).count() as u64)
    }

    async fn save(&self, table: &str, primary_key: &str, row: Value) -> Result<Value, DatastoreError> {
        self.record(format!("save {table}"));

        let Value::Object(mut fields) = row else {
            return Err(DatastoreError::Backend(format!("rows of `{table}` must be objects")));
        };

        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.entry(table.to_owned()).or_default();

        let id = fields.get(primary_key).filter(|id| !id.is_null()).cloned();
        if let Some(existing) = id
            .as_ref()
            .and_then(|id| rows.iter_mut().find(|row| row.get(primary_key) == Some(id)))
        {
            if let Value::Object(existing) = existing {
                existing.extend(fields);
            }
            return Ok(existing.clone());
        }

        if id.is_none() {
            let next = rows
                .iter()
                .filter_map(|row| row.get(primary_key).and_then(Value::as_i64))
                .max()
                .unwrap_or_default()
                + 1;
            fields.insert(primary_key.to_owned(), Value::from(next));
        }

        let row = Value::Object(fields);
        rows.push(row.clone());
        Ok(row)
    }

    async fn remove(&self, table: &str, filter: &Filter) -> Result<u64, DatastoreError> {
        self.record(format!("remove {table}"));

        let mut tables = self.tables.lock().unwrap_or_else(PoisonError::into_inner);
        let rows = tables.entry(table.to_owned()).or_default();
        let before = rows.len();
        rows.retain(|row| !filter.matches(row));

        Ok((before - rows.len()) as u64)
    }

    async fn load_relation_ids(
        &self,
        relation: &RelationQuery,
        owner_ids: &[Value],
    ) -> Result<Vec<Vec<Value>>, DatastoreError> {
        self.record(format!(
            "load_relation_ids {}->{} x{}",
            relation.owner_table,
            relation.target_table,
            owner_ids.len()
        ));

        let owners = self.table(&relation.owner_table);
        let targets = self.table(&relation.target_table);

        let ids = owner_ids
            .iter()
            .map(|owner_id| {
                if let Some(column) = &relation.join_column {
                    let owner = owners
                        .iter()
                        .find(|row| row.get(&relation.owner_key) == Some(owner_id));
                    return match owner.and_then(|row| row.get(column)) {
                        Some(Value::Array(ids)) => ids.clone(),
                        Some(Value::Null) | None => Vec::new(),
                        Some(id) => vec![id.clone()],
                    };
                }

                let Some(column) = &relation.inverse_column else {
                    return Vec::new();
                };
                targets
                    .iter()
                    .filter(|row| match row.get(column) {
                        Some(Value::Array(ids)) => ids.contains(owner_id),
                        Some(id) => id == owner_id,
                        None => false,
                    })
                    .filter_map(|row| row.get(&relation.target_key).cloned())
                    .collect()
            })
            .collect();

        Ok(ids)
    }
}

fn compare(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(left), Value::String(right)) => left.cmp(right),
        (Value::Bool(left), Value::Bool(right)) => left.cmp(right),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
