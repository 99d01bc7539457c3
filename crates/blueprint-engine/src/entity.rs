use std::sync::{Arc, OnceLock};

use blueprint_config::{EntityConfig, RelationConfig};
use serde_json::{Map, Value};

use crate::{Datastore, DatastoreError, Filter, FindOptions, OrderDirection, RelationQuery};

/// A model bound to a storage table.
///
/// The repository is materialised on first use and reused afterwards.
pub struct EntityBinding {
    model: String,
    config: EntityConfig,
    repository: OnceLock<Repository>,
}

impl EntityBinding {
    pub fn new(model: impl Into<String>, config: EntityConfig) -> Self {
        EntityBinding {
            model: model.into(),
            config,
            repository: OnceLock::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn config(&self) -> &EntityConfig {
        &self.config
    }

    pub fn table(&self) -> &str {
        self.config.table_name(&self.model)
    }

    /// Field holding the identity of an entity.
    pub fn primary_key(&self) -> &str {
        &self.config.primary_key
    }

    pub fn repository(&self, datastore: &Arc<dyn Datastore>) -> &Repository {
        self.repository.get_or_init(|| {
            tracing::debug!(model = self.model.as_str(), table = self.table(), "materialising repository");
            Repository {
                datastore: Arc::clone(datastore),
                table: self.table().to_owned(),
                config: self.config.clone(),
            }
        })
    }

    pub fn is_materialised(&self) -> bool {
        self.repository.get().is_some()
    }

    /// The relation behind `field`, when it is resolved from storage automatically.
    pub fn auto_relation(&self, field: &str) -> Option<&RelationConfig> {
        self.config
            .relation(field)
            .filter(|_| self.config.auto_resolve.includes(field))
    }

    pub fn relation_query(&self, field: &str, target: &EntityBinding) -> Option<RelationQuery> {
        let relation = self.config.relation(field)?;
        Some(RelationQuery {
            kind: relation.kind,
            owner_table: self.table().to_owned(),
            owner_key: self.config.column(self.primary_key()).to_owned(),
            target_table: target.table().to_owned(),
            target_key: target.config.column(target.primary_key()).to_owned(),
            join_column: relation.join_column.clone(),
            inverse_column: relation.inverse_column.clone(),
        })
    }
}

impl std::fmt::Debug for EntityBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityBinding")
            .field("model", &self.model)
            .field("config", &self.config)
            .field("materialised", &self.is_materialised())
            .finish()
    }
}

/// Storage access for one entity, speaking in field names.
pub struct Repository {
    datastore: Arc<dyn Datastore>,
    table: String,
    config: EntityConfig,
}

impl Repository {
    pub fn datastore(&self) -> &Arc<dyn Datastore> {
        &self.datastore
    }

    pub async fn find_one(&self, by: &Map<String, Value>) -> Result<Option<Value>, DatastoreError> {
        let row = self.datastore.find_one(&self.table, &self.filter(by)).await?;
        Ok(row.map(|row| self.to_fields(row)))
    }

    pub async fn find(
        &self,
        by: &Map<String, Value>,
        order: &[(String, OrderDirection)],
        skip: Option<usize>,
        take: Option<usize>,
    ) -> Result<Vec<Value>, DatastoreError> {
        let options = FindOptions {
            filter: self.filter(by),
            order: order
                .iter()
                .map(|(field, direction)| (self.config.column(field).to_owned(), *direction))
                .collect(),
            skip,
            take,
        };

        let rows = self.datastore.find(&self.table, &options).await?;
        Ok(rows.into_iter().map(|row| self.to_fields(row)).collect())
    }

    pub async fn find_by_ids(&self, ids: Vec<Value>) -> Result<Vec<Value>, DatastoreError> {
        let options = FindOptions {
            filter: Filter::new().any_of(self.config.column(&self.config.primary_key), ids),
            ..FindOptions::default()
        };

        let rows = self.datastore.find(&self.table, &options).await?;
        Ok(rows.into_iter().map(|row| self.to_fields(row)).collect())
    }

    pub async fn count(&self, by: &Map<String, Value>) -> Result<u64, DatastoreError> {
        self.datastore.count(&self.table, &self.filter(by)).await
    }

    pub async fn save(&self, entity: Value) -> Result<Value, DatastoreError> {
        let primary_key = self.config.column(&self.config.primary_key);
        let row = self.datastore.save(&self.table, primary_key, self.to_columns(entity)).await?;
        Ok(self.to_fields(row))
    }

    pub async fn remove(&self, by: &Map<String, Value>) -> Result<u64, DatastoreError> {
        self.datastore.remove(&self.table, &self.filter(by)).await
    }

    fn filter(&self, by: &Map<String, Value>) -> Filter {
        by.iter().fold(Filter::new(), |filter, (field, value)| {
            filter.eq(self.config.column(field), value.clone())
        })
    }

    fn to_columns(&self, entity: Value) -> Value {
        match entity {
            Value::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(field, value)| (self.config.column(&field).to_owned(), value))
                    .collect(),
            ),
            other => other,
        }
    }

    fn to_fields(&self, row: Value) -> Value {
        match row {
            Value::Object(columns) => Value::Object(
                columns
                    .into_iter()
                    .map(|(column, value)| {
                        let field = self
                            .config
                            .columns
                            .iter()
                            .find(|(_, mapped)| **mapped == column)
                            .map_or(column, |(field, _)| field.clone());
                        (field, value)
                    })
                    .collect(),
            ),
            other => other,
        }
    }
}
