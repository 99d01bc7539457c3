mod entity;
mod naming;

use std::{collections::BTreeMap, path::Path};

pub use entity::*;
pub use naming::*;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] toml::de::Error),
    #[error("relation `{model}.{relation}` targets `{target}`, which has no entity binding")]
    UnknownRelationTarget {
        model: String,
        relation: String,
        target: String,
    },
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Configuration of a blueprint engine.
pub struct Config {
    /// Execution settings
    pub engine: EngineConfig,
    /// Names of the generated CRUD root fields and inputs
    pub naming: NamingConfig,
    /// Storage bindings, keyed by model name
    pub entities: BTreeMap<String, EntityConfig>,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Upper bound of keys dispatched in one batch. Unbounded when unset.
    pub max_batch_size: Option<usize>,
    /// Generate CRUD root fields for entities asking for them.
    pub generate_crud: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: None,
            generate_crud: true,
        }
    }
}

impl Config {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&input)
    }

    pub fn entity(&self, model: &str) -> Option<&EntityConfig> {
        self.entities.get(model)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (model, entity) in &self.entities {
            for (relation, config) in &entity.relations {
                if !self.entities.contains_key(&config.target) {
                    return Err(ConfigError::UnknownRelationTarget {
                        model: model.clone(),
                        relation: relation.clone(),
                        target: config.target.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}
