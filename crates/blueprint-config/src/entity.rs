use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
/// Storage binding of one model.
pub struct EntityConfig {
    /// Storage table. Defaults to the model name.
    pub table: Option<String>,
    /// Field holding the identity of a row. Default: `id`.
    pub primary_key: String,
    /// Field name to column name, for fields stored under another name
    pub columns: BTreeMap<String, String>,
    /// Relations to other entities, keyed by field name
    pub relations: BTreeMap<String, RelationConfig>,
    /// Relation fields resolved from storage when no resolver is registered
    pub auto_resolve: AutoResolve,
    /// Generate CRUD root fields for this model
    pub crud: bool,
}

impl Default for EntityConfig {
    fn default() -> Self {
        Self {
            table: None,
            primary_key: String::from("id"),
            columns: BTreeMap::new(),
            relations: BTreeMap::new(),
            auto_resolve: AutoResolve::default(),
            crud: false,
        }
    }
}

impl EntityConfig {
    pub fn table_name<'a>(&'a self, model: &'a str) -> &'a str {
        self.table.as_deref().unwrap_or(model)
    }

    pub fn column<'a>(&'a self, field: &'a str) -> &'a str {
        self.columns.get(field).map_or(field, String::as_str)
    }

    pub fn relation(&self, field: &str) -> Option<&RelationConfig> {
        self.relations.get(field)
    }
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelationConfig {
    /// Model on the other side
    pub target: String,
    pub kind: RelationKind,
    /// Column of the owning side holding the id of the target
    #[serde(default)]
    pub join_column: Option<String>,
    /// Column of the target side holding the id of the owner
    #[serde(default)]
    pub inverse_column: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Deserialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RelationKind {
    OneToOne,
    ManyToOne,
    OneToMany,
    ManyToMany,
}

impl RelationKind {
    /// Whether the relation yields a list of targets per owner.
    pub fn is_many(self) -> bool {
        matches!(self, RelationKind::OneToMany | RelationKind::ManyToMany)
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
#[serde(expecting = "expecting string \"all\", string \"none\", or an array of field names")]
pub enum AutoResolve {
    All,
    #[default]
    None,
    #[serde(untagged)]
    Fields(Vec<String>),
}

impl AutoResolve {
    pub fn includes(&self, field: &str) -> bool {
        match self {
            AutoResolve::All => true,
            AutoResolve::None => false,
            AutoResolve::Fields(fields) => fields.iter().any(|name| name == field),
        }
    }
}
