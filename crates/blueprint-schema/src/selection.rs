use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::SchemaError;

/// Field name to selection, in the order the caller wrote them.
pub type SelectSet = IndexMap<String, FieldSelection>;

/// What a caller wants back for one field.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FieldSelection {
    /// `true` selects the field as a whole, `false` drops it.
    Include(bool),
    Object(Selection),
}

/// Selection for one query, mutation or nested field: optional arguments, an optional
/// nested selection and optional aliases.
///
/// Aliases surface the same underlying field under several keys, each with its own
/// arguments and sub-selection. When aliases are present, the field itself is only
/// exposed through them.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Selection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<SelectSet>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub aliases: IndexMap<String, Selection>,
}

impl FieldSelection {
    pub fn is_selected(&self) -> bool {
        !matches!(self, FieldSelection::Include(false))
    }
}

impl From<bool> for FieldSelection {
    fn from(include: bool) -> Self {
        FieldSelection::Include(include)
    }
}

impl From<Selection> for FieldSelection {
    fn from(selection: Selection) -> Self {
        FieldSelection::Object(selection)
    }
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the JSON form `{ "args": {..}, "select": {..}, "aliases": {..} }`.
    pub fn from_json(value: Value) -> Result<Self, SchemaError> {
        serde_json::from_value(value).map_err(|err| SchemaError::InvalidSelection(err.to_string()))
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.get_or_insert_with(Map::new).insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_args(mut self, args: Map<String, Value>) -> Self {
        self.args = Some(args);
        self
    }

    /// Selects `name` as a whole.
    #[must_use]
    pub fn field(self, name: impl Into<String>) -> Self {
        self.entry(name, FieldSelection::Include(true))
    }

    #[must_use]
    pub fn fields<I>(self, names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        names.into_iter().fold(self, Selection::field)
    }

    /// Selects `name` with its own arguments and sub-selection.
    #[must_use]
    pub fn nested(self, name: impl Into<String>, selection: Selection) -> Self {
        self.entry(name, FieldSelection::Object(selection))
    }

    /// Exposes field `name` under the key `alias`.
    #[must_use]
    pub fn alias(mut self, name: impl Into<String>, alias: impl Into<String>, selection: Selection) -> Self {
        let select = self.select.get_or_insert_with(IndexMap::new);
        let entry = select
            .entry(name.into())
            .or_insert_with(|| FieldSelection::Object(Selection::default()));

        if let FieldSelection::Include(_) = entry {
            *entry = FieldSelection::Object(Selection::default());
        }
        if let FieldSelection::Object(object) = entry {
            object.aliases.insert(alias.into(), selection);
        }

        self
    }

    #[must_use]
    pub fn entry(mut self, name: impl Into<String>, selection: FieldSelection) -> Self {
        self.select
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), selection);
        self
    }

    pub fn has_aliases(&self) -> bool {
        !self.aliases.is_empty()
    }

    /// Arguments as a JSON object, `None` when the caller passed none.
    pub fn args_value(&self) -> Option<Value> {
        self.args.clone().map(Value::Object)
    }
}
