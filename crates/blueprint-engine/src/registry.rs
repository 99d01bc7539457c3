use std::collections::{HashMap, HashSet};

use blueprint_schema::{AppSchema, Blueprint, Node, OperationKind, SchemaError};
use indexmap::IndexMap;

use crate::OutputTypeId;

/// An executable object type.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputType {
    pub name: String,
    /// Set on the `Query` and `Mutation` types.
    pub root: Option<OperationKind>,
    pub fields: IndexMap<String, OutputField>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputField {
    pub name: String,
    /// The declared node, args wrapper included.
    pub node: Node,
    /// Object type of the value, when it is one.
    pub target: Option<OutputTypeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeState {
    Uncreated,
    UnderConstruction(OutputTypeId),
    Cached(OutputTypeId),
}

/// Output types by name.
///
/// Every named type is built once: a type reached again while it is being built
/// resolves to the id already reserved for it, which makes cyclic models terminate.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    pub(crate) types: Vec<OutputType>,
    by_name: HashMap<String, OutputTypeId>,
    under_construction: HashSet<String>,
    build_count: usize,
}

impl TypeRegistry {
    /// Builds the root types and the type of every registered model.
    pub fn build(schema: &AppSchema) -> Result<Self, SchemaError> {
        let mut registry = TypeRegistry::default();

        for kind in [OperationKind::Query, OperationKind::Mutation] {
            let id = registry.take_type(schema, kind.type_name(), schema.root(kind))?;
            registry[id].root = Some(kind);
        }
        for model in schema.models() {
            registry.take_type(schema, model.name(), model.blueprint())?;
        }

        tracing::debug!(types = registry.types.len(), "built the output type registry");

        Ok(registry)
    }

    /// Returns the id of the type named `name`, building it from `blueprint` first if it
    /// does not exist yet.
    pub fn take_type(
        &mut self,
        schema: &AppSchema,
        name: &str,
        blueprint: &Blueprint,
    ) -> Result<OutputTypeId, SchemaError> {
        if let Some(id) = self.by_name.get(name) {
            return Ok(*id);
        }

        let id = OutputTypeId::from(self.types.len());
        self.types.push(OutputType {
            name: name.to_owned(),
            root: None,
            fields: IndexMap::new(),
        });
        self.by_name.insert(name.to_owned(), id);
        self.under_construction.insert(name.to_owned());
        self.build_count += 1;

        let mut fields = IndexMap::with_capacity(blueprint.len());
        for (field_name, node) in blueprint.iter() {
            let target = self.target(schema, name, field_name, node)?;
            fields.insert(
                field_name.to_owned(),
                OutputField {
                    name: field_name.to_owned(),
                    node: node.clone(),
                    target,
                },
            );
        }

        self[id].fields = fields;
        self.under_construction.remove(name);

        Ok(id)
    }

    fn target(
        &mut self,
        schema: &AppSchema,
        parent: &str,
        field: &str,
        node: &Node,
    ) -> Result<Option<OutputTypeId>, SchemaError> {
        let id = match node {
            Node::Primitive(_) | Node::Input(_) | Node::InputReference(_) => return Ok(None),
            Node::Optional(inner) | Node::Nullable(inner) | Node::Array(inner) | Node::InputArray(inner) => {
                return self.target(schema, parent, field, inner);
            }
            Node::Args(args) => return self.target(schema, parent, field, &args.value),
            Node::Selection(selection) => return self.target(schema, parent, field, &selection.model),
            Node::Model(model) => self.take_type(schema, model.name(), model.blueprint())?,
            Node::ModelReference(reference) => {
                let model = schema.resolve_model(reference)?;
                self.take_type(schema, model.name(), model.blueprint())?
            }
            Node::Blueprint(blueprint) => self.take_type(schema, &anonymous_name(parent, field), blueprint)?,
        };

        Ok(Some(id))
    }

    pub fn state(&self, name: &str) -> TypeState {
        match self.by_name.get(name) {
            None => TypeState::Uncreated,
            Some(id) if self.under_construction.contains(name) => TypeState::UnderConstruction(*id),
            Some(id) => TypeState::Cached(*id),
        }
    }

    pub fn get(&self, name: &str) -> Option<OutputTypeId> {
        self.by_name.get(name).copied()
    }

    pub fn root(&self, kind: OperationKind) -> Option<OutputTypeId> {
        self.get(kind.type_name())
    }

    /// How many types were built, every named type counting once.
    pub fn build_count(&self) -> usize {
        self.build_count
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &OutputType> + '_ {
        self.types.iter()
    }
}

/// `Post` + `meta` gives `PostMeta`.
pub(crate) fn anonymous_name(parent: &str, field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("{parent}{}{}", first.to_uppercase(), chars.as_str()),
        None => parent.to_owned(),
    }
}
