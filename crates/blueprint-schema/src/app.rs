use std::{collections::HashSet, sync::Arc};

use indexmap::IndexMap;

use crate::{Blueprint, Input, InputReference, Model, ModelReference, Node, OperationKind, SchemaError};

/// The declared schema of one application: root queries and mutations plus every model
/// and input, registered by name.
#[derive(Debug, Clone, Default)]
pub struct AppSchema {
    queries: Blueprint,
    mutations: Blueprint,
    models: IndexMap<String, Arc<Model>>,
    inputs: IndexMap<String, Arc<Input>>,
}

impl AppSchema {
    pub fn builder() -> AppSchemaBuilder {
        AppSchemaBuilder::default()
    }

    /// Reopens the schema, to add fields before building it again.
    pub fn into_builder(self) -> AppSchemaBuilder {
        AppSchemaBuilder {
            queries: self.queries,
            mutations: self.mutations,
            models: self.models.into_values().collect(),
            inputs: self.inputs.into_values().collect(),
        }
    }

    pub fn queries(&self) -> &Blueprint {
        &self.queries
    }

    pub fn mutations(&self) -> &Blueprint {
        &self.mutations
    }

    pub fn root(&self, kind: OperationKind) -> &Blueprint {
        match kind {
            OperationKind::Query => &self.queries,
            OperationKind::Mutation => &self.mutations,
        }
    }

    pub fn root_field(&self, kind: OperationKind, name: &str) -> Result<&Node, SchemaError> {
        self.root(kind).get(name).ok_or_else(|| SchemaError::UnknownRootField {
            kind,
            name: name.to_owned(),
        })
    }

    pub fn models(&self) -> impl ExactSizeIterator<Item = &Arc<Model>> + '_ {
        self.models.values()
    }

    pub fn inputs(&self) -> impl ExactSizeIterator<Item = &Arc<Input>> + '_ {
        self.inputs.values()
    }

    pub fn model(&self, name: &str) -> Option<&Arc<Model>> {
        self.models.get(name)
    }

    pub fn input(&self, name: &str) -> Option<&Arc<Input>> {
        self.inputs.get(name)
    }

    pub fn resolve_model(&self, reference: &ModelReference) -> Result<&Arc<Model>, SchemaError> {
        self.models
            .get(reference.name())
            .ok_or_else(|| SchemaError::UnresolvedModel(reference.name().to_owned()))
    }

    pub fn resolve_input(&self, reference: &InputReference) -> Result<&Arc<Input>, SchemaError> {
        self.inputs
            .get(reference.name())
            .ok_or_else(|| SchemaError::UnresolvedInput(reference.name().to_owned()))
    }
}

#[derive(Debug, Default)]
pub struct AppSchemaBuilder {
    queries: Blueprint,
    mutations: Blueprint,
    models: Vec<Arc<Model>>,
    inputs: Vec<Arc<Input>>,
}

impl AppSchemaBuilder {
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.queries.insert(name, node);
        self
    }

    #[must_use]
    pub fn mutation(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.mutations.insert(name, node);
        self
    }

    /// Registers a model that is only reached through references.
    #[must_use]
    pub fn model(mut self, model: Arc<Model>) -> Self {
        self.models.push(model);
        self
    }

    #[must_use]
    pub fn input(mut self, input: Arc<Input>) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn root_mut(&mut self, kind: OperationKind) -> &mut Blueprint {
        match kind {
            OperationKind::Query => &mut self.queries,
            OperationKind::Mutation => &mut self.mutations,
        }
    }

    /// Registers every model and input reachable from the declarations, then checks that
    /// names are unambiguous, that every reference resolves and that argument positions
    /// only hold input nodes.
    pub fn build(self) -> Result<AppSchema, SchemaError> {
        let mut schema = AppSchema {
            queries: self.queries,
            mutations: self.mutations,
            models: IndexMap::new(),
            inputs: IndexMap::new(),
        };

        for model in &self.models {
            register_model(&mut schema.models, model)?;
        }
        for input in &self.inputs {
            register_input(&mut schema.inputs, input)?;
        }

        let mut collector = Collector::default();
        for (_, node) in schema.queries.iter().chain(schema.mutations.iter()) {
            collector.visit(node);
        }
        for model in &self.models {
            collector.visit_blueprint(model.blueprint());
        }
        for input in &self.inputs {
            collector.visit_blueprint(input.blueprint());
        }

        for model in &collector.models {
            register_model(&mut schema.models, model)?;
        }
        for input in &collector.inputs {
            register_input(&mut schema.inputs, input)?;
        }

        for name in &collector.model_references {
            if !schema.models.contains_key(name) {
                return Err(SchemaError::UnresolvedModel(name.clone()));
            }
        }
        for name in &collector.input_references {
            if !schema.inputs.contains_key(name) {
                return Err(SchemaError::UnresolvedInput(name.clone()));
            }
        }
        for input in schema.inputs.values() {
            Node::Blueprint(input.blueprint().clone()).is_input_family()?;
        }

        Ok(schema)
    }
}

fn register_model(models: &mut IndexMap<String, Arc<Model>>, model: &Arc<Model>) -> Result<(), SchemaError> {
    match models.get(model.name()) {
        Some(existing) if Arc::ptr_eq(existing, model) || **existing == **model => Ok(()),
        Some(_) => Err(SchemaError::DuplicateModel(model.name().to_owned())),
        None => {
            models.insert(model.name().to_owned(), Arc::clone(model));
            Ok(())
        }
    }
}

fn register_input(inputs: &mut IndexMap<String, Arc<Input>>, input: &Arc<Input>) -> Result<(), SchemaError> {
    match inputs.get(input.name()) {
        Some(existing) if Arc::ptr_eq(existing, input) || **existing == **input => Ok(()),
        Some(_) => Err(SchemaError::DuplicateInput(input.name().to_owned())),
        None => {
            inputs.insert(input.name().to_owned(), Arc::clone(input));
            Ok(())
        }
    }
}

/// Collects embedded models and inputs plus every name referenced, in declaration order.
#[derive(Default)]
struct Collector {
    models: Vec<Arc<Model>>,
    inputs: Vec<Arc<Input>>,
    seen: HashSet<*const ()>,
    model_references: Vec<String>,
    input_references: Vec<String>,
}

impl Collector {
    fn visit_blueprint(&mut self, blueprint: &Blueprint) {
        for (_, node) in blueprint.iter() {
            self.visit(node);
        }
    }

    fn visit(&mut self, node: &Node) {
        match node {
            Node::Primitive(_) => {}
            Node::Blueprint(blueprint) => self.visit_blueprint(blueprint),
            Node::Optional(inner) | Node::Nullable(inner) | Node::Array(inner) | Node::InputArray(inner) => {
                self.visit(inner);
            }
            Node::Args(args) => {
                self.visit(&args.value);
                self.visit(args.args.node());
            }
            Node::Model(model) => {
                if self.seen.insert(Arc::as_ptr(model).cast()) {
                    self.models.push(Arc::clone(model));
                    self.visit_blueprint(model.blueprint());
                }
            }
            Node::Input(input) => {
                if self.seen.insert(Arc::as_ptr(input).cast()) {
                    self.inputs.push(Arc::clone(input));
                    self.visit_blueprint(input.blueprint());
                }
            }
            Node::ModelReference(reference) => self.model_references.push(reference.name().to_owned()),
            Node::InputReference(reference) => self.input_references.push(reference.name().to_owned()),
            Node::Selection(selection) => self.visit(&selection.model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{args, array, input, model, reference, NodeKind, Primitive};

    #[test]
    fn registers_embedded_models_and_inputs() {
        let photo = model("Photo", Blueprint::new().field("id", Primitive::Number));
        let limit = input("Limit", Blueprint::new().field("limit", Primitive::Number));
        let post = model(
            "Post",
            Blueprint::new()
                .field("id", Primitive::Number)
                .field("photos", args(array(&photo), limit)),
        );

        let schema = AppSchema::builder().query("posts", array(&post)).build().unwrap();

        assert_eq!(schema.models().map(|model| model.name()).collect::<Vec<_>>(), ["Post", "Photo"]);
        assert_eq!(schema.inputs().map(|input| input.name()).collect::<Vec<_>>(), ["Limit"]);
    }

    #[test]
    fn unresolved_references_are_rejected() {
        let post = model("Post", Blueprint::new().field("author", reference("User")));
        let error = AppSchema::builder().query("post", post).build().unwrap_err();
        assert_eq!(error, SchemaError::UnresolvedModel("User".to_owned()));
    }

    #[test]
    fn cyclic_references_resolve_through_the_registry() {
        let user = model(
            "User",
            Blueprint::new()
                .field("id", Primitive::Number)
                .field("posts", array(reference("Post"))),
        );
        let post = model("Post", Blueprint::new().field("author", &user));

        let schema = AppSchema::builder().query("post", post).build().unwrap();
        let resolved = schema.resolve_model(&reference("Post")).unwrap();
        assert_eq!(resolved.blueprint().get("author").map(Node::kind), Some(NodeKind::Model));
    }

    #[test]
    fn distinct_models_cannot_share_a_name() {
        let first = model("Post", Blueprint::new().field("id", Primitive::Number));
        let second = model("Post", Blueprint::new().field("id", Primitive::String));

        let error = AppSchema::builder()
            .query("first", first)
            .query("second", second)
            .build()
            .unwrap_err();

        assert_eq!(error, SchemaError::DuplicateModel("Post".to_owned()));
    }

    #[test]
    fn inputs_cannot_hold_output_nodes() {
        let post = model("Post", Blueprint::new());
        let broken = input("PostInput", Blueprint::new().field("post", post));

        let error = AppSchema::builder().input(broken).build().unwrap_err();
        assert_eq!(error, SchemaError::OutputNodeInInputPosition(NodeKind::Model));
    }
}
