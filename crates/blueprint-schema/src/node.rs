use std::sync::Arc;

use crate::{Blueprint, Input, InputReference, Model, ModelReference, Primitive, SchemaError, SelectSet};

/// A node of the schema graph.
///
/// Every declared type is one of these variants. Cross-model edges are either a shared
/// [`Model`] or a by-name [`ModelReference`], so a schema is always a finite tree and
/// cycles only exist through the registry lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Primitive(Primitive),
    Blueprint(Blueprint),
    /// The field may be absent altogether.
    Optional(Box<Node>),
    /// The field is present but its value may be null.
    Nullable(Box<Node>),
    Array(Box<Node>),
    Args(Box<ArgsNode>),
    Model(Arc<Model>),
    ModelReference(ModelReference),
    Input(Arc<Input>),
    InputReference(InputReference),
    InputArray(Box<Node>),
    Selection(Box<SelectionNode>),
}

/// Discriminant of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum NodeKind {
    Primitive,
    Blueprint,
    Optional,
    Nullable,
    Array,
    Args,
    Model,
    ModelReference,
    Input,
    InputReference,
    InputArray,
    Selection,
}

/// A field returning `value` and accepting `args`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgsNode {
    pub value: Node,
    pub args: InputNode,
}

/// A model restricted to a default selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionNode {
    pub model: Node,
    pub select: SelectSet,
}

/// A node allowed in argument position.
///
/// Output-only nodes (models, model references, args wrappers and selections) cannot be
/// turned into an `InputNode`.
#[derive(Debug, Clone, PartialEq)]
pub struct InputNode(Node);

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Primitive(_) => NodeKind::Primitive,
            Node::Optional(_) => NodeKind::Optional,
            Node::Nullable(_) => NodeKind::Nullable,
            Node::Array(_) => NodeKind::Array,
            Node::Args(_) => NodeKind::Args,
            Node::Model(_) => NodeKind::Model,
            Node::ModelReference(_) => NodeKind::ModelReference,
            Node::Input(_) => NodeKind::Input,
            Node::InputReference(_) => NodeKind::InputReference,
            Node::InputArray(_) => NodeKind::InputArray,
            Node::Selection(_) => NodeKind::Selection,
            Node::Blueprint(_) => NodeKind::Blueprint,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.kind() == NodeKind::Primitive
    }

    pub fn is_optional(&self) -> bool {
        self.kind() == NodeKind::Optional
    }

    pub fn is_nullable(&self) -> bool {
        self.kind() == NodeKind::Nullable
    }

    pub fn is_array(&self) -> bool {
        self.kind() == NodeKind::Array
    }

    pub fn is_args(&self) -> bool {
        self.kind() == NodeKind::Args
    }

    pub fn is_model(&self) -> bool {
        self.kind() == NodeKind::Model
    }

    pub fn is_model_reference(&self) -> bool {
        self.kind() == NodeKind::ModelReference
    }

    pub fn is_input(&self) -> bool {
        self.kind() == NodeKind::Input
    }

    pub fn is_input_reference(&self) -> bool {
        self.kind() == NodeKind::InputReference
    }

    pub fn is_input_array(&self) -> bool {
        self.kind() == NodeKind::InputArray
    }

    pub fn is_selection(&self) -> bool {
        self.kind() == NodeKind::Selection
    }

    pub fn is_blueprint(&self) -> bool {
        self.kind() == NodeKind::Blueprint
    }

    /// The accepted arguments, if this is an args wrapper.
    pub fn args(&self) -> Option<&InputNode> {
        match self {
            Node::Args(args) => Some(&args.args),
            _ => None,
        }
    }

    /// Strips the args wrapper, if any.
    pub fn value_node(&self) -> &Node {
        match self {
            Node::Args(args) => &args.value,
            node => node,
        }
    }

    /// Whether the field may be absent or null.
    pub fn accepts_null(&self) -> bool {
        match self {
            Node::Optional(_) | Node::Nullable(_) => true,
            Node::Args(args) => args.value.accepts_null(),
            _ => false,
        }
    }

    /// Name of the model or input this node designates, looking through selections.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Node::Model(model) => Some(model.name()),
            Node::ModelReference(reference) => Some(reference.name()),
            Node::Input(input) => Some(input.name()),
            Node::InputReference(reference) => Some(reference.name()),
            Node::Selection(selection) => selection.model.type_name(),
            _ => None,
        }
    }

    pub(crate) fn is_input_family(&self) -> Result<(), SchemaError> {
        match self {
            Node::Primitive(_) | Node::Input(_) | Node::InputReference(_) => Ok(()),
            Node::Optional(inner) | Node::Nullable(inner) | Node::Array(inner) | Node::InputArray(inner) => {
                inner.is_input_family()
            }
            Node::Blueprint(blueprint) => blueprint.iter().try_for_each(|(_, node)| node.is_input_family()),
            Node::Args(_) | Node::Model(_) | Node::ModelReference(_) | Node::Selection(_) => {
                Err(SchemaError::OutputNodeInInputPosition(self.kind()))
            }
        }
    }
}

impl InputNode {
    pub fn node(&self) -> &Node {
        &self.0
    }

    pub fn into_node(self) -> Node {
        self.0
    }

    /// An anonymous argument object.
    pub fn blueprint(blueprint: Blueprint) -> Result<Self, SchemaError> {
        Self::try_from(Node::Blueprint(blueprint))
    }

    #[must_use]
    pub fn optional(self) -> Self {
        InputNode(Node::Optional(Box::new(self.0)))
    }

    #[must_use]
    pub fn nullable(self) -> Self {
        InputNode(Node::Nullable(Box::new(self.0)))
    }
}

impl TryFrom<Node> for InputNode {
    type Error = SchemaError;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        node.is_input_family()?;
        Ok(InputNode(node))
    }
}

impl From<Primitive> for InputNode {
    fn from(primitive: Primitive) -> Self {
        InputNode(Node::Primitive(primitive))
    }
}

impl From<Arc<Input>> for InputNode {
    fn from(input: Arc<Input>) -> Self {
        InputNode(Node::Input(input))
    }
}

impl From<InputReference> for InputNode {
    fn from(reference: InputReference) -> Self {
        InputNode(Node::InputReference(reference))
    }
}

impl From<InputNode> for Node {
    fn from(input: InputNode) -> Self {
        input.0
    }
}

impl From<Primitive> for Node {
    fn from(primitive: Primitive) -> Self {
        Node::Primitive(primitive)
    }
}

impl From<Blueprint> for Node {
    fn from(blueprint: Blueprint) -> Self {
        Node::Blueprint(blueprint)
    }
}

impl From<Arc<Model>> for Node {
    fn from(model: Arc<Model>) -> Self {
        Node::Model(model)
    }
}

impl From<&Arc<Model>> for Node {
    fn from(model: &Arc<Model>) -> Self {
        Node::Model(Arc::clone(model))
    }
}

impl From<ModelReference> for Node {
    fn from(reference: ModelReference) -> Self {
        Node::ModelReference(reference)
    }
}

impl From<Arc<Input>> for Node {
    fn from(input: Arc<Input>) -> Self {
        Node::Input(input)
    }
}

impl From<InputReference> for Node {
    fn from(reference: InputReference) -> Self {
        Node::InputReference(reference)
    }
}

pub fn optional(node: impl Into<Node>) -> Node {
    Node::Optional(Box::new(node.into()))
}

pub fn nullable(node: impl Into<Node>) -> Node {
    Node::Nullable(Box::new(node.into()))
}

pub fn array(node: impl Into<Node>) -> Node {
    Node::Array(Box::new(node.into()))
}

pub fn args(value: impl Into<Node>, args: impl Into<InputNode>) -> Node {
    Node::Args(Box::new(ArgsNode {
        value: value.into(),
        args: args.into(),
    }))
}

pub fn model(name: impl Into<String>, blueprint: Blueprint) -> Arc<Model> {
    Arc::new(Model::new(name, blueprint))
}

pub fn reference(name: impl Into<String>) -> ModelReference {
    ModelReference::new(name)
}

pub fn input(name: impl Into<String>, blueprint: Blueprint) -> Arc<Input> {
    Arc::new(Input::new(name, blueprint))
}

pub fn input_reference(name: impl Into<String>) -> InputReference {
    InputReference::new(name)
}

pub fn input_array(node: impl Into<InputNode>) -> InputNode {
    InputNode(Node::InputArray(Box::new(node.into().0)))
}

pub fn selection(model: impl Into<Node>, select: SelectSet) -> Node {
    Node::Selection(Box::new(SelectionNode {
        model: model.into(),
        select,
    }))
}
