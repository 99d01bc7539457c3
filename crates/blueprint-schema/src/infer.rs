use indexmap::IndexMap;

use crate::{
    AppSchema, Blueprint, FieldSelection, InferredShape, Node, OperationKind, SchemaError, SelectSet, Selection, Shape,
    ShapeObject,
};

/// Infers the shape of the data `node` produces for the selection `select`.
///
/// Without selection an object is the projection of its stored value: every declared field
/// is kept but may be missing, and models are emitted as named shapes, which keeps cyclic
/// models finite. With a selection, an object has exactly the selected keys.
pub fn infer(schema: &AppSchema, node: &Node, select: Option<&SelectSet>) -> Result<InferredShape, SchemaError> {
    let mut inference = Inference {
        schema,
        named: IndexMap::new(),
    };
    let root = inference.infer(node, select)?;

    Ok(InferredShape {
        root,
        named: inference.named,
    })
}

/// Infers the shape of `data[name]` for a root query or mutation. Aliases on the root
/// selection produce an object keyed by alias.
pub fn infer_operation(
    schema: &AppSchema,
    kind: OperationKind,
    name: &str,
    selection: &Selection,
) -> Result<InferredShape, SchemaError> {
    let node = schema.root(kind).get(name).ok_or_else(|| SchemaError::UnknownRootField {
        kind,
        name: name.to_owned(),
    })?;

    let mut inference = Inference {
        schema,
        named: IndexMap::new(),
    };

    let root = if selection.has_aliases() {
        let mut fields = IndexMap::with_capacity(selection.aliases.len());
        for (alias, aliased) in &selection.aliases {
            fields.insert(alias.clone(), inference.infer(node, aliased.select.as_ref())?);
        }
        Shape::Object(ShapeObject { fields })
    } else {
        inference.infer(node, selection.select.as_ref())?
    };

    Ok(InferredShape {
        root,
        named: inference.named,
    })
}

struct Inference<'a> {
    schema: &'a AppSchema,
    named: IndexMap<String, ShapeObject>,
}

impl Inference<'_> {
    fn infer(&mut self, node: &Node, select: Option<&SelectSet>) -> Result<Shape, SchemaError> {
        let shape = match node {
            Node::Primitive(primitive) => Shape::Scalar(*primitive),
            Node::Optional(inner) => Shape::Optional(Box::new(self.infer(inner, select)?)),
            Node::Nullable(inner) => Shape::Nullable(Box::new(self.infer(inner, select)?)),
            Node::Array(inner) | Node::InputArray(inner) => Shape::List(Box::new(self.infer(inner, select)?)),
            Node::Args(args) => self.infer(&args.value, select)?,
            Node::Blueprint(blueprint) => self.object(None, blueprint, select)?,
            Node::Model(model) => self.object(Some(model.name()), model.blueprint(), select)?,
            Node::ModelReference(reference) => {
                let model = self.schema.resolve_model(reference)?;
                self.object(Some(model.name()), model.blueprint(), select)?
            }
            // Inputs only travel as arguments, they are never selected.
            Node::Input(input) => self.object(Some(input.name()), input.blueprint(), None)?,
            Node::InputReference(reference) => {
                let input = self.schema.resolve_input(reference)?;
                self.object(Some(input.name()), input.blueprint(), None)?
            }
            Node::Selection(selection) => self.infer(&selection.model, Some(select.unwrap_or(&selection.select)))?,
        };

        Ok(shape)
    }

    fn object(
        &mut self,
        name: Option<&str>,
        blueprint: &Blueprint,
        select: Option<&SelectSet>,
    ) -> Result<Shape, SchemaError> {
        match (select, name) {
            (Some(select), _) => Ok(Shape::Object(self.selected_fields(name, blueprint, select)?)),
            (None, Some(name)) => {
                if !self.named.contains_key(name) {
                    // Reserve the slot first so a model reaching itself stops here.
                    self.named.insert(name.to_owned(), ShapeObject::default());
                    let object = self.all_fields(blueprint)?;
                    self.named.insert(name.to_owned(), object);
                }
                Ok(Shape::Named(name.to_owned()))
            }
            (None, None) => Ok(Shape::Object(self.all_fields(blueprint)?)),
        }
    }

    fn all_fields(&mut self, blueprint: &Blueprint) -> Result<ShapeObject, SchemaError> {
        let mut fields = IndexMap::with_capacity(blueprint.len());
        for (key, node) in blueprint.iter() {
            fields.insert(key.to_owned(), self.infer(node, None)?.into_optional());
        }
        Ok(ShapeObject { fields })
    }

    fn selected_fields(
        &mut self,
        name: Option<&str>,
        blueprint: &Blueprint,
        select: &SelectSet,
    ) -> Result<ShapeObject, SchemaError> {
        let mut fields = IndexMap::with_capacity(select.len());

        for (key, selection) in select {
            let node = blueprint.get(key).ok_or_else(|| SchemaError::UnknownField {
                type_name: name.unwrap_or("<anonymous>").to_owned(),
                field: key.clone(),
            })?;

            match selection {
                FieldSelection::Include(false) => {}
                FieldSelection::Include(true) => {
                    fields.insert(key.clone(), self.infer(node, None)?);
                }
                FieldSelection::Object(object) if object.has_aliases() => {
                    for (alias, aliased) in &object.aliases {
                        fields.insert(alias.clone(), self.infer(node, aliased.select.as_ref())?);
                    }
                }
                FieldSelection::Object(object) => {
                    fields.insert(key.clone(), self.infer(node, object.select.as_ref())?);
                }
            }
        }

        Ok(ShapeObject { fields })
    }
}
