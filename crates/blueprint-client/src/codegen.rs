//! TypeScript definitions for a blueprint application.
//!
//! [`generate_module`] writes a `Schema` type holding every model and input, a `Stored`
//! helper for objects returned without selection, plus `Queries` and `Mutations` types
//! describing the arguments and result of each root field.
//! [`generate_selection_types`] writes one result type per named selection, from the shape
//! inferred for it.

use std::fmt;

use blueprint_schema::{
    infer_operation, AppSchema, Blueprint, Node, OperationKind, Primitive, Selection, Shape,
};

const INDENT: &str = "  ";
const DOUBLE_INDENT: &str = "    ";

#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error(transparent)]
    Schema(#[from] blueprint_schema::SchemaError),
    #[error("could not write the generated module")]
    Write(#[from] fmt::Error),
}

/// A selection to generate a result type for.
#[derive(Debug, Clone, Copy)]
pub struct NamedSelection<'a> {
    /// Name of the generated type.
    pub name: &'a str,
    pub kind: OperationKind,
    /// The root field the selection is written against.
    pub field: &'a str,
    pub selection: &'a Selection,
}

pub fn generate_module<O>(schema: &AppSchema, out: &mut O) -> fmt::Result
where
    O: fmt::Write,
{
    out.write_str(HEADER)?;
    out.write_str("export type Schema = {\n")?;

    for model in schema.models() {
        maybe_docs(out, model.description(), INDENT)?;
        writeln!(out, "{INDENT}'{}': {{", model.name())?;
        writeln!(out, "{DOUBLE_INDENT}__typename?: '{}';", model.name())?;
        write_fields(out, model.blueprint())?;
        writeln!(out, "{INDENT}}};")?;
    }

    for input in schema.inputs() {
        maybe_docs(out, input.description(), INDENT)?;
        writeln!(out, "{INDENT}'{}': {{", input.name())?;
        write_fields(out, input.blueprint())?;
        writeln!(out, "{INDENT}}};")?;
    }

    out.write_str("};\n")?;
    out.write_str(STORED)?;

    write_root_type(out, "Queries", schema.queries())?;
    write_root_type(out, "Mutations", schema.mutations())
}

/// Writes one `export type` per selection, each describing exactly the data that selection
/// returns.
pub fn generate_selection_types<O>(
    schema: &AppSchema,
    selections: &[NamedSelection<'_>],
    out: &mut O,
) -> Result<(), CodegenError>
where
    O: fmt::Write,
{
    for selection in selections {
        let shape = infer_operation(schema, selection.kind, selection.field, selection.selection)?;
        writeln!(
            out,
            "\nexport type {} = {};",
            selection.name,
            render_shape(&shape.root)
        )?;
    }

    Ok(())
}

fn write_fields<O: fmt::Write>(out: &mut O, blueprint: &Blueprint) -> fmt::Result {
    for (name, node) in blueprint.iter() {
        let (optional, node) = field_node(node);
        let optional = if optional { "?" } else { "" };
        writeln!(out, "{DOUBLE_INDENT}{name}{optional}: {};", render_node(node))?;
    }
    Ok(())
}

fn write_root_type<O: fmt::Write>(out: &mut O, type_name: &str, fields: &Blueprint) -> fmt::Result {
    if fields.is_empty() {
        return Ok(());
    }

    writeln!(out, "\nexport type {type_name} = {{")?;

    for (name, node) in fields.iter() {
        let arguments = node.args().map_or_else(|| "never".to_owned(), |args| render_node(args.node()));
        let (_, result) = field_node(node.value_node());
        let mut result = render_node(result);
        if node.value_node().is_optional() {
            result.push_str(" | undefined");
        }

        writeln!(out, "{INDENT}{name}: {{ args: {arguments}; result: {result} }};")?;
    }

    writeln!(out, "}};")
}

/// Strips the args wrapper and reports whether the field may be absent.
fn field_node(node: &Node) -> (bool, &Node) {
    match node.value_node() {
        Node::Optional(inner) => (true, inner),
        node => (false, node),
    }
}

fn render_node(node: &Node) -> String {
    match node {
        Node::Primitive(primitive) => render_primitive(*primitive).to_owned(),
        Node::Optional(inner) => format!("{} | undefined", render_node(inner)),
        Node::Nullable(inner) => format!("{} | null", render_node(inner)),
        Node::Array(inner) | Node::InputArray(inner) => format!("Array<{}>", render_node(inner)),
        Node::Args(args) => render_node(&args.value),
        Node::Blueprint(blueprint) => {
            let fields = blueprint
                .iter()
                .map(|(name, node)| {
                    let (optional, node) = field_node(node);
                    let optional = if optional { "?" } else { "" };
                    format!("{name}{optional}: {}", render_node(node))
                })
                .collect::<Vec<_>>();
            format!("{{ {} }}", fields.join("; "))
        }
        Node::Selection(selection) => {
            let keys = selection
                .select
                .iter()
                .filter(|(_, selected)| selected.is_selected())
                .map(|(key, _)| format!("'{key}'"))
                .collect::<Vec<_>>();
            format!("Pick<{}, {}>", render_node(&selection.model), keys.join(" | "))
        }
        Node::Model(_) | Node::ModelReference(_) | Node::Input(_) | Node::InputReference(_) => {
            format!("Schema['{}']", node.type_name().unwrap_or_default())
        }
    }
}

fn render_shape(shape: &Shape) -> String {
    match shape {
        Shape::Scalar(primitive) => render_primitive(*primitive).to_owned(),
        Shape::Optional(inner) => format!("{} | undefined", render_shape(inner)),
        Shape::Nullable(inner) => format!("{} | null", render_shape(inner)),
        Shape::List(inner) => format!("Array<{}>", render_shape(inner)),
        Shape::Named(name) => format!("Stored<Schema['{name}']>"),
        Shape::Object(object) => {
            let fields = object
                .fields
                .iter()
                .map(|(name, shape)| match shape {
                    Shape::Optional(inner) => format!("{name}?: {}", render_shape(inner)),
                    shape => format!("{name}: {}", render_shape(shape)),
                })
                .collect::<Vec<_>>();
            format!("{{ {} }}", fields.join("; "))
        }
    }
}

fn render_primitive(primitive: Primitive) -> &'static str {
    match primitive {
        Primitive::String => "string",
        Primitive::Number | Primitive::Float => "number",
        Primitive::Boolean => "boolean",
    }
}

fn maybe_docs<O>(out: &mut O, docs: Option<&str>, indentation: &str) -> fmt::Result
where
    O: fmt::Write,
{
    let Some(docs) = docs else { return Ok(()) };

    writeln!(out, "{indentation}/**")?;

    for line in docs.lines() {
        writeln!(out, "{indentation} * {line}")?;
    }

    writeln!(out, "{indentation} */")
}

/// An object returned without selection holds its stored fields only, any may be missing.
const STORED: &str = r#"
export type Stored<T> = T extends Array<infer I>
  ? Array<Stored<I>>
  : T extends object
    ? { [K in keyof T]?: Stored<T[K]> }
    : T;
"#;

const HEADER: &str = r#"// This is a generated file. It should not be edited manually.
//
// Regenerate it whenever the application schema changes.

"#;
