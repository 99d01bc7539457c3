use std::collections::HashMap;

use async_graphql_parser::types::{
    DocumentOperations, Field, OperationType, Selection as ItemSelection, SelectionSet,
};
use async_graphql_value::ConstValue;
use blueprint_schema::{FieldSelection, OperationKind, SelectSet, Selection};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::EngineError;

/// A parsed operation, one selection per root field.
#[derive(Debug, PartialEq)]
pub(crate) struct Operation {
    pub(crate) kind: OperationKind,
    pub(crate) fields: Vec<RootField>,
}

#[derive(Debug, PartialEq)]
pub(crate) struct RootField {
    pub(crate) name: String,
    /// Alias of the field, or its name.
    pub(crate) response_key: String,
    pub(crate) selection: Selection,
}

/// Parses a document holding a single query or mutation.
pub(crate) fn parse(source: &str, variables: &Map<String, Value>) -> Result<Operation, EngineError> {
    let document = async_graphql_parser::parse_query(source).map_err(|err| invalid(err.to_string()))?;

    if !document.fragments.is_empty() {
        return Err(invalid("fragments are not supported"));
    }

    let operation = match document.operations {
        DocumentOperations::Single(operation) => operation.node,
        DocumentOperations::Multiple(operations) if operations.len() == 1 => operations
            .into_values()
            .next()
            .map(|operation| operation.node)
            .ok_or_else(|| invalid("the document holds no operation"))?,
        DocumentOperations::Multiple(_) => return Err(invalid("the document must hold exactly one operation")),
    };

    let kind = match operation.ty {
        OperationType::Query => OperationKind::Query,
        OperationType::Mutation => OperationKind::Mutation,
        OperationType::Subscription => return Err(invalid("subscriptions are not supported")),
    };

    let mut values = HashMap::with_capacity(operation.variable_definitions.len());
    for definition in &operation.variable_definitions {
        let name = definition.node.name.node.as_str();
        let value = match (variables.get(name), &definition.node.default_value) {
            (Some(value), _) => {
                ConstValue::from_json(value.clone()).map_err(|err| invalid(format!("variable `${name}`: {err}")))?
            }
            (None, Some(default)) => default.node.clone(),
            (None, None) if definition.node.var_type.node.nullable => ConstValue::Null,
            (None, None) => return Err(invalid(format!("variable `${name}` is required"))),
        };
        values.insert(name.to_owned(), value);
    }

    let fields = operation
        .selection_set
        .node
        .items
        .iter()
        .map(|item| {
            let field = field(item)?;
            Ok(RootField {
                name: field.name.node.to_string(),
                response_key: field.response_key().node.to_string(),
                selection: selection(field, &values)?,
            })
        })
        .collect::<Result<_, EngineError>>()?;

    Ok(Operation { kind, fields })
}

fn field(item: &async_graphql_parser::Positioned<ItemSelection>) -> Result<&Field, EngineError> {
    match &item.node {
        ItemSelection::Field(field) => Ok(&field.node),
        ItemSelection::FragmentSpread(_) | ItemSelection::InlineFragment(_) => {
            Err(invalid("fragments are not supported"))
        }
    }
}

fn selection(field: &Field, values: &HashMap<String, ConstValue>) -> Result<Selection, EngineError> {
    let args = if field.arguments.is_empty() {
        None
    } else {
        let args = field
            .arguments
            .iter()
            .map(|(name, value)| {
                let value = value
                    .node
                    .clone()
                    .into_const_with(|variable| {
                        values
                            .get(variable.as_str())
                            .cloned()
                            .ok_or_else(|| invalid(format!("variable `${variable}` is not defined")))
                    })?
                    .into_json()
                    .map_err(|err| invalid(err.to_string()))?;
                Ok((name.node.to_string(), value))
            })
            .collect::<Result<Map<_, _>, EngineError>>()?;
        Some(args)
    };

    let select = if field.selection_set.node.items.is_empty() {
        None
    } else {
        Some(select_set(&field.selection_set.node, values)?)
    };

    Ok(Selection {
        args,
        select,
        aliases: IndexMap::new(),
    })
}

/// A field requested more than once, or under an alias, is only exposed through aliases.
fn select_set(set: &SelectionSet, values: &HashMap<String, ConstValue>) -> Result<SelectSet, EngineError> {
    let mut grouped: IndexMap<String, Vec<(String, bool, Selection)>> = IndexMap::new();

    for item in &set.items {
        let field = field(item)?;
        grouped.entry(field.name.node.to_string()).or_default().push((
            field.response_key().node.to_string(),
            field.alias.is_some(),
            selection(field, values)?,
        ));
    }

    let mut select = SelectSet::with_capacity(grouped.len());
    for (name, entries) in grouped {
        let aliased = entries.len() > 1 || entries.iter().any(|(_, alias, _)| *alias);

        let entry = if aliased {
            FieldSelection::Object(Selection {
                aliases: entries
                    .into_iter()
                    .map(|(response_key, _, selection)| (response_key, selection))
                    .collect(),
                ..Selection::default()
            })
        } else {
            match entries.into_iter().next() {
                Some((_, _, selection)) if selection == Selection::default() => FieldSelection::Include(true),
                Some((_, _, selection)) => FieldSelection::Object(selection),
                None => continue,
            }
        };

        select.insert(name, entry);
    }

    Ok(select)
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::Document(message.into())
}
