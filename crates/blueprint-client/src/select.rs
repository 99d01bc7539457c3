use blueprint_schema::{FieldSelection, SelectSet, Selection};
use itertools::Itertools;

use crate::transform_args;

/// Serializes a selection into the selection set of a query document: `{ id name }`.
pub struct SelectToQueryStringTransformer;

impl SelectToQueryStringTransformer {
    /// Returns an empty string when nothing is selected.
    pub fn transform(select: &SelectSet) -> String {
        let fields = select
            .iter()
            .filter_map(|(name, selection)| match selection {
                FieldSelection::Include(false) => None,
                FieldSelection::Include(true) => Some(name.clone()),
                FieldSelection::Object(selection) => Some(Self::field(name, selection)),
            })
            .join(" ");

        if fields.is_empty() {
            return String::new();
        }

        format!("{{ {fields} }}")
    }

    /// One field with its arguments and sub-selection, or one entry per alias when
    /// the selection has aliases.
    pub fn field(name: &str, selection: &Selection) -> String {
        if selection.has_aliases() {
            return selection
                .aliases
                .iter()
                .map(|(alias, aliased)| format!("{alias}: {}", Self::field(name, aliased)))
                .join(" ");
        }

        let mut field = name.to_owned();

        if let Some(args) = selection.args.as_ref().filter(|args| !args.is_empty()) {
            field.push('(');
            field.push_str(&transform_args(args));
            field.push(')');
        }

        let sub_selection = selection.select.as_ref().map(Self::transform).unwrap_or_default();
        if !sub_selection.is_empty() {
            field.push(' ');
            field.push_str(&sub_selection);
        }

        field
    }
}
