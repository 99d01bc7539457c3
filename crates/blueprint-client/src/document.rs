use blueprint_schema::{OperationKind, Selection};

use crate::SelectToQueryStringTransformer;

/// Builds the query document for a single root field: `query { post(id: 1) { id name } }`.
pub fn build_document(kind: OperationKind, name: &str, selection: &Selection) -> String {
    let field = SelectToQueryStringTransformer::field(name, selection);
    format!("{kind} {{ {field} }}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_with_arguments() {
        let selection = Selection::new().arg("id", 1).fields(["id", "name"]);
        assert_eq!(
            build_document(OperationKind::Query, "post", &selection),
            "query { post(id: 1) { id name } }"
        );
    }

    #[test]
    fn mutation_without_selection() {
        let selection = Selection::new().arg("id", 3);
        assert_eq!(
            build_document(OperationKind::Mutation, "like", &selection),
            "mutation { like(id: 3) }"
        );
    }

    #[test]
    fn root_aliases() {
        let selection = Selection {
            aliases: [
                ("first".to_owned(), Selection::new().arg("id", 1).field("id")),
                ("second".to_owned(), Selection::new().arg("id", 2).field("id")),
            ]
            .into_iter()
            .collect(),
            ..Selection::default()
        };
        insta::assert_snapshot!(
            build_document(OperationKind::Query, "post", &selection),
            @"query { first: post(id: 1) { id } second: post(id: 2) { id } }"
        );
    }
}
