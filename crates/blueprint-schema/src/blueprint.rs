use indexmap::IndexMap;

use crate::Node;

/// An anonymous structural type: an ordered mapping from field name to node.
///
/// Field names are unique, declaring a field twice keeps the position of the first
/// declaration and the node of the last one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Blueprint {
    fields: IndexMap<String, Node>,
}

impl Blueprint {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, node: impl Into<Node>) -> Self {
        self.fields.insert(name.into(), node.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<Node>) -> Option<Node> {
        self.fields.insert(name.into(), node.into())
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Node)> + '_ {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn names(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, N: Into<Node>> FromIterator<(K, N)> for Blueprint {
    fn from_iter<T: IntoIterator<Item = (K, N)>>(iter: T) -> Self {
        Blueprint {
            fields: iter.into_iter().map(|(name, node)| (name.into(), node.into())).collect(),
        }
    }
}
