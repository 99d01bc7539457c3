use crate::Blueprint;

/// A named, identity-bearing blueprint.
#[derive(Debug, PartialEq)]
pub struct Model {
    name: String,
    description: Option<String>,
    blueprint: Blueprint,
}

impl Model {
    pub fn new(name: impl Into<String>, blueprint: Blueprint) -> Self {
        Model {
            name: name.into(),
            description: None,
            blueprint,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }
}

/// Forward declaration of a model, resolved by name against the application registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelReference {
    name: String,
}

impl ModelReference {
    pub fn new(name: impl Into<String>) -> Self {
        ModelReference { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Named argument or mutation payload type.
#[derive(Debug, PartialEq)]
pub struct Input {
    name: String,
    description: Option<String>,
    blueprint: Blueprint,
}

impl Input {
    pub fn new(name: impl Into<String>, blueprint: Blueprint) -> Self {
        Input {
            name: name.into(),
            description: None,
            blueprint,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InputReference {
    name: String,
}

impl InputReference {
    pub fn new(name: impl Into<String>) -> Self {
        InputReference { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
