/// Templates for the names of generated CRUD fields and inputs.
///
/// `{model}` expands to the model name with a lowercase first letter, `{Model}` to the
/// model name as declared.
#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    /// Query returning one entity. Default: `{model}`
    pub one: String,
    /// Query returning a list of entities. Default: `{model}s`
    pub many: String,
    /// Query counting entities. Default: `{model}Count`
    pub count: String,
    /// Mutation creating or updating an entity. Default: `{model}Save`
    pub save: String,
    /// Mutation deleting an entity. Default: `{model}Remove`
    pub remove: String,
    /// Filter input. Default: `{Model}Where`
    pub where_input: String,
    /// Ordering input. Default: `{Model}Order`
    pub order_input: String,
    /// Payload input of the save mutation. Default: `{Model}Input`
    pub save_input: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            one: String::from("{model}"),
            many: String::from("{model}s"),
            count: String::from("{model}Count"),
            save: String::from("{model}Save"),
            remove: String::from("{model}Remove"),
            where_input: String::from("{Model}Where"),
            order_input: String::from("{Model}Order"),
            save_input: String::from("{Model}Input"),
        }
    }
}

impl NamingConfig {
    pub fn one(&self, model: &str) -> String {
        render(&self.one, model)
    }

    pub fn many(&self, model: &str) -> String {
        render(&self.many, model)
    }

    pub fn count(&self, model: &str) -> String {
        render(&self.count, model)
    }

    pub fn save(&self, model: &str) -> String {
        render(&self.save, model)
    }

    pub fn remove(&self, model: &str) -> String {
        render(&self.remove, model)
    }

    pub fn where_input(&self, model: &str) -> String {
        render(&self.where_input, model)
    }

    pub fn order_input(&self, model: &str) -> String {
        render(&self.order_input, model)
    }

    pub fn save_input(&self, model: &str) -> String {
        render(&self.save_input, model)
    }
}

fn render(template: &str, model: &str) -> String {
    let mut chars = model.chars();
    let camel = match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    };

    template.replace("{model}", &camel).replace("{Model}", model)
}
