//! Relation flags
//!
//! Flags are namespaced booleans read by reactive handlers outside this
//! crate. They are declared as templates and rendered with the concrete
//! relation name each time they are used.

/// Placeholder substituted with the relation name
const RELATION_NAME_PLACEHOLDER: &str = "{relation_name}";

/// Flags managed by the provides side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// The principal has joined the relation
    Connected,
    /// The relation has been established
    Related,
}

impl Flag {
    /// Unrendered flag template
    pub fn template(&self) -> &'static str {
        match self {
            Flag::Connected => "{relation_name}.connected",
            Flag::Related => "{relation_name}.related",
        }
    }

    /// Render the flag for a relation
    pub fn render(&self, relation_name: &str) -> String {
        self.template()
            .replace(RELATION_NAME_PLACEHOLDER, relation_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_uses_relation_name() {
        assert_eq!(Flag::Connected.render("some-relation"), "some-relation.connected");
        assert_eq!(Flag::Related.render("neutron-plugin"), "neutron-plugin.related");
    }
}
