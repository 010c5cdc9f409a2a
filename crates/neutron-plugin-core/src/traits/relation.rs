// # Relation Trait
//
// A relation is a named channel between two charm roles. Remote units that
// join it are grouped into conversations according to the relation scope.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::traits::Conversation;

/// How remote units are grouped into conversations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every remote unit shares a single conversation
    #[default]
    Global,
    /// One conversation per remote service
    Service,
    /// One conversation per remote unit
    Unit,
}

impl Scope {
    /// Conversation scope name a remote unit falls into
    ///
    /// `nova-compute/0` maps to `global`, `nova-compute` or `nova-compute/0`
    /// depending on the scope.
    pub fn conversation_scope(&self, unit: &str) -> String {
        match self {
            Scope::Global => "global".to_string(),
            Scope::Service => unit.split('/').next().unwrap_or(unit).to_string(),
            Scope::Unit => unit.to_string(),
        }
    }

    /// Parse a scope name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "global" => Some(Scope::Global),
            "service" => Some(Scope::Service),
            "unit" => Some(Scope::Unit),
            _ => None,
        }
    }
}

/// Build the key identifying a conversation
pub fn conversation_key(relation_name: &str, scope: &str) -> String {
    format!("reactive.conversations.{}.{}", relation_name, scope)
}

/// Trait for relation implementations
///
/// The relation owns an ordered set of conversations; implementations decide
/// which of them is current for the executing hook.
#[async_trait]
pub trait Relation: Send + Sync {
    /// Name of the relation (e.g., "neutron-plugin")
    fn relation_name(&self) -> &str;

    /// Scope used to group remote units
    fn scope(&self) -> Scope;

    /// All active conversations, in a stable iteration order
    async fn conversations(&self) -> Result<Vec<Arc<dyn Conversation>>>;

    /// The conversation for the executing hook
    ///
    /// # Returns
    ///
    /// - `Ok(conversation)`: Exactly one conversation applies
    /// - `Err(Error::NoConversation)`: The relation has no conversation
    /// - `Err(Error::AmbiguousConversation)`: Several conversations apply and
    ///   the hook context does not single one out
    async fn conversation(&self) -> Result<Arc<dyn Conversation>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_scope() {
        assert_eq!(Scope::Global.conversation_scope("nova-compute/0"), "global");
        assert_eq!(Scope::Service.conversation_scope("nova-compute/0"), "nova-compute");
        assert_eq!(Scope::Unit.conversation_scope("nova-compute/0"), "nova-compute/0");
    }

    #[test]
    fn test_conversation_key() {
        assert_eq!(
            conversation_key("neutron-plugin", "global"),
            "reactive.conversations.neutron-plugin.global"
        );
    }
}
