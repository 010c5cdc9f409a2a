// # Memory Relation
//
// In-memory implementation of Relation and Conversation.
//
// ## Purpose
//
// Stands in for the framework's relation storage in tests and in the hook
// runner. Remote units join and depart explicitly; the relation groups them
// into conversations according to its scope.
//
// ## Current Conversation
//
// - With a remote unit recorded for the executing hook, the current
//   conversation is the one holding that unit
// - Without one, the relation must have exactly one conversation
//
// Anything else is reported as `NoConversation` or `AmbiguousConversation`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::state::snapshot::RelationSnapshot;
use crate::traits::relation::conversation_key;
use crate::traits::{Conversation, Relation, RemoteData, Scope};

/// Serializable state of one conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationRecord {
    /// Conversation scope name (`global`, a service or a unit name)
    pub scope: String,
    /// Participating remote units, in join order
    #[serde(default)]
    pub units: Vec<String>,
    /// Flags set on the conversation
    #[serde(default)]
    pub flags: BTreeSet<String>,
    /// Data published to the remote units
    #[serde(default)]
    pub local: BTreeMap<String, String>,
    /// Data each remote unit published
    #[serde(default)]
    pub remote: BTreeMap<String, BTreeMap<String, String>>,
}

impl ConversationRecord {
    /// Create an empty record for a scope
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            ..Default::default()
        }
    }
}

/// In-memory conversation
#[derive(Debug)]
pub struct MemoryConversation {
    key: String,
    relation_name: String,
    record: RwLock<ConversationRecord>,
}

impl MemoryConversation {
    /// Create a conversation from a record
    pub fn new(relation_name: impl Into<String>, record: ConversationRecord) -> Self {
        let relation_name = relation_name.into();
        Self {
            key: conversation_key(&relation_name, &record.scope),
            relation_name,
            record: RwLock::new(record),
        }
    }

    /// Copy of the conversation state
    pub async fn record(&self) -> ConversationRecord {
        self.record.read().await.clone()
    }

    /// Flags currently set
    pub async fn flags(&self) -> BTreeSet<String> {
        self.record.read().await.flags.clone()
    }

    /// Data published to the remote units
    pub async fn local_data(&self) -> BTreeMap<String, String> {
        self.record.read().await.local.clone()
    }

    async fn has_unit(&self, unit: &str) -> bool {
        self.record.read().await.units.iter().any(|u| u == unit)
    }
}

#[async_trait]
impl Conversation for MemoryConversation {
    fn key(&self) -> &str {
        &self.key
    }

    fn relation_name(&self) -> &str {
        &self.relation_name
    }

    async fn units(&self) -> Result<Vec<String>> {
        Ok(self.record.read().await.units.clone())
    }

    async fn set_flag(&self, flag: &str) -> Result<()> {
        let mut guard = self.record.write().await;
        guard.flags.insert(flag.to_string());
        Ok(())
    }

    async fn remove_flag(&self, flag: &str) -> Result<()> {
        let mut guard = self.record.write().await;
        guard.flags.remove(flag);
        Ok(())
    }

    async fn is_flag_set(&self, flag: &str) -> Result<bool> {
        Ok(self.record.read().await.flags.contains(flag))
    }

    async fn set_remote(&self, data: RemoteData) -> Result<()> {
        let mut guard = self.record.write().await;
        for (key, value) in data {
            match value {
                Some(value) => guard.local.insert(key, value),
                None => guard.local.remove(&key),
            };
        }
        Ok(())
    }

    async fn get_remote(&self, key: &str) -> Result<Option<String>> {
        let guard = self.record.read().await;
        Ok(guard
            .units
            .iter()
            .filter_map(|unit| guard.remote.get(unit))
            .find_map(|data| data.get(key).cloned()))
    }
}

/// In-memory relation
///
/// # Example
///
/// ```rust
/// use neutron_plugin_core::{MemoryRelation, Relation, Scope};
///
/// #[tokio::main]
/// async fn main() -> neutron_plugin_core::Result<()> {
///     let relation = MemoryRelation::new("neutron-plugin", Scope::Unit);
///     relation.join("nova-compute/0").await;
///     relation.join("nova-compute/1").await;
///     relation.publish("nova-compute/0", "private-address", "10.0.0.10").await?;
///
///     assert_eq!(relation.conversations().await?.len(), 2);
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MemoryRelation {
    relation_name: String,
    scope: Scope,
    conversations: RwLock<Vec<Arc<MemoryConversation>>>,
    remote_unit: RwLock<Option<String>>,
}

impl MemoryRelation {
    /// Create an empty relation
    pub fn new(relation_name: impl Into<String>, scope: Scope) -> Self {
        Self {
            relation_name: relation_name.into(),
            scope,
            conversations: RwLock::new(Vec::new()),
            remote_unit: RwLock::new(None),
        }
    }

    /// Add a remote unit to the relation
    ///
    /// The unit is placed in the conversation its scope dictates; the
    /// conversation is created if it does not exist yet. Joining twice is a
    /// no-op.
    pub async fn join(&self, unit: &str) -> Arc<MemoryConversation> {
        let scope = self.scope.conversation_scope(unit);
        let mut conversations = self.conversations.write().await;

        let existing = conversations
            .iter()
            .find(|c| c.key == conversation_key(&self.relation_name, &scope))
            .cloned();
        let conversation = match existing {
            Some(conversation) => conversation,
            None => {
                let conversation = Arc::new(MemoryConversation::new(
                    self.relation_name.clone(),
                    ConversationRecord::new(scope),
                ));
                conversations.push(conversation.clone());
                conversation
            }
        };

        let mut record = conversation.record.write().await;
        if !record.units.iter().any(|u| u == unit) {
            record.units.push(unit.to_string());
            tracing::debug!("Unit {} joined {}", unit, conversation.key);
        }
        drop(record);

        conversation
    }

    /// Remove a remote unit from the relation
    ///
    /// The unit's published data goes with it, and a conversation left
    /// without units is dropped.
    ///
    /// # Returns
    ///
    /// The conversation the unit belonged to, or `None` if it was unknown.
    pub async fn depart(&self, unit: &str) -> Option<Arc<MemoryConversation>> {
        let mut conversations = self.conversations.write().await;

        let mut found = None;
        for conversation in conversations.iter() {
            if conversation.has_unit(unit).await {
                found = Some(conversation.clone());
                break;
            }
        }
        let conversation = found?;

        let mut record = conversation.record.write().await;
        record.units.retain(|u| u != unit);
        record.remote.remove(unit);
        let empty = record.units.is_empty();
        drop(record);

        if empty {
            conversations.retain(|c| !Arc::ptr_eq(c, &conversation));
            tracing::debug!("Dropped empty conversation {}", conversation.key);
        }

        Some(conversation)
    }

    /// Record data a remote unit published
    ///
    /// # Errors
    ///
    /// Returns `Error::NoConversation` if the unit has not joined.
    pub async fn publish(
        &self,
        unit: &str,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<()> {
        let conversation = self
            .conversation_for(unit)
            .await
            .ok_or_else(|| Error::no_conversation(&self.relation_name))?;

        let mut record = conversation.record.write().await;
        record
            .remote
            .entry(unit.to_string())
            .or_default()
            .insert(key.into(), value.into());
        Ok(())
    }

    /// Record the remote unit of the executing hook
    pub async fn set_remote_unit(&self, unit: Option<String>) {
        *self.remote_unit.write().await = unit;
    }

    /// Conversation a remote unit belongs to
    pub async fn conversation_for(&self, unit: &str) -> Option<Arc<MemoryConversation>> {
        let conversations = self.conversations.read().await;
        for conversation in conversations.iter() {
            if conversation.has_unit(unit).await {
                return Some(conversation.clone());
            }
        }
        None
    }

    /// All conversations with their concrete type
    pub async fn memory_conversations(&self) -> Vec<Arc<MemoryConversation>> {
        self.conversations.read().await.clone()
    }

    /// Capture the relation state
    pub async fn snapshot(&self) -> RelationSnapshot {
        let mut records = Vec::new();
        for conversation in self.conversations.read().await.iter() {
            records.push(conversation.record().await);
        }

        RelationSnapshot::new(
            self.relation_name.clone(),
            self.scope,
            self.remote_unit.read().await.clone(),
            records,
        )
    }

    /// Rebuild a relation from a snapshot
    pub fn from_snapshot(snapshot: RelationSnapshot) -> Self {
        let conversations = snapshot
            .conversations
            .into_iter()
            .map(|record| Arc::new(MemoryConversation::new(snapshot.relation_name.clone(), record)))
            .collect();

        Self {
            relation_name: snapshot.relation_name,
            scope: snapshot.scope,
            conversations: RwLock::new(conversations),
            remote_unit: RwLock::new(snapshot.remote_unit),
        }
    }
}

#[async_trait]
impl Relation for MemoryRelation {
    fn relation_name(&self) -> &str {
        &self.relation_name
    }

    fn scope(&self) -> Scope {
        self.scope
    }

    async fn conversations(&self) -> Result<Vec<Arc<dyn Conversation>>> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .iter()
            .map(|c| c.clone() as Arc<dyn Conversation>)
            .collect())
    }

    async fn conversation(&self) -> Result<Arc<dyn Conversation>> {
        if let Some(unit) = self.remote_unit.read().await.as_deref() {
            return self
                .conversation_for(unit)
                .await
                .map(|c| c as Arc<dyn Conversation>)
                .ok_or_else(|| Error::no_conversation(&self.relation_name));
        }

        let conversations = self.conversations.read().await;
        match conversations.as_slice() {
            [] => Err(Error::no_conversation(&self.relation_name)),
            [only] => Ok(only.clone() as Arc<dyn Conversation>),
            many => Err(Error::ambiguous_conversation(&self.relation_name, many.len())),
        }
    }
}
