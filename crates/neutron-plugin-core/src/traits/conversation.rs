// # Conversation Trait
//
// A conversation groups one or more remote units that take part in a
// relation together. Each conversation carries:
// - A set of flags gating reactive handlers
// - Data published to the remote side (`set_remote`)
// - Data the remote side published (`get_remote`)
//
// ## Usage
//
// ```rust,ignore
// use neutron_plugin_core::traits::{Conversation, RemoteData};
//
// async fn publish(conversation: &dyn Conversation) -> neutron_plugin_core::Result<()> {
//     conversation.set_flag("neutron-plugin.connected").await?;
//
//     let data = RemoteData::new().with("neutron-plugin", "ovs");
//     conversation.set_remote(data).await?;
//
//     let address = conversation.get_remote("private-address").await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;

use crate::error::Result;

/// Ordered batch of key/value pairs written to the remote side in one go
///
/// A value of `None` clears the key on the remote side. Keys are kept in
/// insertion order; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteData {
    entries: Vec<(String, Option<String>)>,
}

impl RemoteData {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key with a value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    /// Add a key whose value may be absent
    pub fn with_optional(mut self, key: impl Into<String>, value: Option<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace a key
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a key
    ///
    /// Returns `None` if the key is not part of the batch, `Some(None)` if it
    /// is present with an absent value.
    pub fn get(&self, key: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_deref())
    }

    /// Iterate over the entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Number of keys in the batch
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for RemoteData {
    type Item = (String, Option<String>);
    type IntoIter = std::vec::IntoIter<(String, Option<String>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Trait for conversation implementations
///
/// Implementations are provided by the framework hosting the charm. Flag
/// names handed to this trait are already rendered with the relation name.
///
/// # Idempotency
///
/// Setting a flag that is already set, or removing one that is not, must
/// succeed without side effects.
#[async_trait]
pub trait Conversation: Send + Sync {
    /// Unique key of the conversation
    /// (e.g. `reactive.conversations.neutron-plugin.global`)
    fn key(&self) -> &str;

    /// Name of the relation the conversation belongs to
    fn relation_name(&self) -> &str;

    /// Remote units currently participating
    async fn units(&self) -> Result<Vec<String>>;

    /// Set a flag on this conversation
    async fn set_flag(&self, flag: &str) -> Result<()>;

    /// Remove a flag from this conversation
    async fn remove_flag(&self, flag: &str) -> Result<()>;

    /// Check whether a flag is set on this conversation
    async fn is_flag_set(&self, flag: &str) -> Result<bool>;

    /// Publish a batch of key/value pairs to the remote units
    async fn set_remote(&self, data: RemoteData) -> Result<()>;

    /// Read a value published by the remote units
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: A remote unit published the key
    /// - `Ok(None)`: No remote unit published it
    async fn get_remote(&self, key: &str) -> Result<Option<String>>;
}
