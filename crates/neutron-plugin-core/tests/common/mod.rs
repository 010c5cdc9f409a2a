//! Test doubles and common utilities for the contract tests
//!
//! The doubles record every call the provides side makes so tests can
//! assert on exact flag and remote-data traffic.

#![allow(dead_code)]

use neutron_plugin_core::error::{Error, Result};
use neutron_plugin_core::traits::{Conversation, Relation, RemoteData, Scope};
use neutron_plugin_core::{NeutronPluginProvides, ProvidesConfig};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// A call made against a conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SetFlag(String),
    RemoveFlag(String),
    SetRemote(Vec<(String, Option<String>)>),
    GetRemote(String),
}

/// A conversation that records calls and serves canned remote data
pub struct RecordingConversation {
    key: String,
    relation_name: String,
    calls: Mutex<Vec<Call>>,
    remote: HashMap<String, String>,
}

impl RecordingConversation {
    pub fn new(relation_name: &str, scope: &str) -> Self {
        Self {
            key: format!("reactive.conversations.{}.{}", relation_name, scope),
            relation_name: relation_name.to_string(),
            calls: Mutex::new(Vec::new()),
            remote: HashMap::new(),
        }
    }

    /// Serve a value from `get_remote`
    pub fn with_remote(mut self, key: &str, value: &str) -> Self {
        self.remote.insert(key.to_string(), value.to_string());
        self
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Only the `set_remote` batches
    pub fn remote_writes(&self) -> Vec<Vec<(String, Option<String>)>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::SetRemote(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl Conversation for RecordingConversation {
    fn key(&self) -> &str {
        &self.key
    }

    fn relation_name(&self) -> &str {
        &self.relation_name
    }

    async fn units(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn set_flag(&self, flag: &str) -> Result<()> {
        self.record(Call::SetFlag(flag.to_string()));
        Ok(())
    }

    async fn remove_flag(&self, flag: &str) -> Result<()> {
        self.record(Call::RemoveFlag(flag.to_string()));
        Ok(())
    }

    async fn is_flag_set(&self, flag: &str) -> Result<bool> {
        let calls = self.calls.lock().unwrap();
        let last = calls.iter().rev().find_map(|call| match call {
            Call::SetFlag(f) if f == flag => Some(true),
            Call::RemoveFlag(f) if f == flag => Some(false),
            _ => None,
        });
        Ok(last.unwrap_or(false))
    }

    async fn set_remote(&self, data: RemoteData) -> Result<()> {
        self.record(Call::SetRemote(data.into_iter().collect()));
        Ok(())
    }

    async fn get_remote(&self, key: &str) -> Result<Option<String>> {
        self.record(Call::GetRemote(key.to_string()));
        Ok(self.remote.get(key).cloned())
    }
}

/// A relation over a fixed list of recording conversations
pub struct RecordingRelation {
    relation_name: String,
    conversations: Vec<Arc<RecordingConversation>>,
}

impl RecordingRelation {
    pub fn new(relation_name: &str, conversations: Vec<Arc<RecordingConversation>>) -> Self {
        Self {
            relation_name: relation_name.to_string(),
            conversations,
        }
    }

    /// A relation with a single global conversation
    pub fn single(relation_name: &str) -> (Arc<Self>, Arc<RecordingConversation>) {
        let conversation = Arc::new(RecordingConversation::new(relation_name, "global"));
        let relation = Arc::new(Self::new(relation_name, vec![conversation.clone()]));
        (relation, conversation)
    }
}

#[async_trait::async_trait]
impl Relation for RecordingRelation {
    fn relation_name(&self) -> &str {
        &self.relation_name
    }

    fn scope(&self) -> Scope {
        Scope::Global
    }

    async fn conversations(&self) -> Result<Vec<Arc<dyn Conversation>>> {
        Ok(self
            .conversations
            .iter()
            .map(|c| c.clone() as Arc<dyn Conversation>)
            .collect())
    }

    async fn conversation(&self) -> Result<Arc<dyn Conversation>> {
        match self.conversations.as_slice() {
            [] => Err(Error::no_conversation(&self.relation_name)),
            [only] => Ok(only.clone() as Arc<dyn Conversation>),
            many => Err(Error::ambiguous_conversation(
                &self.relation_name,
                many.len(),
            )),
        }
    }
}

/// Build a provides instance for a relation, reading keys from `key_file`
pub fn provides_for(relation: Arc<dyn Relation>, key_file: &Path) -> NeutronPluginProvides {
    let config = ProvidesConfig::new()
        .with_relation_name(relation.relation_name())
        .with_rndc_key_path(key_file);
    NeutronPluginProvides::new(relation, config).expect("valid provides config")
}

/// Owned `(key, value)` pair for comparing remote writes
pub fn pair(key: &str, value: Option<&str>) -> (String, Option<String>) {
    (key.to_string(), value.map(str::to_string))
}
