//! Provides side of the neutron-plugin relation
//!
//! [`NeutronPluginProvides`] reacts to relation lifecycle hooks by flipping
//! the `{relation_name}.connected` flag, and exchanges data with the
//! principal through the relation's conversations.
//!
//! ## State Machine
//!
//! ```text
//!                joined / changed
//! ┌─────────────┐ ───────────────▶ ┌───────────┐
//! │ unconnected │                  │ connected │
//! └─────────────┘ ◀─────────────── └───────────┘
//!                broken / departed
//! ```
//!
//! Both transitions are idempotent. Nothing is stored here; the flags live
//! on the framework's conversation records.

pub mod json;
pub mod key_info;

use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ProvidesConfig;
use crate::error::{Error, Result};
use crate::flags::Flag;
use crate::hooks::HookRegistry;
use crate::traits::{Relation, RemoteData};

pub use key_info::KeyInfo;

/// Hooks that set the connected flag
pub const CHANGED_PATTERN: &str = "{provides:neutron-plugin}-relation-{joined,changed}";

/// Hooks that clear the connected flag
pub const BROKEN_PATTERN: &str = "{provides:neutron-plugin}-relation-{broken,departed}";

/// Remote key carrying the plugin name
pub const PLUGIN_KEY: &str = "neutron-plugin";

/// Remote key carrying the JSON encoded subordinate configuration
pub const SUBORDINATE_CONFIGURATION_KEY: &str = "subordinate_configuration";

/// Handlers the provides side registers with the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvidesHook {
    /// Runs [`NeutronPluginProvides::changed`]
    Changed,
    /// Runs [`NeutronPluginProvides::broken`]
    Broken,
}

impl ProvidesHook {
    /// Handler name
    pub fn name(&self) -> &'static str {
        match self {
            ProvidesHook::Changed => "changed",
            ProvidesHook::Broken => "broken",
        }
    }

    /// Run the handler against a provides instance
    pub async fn invoke(&self, provides: &NeutronPluginProvides) -> Result<()> {
        match self {
            ProvidesHook::Changed => provides.changed().await,
            ProvidesHook::Broken => provides.broken().await,
        }
    }
}

/// Provides side of the neutron-plugin interface
///
/// Wraps a framework relation and drives its flags and remote data. Every
/// operation runs to completion within a single hook invocation.
///
/// # Example
///
/// ```rust
/// use neutron_plugin_core::{MemoryRelation, NeutronPluginProvides, ProvidesConfig, Scope};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> neutron_plugin_core::Result<()> {
///     let relation = Arc::new(MemoryRelation::new("neutron-plugin", Scope::Global));
///     relation.join("nova-compute/0").await;
///
///     let provides = NeutronPluginProvides::new(relation.clone(), ProvidesConfig::new())?;
///     provides.changed().await?;
///     assert!(provides.is_connected().await?);
///
///     let mut config = serde_json::Map::new();
///     config.insert("bob".into(), 1.into());
///     provides.configure_plugin("myplugin", &config).await?;
///     Ok(())
/// }
/// ```
pub struct NeutronPluginProvides {
    /// Relation the flags and remote data live on
    relation: Arc<dyn Relation>,

    /// Provides side configuration
    config: ProvidesConfig,
}

impl NeutronPluginProvides {
    /// Create a provides instance for a relation
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid or names a
    /// different relation than the one supplied.
    pub fn new(relation: Arc<dyn Relation>, config: ProvidesConfig) -> Result<Self> {
        config.validate()?;

        if relation.relation_name() != config.relation_name {
            return Err(Error::config(format!(
                "Configured for relation {} but given relation {}",
                config.relation_name,
                relation.relation_name()
            )));
        }

        Ok(Self { relation, config })
    }

    /// Register the lifecycle handlers
    ///
    /// Adds exactly two entries: [`CHANGED_PATTERN`] mapped to
    /// [`ProvidesHook::Changed`] and [`BROKEN_PATTERN`] mapped to
    /// [`ProvidesHook::Broken`].
    pub fn register_hooks(registry: &mut HookRegistry<ProvidesHook>) -> Result<()> {
        registry.register(CHANGED_PATTERN, ProvidesHook::Changed)?;
        registry.register(BROKEN_PATTERN, ProvidesHook::Broken)?;
        Ok(())
    }

    /// Name of the wrapped relation
    pub fn relation_name(&self) -> &str {
        self.relation.relation_name()
    }

    /// Configuration in use
    pub fn config(&self) -> &ProvidesConfig {
        &self.config
    }

    /// A peer joined or changed its data: mark the relation connected
    pub async fn changed(&self) -> Result<()> {
        let flag = Flag::Connected.render(self.relation_name());
        let conversation = self.relation.conversation().await?;
        conversation.set_flag(&flag).await?;

        info!("Relation {} connected ({})", self.relation_name(), conversation.key());
        Ok(())
    }

    /// The relation broke or a peer departed: clear the connected flag
    ///
    /// A relation whose conversations are already gone has nothing left to
    /// clear, so it is treated as unconnected.
    pub async fn broken(&self) -> Result<()> {
        self.remove_flag(Flag::Connected).await?;
        info!("Relation {} disconnected", self.relation_name());
        Ok(())
    }

    /// Clear the related flag on the current conversation
    pub async fn departed(&self) -> Result<()> {
        self.remove_flag(Flag::Related).await
    }

    async fn remove_flag(&self, flag: Flag) -> Result<()> {
        let flag = flag.render(self.relation_name());
        match self.relation.conversation().await {
            Ok(conversation) => conversation.remove_flag(&flag).await,
            Err(Error::NoConversation { .. }) => {
                debug!("No conversation left on {}; {} already clear", self.relation_name(), flag);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Whether the current conversation carries the connected flag
    pub async fn is_connected(&self) -> Result<bool> {
        let flag = Flag::Connected.render(self.relation_name());
        match self.relation.conversation().await {
            Ok(conversation) => conversation.is_flag_set(&flag).await,
            Err(Error::NoConversation { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Tell the principal which plugin this is and how to configure it
    ///
    /// Writes `neutron-plugin` and `subordinate_configuration` to the
    /// current conversation in a single remote write. The configuration is
    /// encoded the way Python's `json.dumps` would encode it.
    ///
    /// # Errors
    ///
    /// Returns `Error::AmbiguousConversation` if the relation cannot pick a
    /// single current conversation; the data is never broadcast.
    pub async fn configure_plugin(&self, plugin_name: &str, config: &Map<String, Value>) -> Result<()> {
        let encoded = json::to_string(config)?;
        let conversation = self.relation.conversation().await?;

        let data = RemoteData::new()
            .with(PLUGIN_KEY, plugin_name)
            .with(SUBORDINATE_CONFIGURATION_KEY, encoded);
        conversation.set_remote(data).await?;

        info!(
            "Sent plugin {} configuration ({} keys) on {}",
            plugin_name,
            config.len(),
            conversation.key()
        );
        Ok(())
    }

    /// Broadcast RNDC key material to every conversation
    ///
    /// Labels missing from the key file are sent as absent values.
    ///
    /// # Errors
    ///
    /// Returns `Error::KeyFile` if the key file cannot be read.
    pub async fn send_key_info(&self) -> Result<()> {
        let info = KeyInfo::read(&self.config.rndc_key_path).await?;

        let conversations = self.relation.conversations().await?;
        for conversation in &conversations {
            conversation.set_remote(info.to_remote_data()).await?;
            debug!("Sent key info on {}", conversation.key());
        }

        info!(
            "Broadcast key info to {} conversation(s) on {}",
            conversations.len(),
            self.relation_name()
        );
        Ok(())
    }

    /// Addresses published by the peers
    ///
    /// # Returns
    ///
    /// One entry per conversation, in conversation order. An entry is
    /// `None` when that peer has not published its address yet.
    pub async fn client_ips(&self) -> Result<Vec<Option<String>>> {
        let conversations = self.relation.conversations().await?;
        let mut addresses = Vec::with_capacity(conversations.len());

        for conversation in &conversations {
            addresses.push(conversation.get_remote(&self.config.address_key).await?);
        }

        Ok(addresses)
    }
}
