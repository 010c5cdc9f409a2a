//! Configuration types for the neutron-plugin interface
//!
//! This module defines the configuration handed to [`NeutronPluginProvides`]
//! and the endpoint declarations hook patterns are expanded against.
//!
//! [`NeutronPluginProvides`]: crate::provides::NeutronPluginProvides

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::traits::Scope;

/// Interface name implemented by this crate
pub const INTERFACE_NAME: &str = "neutron-plugin";

/// Main configuration for the provides side
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidesConfig {
    /// Name of the relation this instance drives (e.g., "neutron-plugin")
    #[serde(default = "default_relation_name")]
    pub relation_name: String,

    /// How remote units are grouped into conversations
    #[serde(default)]
    pub scope: Scope,

    /// Relation endpoints declared by the charm
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<Endpoint>,

    /// RNDC key file read by `send_key_info`
    #[serde(default = "default_rndc_key_path")]
    pub rndc_key_path: PathBuf,

    /// Remote key holding a peer's address, read by `client_ips`
    #[serde(default = "default_address_key")]
    pub address_key: String,
}

impl ProvidesConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            relation_name: default_relation_name(),
            scope: Scope::default(),
            endpoints: default_endpoints(),
            rndc_key_path: default_rndc_key_path(),
            address_key: default_address_key(),
        }
    }

    /// Use a different relation name
    ///
    /// The provides endpoint list is rewritten so that the new name is the
    /// one declared for the neutron-plugin interface.
    pub fn with_relation_name(mut self, relation_name: impl Into<String>) -> Self {
        let relation_name = relation_name.into();
        for endpoint in &mut self.endpoints {
            if endpoint.role == Role::Provides && endpoint.interface == INTERFACE_NAME {
                endpoint.name = relation_name.clone();
            }
        }
        self.relation_name = relation_name;
        self
    }

    /// Set the conversation scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Set the RNDC key file path
    pub fn with_rndc_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.rndc_key_path = path.into();
        self
    }

    /// Set the remote address key
    pub fn with_address_key(mut self, key: impl Into<String>) -> Self {
        self.address_key = key.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.relation_name.is_empty() {
            return Err(crate::Error::config("Relation name cannot be empty"));
        }

        if self.address_key.is_empty() {
            return Err(crate::Error::config("Address key cannot be empty"));
        }

        if self.rndc_key_path.as_os_str().is_empty() {
            return Err(crate::Error::config("RNDC key path cannot be empty"));
        }

        for endpoint in &self.endpoints {
            endpoint.validate()?;
        }

        let declared = self.endpoints.iter().any(|e| {
            e.name == self.relation_name
                && e.role == Role::Provides
                && e.interface == INTERFACE_NAME
        });
        if !declared {
            return Err(crate::Error::config(format!(
                "Relation {} is not declared as a provides endpoint of interface {}",
                self.relation_name, INTERFACE_NAME
            )));
        }

        Ok(())
    }
}

impl Default for ProvidesConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Role a charm plays on a relation endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Endpoint the charm provides
    Provides,
    /// Endpoint the charm requires
    Requires,
    /// Peer endpoint
    Peers,
}

impl Role {
    /// Parse a role name
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "provides" => Some(Role::Provides),
            "requires" => Some(Role::Requires),
            "peers" => Some(Role::Peers),
            _ => None,
        }
    }
}

/// A relation endpoint declared in charm metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Relation name (e.g., "neutron-plugin")
    pub name: String,

    /// Role of the charm on this endpoint
    pub role: Role,

    /// Interface implemented over the endpoint
    pub interface: String,
}

impl Endpoint {
    /// Create a new endpoint declaration
    pub fn new(name: impl Into<String>, role: Role, interface: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role,
            interface: interface.into(),
        }
    }

    /// Shorthand for a provides endpoint
    pub fn provides(name: impl Into<String>, interface: impl Into<String>) -> Self {
        Self::new(name, Role::Provides, interface)
    }

    /// Shorthand for a requires endpoint
    pub fn requires(name: impl Into<String>, interface: impl Into<String>) -> Self {
        Self::new(name, Role::Requires, interface)
    }

    /// Validate the endpoint declaration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.name.is_empty() {
            return Err(crate::Error::config("Endpoint name cannot be empty"));
        }
        if self.interface.is_empty() {
            return Err(crate::Error::config(format!(
                "Endpoint {} has an empty interface",
                self.name
            )));
        }
        Ok(())
    }
}

fn default_relation_name() -> String {
    INTERFACE_NAME.to_string()
}

fn default_endpoints() -> Vec<Endpoint> {
    vec![Endpoint::provides(INTERFACE_NAME, INTERFACE_NAME)]
}

fn default_rndc_key_path() -> PathBuf {
    PathBuf::from("/etc/bind/rndc.key")
}

fn default_address_key() -> String {
    "private-address".to_string()
}
