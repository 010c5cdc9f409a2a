//! Hook registration table
//!
//! The registry maps relation expressions to handlers. It is built once at
//! startup and handed to whatever dispatches hooks, so tests can build their
//! own table instead of patching global state.
//!
//! ## Usage
//!
//! ```rust
//! use neutron_plugin_core::{HookRegistry, NeutronPluginProvides, ProvidesHook};
//! use neutron_plugin_core::config::Endpoint;
//!
//! let mut registry = HookRegistry::new();
//! NeutronPluginProvides::register_hooks(&mut registry).unwrap();
//!
//! let endpoints = vec![Endpoint::provides("neutron-plugin", "neutron-plugin")];
//! let resolved = registry.resolve("neutron-plugin-relation-joined", &endpoints);
//! assert_eq!(resolved[0].handler, ProvidesHook::Changed);
//! ```

use crate::config::Endpoint;
use crate::error::Result;
use crate::hooks::HookPattern;

/// A handler selected for a hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHook<H> {
    /// Relation bound by the pattern's endpoint selector
    pub relation_name: Option<String>,
    /// Handler to invoke
    pub handler: H,
}

/// Ordered table of `pattern → handler` registrations
#[derive(Debug, Clone)]
pub struct HookRegistry<H> {
    entries: Vec<(HookPattern, H)>,
}

impl<H> Default for HookRegistry<H> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<H: Clone> HookRegistry<H> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a relation expression
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPattern` if the expression does not parse.
    pub fn register(&mut self, pattern: &str, handler: H) -> Result<()> {
        let pattern = HookPattern::parse(pattern)?;
        tracing::debug!("Registered hook pattern {}", pattern);
        self.entries.push((pattern, handler));
        Ok(())
    }

    /// All registrations, in registration order
    pub fn entries(&self) -> &[(HookPattern, H)] {
        &self.entries
    }

    /// Registered pattern strings, verbatim
    pub fn patterns(&self) -> Vec<&str> {
        self.entries.iter().map(|(p, _)| p.as_str()).collect()
    }

    /// Find every handler registered for a hook
    ///
    /// # Parameters
    ///
    /// - `hook_name`: Concrete hook being executed
    /// - `endpoints`: Endpoints declared by the charm, used to expand
    ///   `{role:interface}` selectors
    ///
    /// # Returns
    ///
    /// Matching handlers in registration order; empty if none apply.
    pub fn resolve(&self, hook_name: &str, endpoints: &[Endpoint]) -> Vec<ResolvedHook<H>> {
        self.entries
            .iter()
            .filter_map(|(pattern, handler)| {
                pattern
                    .matches(hook_name, endpoints)
                    .map(|expanded| ResolvedHook {
                        relation_name: expanded.relation_name,
                        handler: handler.clone(),
                    })
            })
            .collect()
    }

    /// Number of registrations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
