//! Hook routing
//!
//! Relation expressions such as
//! `{provides:neutron-plugin}-relation-{joined,changed}` name the hooks a
//! handler reacts to. [`HookPattern`] parses and expands them against the
//! charm's endpoints; [`HookRegistry`] is the table handed to the dispatcher.

pub mod pattern;
pub mod registry;

pub use pattern::{ExpandedHook, HookPattern};
pub use registry::{HookRegistry, ResolvedHook};
