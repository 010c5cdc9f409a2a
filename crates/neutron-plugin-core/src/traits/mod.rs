//! Core traits for the neutron-plugin interface
//!
//! This module defines the abstract interfaces the hosting framework
//! implements so the provides side can act on a relation.
//!
//! - [`Relation`]: A named relation and the conversations inside it
//! - [`Conversation`]: Flags and remote data scoped to a group of peers

pub mod conversation;
pub mod relation;

pub use conversation::{Conversation, RemoteData};
pub use relation::{Relation, Scope};
