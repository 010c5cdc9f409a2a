// # neutron-plugin-core
//
// Provides side of the `neutron-plugin` relation interface.
//
// A subordinate neutron plugin charm uses this crate to tell its principal
// which plugin it implements and what configuration the principal should
// render. The framework that runs the charm owns event dispatch, relation
// storage and the transport between units; this crate only consumes them.
//
// ## Architecture Overview
//
// - **Relation / Conversation**: Traits the framework implements to expose a
//   relation and the per-peer conversations inside it
// - **NeutronPluginProvides**: State machine reacting to relation lifecycle
//   hooks and exchanging remote data with the principal
// - **HookRegistry**: Explicit table mapping relation-expression patterns to
//   handlers, built at startup and handed to the dispatcher
// - **MemoryRelation**: In-memory relation used by tests and the hook runner
//
// ## Event Flow
//
// 1. The framework fires a hook such as `neutron-plugin-relation-joined`
// 2. `HookRegistry::resolve()` maps the hook name to a `ProvidesHook`
// 3. The handler flips `{relation_name}.connected` on the current conversation
// 4. Reactive handlers gated on that flag call `configure_plugin()`

pub mod config;
pub mod error;
pub mod flags;
pub mod hooks;
pub mod provides;
pub mod state;
pub mod traits;

// Re-export core types for convenience
pub use config::{Endpoint, ProvidesConfig, Role};
pub use error::{Error, Result};
pub use flags::Flag;
pub use hooks::{HookPattern, HookRegistry};
pub use provides::{NeutronPluginProvides, ProvidesHook};
pub use state::{MemoryConversation, MemoryRelation, RelationSnapshot};
pub use traits::{Conversation, Relation, RemoteData, Scope};
