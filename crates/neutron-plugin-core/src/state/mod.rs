// # Relation Implementations
//
// In-memory implementation of the relation traits, plus the JSON snapshot
// the hook runner uses to carry relation state between invocations.

pub mod memory;
pub mod snapshot;

pub use memory::{ConversationRecord, MemoryConversation, MemoryRelation};
pub use snapshot::RelationSnapshot;
