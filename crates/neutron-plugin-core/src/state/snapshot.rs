// # Relation Snapshot
//
// JSON form of a MemoryRelation, used by the hook runner to carry relation
// state from one hook invocation to the next.
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "relation_name": "neutron-plugin",
//   "scope": "global",
//   "remote_unit": "nova-compute/0",
//   "conversations": [
//     {
//       "scope": "global",
//       "units": ["nova-compute/0"],
//       "flags": ["neutron-plugin.connected"],
//       "local": {"neutron-plugin": "ovs"},
//       "remote": {"nova-compute/0": {"private-address": "10.0.0.10"}}
//     }
//   ]
// }
// ```
//
// Writes go to a temporary file that is then renamed over the snapshot.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{Error, Result};
use crate::state::memory::ConversationRecord;
use crate::traits::Scope;

/// Snapshot format version
const SNAPSHOT_VERSION: &str = "1.0";

/// Serializable relation state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSnapshot {
    /// Format version
    pub version: String,
    /// Relation name
    pub relation_name: String,
    /// Conversation scope
    #[serde(default)]
    pub scope: Scope,
    /// Remote unit of the last executed hook
    #[serde(default)]
    pub remote_unit: Option<String>,
    /// Conversations in iteration order
    #[serde(default)]
    pub conversations: Vec<ConversationRecord>,
}

impl RelationSnapshot {
    /// Create a snapshot at the current format version
    pub fn new(
        relation_name: impl Into<String>,
        scope: Scope,
        remote_unit: Option<String>,
        conversations: Vec<ConversationRecord>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            relation_name: relation_name.into(),
            scope,
            remote_unit,
            conversations,
        }
    }

    /// Load a snapshot from disk
    ///
    /// # Returns
    ///
    /// - `Ok(Some(snapshot))`: The file exists and parsed
    /// - `Ok(None)`: No snapshot has been written yet
    /// - `Err(Error)`: The file could not be read or parsed
    pub async fn load(path: &Path) -> Result<Option<Self>> {
        if !fs::try_exists(path).await? {
            tracing::debug!("Snapshot does not exist: {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::snapshot(format!("Failed to read snapshot {}: {}", path.display(), e))
        })?;

        let snapshot: Self = serde_json::from_str(&content).map_err(|e| {
            Error::snapshot(format!(
                "Failed to parse snapshot {}: {}",
                path.display(),
                e
            ))
        })?;

        if snapshot.version != SNAPSHOT_VERSION {
            tracing::warn!(
                "Snapshot version mismatch: expected {}, got {}. Attempting to load anyway.",
                SNAPSHOT_VERSION,
                snapshot.version
            );
        }

        Ok(Some(snapshot))
    }

    /// Write the snapshot to disk atomically
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::snapshot(format!(
                    "Failed to create snapshot directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let json = serde_json::to_string_pretty(self)?;

        let temp_path = temp_path(path);
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::snapshot(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.write_all(json.as_bytes()).await?;
            file.flush().await?;
        }

        fs::rename(&temp_path, path).await.map_err(|e| {
            Error::snapshot(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))
        })?;

        tracing::trace!("Snapshot written to {}", path.display());
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    PathBuf::from(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryRelation;
    use crate::traits::{Conversation, RemoteData};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relation.json");

        let relation = MemoryRelation::new("neutron-plugin", Scope::Global);
        let conversation = relation.join("nova-compute/0").await;
        conversation.set_flag("neutron-plugin.connected").await.unwrap();
        conversation
            .set_remote(RemoteData::new().with("neutron-plugin", "ovs"))
            .await
            .unwrap();
        relation
            .publish("nova-compute/0", "private-address", "10.0.0.10")
            .await
            .unwrap();

        let snapshot = relation.snapshot().await;
        snapshot.save(&path).await.unwrap();
        assert!(!temp_path(&path).exists());

        let loaded = RelationSnapshot::load(&path).await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);

        let restored = MemoryRelation::from_snapshot(loaded);
        let conversations = restored.memory_conversations().await;
        assert!(
            conversations[0]
                .is_flag_set("neutron-plugin.connected")
                .await
                .unwrap()
        );
        assert_eq!(
            conversations[0].get_remote("private-address").await.unwrap().as_deref(),
            Some("10.0.0.10")
        );
    }

    #[tokio::test]
    async fn test_load_missing() {
        let dir = TempDir::new().unwrap();
        let loaded = RelationSnapshot::load(&dir.path().join("absent.json")).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_load_corrupted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("relation.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let err = RelationSnapshot::load(&path).await.unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
    }
}
