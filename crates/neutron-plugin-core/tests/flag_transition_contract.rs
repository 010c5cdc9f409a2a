//! Contract Test: Connected Flag Transitions
//!
//! The provides side is a two-state machine driven only by lifecycle
//! hooks. Downstream reactive handlers gate on `{relation_name}.connected`.
//!
//! Constraints verified:
//! - `changed` sets the rendered flag exactly once per call
//! - `broken` removes the rendered flag exactly once per call
//! - Both transitions are idempotent
//! - The flag name always carries the concrete relation name

mod common;

use common::*;
use neutron_plugin_core::{MemoryRelation, ProvidesHook, Scope};
use std::path::Path;
use std::sync::Arc;

const NO_KEY_FILE: &str = "/nonexistent/rndc.key";

#[tokio::test]
async fn changed_sets_connected_flag_once() {
    let (relation, conversation) = RecordingRelation::single("some-relation");
    let provides = provides_for(relation, Path::new(NO_KEY_FILE));

    provides.changed().await.expect("changed succeeds");

    assert_eq!(
        conversation.calls(),
        vec![Call::SetFlag("some-relation.connected".into())]
    );
}

#[tokio::test]
async fn broken_removes_connected_flag_once() {
    let (relation, conversation) = RecordingRelation::single("some-relation");
    let provides = provides_for(relation, Path::new(NO_KEY_FILE));

    provides.broken().await.expect("broken succeeds");

    assert_eq!(
        conversation.calls(),
        vec![Call::RemoveFlag("some-relation.connected".into())]
    );
}

#[tokio::test]
async fn departed_removes_related_flag() {
    let (relation, conversation) = RecordingRelation::single("some-relation");
    let provides = provides_for(relation, Path::new(NO_KEY_FILE));

    provides.departed().await.expect("departed succeeds");

    assert_eq!(
        conversation.calls(),
        vec![Call::RemoveFlag("some-relation.related".into())]
    );
}

#[tokio::test]
async fn transitions_ignore_prior_state() {
    let (relation, conversation) = RecordingRelation::single("neutron-plugin");
    let provides = provides_for(relation, Path::new(NO_KEY_FILE));

    provides.changed().await.unwrap();
    provides.changed().await.unwrap();
    provides.broken().await.unwrap();
    provides.broken().await.unwrap();

    let flag = "neutron-plugin.connected".to_string();
    assert_eq!(
        conversation.calls(),
        vec![
            Call::SetFlag(flag.clone()),
            Call::SetFlag(flag.clone()),
            Call::RemoveFlag(flag.clone()),
            Call::RemoveFlag(flag),
        ]
    );
}

#[tokio::test]
async fn hook_handlers_drive_memory_relation() {
    let relation = Arc::new(MemoryRelation::new("neutron-plugin", Scope::Global));
    let provides = provides_for(relation.clone(), Path::new(NO_KEY_FILE));

    assert!(!provides.is_connected().await.unwrap());

    relation.join("nova-compute/0").await;
    ProvidesHook::Changed.invoke(&provides).await.unwrap();
    assert!(provides.is_connected().await.unwrap());

    ProvidesHook::Changed.invoke(&provides).await.unwrap();
    let conversations = relation.memory_conversations().await;
    assert_eq!(conversations[0].flags().await.len(), 1);

    ProvidesHook::Broken.invoke(&provides).await.unwrap();
    assert!(!provides.is_connected().await.unwrap());
}

#[tokio::test]
async fn broken_after_last_unit_departed_is_a_no_op() {
    let relation = Arc::new(MemoryRelation::new("neutron-plugin", Scope::Global));
    let provides = provides_for(relation.clone(), Path::new(NO_KEY_FILE));

    relation.join("nova-compute/0").await;
    provides.changed().await.unwrap();
    relation.depart("nova-compute/0").await;

    provides.broken().await.expect("nothing left to clear");
    assert!(!provides.is_connected().await.unwrap());
}

#[tokio::test]
async fn changed_without_conversation_fails() {
    let relation = Arc::new(MemoryRelation::new("neutron-plugin", Scope::Global));
    let provides = provides_for(relation, Path::new(NO_KEY_FILE));

    let err = provides.changed().await.unwrap_err();
    assert!(matches!(
        err,
        neutron_plugin_core::Error::NoConversation { .. }
    ));
}
