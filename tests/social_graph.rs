// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

//! Relationship-tier transition laws and onion views, exercised end to end
//! over the in-memory store.

use std::sync::Arc;

use uuid::Uuid;

use onionpost_api::config::VisibilityConfig;
use onionpost_api::models::profile::{EdgeTier, Profile, RelationshipEdge, RelationshipTier};
use onionpost_api::onion::VisibilityEngine;
use onionpost_api::social_graph::{GraphError, SocialGraph};
use onionpost_api::storage::memory::MemoryProfileStore;
use onionpost_api::storage::ProfileStore;

struct Fixture {
    store: Arc<MemoryProfileStore>,
    graph: SocialGraph,
    alice: Profile,
    bob: Profile,
}

async fn fixture() -> Fixture {
    let store = Arc::new(MemoryProfileStore::new());
    let config = VisibilityConfig::default();
    let graph = SocialGraph::new(
        store.clone() as Arc<dyn ProfileStore>,
        VisibilityEngine::new(config.fallback_policy.clone()),
    );

    let mut alice = Profile::create(
        Uuid::new_v4(),
        "alice".to_string(),
        Some("Alice".to_string()),
        Some("gardener of layered things".to_string()),
        vec!["rust".to_string(), "onions".to_string()],
        false,
        config.default_policy.clone(),
    );
    alice.avatar_url = Some("https://cdn.onionpost.dev/alice.png".to_string());
    let alice = store.insert_profile(alice).await.unwrap();

    let bob = store
        .insert_profile(Profile::create(
            Uuid::new_v4(),
            "bob".to_string(),
            Some("Bob".to_string()),
            None,
            Vec::new(),
            false,
            config.default_policy,
        ))
        .await
        .unwrap();

    Fixture {
        store,
        graph,
        alice,
        bob,
    }
}

async fn edges_of(store: &MemoryProfileStore, id: Uuid) -> Vec<RelationshipEdge> {
    store.get_profile(id).await.unwrap().relationships
}

#[tokio::test]
async fn self_follow_and_self_close_are_rejected() {
    let f = fixture().await;

    let err = f.graph.follow(f.bob.id, f.bob.id).await.unwrap_err();
    assert!(matches!(err, GraphError::InvalidTarget));

    let err = f
        .graph
        .add_close_friend(f.bob.id, f.bob.id)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::InvalidTarget));
}

#[tokio::test]
async fn following_a_missing_target_is_not_found() {
    let f = fixture().await;
    let err = f.graph.follow(f.bob.id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, GraphError::NotFound));
}

#[tokio::test]
async fn unfollow_without_an_edge_is_a_no_op() {
    let f = fixture().await;
    f.graph.unfollow(f.bob.id, f.alice.id).await.unwrap();
    assert!(edges_of(&f.store, f.bob.id).await.is_empty());
}

#[tokio::test]
async fn follow_then_close_leaves_a_single_close_edge() {
    let f = fixture().await;

    let tier = f.graph.follow(f.bob.id, f.alice.id).await.unwrap();
    assert_eq!(tier, RelationshipTier::Follower);

    let tier = f.graph.add_close_friend(f.bob.id, f.alice.id).await.unwrap();
    assert_eq!(tier, RelationshipTier::Close);

    let edges = edges_of(&f.store, f.bob.id).await;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].peer_profile_id, f.alice.id);
    assert_eq!(edges[0].tier, EdgeTier::Close);
}

#[tokio::test]
async fn removing_a_close_friend_downgrades_to_follower() {
    let f = fixture().await;
    f.graph.add_close_friend(f.bob.id, f.alice.id).await.unwrap();

    let remaining = f
        .graph
        .remove_close_friend(f.bob.id, f.alice.id)
        .await
        .unwrap();
    assert_eq!(remaining, Some(RelationshipTier::Follower));

    let edges = edges_of(&f.store, f.bob.id).await;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].tier, EdgeTier::Follower);
}

#[tokio::test]
async fn removing_a_plain_follower_deletes_the_edge() {
    let f = fixture().await;
    f.graph.follow(f.bob.id, f.alice.id).await.unwrap();

    let remaining = f
        .graph
        .remove_close_friend(f.bob.id, f.alice.id)
        .await
        .unwrap();
    assert_eq!(remaining, None);
    assert!(edges_of(&f.store, f.bob.id).await.is_empty());
}

#[tokio::test]
async fn removing_without_any_edge_is_not_found() {
    let f = fixture().await;
    let err = f
        .graph
        .remove_close_friend(f.bob.id, f.alice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::NotFound));
}

#[tokio::test]
async fn following_a_close_friend_downgrades_the_edge() {
    let f = fixture().await;
    f.graph.add_close_friend(f.bob.id, f.alice.id).await.unwrap();

    let tier = f.graph.follow(f.bob.id, f.alice.id).await.unwrap();
    assert_eq!(tier, RelationshipTier::Follower);

    let edges = edges_of(&f.store, f.bob.id).await;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].tier, EdgeTier::Follower);
}

#[tokio::test]
async fn at_most_one_edge_survives_any_operation_sequence() {
    let f = fixture().await;

    f.graph.follow(f.bob.id, f.alice.id).await.unwrap();
    f.graph.add_close_friend(f.bob.id, f.alice.id).await.unwrap();
    f.graph.follow(f.bob.id, f.alice.id).await.unwrap();
    f.graph
        .remove_close_friend(f.bob.id, f.alice.id)
        .await
        .unwrap();
    f.graph.follow(f.bob.id, f.alice.id).await.unwrap();
    f.graph.unfollow(f.bob.id, f.alice.id).await.unwrap();
    f.graph.add_close_friend(f.bob.id, f.alice.id).await.unwrap();

    let edges = edges_of(&f.store, f.bob.id).await;
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].tier, EdgeTier::Close);
}

#[test_log::test(tokio::test)]
async fn promoting_a_follower_widens_their_view() {
    let f = fixture().await;

    // note: visibility follows ALICE's edge list, so Alice follows/promotes Bob
    f.graph.follow(f.alice.id, f.bob.id).await.unwrap();
    let view = f
        .graph
        .profile_view(f.alice.id, Some(f.bob.id))
        .await
        .unwrap();
    assert_eq!(view.relationship_level, RelationshipTier::Follower);
    assert_eq!(view.profile.username.as_deref(), Some("alice"));
    assert!(view.profile.avatar_url.is_some());
    assert!(view.profile.bio.is_some());
    assert!(view.profile.interests.is_none());

    f.graph.add_close_friend(f.alice.id, f.bob.id).await.unwrap();
    let view = f
        .graph
        .profile_view(f.alice.id, Some(f.bob.id))
        .await
        .unwrap();
    assert_eq!(view.relationship_level, RelationshipTier::Close);
    assert!(view.profile.interests.is_some());
}

#[tokio::test]
async fn anonymous_view_is_minimal() {
    let f = fixture().await;
    let view = f.graph.profile_view(f.alice.id, None).await.unwrap();

    assert_eq!(view.relationship_level, RelationshipTier::Public);
    assert_eq!(view.profile.id, f.alice.id);
    assert!(view.profile.username.is_some());
    assert!(view.profile.avatar_url.is_some());
    assert!(view.profile.bio.is_none());
    assert!(view.profile.interests.is_none());
    assert!(view.profile.visibility.is_none());
}

#[tokio::test]
async fn owner_view_includes_the_policy_itself() {
    let f = fixture().await;
    let view = f
        .graph
        .profile_view(f.alice.id, Some(f.alice.id))
        .await
        .unwrap();

    assert_eq!(view.relationship_level, RelationshipTier::Owner);
    assert!(view.profile.visibility.is_some());
    assert!(view.profile.created_at.is_some());
    assert_eq!(view.profile.is_anonymous, Some(false));
}

#[tokio::test]
async fn blocked_viewers_see_the_public_layer() {
    let f = fixture().await;

    // block edges have no dedicated operation yet; write one directly
    let mut alice = f.store.get_profile(f.alice.id).await.unwrap();
    alice.relationships.push(RelationshipEdge {
        peer_profile_id: f.bob.id,
        tier: EdgeTier::Blocked,
    });
    f.store.save_profile(alice).await.unwrap();

    let view = f
        .graph
        .profile_view(f.alice.id, Some(f.bob.id))
        .await
        .unwrap();
    assert_eq!(view.relationship_level, RelationshipTier::Blocked);
    assert!(view.profile.username.is_some());
    assert!(view.profile.bio.is_none());
    assert!(view.profile.interests.is_none());
}

#[test_log::test(tokio::test)]
async fn view_by_username_matches_view_by_id() {
    let f = fixture().await;
    f.graph.follow(f.alice.id, f.bob.id).await.unwrap();

    let by_id = f
        .graph
        .profile_view(f.alice.id, Some(f.bob.id))
        .await
        .unwrap();
    let by_name = f
        .graph
        .profile_view_by_username("alice", Some(f.bob.id))
        .await
        .unwrap();

    assert_eq!(by_id.profile, by_name.profile);
    assert_eq!(by_id.relationship_level, by_name.relationship_level);
}
