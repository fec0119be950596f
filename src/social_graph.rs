// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::profile::{EdgeTier, RelationshipEdge, RelationshipTier};
use crate::onion::{resolve_tier, ProfileView, VisibilityEngine};
use crate::storage::{ProfileStore, StoreError};

/// How many times a read-modify-write cycle is retried when another writer
/// bumps the profile version underneath it.
const MAX_WRITE_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("profile not found")]
    NotFound,
    #[error("operation cannot target the acting profile")]
    InvalidTarget,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for GraphError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => GraphError::NotFound,
            other => GraphError::Store(other),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileViewResponse {
    pub profile: ProfileView,
    pub relationship_level: RelationshipTier,
}

/// Relationship edges plus onion-view orchestration over the profile store.
///
/// All mutations touch only the acting viewer's own record; the target is
/// read just to confirm it exists. Writes go through a bounded retry loop
/// on version conflicts (see the store contract).
pub struct SocialGraph {
    store: Arc<dyn ProfileStore>,
    engine: VisibilityEngine,
}

impl SocialGraph {
    pub fn new(store: Arc<dyn ProfileStore>, engine: VisibilityEngine) -> Self {
        Self { store, engine }
    }

    /// Redacted view of `target` as seen by `viewer`.
    pub async fn profile_view(
        &self,
        target: Uuid,
        viewer: Option<Uuid>,
    ) -> Result<ProfileViewResponse, GraphError> {
        let profile = self.store.get_profile(target).await?;
        let tier = resolve_tier(&profile, viewer);
        debug!(profile = %target, tier = %tier, "resolved viewer tier");
        Ok(ProfileViewResponse {
            profile: self.engine.project(&profile, tier),
            relationship_level: tier,
        })
    }

    /// Same as [`profile_view`](Self::profile_view), addressed by handle.
    pub async fn profile_view_by_username(
        &self,
        username: &str,
        viewer: Option<Uuid>,
    ) -> Result<ProfileViewResponse, GraphError> {
        let profile = self.store.find_by_username(username).await?;
        let tier = resolve_tier(&profile, viewer);
        Ok(ProfileViewResponse {
            profile: self.engine.project(&profile, tier),
            relationship_level: tier,
        })
    }

    /// Follow `target`. An existing edge of any tier is set to `follower`,
    /// so following a close friend downgrades them.
    pub async fn follow(
        &self,
        viewer: Uuid,
        target: Uuid,
    ) -> Result<RelationshipTier, GraphError> {
        self.check_target(viewer, target).await?;
        self.mutate_edges(viewer, |edges| {
            upsert_edge(edges, target, EdgeTier::Follower);
            Ok(())
        })
        .await?;
        info!(viewer = %viewer, peer = %target, "followed profile");
        Ok(RelationshipTier::Follower)
    }

    /// Drop any edge to `target`, regardless of tier. Idempotent: a missing
    /// edge (or even a missing target) is not an error.
    pub async fn unfollow(&self, viewer: Uuid, target: Uuid) -> Result<(), GraphError> {
        self.mutate_edges(viewer, |edges| {
            edges.retain(|edge| edge.peer_profile_id != target);
            Ok(())
        })
        .await?;
        info!(viewer = %viewer, peer = %target, "unfollowed profile");
        Ok(())
    }

    pub async fn add_close_friend(
        &self,
        viewer: Uuid,
        target: Uuid,
    ) -> Result<RelationshipTier, GraphError> {
        self.check_target(viewer, target).await?;
        self.mutate_edges(viewer, |edges| {
            upsert_edge(edges, target, EdgeTier::Close);
            Ok(())
        })
        .await?;
        info!(viewer = %viewer, peer = %target, "added close friend");
        Ok(RelationshipTier::Close)
    }

    /// Demote a close friend back to follower; an edge that never was close
    /// is deleted outright. Returns the remaining tier, if any.
    pub async fn remove_close_friend(
        &self,
        viewer: Uuid,
        target: Uuid,
    ) -> Result<Option<RelationshipTier>, GraphError> {
        let remaining = self
            .mutate_edges(viewer, |edges| {
                let index = edges
                    .iter()
                    .position(|edge| edge.peer_profile_id == target)
                    .ok_or(GraphError::NotFound)?;
                if edges[index].tier == EdgeTier::Close {
                    edges[index].tier = EdgeTier::Follower;
                    Ok(Some(RelationshipTier::Follower))
                } else {
                    edges.remove(index);
                    Ok(None)
                }
            })
            .await?;
        info!(viewer = %viewer, peer = %target, "removed close friend");
        Ok(remaining)
    }

    /// The viewer's own outbound edge list.
    pub async fn relationships(&self, viewer: Uuid) -> Result<Vec<RelationshipEdge>, GraphError> {
        let profile = self.store.get_profile(viewer).await?;
        Ok(profile.relationships)
    }

    async fn check_target(&self, viewer: Uuid, target: Uuid) -> Result<(), GraphError> {
        if viewer == target {
            return Err(GraphError::InvalidTarget);
        }
        self.store.get_profile(target).await?;
        Ok(())
    }

    async fn mutate_edges<T>(
        &self,
        viewer: Uuid,
        op: impl Fn(&mut Vec<RelationshipEdge>) -> Result<T, GraphError>,
    ) -> Result<T, GraphError> {
        let mut attempts = 0;
        loop {
            let mut profile = self.store.get_profile(viewer).await?;
            let outcome = op(&mut profile.relationships)?;
            match self.store.save_profile(profile).await {
                Ok(_) => return Ok(outcome),
                Err(StoreError::VersionConflict) => {
                    attempts += 1;
                    if attempts >= MAX_WRITE_ATTEMPTS {
                        return Err(GraphError::Store(StoreError::VersionConflict));
                    }
                    warn!(profile = %viewer, attempts, "relationship write raced, retrying");
                }
                Err(other) => return Err(other.into()),
            }
        }
    }
}

/// Point the edge to `peer` at `tier`, inserting it if absent. Keeps the
/// at-most-one-edge-per-peer invariant.
fn upsert_edge(edges: &mut Vec<RelationshipEdge>, peer: Uuid, tier: EdgeTier) {
    match edges.iter_mut().find(|edge| edge.peer_profile_id == peer) {
        Some(edge) => edge.tier = tier,
        None => edges.push(RelationshipEdge {
            peer_profile_id: peer,
            tier,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_edge_never_duplicates_a_peer() {
        let peer = Uuid::new_v4();
        let mut edges = Vec::new();

        upsert_edge(&mut edges, peer, EdgeTier::Follower);
        upsert_edge(&mut edges, peer, EdgeTier::Close);
        upsert_edge(&mut edges, peer, EdgeTier::Follower);

        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].tier, EdgeTier::Follower);
    }
}
