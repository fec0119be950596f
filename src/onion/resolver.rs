// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use uuid::Uuid;

use crate::models::profile::{Profile, RelationshipTier};

/// Resolve the trust tier between a viewer and a target profile.
///
/// Pure lookup over the target's edge list: anonymous viewers are
/// `public`, the profile itself is `owner`, everyone else gets the tier of
/// the target's edge to them (or `public` when there is none).
pub fn resolve_tier(target: &Profile, viewer: Option<Uuid>) -> RelationshipTier {
    let Some(viewer) = viewer else {
        return RelationshipTier::Public;
    };
    if viewer == target.id {
        return RelationshipTier::Owner;
    }
    target
        .edge_to(viewer)
        .map(|edge| edge.tier.into())
        .unwrap_or(RelationshipTier::Public)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::{EdgeTier, RelationshipEdge, VisibilityPolicy};

    fn profile_with_edges(edges: Vec<RelationshipEdge>) -> Profile {
        let mut profile = Profile::create(
            Uuid::new_v4(),
            "alice".to_string(),
            Some("Alice".to_string()),
            None,
            Vec::new(),
            false,
            VisibilityPolicy::default(),
        );
        profile.relationships = edges;
        profile
    }

    #[test]
    fn anonymous_viewer_is_public() {
        let profile = profile_with_edges(Vec::new());
        assert_eq!(resolve_tier(&profile, None), RelationshipTier::Public);
    }

    #[test]
    fn profile_views_itself_as_owner() {
        let profile = profile_with_edges(Vec::new());
        assert_eq!(
            resolve_tier(&profile, Some(profile.id)),
            RelationshipTier::Owner
        );
    }

    #[test]
    fn edge_tier_is_reported() {
        let close = Uuid::new_v4();
        let follower = Uuid::new_v4();
        let blocked = Uuid::new_v4();
        let profile = profile_with_edges(vec![
            RelationshipEdge {
                peer_profile_id: close,
                tier: EdgeTier::Close,
            },
            RelationshipEdge {
                peer_profile_id: follower,
                tier: EdgeTier::Follower,
            },
            RelationshipEdge {
                peer_profile_id: blocked,
                tier: EdgeTier::Blocked,
            },
        ]);

        assert_eq!(resolve_tier(&profile, Some(close)), RelationshipTier::Close);
        assert_eq!(
            resolve_tier(&profile, Some(follower)),
            RelationshipTier::Follower
        );
        assert_eq!(
            resolve_tier(&profile, Some(blocked)),
            RelationshipTier::Blocked
        );
    }

    #[test]
    fn stranger_is_public() {
        let profile = profile_with_edges(vec![RelationshipEdge {
            peer_profile_id: Uuid::new_v4(),
            tier: EdgeTier::Close,
        }]);
        assert_eq!(
            resolve_tier(&profile, Some(Uuid::new_v4())),
            RelationshipTier::Public
        );
    }

    #[test]
    fn malformed_edge_tier_resolves_to_public() {
        let peer = Uuid::new_v4();
        let profile = profile_with_edges(vec![RelationshipEdge {
            peer_profile_id: peer,
            tier: EdgeTier::Unknown,
        }]);
        assert_eq!(resolve_tier(&profile, Some(peer)), RelationshipTier::Public);
    }
}
