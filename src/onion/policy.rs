// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::models::profile::{
    Profile, ProfileField, RelationshipTier, TierFields, VisibilityPolicy,
};

/// Redacted projection of a profile. Absent fields were not visible at the
/// viewer's tier; `id` is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileView {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_anonymous: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<VisibilityPolicy>,
}

/// Applies a profile's visibility policy to a resolved viewer tier.
///
/// The engine is total: malformed or missing policy layers fall back to the
/// configured minimal-disclosure lists, never an error. Layer sets compose
/// cumulatively along the fixed ordering public < follower < close, so a
/// higher tier always sees a superset of a lower one.
pub struct VisibilityEngine {
    fallback: VisibilityPolicy,
}

impl VisibilityEngine {
    pub fn new(fallback: VisibilityPolicy) -> Self {
        Self { fallback }
    }

    /// The deduplicated field set visible at `tier`.
    pub fn allowed_fields(
        &self,
        policy: &VisibilityPolicy,
        tier: RelationshipTier,
    ) -> BTreeSet<ProfileField> {
        let mut allowed = BTreeSet::new();
        allowed.extend(layer(&policy.public, &self.fallback.public));
        if matches!(
            tier,
            RelationshipTier::Owner | RelationshipTier::Close | RelationshipTier::Follower
        ) {
            allowed.extend(layer(&policy.follower, &self.fallback.follower));
        }
        if matches!(tier, RelationshipTier::Owner | RelationshipTier::Close) {
            allowed.extend(layer(&policy.close_friend, &self.fallback.close_friend));
        }
        // names outside the exposable enum are never projected
        allowed.remove(&ProfileField::Unknown);
        allowed
    }

    /// Project `profile` onto the field set visible at `tier`.
    pub fn project(&self, profile: &Profile, tier: RelationshipTier) -> ProfileView {
        if tier == RelationshipTier::Owner {
            return ProfileView {
                id: profile.id,
                username: Some(profile.username.clone()),
                display_name: profile.display_name.clone(),
                bio: profile.bio.clone(),
                avatar_url: profile.avatar_url.clone(),
                interests: Some(profile.interests.clone()),
                is_anonymous: Some(profile.is_anonymous),
                created_at: Some(profile.created_at),
                visibility: Some(profile.visibility.clone()),
            };
        }

        let allowed = self.allowed_fields(&profile.visibility, tier);
        ProfileView {
            id: profile.id,
            username: allowed
                .contains(&ProfileField::Username)
                .then(|| profile.username.clone()),
            display_name: None,
            bio: allowed
                .contains(&ProfileField::Bio)
                .then(|| profile.bio.clone())
                .flatten(),
            avatar_url: allowed
                .contains(&ProfileField::Avatar)
                .then(|| profile.avatar_url.clone())
                .flatten(),
            interests: allowed
                .contains(&ProfileField::Interests)
                .then(|| profile.interests.clone()),
            is_anonymous: None,
            created_at: None,
            visibility: None,
        }
    }
}

fn layer<'a>(
    slot: &'a Option<TierFields>,
    fallback: &'a Option<TierFields>,
) -> impl Iterator<Item = ProfileField> + 'a {
    slot.as_ref()
        .or(fallback.as_ref())
        .map(|tier| tier.fields.as_slice())
        .unwrap_or(&[])
        .iter()
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VisibilityConfig;
    use crate::models::profile::ProfileField::{Avatar, Bio, Interests, Username};
    use serde_json::json;
    use uuid::Uuid;

    fn engine() -> VisibilityEngine {
        VisibilityEngine::new(VisibilityConfig::default().fallback_policy)
    }

    fn policy(
        public: &[ProfileField],
        follower: &[ProfileField],
        close_friend: &[ProfileField],
    ) -> VisibilityPolicy {
        VisibilityPolicy {
            public: Some(TierFields::new(public)),
            follower: Some(TierFields::new(follower)),
            close_friend: Some(TierFields::new(close_friend)),
        }
    }

    fn sample_profile(visibility: VisibilityPolicy) -> Profile {
        let mut profile = Profile::create(
            Uuid::new_v4(),
            "alice".to_string(),
            Some("Alice".to_string()),
            Some("gardener of layered things".to_string()),
            vec!["rust".to_string(), "onions".to_string()],
            false,
            visibility,
        );
        profile.avatar_url = Some("https://cdn.onionpost.dev/a.png".to_string());
        profile
    }

    #[test]
    fn owner_sees_every_field_including_the_policy() {
        let profile = sample_profile(policy(&[Username], &[], &[]));
        let view = engine().project(&profile, RelationshipTier::Owner);

        assert_eq!(view.username.as_deref(), Some("alice"));
        assert_eq!(view.display_name.as_deref(), Some("Alice"));
        assert!(view.bio.is_some());
        assert!(view.avatar_url.is_some());
        assert!(view.interests.is_some());
        assert_eq!(view.is_anonymous, Some(false));
        assert!(view.created_at.is_some());
        assert_eq!(view.visibility.as_ref(), Some(&profile.visibility));
    }

    #[test]
    fn anonymous_viewer_gets_public_fields_and_id_only() {
        let profile = sample_profile(policy(&[Username, Avatar], &[Bio], &[Interests]));
        let view = engine().project(&profile, RelationshipTier::Public);

        assert_eq!(view.id, profile.id);
        assert_eq!(view.username.as_deref(), Some("alice"));
        assert!(view.avatar_url.is_some());
        assert!(view.bio.is_none());
        assert!(view.interests.is_none());
        assert!(view.display_name.is_none());
        assert!(view.is_anonymous.is_none());
        assert!(view.created_at.is_none());
        assert!(view.visibility.is_none());
    }

    #[test]
    fn follower_gains_bio_and_close_friend_gains_interests() {
        let profile = sample_profile(policy(&[Username, Avatar], &[Bio], &[Interests]));
        let engine = engine();

        let follower = engine.project(&profile, RelationshipTier::Follower);
        assert!(follower.username.is_some());
        assert!(follower.avatar_url.is_some());
        assert!(follower.bio.is_some());
        assert!(follower.interests.is_none());

        let close = engine.project(&profile, RelationshipTier::Close);
        assert!(close.username.is_some());
        assert!(close.avatar_url.is_some());
        assert!(close.bio.is_some());
        assert_eq!(
            close.interests,
            Some(vec!["rust".to_string(), "onions".to_string()])
        );
    }

    #[test]
    fn allowed_sets_are_monotonic_for_arbitrary_policies() {
        let engine = engine();
        let policies = [
            policy(&[Username, Avatar], &[Bio], &[Interests]),
            policy(&[], &[], &[]),
            policy(&[Bio], &[Bio], &[Bio]),
            policy(&[Interests], &[], &[Username, Avatar, Bio]),
            policy(&[Username, Username, Avatar], &[Avatar], &[]),
            VisibilityPolicy::default(),
            VisibilityPolicy {
                public: None,
                follower: Some(TierFields::new(&[Interests])),
                close_friend: None,
            },
        ];

        for policy in &policies {
            let public = engine.allowed_fields(policy, RelationshipTier::Public);
            let follower = engine.allowed_fields(policy, RelationshipTier::Follower);
            let close = engine.allowed_fields(policy, RelationshipTier::Close);
            assert!(public.is_subset(&follower), "public ⊆ follower for {policy:?}");
            assert!(follower.is_subset(&close), "follower ⊆ close for {policy:?}");
        }
    }

    #[test]
    fn duplicate_policy_entries_collapse() {
        let engine = engine();
        let policy = policy(&[Username, Avatar], &[Username, Bio], &[Bio, Bio]);
        let close = engine.allowed_fields(&policy, RelationshipTier::Close);
        assert_eq!(close.len(), 3);
    }

    #[test]
    fn blocked_viewers_are_projected_like_public() {
        let profile = sample_profile(policy(&[Username], &[Bio], &[Interests]));
        let engine = engine();
        assert_eq!(
            engine.project(&profile, RelationshipTier::Blocked),
            engine.project(&profile, RelationshipTier::Public)
        );
    }

    #[test]
    fn missing_layers_fall_back_to_configured_lists() {
        let engine = engine();
        let unset = VisibilityPolicy::default();
        let allowed = engine.allowed_fields(&unset, RelationshipTier::Close);
        // the shipped fallback exposes username and avatar at every tier
        assert_eq!(
            allowed.into_iter().collect::<Vec<_>>(),
            vec![Username, Avatar]
        );
    }

    #[test]
    fn unrecognized_policy_field_names_are_never_exposed() {
        let raw = json!({
            "public": { "fields": ["username", "password", "email"] },
            "follower": { "fields": ["secrets"] }
        });
        let policy: VisibilityPolicy = serde_json::from_value(raw).expect("lenient parse");
        let allowed = engine().allowed_fields(&policy, RelationshipTier::Follower);
        assert_eq!(allowed.into_iter().collect::<Vec<_>>(), vec![Username]);
    }

    #[test]
    fn malformed_policy_json_degrades_instead_of_failing() {
        let policy: VisibilityPolicy = serde_json::from_value(json!({})).expect("empty object");
        assert_eq!(policy, VisibilityPolicy::default());

        // a layer with the wrong shape is a parse error upstream; the store
        // maps that to an empty policy, which the engine still serves
        let profile = sample_profile(VisibilityPolicy::default());
        let view = engine().project(&profile, RelationshipTier::Public);
        assert!(view.username.is_some());
        assert!(view.bio.is_none());
    }
}
