// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::schema::profiles;

/// Field names a visibility policy may expose to non-owners.
///
/// `display_name`, `is_anonymous` and `created_at` are deliberately absent:
/// those are only ever shown to the profile owner. Unrecognized names in
/// stored policies parse as `Unknown` and are never projected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ProfileField {
    Username,
    Avatar,
    Bio,
    Interests,
    Unknown,
}

impl From<String> for ProfileField {
    fn from(value: String) -> Self {
        match value.as_str() {
            "username" => ProfileField::Username,
            "avatar" => ProfileField::Avatar,
            "bio" => ProfileField::Bio,
            "interests" => ProfileField::Interests,
            _ => ProfileField::Unknown,
        }
    }
}

/// One layer of a visibility policy: the fields exposed at that tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierFields {
    #[serde(default)]
    pub fields: Vec<ProfileField>,
}

impl TierFields {
    pub fn new(fields: &[ProfileField]) -> Self {
        Self {
            fields: fields.to_vec(),
        }
    }
}

/// Per-tier field exposure lists declared by the profile owner.
///
/// A missing layer means "use the configured fallback", which is how
/// partially written policies degrade to minimal disclosure instead of
/// failing a read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<TierFields>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower: Option<TierFields>,
    #[serde(default, rename = "closeFriend", skip_serializing_if = "Option::is_none")]
    pub close_friend: Option<TierFields>,
}

/// Trust level carried by a relationship edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum EdgeTier {
    Close,
    Follower,
    Blocked,
    Unknown,
}

impl From<String> for EdgeTier {
    fn from(value: String) -> Self {
        match value.as_str() {
            "close" => EdgeTier::Close,
            "follower" => EdgeTier::Follower,
            "blocked" => EdgeTier::Blocked,
            _ => EdgeTier::Unknown,
        }
    }
}

/// Directed relationship record held by the viewing profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationshipEdge {
    pub peer_profile_id: Uuid,
    pub tier: EdgeTier,
}

/// Resolved trust level between a viewer and a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipTier {
    Owner,
    Close,
    Follower,
    Blocked,
    Public,
}

impl From<EdgeTier> for RelationshipTier {
    fn from(tier: EdgeTier) -> Self {
        match tier {
            EdgeTier::Close => RelationshipTier::Close,
            EdgeTier::Follower => RelationshipTier::Follower,
            EdgeTier::Blocked => RelationshipTier::Blocked,
            // malformed edge tiers resolve to the lowest trust level
            EdgeTier::Unknown => RelationshipTier::Public,
        }
    }
}

impl fmt::Display for RelationshipTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RelationshipTier::Owner => "owner",
            RelationshipTier::Close => "close",
            RelationshipTier::Follower => "follower",
            RelationshipTier::Blocked => "blocked",
            RelationshipTier::Public => "public",
        };
        f.write_str(name)
    }
}

/// A persona owned by a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub interests: Vec<String>,
    pub is_anonymous: bool,
    pub visibility: VisibilityPolicy,
    pub relationships: Vec<RelationshipEdge>,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Profile {
    /// Build a fresh persona record (version 0, timestamps now).
    pub fn create(
        user_id: Uuid,
        username: String,
        display_name: Option<String>,
        bio: Option<String>,
        interests: Vec<String>,
        is_anonymous: bool,
        visibility: VisibilityPolicy,
    ) -> Self {
        let now = chrono::Utc::now().naive_utc();
        Profile {
            id: Uuid::new_v4(),
            user_id,
            username,
            display_name,
            bio,
            avatar_url: None,
            interests,
            is_anonymous,
            visibility,
            relationships: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn edge_to(&self, peer: Uuid) -> Option<&RelationshipEdge> {
        self.relationships
            .iter()
            .find(|edge| edge.peer_profile_id == peer)
    }
}

/// Raw database row; the jsonb columns are decoded into the domain type
/// through [`ProfileRecord::into_domain`].
#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = profiles)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub interests: Vec<String>,
    pub is_anonymous: bool,
    pub visibility: serde_json::Value,
    pub relationships: serde_json::Value,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl ProfileRecord {
    /// Decode the jsonb columns, degrading malformed data to the most
    /// restrictive interpretation instead of failing the read.
    pub fn into_domain(self) -> Profile {
        let visibility = serde_json::from_value(self.visibility).unwrap_or_else(|e| {
            warn!(profile = %self.id, "stored visibility policy is malformed, treating as empty: {e}");
            VisibilityPolicy::default()
        });
        let relationships = serde_json::from_value(self.relationships).unwrap_or_else(|e| {
            warn!(profile = %self.id, "stored relationship list is malformed, treating as empty: {e}");
            Vec::new()
        });
        Profile {
            id: self.id,
            user_id: self.user_id,
            username: self.username,
            display_name: self.display_name,
            bio: self.bio,
            avatar_url: self.avatar_url,
            interests: self.interests,
            is_anonymous: self.is_anonymous,
            visibility,
            relationships,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = profiles)]
pub struct NewProfileRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub interests: Vec<String>,
    pub is_anonymous: bool,
    pub visibility: serde_json::Value,
    pub relationships: serde_json::Value,
    pub version: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<&Profile> for NewProfileRecord {
    fn from(profile: &Profile) -> Self {
        NewProfileRecord {
            id: profile.id,
            user_id: profile.user_id,
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            bio: profile.bio.clone(),
            avatar_url: profile.avatar_url.clone(),
            interests: profile.interests.clone(),
            is_anonymous: profile.is_anonymous,
            visibility: serde_json::to_value(&profile.visibility).unwrap_or_default(),
            relationships: serde_json::to_value(&profile.relationships).unwrap_or_default(),
            version: profile.version,
            created_at: profile.created_at,
            updated_at: profile.updated_at,
        }
    }
}

/// Whole-record changeset applied by `save_profile`; bumps the version.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = profiles, treat_none_as_null = true)]
pub struct ProfileChangeset {
    pub username: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub interests: Vec<String>,
    pub is_anonymous: bool,
    pub visibility: serde_json::Value,
    pub relationships: serde_json::Value,
    pub version: i32,
    pub updated_at: NaiveDateTime,
}

impl From<&Profile> for ProfileChangeset {
    fn from(profile: &Profile) -> Self {
        ProfileChangeset {
            username: profile.username.clone(),
            display_name: profile.display_name.clone(),
            bio: profile.bio.clone(),
            avatar_url: profile.avatar_url.clone(),
            interests: profile.interests.clone(),
            is_anonymous: profile.is_anonymous,
            visibility: serde_json::to_value(&profile.visibility).unwrap_or_default(),
            relationships: serde_json::to_value(&profile.relationships).unwrap_or_default(),
            version: profile.version + 1,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
