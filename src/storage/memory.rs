// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use super::{ProfileStore, StoreError};
use crate::models::profile::Profile;

/// In-memory profile store with the same versioning semantics as the
/// PostgreSQL implementation. Used by tests and local development.
#[derive(Default)]
pub struct MemoryProfileStore {
    records: RwLock<HashMap<Uuid, Profile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get_profile(&self, id: Uuid) -> Result<Profile, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records.get(&id).cloned().ok_or(StoreError::NotFound)
    }

    async fn find_by_username(&self, username: &str) -> Result<Profile, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        records
            .values()
            .find(|profile| profile.username == username)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn insert_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        if records
            .values()
            .any(|existing| existing.username == profile.username)
        {
            return Err(StoreError::UsernameTaken);
        }
        records.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn save_profile(&self, mut profile: Profile) -> Result<Profile, StoreError> {
        let mut records = self.records.write().unwrap_or_else(|e| e.into_inner());
        let stored = records.get(&profile.id).ok_or(StoreError::NotFound)?;
        if stored.version != profile.version {
            return Err(StoreError::VersionConflict);
        }
        profile.version += 1;
        profile.updated_at = chrono::Utc::now().naive_utc();
        records.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Profile>, StoreError> {
        let records = self.records.read().unwrap_or_else(|e| e.into_inner());
        let mut profiles: Vec<Profile> = records
            .values()
            .filter(|profile| profile.user_id == user_id)
            .cloned()
            .collect();
        profiles.sort_by_key(|profile| profile.created_at);
        Ok(profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::VisibilityPolicy;

    fn persona(username: &str) -> Profile {
        Profile::create(
            Uuid::new_v4(),
            username.to_string(),
            None,
            None,
            Vec::new(),
            false,
            VisibilityPolicy::default(),
        )
    }

    #[tokio::test]
    async fn stale_saves_are_rejected() {
        let store = MemoryProfileStore::new();
        let profile = store.insert_profile(persona("alice")).await.unwrap();

        let copy_a = store.get_profile(profile.id).await.unwrap();
        let copy_b = store.get_profile(profile.id).await.unwrap();

        let saved = store.save_profile(copy_a).await.unwrap();
        assert_eq!(saved.version, 1);

        let err = store.save_profile(copy_b).await.unwrap_err();
        assert!(matches!(err, StoreError::VersionConflict));
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let store = MemoryProfileStore::new();
        store.insert_profile(persona("alice")).await.unwrap();
        let err = store.insert_profile(persona("alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken));
    }

    #[tokio::test]
    async fn saving_a_missing_record_is_not_found() {
        let store = MemoryProfileStore::new();
        let err = store.save_profile(persona("ghost")).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
    }
}
