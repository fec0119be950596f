// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::profile::Profile;

pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("stale write: record version changed underneath the caller")]
    VersionConflict,
    #[error("username already taken")]
    UsernameTaken,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Persistence collaborator for profile records.
///
/// `save_profile` is a whole-record upsert guarded by the record's
/// `version` counter: the write only succeeds when the stored version still
/// matches the one the caller read, and bumps it by one. Concurrent
/// read-modify-write cycles on the same profile therefore cannot
/// interleave silently; callers retry on [`StoreError::VersionConflict`].
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, id: Uuid) -> Result<Profile, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Profile, StoreError>;

    /// Insert a new persona; fails with [`StoreError::UsernameTaken`] when
    /// the handle is already claimed.
    async fn insert_profile(&self, profile: Profile) -> Result<Profile, StoreError>;

    /// Versioned whole-record update; returns the record as stored.
    async fn save_profile(&self, profile: Profile) -> Result<Profile, StoreError>;

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Profile>, StoreError>;
}
