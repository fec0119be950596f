// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use super::{ProfileStore, StoreError};
use crate::db::{Database, DbConnection};
use crate::models::profile::{NewProfileRecord, Profile, ProfileChangeset, ProfileRecord};
use crate::schema::profiles;

/// PostgreSQL-backed profile store. Profiles are one row each; the
/// visibility policy and relationship edge list travel in jsonb columns so
/// every read and write covers the whole record.
pub struct PgProfileStore {
    db: Arc<Database>,
}

impl PgProfileStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn conn(&self) -> Result<DbConnection, StoreError> {
        self.db
            .get_connection()
            .await
            .map_err(StoreError::Backend)
    }
}

fn lookup_error(err: DieselError) -> StoreError {
    match err {
        DieselError::NotFound => StoreError::NotFound,
        other => StoreError::Backend(anyhow!("database error: {other}")),
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn get_profile(&self, id: Uuid) -> Result<Profile, StoreError> {
        let mut conn = self.conn().await?;
        let record = profiles::table
            .find(id)
            .first::<ProfileRecord>(&mut conn)
            .await
            .map_err(lookup_error)?;
        Ok(record.into_domain())
    }

    async fn find_by_username(&self, username: &str) -> Result<Profile, StoreError> {
        let mut conn = self.conn().await?;
        let record = profiles::table
            .filter(profiles::username.eq(username))
            .first::<ProfileRecord>(&mut conn)
            .await
            .map_err(lookup_error)?;
        Ok(record.into_domain())
    }

    async fn insert_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        let mut conn = self.conn().await?;
        let record = diesel::insert_into(profiles::table)
            .values(NewProfileRecord::from(&profile))
            .get_result::<ProfileRecord>(&mut conn)
            .await
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    StoreError::UsernameTaken
                }
                other => StoreError::Backend(anyhow!("database error: {other}")),
            })?;
        debug!(profile = %record.id, username = %record.username, "inserted profile");
        Ok(record.into_domain())
    }

    async fn save_profile(&self, profile: Profile) -> Result<Profile, StoreError> {
        let mut conn = self.conn().await?;
        let result = diesel::update(
            profiles::table
                .filter(profiles::id.eq(profile.id))
                .filter(profiles::version.eq(profile.version)),
        )
        .set(ProfileChangeset::from(&profile))
        .get_result::<ProfileRecord>(&mut conn)
        .await;

        match result {
            Ok(record) => Ok(record.into_domain()),
            // no row matched: either the record is gone or another writer
            // bumped the version first
            Err(DieselError::NotFound) => {
                let exists: i64 = profiles::table
                    .filter(profiles::id.eq(profile.id))
                    .count()
                    .get_result(&mut conn)
                    .await
                    .map_err(|e| StoreError::Backend(anyhow!("database error: {e}")))?;
                if exists > 0 {
                    Err(StoreError::VersionConflict)
                } else {
                    Err(StoreError::NotFound)
                }
            }
            Err(other) => Err(StoreError::Backend(anyhow!("database error: {other}"))),
        }
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Profile>, StoreError> {
        let mut conn = self.conn().await?;
        let records = profiles::table
            .filter(profiles::user_id.eq(user_id))
            .order(profiles::created_at.asc())
            .load::<ProfileRecord>(&mut conn)
            .await
            .map_err(|e| StoreError::Backend(anyhow!("database error: {e}")))?;
        Ok(records.into_iter().map(ProfileRecord::into_domain).collect())
    }
}
