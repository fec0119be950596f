// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::db_error;
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::community::{Community, CommunityDetail, NewCommunity};
use crate::schema::{communities, profiles};

#[derive(Debug, Deserialize)]
pub struct CreateCommunityRequest {
    pub name: String,
    pub description: String,
}

/// Create a community; the creator's persona becomes its first member.
pub async fn create_community(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateCommunityRequest>,
) -> Result<(StatusCode, Json<Community>), AppError> {
    if req.name.trim().is_empty() || req.description.trim().is_empty() {
        return Err(AppError::Validation(
            "name and description are required".to_string(),
        ));
    }

    let creator = state.profiles.get_profile(auth.profile_id).await?;

    let mut conn = state.db.get_connection().await?;
    let now = Utc::now().naive_utc();
    let new_community = NewCommunity {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        description: req.description,
        creator_profile_id: creator.id,
        member_profile_ids: vec![creator.id],
        created_at: now,
        updated_at: now,
    };
    let community = diesel::insert_into(communities::table)
        .values(&new_community)
        .get_result::<Community>(&mut conn)
        .await
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                AppError::Conflict("community with this name already exists".to_string())
            }
            other => db_error(other),
        })?;

    info!(community = %community.id, creator = %creator.id, "created community");

    Ok((StatusCode::CREATED, Json(community)))
}

/// All communities with their creators' handles.
pub async fn get_communities(
    State(state): State<AppState>,
) -> Result<Json<Vec<CommunityDetail>>, AppError> {
    let mut conn = state.db.get_connection().await?;
    let rows: Vec<(Community, String)> = communities::table
        .inner_join(profiles::table)
        .order(communities::created_at.desc())
        .select((communities::all_columns, profiles::username))
        .load(&mut conn)
        .await
        .map_err(db_error)?;

    Ok(Json(
        rows.into_iter()
            .map(|(community, creator_username)| CommunityDetail {
                community,
                creator_username,
            })
            .collect(),
    ))
}
