// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use super::parse_id;
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;

/// Follow a profile. Re-following a close friend downgrades the edge.
pub async fn follow_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let target = parse_id(&id)?;
    let tier = state.graph.follow(auth.profile_id, target).await?;
    Ok(Json(json!({
        "message": "profile followed",
        "relationship": tier,
    })))
}

/// Drop any relationship with the target. Idempotent.
pub async fn unfollow_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let target = parse_id(&id)?;
    state.graph.unfollow(auth.profile_id, target).await?;
    Ok(Json(json!({ "message": "profile unfollowed" })))
}

pub async fn add_close_friend(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let target = parse_id(&id)?;
    let tier = state.graph.add_close_friend(auth.profile_id, target).await?;
    Ok(Json(json!({
        "message": "profile added as close friend",
        "relationship": tier,
    })))
}

/// Demote a close friend to follower, or drop a plain follower edge.
pub async fn remove_close_friend(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let target = parse_id(&id)?;
    let remaining = state
        .graph
        .remove_close_friend(auth.profile_id, target)
        .await?;
    let relationship = remaining
        .map(|tier| tier.to_string())
        .unwrap_or_else(|| "none".to_string());
    Ok(Json(json!({
        "message": "close friend relationship removed",
        "relationship": relationship,
    })))
}

/// The caller's own outbound edges, tiers included.
pub async fn get_relationships(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let relationships = state.graph.relationships(auth.profile_id).await?;
    Ok(Json(json!({ "relationships": relationships })))
}
