// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::parse_id;
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::profile::{Profile, VisibilityPolicy};
use crate::social_graph::ProfileViewResponse;
use crate::storage::StoreError;

#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub username: String,
    pub display_name: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub visibility: Option<VisibilityPolicy>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub interests: Option<Vec<String>>,
    pub is_anonymous: Option<bool>,
    /// Per-tier patch; supplied layers replace the stored ones.
    pub visibility: Option<VisibilityPolicy>,
}

/// Add another persona to the calling account.
pub async fn create_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if req.username.trim().is_empty() || req.display_name.trim().is_empty() {
        return Err(AppError::Validation(
            "username and display_name are required".to_string(),
        ));
    }

    let visibility = req
        .visibility
        .unwrap_or_else(|| state.config.visibility.default_policy.clone());
    let persona = Profile::create(
        auth.user_id,
        req.username,
        Some(req.display_name),
        req.bio,
        req.interests,
        req.is_anonymous,
        visibility,
    );
    let profile = state.profiles.insert_profile(persona).await?;
    info!(user = %auth.user_id, profile = %profile.id, "created persona");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": profile.id,
            "username": profile.username,
            "display_name": profile.display_name,
            "bio": profile.bio,
            "interests": profile.interests,
            "is_anonymous": profile.is_anonymous,
        })),
    ))
}

/// Every persona owned by the calling account, unredacted.
pub async fn get_my_profiles(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let profiles = state.profiles.list_for_user(auth.user_id).await?;
    Ok(Json(json!({
        "profiles": profiles,
        "active_profile_id": auth.profile_id,
    })))
}

/// The persona the caller's token is currently bound to.
pub async fn get_current_profile(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Value>, AppError> {
    let profile = state.profiles.get_profile(auth.profile_id).await?;
    Ok(Json(json!({
        "profile": {
            "id": profile.id,
            "username": profile.username,
            "display_name": profile.display_name,
            "is_anonymous": profile.is_anonymous,
        }
    })))
}

/// Re-issue the caller's token bound to another persona they own.
pub async fn switch_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let target = parse_id(&id)?;
    let profile = state.profiles.get_profile(target).await?;
    // a foreign persona is reported as missing, not as forbidden
    if profile.user_id != auth.user_id {
        return Err(AppError::NotFound("profile"));
    }

    let token = state.auth.issue(auth.user_id, profile.id)?;
    info!(user = %auth.user_id, profile = %profile.id, "switched active profile");

    Ok(Json(json!({
        "message": "profile switched",
        "token": token,
        "profile": {
            "id": profile.id,
            "username": profile.username,
            "display_name": profile.display_name,
            "is_anonymous": profile.is_anonymous,
        },
    })))
}

/// Onion-redacted view of a profile; anonymous viewers are allowed.
pub async fn get_profile(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<ProfileViewResponse>, AppError> {
    let target = parse_id(&id)?;
    let view = state
        .graph
        .profile_view(target, viewer.map(|v| v.profile_id))
        .await?;
    Ok(Json(view))
}

/// Onion-redacted view addressed by handle.
pub async fn get_profile_by_username(
    State(state): State<AppState>,
    viewer: Option<AuthUser>,
    Path(username): Path<String>,
) -> Result<Json<ProfileViewResponse>, AppError> {
    let view = state
        .graph
        .profile_view_by_username(&username, viewer.map(|v| v.profile_id))
        .await?;
    Ok(Json(view))
}

/// Edit persona fields and/or visibility layers. The username is fixed.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;

    for _attempt in 0..3 {
        let mut profile = state.profiles.get_profile(id).await?;
        if profile.user_id != auth.user_id {
            return Err(AppError::NotFound("profile"));
        }

        if let Some(display_name) = &req.display_name {
            profile.display_name = Some(display_name.clone());
        }
        if let Some(bio) = &req.bio {
            profile.bio = Some(bio.clone());
        }
        if let Some(avatar_url) = &req.avatar_url {
            profile.avatar_url = Some(avatar_url.clone());
        }
        if let Some(interests) = &req.interests {
            profile.interests = interests.clone();
        }
        if let Some(is_anonymous) = req.is_anonymous {
            profile.is_anonymous = is_anonymous;
        }
        if let Some(patch) = &req.visibility {
            if patch.public.is_some() {
                profile.visibility.public = patch.public.clone();
            }
            if patch.follower.is_some() {
                profile.visibility.follower = patch.follower.clone();
            }
            if patch.close_friend.is_some() {
                profile.visibility.close_friend = patch.close_friend.clone();
            }
        }

        match state.profiles.save_profile(profile).await {
            Ok(saved) => {
                info!(profile = %saved.id, "updated profile");
                return Ok(Json(json!({
                    "id": saved.id,
                    "username": saved.username,
                    "display_name": saved.display_name,
                    "bio": saved.bio,
                    "avatar_url": saved.avatar_url,
                    "interests": saved.interests,
                    "is_anonymous": saved.is_anonymous,
                    "visibility": saved.visibility,
                })));
            }
            Err(StoreError::VersionConflict) => continue,
            Err(other) => return Err(other.into()),
        }
    }

    Err(AppError::Internal(anyhow::anyhow!(
        "profile update kept racing, giving up"
    )))
}
