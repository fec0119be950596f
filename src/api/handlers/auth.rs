// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use super::db_error;
use crate::api::AppState;
use crate::error::AppError;
use crate::models::profile::Profile;
use crate::models::user::{NewUser, User};
use crate::schema::users;
use crate::storage::StoreError;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub username: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Create an account plus its first persona and sign the caller in.
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    if req.email.trim().is_empty()
        || req.username.trim().is_empty()
        || req.display_name.trim().is_empty()
    {
        return Err(AppError::Validation(
            "email, password, username and display_name are required".to_string(),
        ));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let mut conn = state.db.get_connection().await?;

    let existing: i64 = users::table
        .filter(users::email.eq(&req.email))
        .count()
        .get_result(&mut conn)
        .await
        .map_err(db_error)?;
    if existing > 0 {
        return Err(AppError::Conflict("user already exists".to_string()));
    }

    // the store re-checks on insert; this just gives a friendlier error
    match state.profiles.find_by_username(&req.username).await {
        Ok(_) => return Err(AppError::Conflict("username already taken".to_string())),
        Err(StoreError::NotFound) => {}
        Err(other) => return Err(other.into()),
    }

    let user_id = Uuid::new_v4();
    let password_hash = bcrypt::hash(&req.password, bcrypt::DEFAULT_COST)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to hash password: {e}")))?;

    let now = Utc::now().naive_utc();
    let new_user = NewUser {
        id: user_id,
        email: req.email.clone(),
        password_hash,
        primary_profile_id: None,
        created_at: now,
        updated_at: now,
    };
    diesel::insert_into(users::table)
        .values(&new_user)
        .execute(&mut conn)
        .await
        .map_err(db_error)?;

    let persona = Profile::create(
        user_id,
        req.username.clone(),
        Some(req.display_name.clone()),
        None,
        Vec::new(),
        false,
        state.config.visibility.default_policy.clone(),
    );
    let profile = match state.profiles.insert_profile(persona).await {
        Ok(profile) => profile,
        Err(err) => {
            // roll the half-created account back before surfacing the error
            let _ = diesel::delete(users::table.find(user_id))
                .execute(&mut conn)
                .await;
            return Err(err.into());
        }
    };

    diesel::update(users::table.find(user_id))
        .set(users::primary_profile_id.eq(profile.id))
        .execute(&mut conn)
        .await
        .map_err(db_error)?;

    info!(user = %user_id, profile = %profile.id, "registered new user");
    let token = state.auth.issue(user_id, profile.id)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": user_id,
            "email": req.email,
            "primary_profile": {
                "id": profile.id,
                "username": profile.username,
                "display_name": profile.display_name,
            },
            "token": token,
        })),
    ))
}

/// Verify credentials and issue a token bound to the primary persona.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }

    let mut conn = state.db.get_connection().await?;
    let user = users::table
        .filter(users::email.eq(&req.email))
        .first::<User>(&mut conn)
        .await
        .map_err(|err| match err {
            diesel::result::Error::NotFound => AppError::InvalidCredentials,
            other => db_error(other),
        })?;

    let password_ok = bcrypt::verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("failed to verify password: {e}")))?;
    if !password_ok {
        return Err(AppError::InvalidCredentials);
    }

    let profile_id = user
        .primary_profile_id
        .ok_or(AppError::NotFound("profile"))?;
    let profile = state.profiles.get_profile(profile_id).await?;

    let token = state.auth.issue(user.id, profile.id)?;
    debug!(user = %user.id, "login");

    Ok(Json(json!({
        "id": user.id,
        "email": user.email,
        "primary_profile": {
            "id": profile.id,
            "username": profile.username,
            "display_name": profile.display_name,
        },
        "token": token,
    })))
}
