// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

pub mod auth;
pub mod comments;
pub mod communities;
pub mod friends;
pub mod health;
pub mod posts;
pub mod profiles;

use uuid::Uuid;

use crate::error::AppError;

/// Parse a path identifier, surfacing malformed values as a 400 instead of
/// a router-level rejection.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::InvalidId(raw.to_string()))
}

pub(crate) fn db_error(err: diesel::result::Error) -> AppError {
    AppError::Internal(anyhow::anyhow!("database error: {err}"))
}

/// Map diesel's NotFound onto a 404 for `entity`, everything else onto 500.
pub(crate) fn find_error(entity: &'static str) -> impl Fn(diesel::result::Error) -> AppError {
    move |err| match err {
        diesel::result::Error::NotFound => AppError::NotFound(entity),
        other => db_error(other),
    }
}
