// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::social_graph::GraphError;
use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("operation cannot target your own profile")]
    SelfTarget,
    #[error("invalid identifier format: {0}")]
    InvalidId(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("authorization required")]
    Unauthorized,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<GraphError> for AppError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NotFound => AppError::NotFound("profile"),
            GraphError::InvalidTarget => AppError::SelfTarget,
            GraphError::Store(inner) => inner.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("profile"),
            StoreError::UsernameTaken => AppError::Conflict("username already taken".to_string()),
            StoreError::VersionConflict => {
                AppError::Internal(anyhow::anyhow!("write kept racing, giving up"))
            }
            StoreError::Backend(inner) => AppError::Internal(inner),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SelfTarget
            | AppError::InvalidId(_)
            | AppError::Validation(_)
            | AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("request failed: {self:#}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
