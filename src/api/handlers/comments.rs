// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use super::{db_error, find_error, parse_id};
use crate::api::AppState;
use crate::auth::AuthUser;
use crate::error::AppError;
use crate::models::comment::{build_comment_tree, Comment, CommentNode, NewComment};
use crate::schema::{comments, posts, profiles};

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub body: String,
    pub post_id: Uuid,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

/// Attach a comment (or reply) to a post.
pub async fn add_comment(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<AddCommentRequest>,
) -> Result<(StatusCode, Json<CommentNode>), AppError> {
    if req.body.trim().is_empty() {
        return Err(AppError::Validation("comment body is required".to_string()));
    }

    let author = state.profiles.get_profile(auth.profile_id).await?;

    let mut conn = state.db.get_connection().await?;
    posts::table
        .find(req.post_id)
        .select(posts::id)
        .first::<Uuid>(&mut conn)
        .await
        .map_err(find_error("post"))?;

    if let Some(parent_id) = req.parent_id {
        let parent = comments::table
            .find(parent_id)
            .first::<Comment>(&mut conn)
            .await
            .map_err(|_| AppError::Validation("invalid parent comment".to_string()))?;
        // replies must stay on the same post
        if parent.post_id != req.post_id {
            return Err(AppError::Validation("invalid parent comment".to_string()));
        }
    }

    let new_comment = NewComment {
        id: Uuid::new_v4(),
        post_id: req.post_id,
        author_profile_id: author.id,
        parent_id: req.parent_id,
        body: req.body.trim().to_string(),
        created_at: Utc::now().naive_utc(),
    };
    let comment = diesel::insert_into(comments::table)
        .values(&new_comment)
        .get_result::<Comment>(&mut conn)
        .await
        .map_err(db_error)?;

    info!(comment = %comment.id, post = %comment.post_id, "added comment");

    Ok((
        StatusCode::CREATED,
        Json(CommentNode {
            comment,
            author_username: author.username,
            replies: Vec::new(),
        }),
    ))
}

/// Full reply tree for a post, newest-first at every level.
pub async fn get_post_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CommentNode>>, AppError> {
    let post_id = parse_id(&id)?;

    let mut conn = state.db.get_connection().await?;
    posts::table
        .find(post_id)
        .select(posts::id)
        .first::<Uuid>(&mut conn)
        .await
        .map_err(find_error("post"))?;

    let rows: Vec<(Comment, String)> = comments::table
        .inner_join(profiles::table)
        .filter(comments::post_id.eq(post_id))
        .order(comments::created_at.desc())
        .select((comments::all_columns, profiles::username))
        .load(&mut conn)
        .await
        .map_err(db_error)?;

    Ok(Json(build_comment_tree(rows)))
}
