// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use axum::extract::{Path, Query, State};
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
use crate::models::community::Community;
use crate::models::post::{hot_score, NewPost, Post, PostDetail};
use crate::schema::{communities, posts, profiles};

/// Tags arrive either as an array or as a comma-separated string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
    List(Vec<String>),
    Csv(String),
}

impl Default for TagsInput {
    fn default() -> Self {
        TagsInput::List(Vec::new())
    }
}

impl TagsInput {
    fn normalize(self) -> Vec<String> {
        let raw = match self {
            TagsInput::List(tags) => tags,
            TagsInput::Csv(csv) => csv.split(',').map(str::to_string).collect(),
        };
        raw.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub body: String,
    pub community_id: Uuid,
    #[serde(default)]
    pub tags: TagsInput,
}

#[derive(Debug, Deserialize)]
pub struct PostsQuery {
    pub community: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub vote: String,
}

/// Publish a post into a community under the caller's active persona.
pub async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<PostDetail>), AppError> {
    if req.title.trim().is_empty() || req.body.trim().is_empty() {
        return Err(AppError::Validation(
            "title and body are required".to_string(),
        ));
    }

    let author = state.profiles.get_profile(auth.profile_id).await?;
    if author.user_id != auth.user_id {
        return Err(AppError::Unauthorized);
    }

    let mut conn = state.db.get_connection().await?;
    let community = communities::table
        .find(req.community_id)
        .first::<Community>(&mut conn)
        .await
        .map_err(find_error("community"))?;

    let now = Utc::now().naive_utc();
    let new_post = NewPost {
        id: Uuid::new_v4(),
        title: req.title.trim().to_string(),
        body: req.body,
        author_profile_id: author.id,
        community_id: community.id,
        upvotes: 0,
        downvotes: 0,
        tags: req.tags.normalize(),
        created_at: now,
        updated_at: now,
    };
    let post = diesel::insert_into(posts::table)
        .values(&new_post)
        .get_result::<Post>(&mut conn)
        .await
        .map_err(db_error)?;

    info!(post = %post.id, author = %author.id, community = %community.id, "created post");

    Ok((
        StatusCode::CREATED,
        Json(PostDetail {
            post,
            author_username: author.username,
            community_name: community.name,
        }),
    ))
}

/// List posts, optionally filtered by community (name or id) and sorted by
/// `hot`, `top` or `new` (default).
pub async fn get_posts(
    State(state): State<AppState>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<Vec<PostDetail>>, AppError> {
    let mut conn = state.db.get_connection().await?;

    let community_filter = match &query.community {
        Some(raw) => {
            let community = if let Ok(id) = Uuid::parse_str(raw) {
                communities::table
                    .find(id)
                    .first::<Community>(&mut conn)
                    .await
            } else {
                communities::table
                    .filter(communities::name.eq(raw))
                    .first::<Community>(&mut conn)
                    .await
            };
            Some(community.map_err(find_error("community"))?.id)
        }
        None => None,
    };

    let rows: Vec<(Post, String, String)> = match community_filter {
        Some(community_id) => {
            posts::table
                .inner_join(profiles::table)
                .inner_join(communities::table)
                .filter(posts::community_id.eq(community_id))
                .select((posts::all_columns, profiles::username, communities::name))
                .load(&mut conn)
                .await
        }
        None => {
            posts::table
                .inner_join(profiles::table)
                .inner_join(communities::table)
                .select((posts::all_columns, profiles::username, communities::name))
                .load(&mut conn)
                .await
        }
    }
    .map_err(db_error)?;

    let mut details: Vec<PostDetail> = rows
        .into_iter()
        .map(|(post, author_username, community_name)| PostDetail {
            post,
            author_username,
            community_name,
        })
        .collect();

    match query.sort.as_deref().unwrap_or("new") {
        "hot" => details.sort_by_key(|d| {
            std::cmp::Reverse(hot_score(d.post.upvotes, d.post.downvotes, d.post.created_at))
        }),
        "top" => details.sort_by_key(|d| std::cmp::Reverse(d.post.upvotes)),
        _ => details.sort_by_key(|d| std::cmp::Reverse(d.post.created_at)),
    }

    Ok(Json(details))
}

/// Up- or downvote a post. Counters only; voters are not tracked.
pub async fn vote_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> Result<Json<PostDetail>, AppError> {
    let post_id = parse_id(&id)?;

    // the acting persona must still exist
    state.profiles.get_profile(auth.profile_id).await?;

    let mut conn = state.db.get_connection().await?;
    let now = Utc::now().naive_utc();
    let post: Post = match req.vote.as_str() {
        "up" => {
            diesel::update(posts::table.find(post_id))
                .set((
                    posts::upvotes.eq(posts::upvotes + 1),
                    posts::updated_at.eq(now),
                ))
                .get_result(&mut conn)
                .await
        }
        "down" => {
            diesel::update(posts::table.find(post_id))
                .set((
                    posts::downvotes.eq(posts::downvotes + 1),
                    posts::updated_at.eq(now),
                ))
                .get_result(&mut conn)
                .await
        }
        _ => {
            return Err(AppError::Validation(
                "invalid vote type, use \"up\" or \"down\"".to_string(),
            ))
        }
    }
    .map_err(find_error("post"))?;

    let author_username = profiles::table
        .find(post.author_profile_id)
        .select(profiles::username)
        .first::<String>(&mut conn)
        .await
        .map_err(db_error)?;
    let community_name = communities::table
        .find(post.community_id)
        .select(communities::name)
        .first::<String>(&mut conn)
        .await
        .map_err(db_error)?;

    Ok(Json(PostDetail {
        post,
        author_username,
        community_name,
    }))
}
