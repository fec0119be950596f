// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::posts;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = posts)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author_profile_id: Uuid,
    pub community_id: Uuid,
    pub upvotes: i32,
    pub downvotes: i32,
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author_profile_id: Uuid,
    pub community_id: Uuid,
    pub upvotes: i32,
    pub downvotes: i32,
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Post joined with its author handle and community name for responses.
#[derive(Debug, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author_username: String,
    pub community_name: String,
}

const RANKING_EPOCH: i64 = 1_134_028_003;

/// Simplified reddit-style hotness heuristic; deliberately replaceable.
pub fn hot_score(upvotes: i32, downvotes: i32, created_at: NaiveDateTime) -> i64 {
    let score = i64::from(upvotes) - i64::from(downvotes);
    let order = (score.abs().max(1) as f64).log10();
    let sign = score.signum() as f64;
    let seconds = (created_at.and_utc().timestamp() - RANKING_EPOCH) as f64;
    (order + sign * seconds / 45_000.0).round() as i64
}
