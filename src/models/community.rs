// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::communities;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = communities)]
pub struct Community {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_profile_id: Uuid,
    pub member_profile_ids: Vec<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = communities)]
pub struct NewCommunity {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub creator_profile_id: Uuid,
    pub member_profile_ids: Vec<Uuid>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Community joined with its creator's handle for responses.
#[derive(Debug, Serialize)]
pub struct CommunityDetail {
    #[serde(flatten)]
    pub community: Community,
    pub creator_username: String,
}
