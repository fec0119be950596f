// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::comments;

#[derive(Debug, Clone, Queryable, Selectable, Serialize)]
#[diesel(table_name = comments)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_profile_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub struct NewComment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_profile_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub body: String,
    pub created_at: NaiveDateTime,
}

/// Comment with its author handle and nested replies.
#[derive(Debug, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub author_username: String,
    pub replies: Vec<CommentNode>,
}

/// Assemble a reply tree from one flat query result. Rows arrive
/// newest-first and keep that order within each parent.
pub fn build_comment_tree(rows: Vec<(Comment, String)>) -> Vec<CommentNode> {
    let mut by_parent: HashMap<Option<Uuid>, Vec<(Comment, String)>> = HashMap::new();
    for row in rows {
        by_parent.entry(row.0.parent_id).or_default().push(row);
    }
    attach(&mut by_parent, None)
}

fn attach(
    by_parent: &mut HashMap<Option<Uuid>, Vec<(Comment, String)>>,
    parent: Option<Uuid>,
) -> Vec<CommentNode> {
    by_parent
        .remove(&parent)
        .unwrap_or_default()
        .into_iter()
        .map(|(comment, author_username)| {
            let id = comment.id;
            CommentNode {
                comment,
                author_username,
                replies: attach(by_parent, Some(id)),
            }
        })
        .collect()
}
