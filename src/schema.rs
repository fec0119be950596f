// Copyright (c) OnionPost Team
// SPDX-License-Identifier: Apache-2.0

// Import diesel table macros
use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

table! {
    users (id) {
        id -> Uuid,
        email -> Varchar,
        password_hash -> Varchar,
        primary_profile_id -> Nullable<Uuid>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

// Profiles keep their visibility policy and relationship edge list as jsonb
// so a persona is read and saved as one record.
table! {
    profiles (id) {
        id -> Uuid,
        user_id -> Uuid,
        username -> Varchar,
        display_name -> Nullable<Varchar>,
        bio -> Nullable<Text>,
        avatar_url -> Nullable<Varchar>,
        interests -> Array<Text>,
        is_anonymous -> Bool,
        visibility -> Jsonb,
        relationships -> Jsonb,
        version -> Integer,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    communities (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        creator_profile_id -> Uuid,
        member_profile_ids -> Array<Uuid>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    posts (id) {
        id -> Uuid,
        title -> Varchar,
        body -> Text,
        author_profile_id -> Uuid,
        community_id -> Uuid,
        upvotes -> Integer,
        downvotes -> Integer,
        tags -> Array<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

table! {
    comments (id) {
        id -> Uuid,
        post_id -> Uuid,
        author_profile_id -> Uuid,
        parent_id -> Nullable<Uuid>,
        body -> Text,
        created_at -> Timestamp,
    }
}

joinable!(profiles -> users (user_id));
joinable!(communities -> profiles (creator_profile_id));
joinable!(posts -> profiles (author_profile_id));
joinable!(posts -> communities (community_id));
joinable!(comments -> posts (post_id));
joinable!(comments -> profiles (author_profile_id));

allow_tables_to_appear_in_same_query!(
    users,
    profiles,
    communities,
    posts,
    comments,
);
