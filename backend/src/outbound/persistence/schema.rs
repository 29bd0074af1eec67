//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. Migrations
//! are owned by the deployment tooling; `diesel print-schema` against a live
//! database regenerates this file.

diesel::table! {
    /// Roles ordered by `level`; higher levels include lower permissions.
    roles (id) {
        id -> Int8,
        name -> Varchar,
        description -> Text,
        level -> Int4,
    }
}

diesel::table! {
    /// User accounts. `password` holds the Argon2id PHC string.
    users (id) {
        id -> Int8,
        username -> Varchar,
        email -> Varchar,
        password -> Text,
        role_id -> Int8,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pending activations keyed by the SHA-256 digest of the token.
    user_invitations (token) {
        token -> Text,
        user_id -> Int8,
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    /// Posts. `version` starts at 1 and backs optimistic locking.
    posts (id) {
        id -> Int8,
        user_id -> Int8,
        title -> Varchar,
        content -> Text,
        tags -> Array<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        version -> Int4,
    }
}

diesel::table! {
    comments (id) {
        id -> Int8,
        post_id -> Int8,
        user_id -> Int8,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Follow edges; the pair is the primary key.
    followers (follower_id, followed_id) {
        follower_id -> Int8,
        followed_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(comments -> posts (post_id));
diesel::joinable!(comments -> users (user_id));
diesel::joinable!(posts -> users (user_id));
diesel::joinable!(user_invitations -> users (user_id));
diesel::joinable!(users -> roles (role_id));

diesel::allow_tables_to_appear_in_same_query!(
    comments,
    followers,
    posts,
    roles,
    user_invitations,
    users,
);
