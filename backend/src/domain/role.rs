//! Roles and the post mutation policy.

use serde::{Deserialize, Serialize};

use super::{Error, Post, RoleId, UserId};

/// Role assigned to newly registered users.
pub const DEFAULT_ROLE: &str = "user";
/// Role allowed to edit posts it does not own.
pub const MODERATOR_ROLE: &str = "moderator";
/// Role allowed to delete posts it does not own.
pub const ADMIN_ROLE: &str = "admin";

/// Stored role. Higher levels include the permissions of lower ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub level: i32,
}

/// Actor attempting to change a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor<'a> {
    pub user_id: UserId,
    pub role: &'a Role,
}

/// Allow the change when the actor owns `post` or outranks `required`.
///
/// # Examples
/// ```
/// # use chrono::Utc;
/// use social_backend::domain::{authorize_post_mutation, Actor, Post, PostId, Role, RoleId, UserId};
///
/// let role = |id, name: &str, level| Role {
///     id: RoleId::new(id).expect("id"),
///     name: name.to_owned(),
///     description: String::new(),
///     level,
/// };
/// let (user, moderator) = (role(1, "user", 1), role(2, "moderator", 2));
/// let post = Post {
///     id: PostId::new(1).expect("id"),
///     user_id: UserId::new(7).expect("id"),
///     title: "t".into(),
///     content: "c".into(),
///     tags: vec![],
///     created_at: Utc::now(),
///     updated_at: Utc::now(),
///     version: 1,
/// };
/// let stranger = Actor { user_id: UserId::new(8).expect("id"), role: &user };
/// assert!(authorize_post_mutation(stranger, &post, &moderator).is_err());
/// let owner = Actor { user_id: UserId::new(7).expect("id"), role: &user };
/// assert!(authorize_post_mutation(owner, &post, &moderator).is_ok());
/// ```
pub fn authorize_post_mutation(actor: Actor<'_>, post: &Post, required: &Role) -> Result<(), Error> {
    if actor.user_id == post.user_id || actor.role.level >= required.level {
        return Ok(());
    }
    Err(Error::forbidden(format!(
        "requires ownership or the {} role",
        required.name
    )))
}
