//! In-memory entity store implementing every persistence port.
//!
//! Writes are applied under one lock, so a conditional post update is as
//! atomic here as the `UPDATE ... WHERE version = $n` it stands in for.
//! Constraint failures use the PostgreSQL default constraint names.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use pagination::FeedQuery;

use crate::domain::ports::{
    CommentRepository, FeedRepository, FollowerRepository, PostRepository, RoleRepository,
    StoreError, StoreHealth, UserRepository,
};
use crate::domain::role::{ADMIN_ROLE, DEFAULT_ROLE, MODERATOR_ROLE};
use crate::domain::{
    Comment, CommentId, FeedItem, FollowEdge, Invitation, NewComment, NewPost, NewUser, Post,
    PostId, PostStores, PostUpdate, Role, RoleId, TokenDigest, User, UserId, UserStores,
};

struct StoredInvitation {
    digest: TokenDigest,
    user_id: UserId,
    expires_at: DateTime<Utc>,
}

#[derive(Default)]
struct Tables {
    roles: Vec<Role>,
    users: BTreeMap<i64, User>,
    invitations: Vec<StoredInvitation>,
    posts: BTreeMap<i64, Post>,
    comments: Vec<Comment>,
    follows: BTreeSet<(i64, i64)>,
    next_user: i64,
    next_post: i64,
    next_comment: i64,
}

impl Tables {
    fn next(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }

    fn user(&self, id: UserId) -> Result<&User, StoreError> {
        self.users
            .get(&id.get())
            .ok_or_else(|| StoreError::not_found("user"))
    }

    fn ensure_user(&self, id: UserId, constraint: &str) -> Result<(), StoreError> {
        if self.users.contains_key(&id.get()) {
            Ok(())
        } else {
            Err(StoreError::invalid_reference(format!(
                "violates foreign key constraint {constraint}"
            )))
        }
    }
}

/// Shared in-memory store seeded with the `user`, `moderator` and `admin`
/// roles.
pub struct MemoryStore {
    clock: Arc<dyn Clock + Send + Sync>,
    tables: Mutex<Tables>,
    healthy: AtomicBool,
    post_reads: AtomicUsize,
    user_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let role = |id: i64, name: &str, level: i32| {
            RoleId::new(id).map(|id| Role {
                id,
                name: name.to_owned(),
                description: format!("{name} role"),
                level,
            })
        };
        let roles = [
            role(1, DEFAULT_ROLE, 1),
            role(2, MODERATOR_ROLE, 2),
            role(3, ADMIN_ROLE, 3),
        ]
        .into_iter()
        .flatten()
        .collect();
        Self {
            clock,
            tables: Mutex::new(Tables {
                roles,
                ..Tables::default()
            }),
            healthy: AtomicBool::new(true),
            post_reads: AtomicUsize::new(0),
            user_reads: AtomicUsize::new(0),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert an active user with the named role, bypassing registration.
    ///
    /// # Panics
    /// Panics when `role` is not one of the seeded roles.
    pub fn seed_user(&self, username: &str, role: &str) -> User {
        let now = self.clock.utc();
        let mut tables = self.tables();
        let role_id = match tables.roles.iter().find(|candidate| candidate.name == role) {
            Some(found) => found.id,
            None => panic!("unknown role {role}"),
        };
        let raw = Tables::next(&mut tables.next_user);
        let Ok(id) = UserId::new(raw) else {
            panic!("store assigned invalid user id {raw}");
        };
        let user = User {
            id,
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            role_id,
            is_active: true,
            created_at: now,
        };
        tables.users.insert(raw, user.clone());
        user
    }

    /// Make [`StoreHealth::check`] fail until reset.
    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    /// Number of post reads that reached the store.
    pub fn post_reads(&self) -> usize {
        self.post_reads.load(Ordering::SeqCst)
    }

    /// Number of user reads that reached the store.
    pub fn user_reads(&self) -> usize {
        self.user_reads.load(Ordering::SeqCst)
    }

    /// Bundle the store as every port [`crate::domain::PostService`] needs.
    pub fn post_stores(self: &Arc<Self>) -> PostStores {
        PostStores {
            posts: Arc::clone(self) as Arc<dyn PostRepository>,
            comments: Arc::clone(self) as Arc<dyn CommentRepository>,
            feed: Arc::clone(self) as Arc<dyn FeedRepository>,
            users: Arc::clone(self) as Arc<dyn UserRepository>,
            roles: Arc::clone(self) as Arc<dyn RoleRepository>,
        }
    }

    /// Bundle the store as every port [`crate::domain::UserService`] needs.
    pub fn user_stores(self: &Arc<Self>) -> UserStores {
        UserStores {
            users: Arc::clone(self) as Arc<dyn UserRepository>,
            roles: Arc::clone(self) as Arc<dyn RoleRepository>,
            followers: Arc::clone(self) as Arc<dyn FollowerRepository>,
        }
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: &NewPost) -> Result<Post, StoreError> {
        let now = self.clock.utc();
        let mut tables = self.tables();
        tables.ensure_user(post.user_id(), "posts_user_id_fkey")?;
        let raw = Tables::next(&mut tables.next_post);
        let id = PostId::new(raw).map_err(|err| StoreError::invalid_data(err.to_string()))?;
        let stored = Post {
            id,
            user_id: post.user_id(),
            title: post.title().to_owned(),
            content: post.content().to_owned(),
            tags: post.tags().to_vec(),
            created_at: now,
            updated_at: now,
            version: 1,
        };
        tables.posts.insert(raw, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Post, StoreError> {
        self.post_reads.fetch_add(1, Ordering::SeqCst);
        self.tables()
            .posts
            .get(&id.get())
            .cloned()
            .ok_or_else(|| StoreError::not_found("post"))
    }

    async fn update(&self, update: &PostUpdate) -> Result<Post, StoreError> {
        let now = self.clock.utc();
        let mut tables = self.tables();
        let Some(stored) = tables.posts.get_mut(&update.id().get()) else {
            return Err(StoreError::not_found("post"));
        };
        if stored.version != update.expected_version() {
            return Err(StoreError::version_mismatch(
                update.expected_version(),
                stored.version,
            ));
        }
        stored.title = update.title().to_owned();
        stored.content = update.content().to_owned();
        stored.tags = update.tags().to_vec();
        stored.updated_at = now;
        stored.version += 1;
        Ok(stored.clone())
    }

    async fn delete(&self, id: PostId) -> Result<(), StoreError> {
        let mut tables = self.tables();
        if tables.posts.remove(&id.get()).is_none() {
            return Err(StoreError::not_found("post"));
        }
        tables.comments.retain(|comment| comment.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: &NewComment) -> Result<Comment, StoreError> {
        let now = self.clock.utc();
        let mut tables = self.tables();
        if !tables.posts.contains_key(&comment.post_id.get()) {
            return Err(StoreError::invalid_reference(
                "violates foreign key constraint comments_post_id_fkey",
            ));
        }
        tables.ensure_user(comment.user_id, "comments_user_id_fkey")?;
        let username = tables.user(comment.user_id)?.username.clone();
        let raw = Tables::next(&mut tables.next_comment);
        let id = CommentId::new(raw).map_err(|err| StoreError::invalid_data(err.to_string()))?;
        let stored = Comment {
            id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            username,
            content: comment.content().to_owned(),
            created_at: now,
        };
        tables.comments.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_post(&self, post_id: PostId) -> Result<Vec<Comment>, StoreError> {
        let mut comments: Vec<Comment> = self
            .tables()
            .comments
            .iter()
            .filter(|comment| comment.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| (b.created_at, b.id.get()).cmp(&(a.created_at, a.id.get())));
        Ok(comments)
    }
}

fn matches_search(post: &Post, search: Option<&str>) -> bool {
    search.is_none_or(|needle| {
        let needle = needle.to_lowercase();
        post.title.to_lowercase().contains(&needle) || post.content.to_lowercase().contains(&needle)
    })
}

fn matches_range(post: &Post, query: &FeedQuery) -> bool {
    query.since().is_none_or(|since| post.created_at >= since)
        && query.until().is_none_or(|until| post.created_at <= until)
}

#[async_trait]
impl FeedRepository for MemoryStore {
    async fn feed(&self, user_id: UserId, query: &FeedQuery) -> Result<Vec<FeedItem>, StoreError> {
        let tables = self.tables();
        let followed: BTreeSet<i64> = tables
            .follows
            .iter()
            .filter(|(follower, _)| *follower == user_id.get())
            .map(|(_, followed)| *followed)
            .collect();

        let mut posts: Vec<&Post> = tables
            .posts
            .values()
            .filter(|post| post.user_id == user_id || followed.contains(&post.user_id.get()))
            .filter(|post| query.tags().iter().all(|tag| post.tags.contains(tag)))
            .filter(|post| matches_search(post, query.search()))
            .filter(|post| matches_range(post, query))
            .collect();
        posts.sort_by_key(|post| (post.created_at, post.id.get()));
        if query.sort().is_descending() {
            posts.reverse();
        }

        let offset = usize::try_from(query.page().offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.page().limit()).unwrap_or(usize::MAX);
        posts
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|post| {
                let username = tables.user(post.user_id)?.username.clone();
                let comments_count = tables
                    .comments
                    .iter()
                    .filter(|comment| comment.post_id == post.id)
                    .count();
                Ok(FeedItem {
                    post: post.clone(),
                    username,
                    comments_count: u64::try_from(comments_count).unwrap_or(u64::MAX),
                })
            })
            .collect()
    }
}

#[async_trait]
impl FollowerRepository for MemoryStore {
    async fn follow(&self, edge: &FollowEdge) -> Result<(), StoreError> {
        let mut tables = self.tables();
        tables.ensure_user(edge.follower(), "followers_follower_id_fkey")?;
        tables.ensure_user(edge.followed(), "followers_followed_id_fkey")?;
        if !tables
            .follows
            .insert((edge.follower().get(), edge.followed().get()))
        {
            return Err(StoreError::conflict("followers_pkey"));
        }
        Ok(())
    }

    async fn unfollow(&self, edge: &FollowEdge) -> Result<(), StoreError> {
        if self
            .tables()
            .follows
            .remove(&(edge.follower().get(), edge.followed().get()))
        {
            Ok(())
        } else {
            Err(StoreError::not_found("follow edge"))
        }
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Role, StoreError> {
        self.tables()
            .roles
            .iter()
            .find(|role| role.name == name)
            .cloned()
            .ok_or_else(|| StoreError::not_found("role"))
    }

    async fn find_by_id(&self, id: RoleId) -> Result<Role, StoreError> {
        self.tables()
            .roles
            .iter()
            .find(|role| role.id == id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("role"))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_and_invite(
        &self,
        user: &NewUser,
        invitation: &Invitation,
    ) -> Result<User, StoreError> {
        let now = self.clock.utc();
        let mut tables = self.tables();
        if tables.users.values().any(|existing| existing.username == user.username) {
            return Err(StoreError::conflict("users_username_key"));
        }
        if tables.users.values().any(|existing| existing.email == user.email) {
            return Err(StoreError::conflict("users_email_key"));
        }
        if !tables.roles.iter().any(|role| role.id == user.role_id) {
            return Err(StoreError::invalid_reference(
                "violates foreign key constraint users_role_id_fkey",
            ));
        }
        let raw = Tables::next(&mut tables.next_user);
        let id = UserId::new(raw).map_err(|err| StoreError::invalid_data(err.to_string()))?;
        let stored = User {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            role_id: user.role_id,
            is_active: false,
            created_at: now,
        };
        tables.users.insert(raw, stored.clone());
        tables.invitations.push(StoredInvitation {
            digest: invitation.digest.clone(),
            user_id: id,
            expires_at: invitation.expires_at,
        });
        Ok(stored)
    }

    async fn find_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.user_reads.fetch_add(1, Ordering::SeqCst);
        self.tables().user(id).cloned()
    }

    async fn activate(&self, digest: &TokenDigest, now: DateTime<Utc>) -> Result<UserId, StoreError> {
        let mut tables = self.tables();
        let Some(user_id) = tables
            .invitations
            .iter()
            .find(|invitation| invitation.digest == *digest && invitation.expires_at > now)
            .map(|invitation| invitation.user_id)
        else {
            return Err(StoreError::not_found("invitation"));
        };
        match tables.users.get_mut(&user_id.get()) {
            Some(user) => user.is_active = true,
            None => return Err(StoreError::not_found("user")),
        }
        tables
            .invitations
            .retain(|invitation| invitation.user_id != user_id);
        Ok(user_id)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn check(&self) -> Result<(), StoreError> {
        if self.healthy.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::connection("store offline"))
        }
    }
}
