//! Post, comment and feed use-cases.
//!
//! Reads of a single post go through the cache-aside reader under
//! `post-<id>`. Updates and deletes read the post straight from the store
//! (authorization and patch merging must see the latest row), write through
//! the store and then invalidate the cache entry.

use std::sync::Arc;

use pagination::FeedQuery;
use serde::Serialize;
use tracing::info;

use super::ports::{
    CacheKey, CommentRepository, FeedRepository, PostRepository, RoleRepository, UserRepository,
};
use super::role::{ADMIN_ROLE, MODERATOR_ROLE};
use super::{
    Actor, CacheAside, Comment, Error, FeedItem, NewComment, NewPost, Post, PostId, PostPatch,
    PostUpdate, Role, UserId, authorize_post_mutation,
};

/// Cache entity kind for posts.
pub const POST_CACHE_KIND: &str = "post";

/// A post together with its comments, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostWithComments {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// Stores used by [`PostService`].
#[derive(Clone)]
pub struct PostStores {
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub feed: Arc<dyn FeedRepository>,
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
}

/// Post use-cases shared by the HTTP handlers.
#[derive(Clone)]
pub struct PostService {
    stores: PostStores,
    cache: CacheAside,
}

fn post_key(id: PostId) -> CacheKey {
    CacheKey::entity(POST_CACHE_KIND, id.get())
}

impl PostService {
    /// Build the service over `stores`, reading single posts through `cache`.
    pub fn new(stores: PostStores, cache: CacheAside) -> Self {
        Self { stores, cache }
    }

    /// Insert a validated post.
    pub async fn create(&self, post: NewPost) -> Result<Post, Error> {
        let created = self.stores.posts.create(&post).await?;
        info!(post_id = %created.id, user_id = %created.user_id, "post created");
        Ok(created)
    }

    /// Read a post through the cache.
    pub async fn find(&self, id: PostId) -> Result<Post, Error> {
        let posts = Arc::clone(&self.stores.posts);
        self.cache
            .read(&post_key(id), || async move { Ok(posts.find_by_id(id).await?) })
            .await
    }

    /// Read a post and its comments.
    pub async fn find_with_comments(&self, id: PostId) -> Result<PostWithComments, Error> {
        let post = self.find(id).await?;
        let comments = self.stores.comments.list_for_post(id).await?;
        Ok(PostWithComments { post, comments })
    }

    /// Apply `patch` if the stored version still equals `expected_version`.
    ///
    /// Losing a race yields [`super::ErrorCode::Conflict`]; a vanished post
    /// yields [`super::ErrorCode::NotFound`].
    pub async fn update(
        &self,
        actor: UserId,
        id: PostId,
        patch: PostPatch,
        expected_version: u32,
    ) -> Result<Post, Error> {
        let current = self.stores.posts.find_by_id(id).await?;
        self.authorize(actor, &current, MODERATOR_ROLE).await?;

        let update = PostUpdate::merge(&current, patch, expected_version)?;
        let updated = self.stores.posts.update(&update).await?;
        self.cache.invalidate(&post_key(id)).await;
        info!(post_id = %id, version = updated.version, "post updated");
        Ok(updated)
    }

    /// Hard-delete a post.
    pub async fn delete(&self, actor: UserId, id: PostId) -> Result<(), Error> {
        let current = self.stores.posts.find_by_id(id).await?;
        self.authorize(actor, &current, ADMIN_ROLE).await?;

        self.stores.posts.delete(id).await?;
        self.cache.invalidate(&post_key(id)).await;
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    /// Attach a comment to a post.
    pub async fn comment(&self, comment: NewComment) -> Result<Comment, Error> {
        Ok(self.stores.comments.create(&comment).await?)
    }

    /// The caller's feed.
    pub async fn feed(&self, user_id: UserId, query: &FeedQuery) -> Result<Vec<FeedItem>, Error> {
        Ok(self.stores.feed.feed(user_id, query).await?)
    }

    async fn authorize(&self, actor: UserId, post: &Post, required_role: &str) -> Result<(), Error> {
        if actor == post.user_id {
            return Ok(());
        }
        let user = self.stores.users.find_by_id(actor).await?;
        let (actor_role, required): (Role, Role) = (
            self.stores.roles.find_by_id(user.role_id).await?,
            self.stores.roles.find_by_name(required_role).await?,
        );
        authorize_post_mutation(
            Actor {
                user_id: actor,
                role: &actor_role,
            },
            post,
            &required,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{
        MockCommentRepository, MockEntityCache, MockFeedRepository, MockPostRepository,
        MockRoleRepository, MockUserRepository, StoreError,
    };
    use crate::domain::{RoleId, User};
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};
    use std::time::Duration;

    fn uid(raw: i64) -> UserId {
        UserId::new(raw).expect("user id")
    }

    fn pid(raw: i64) -> PostId {
        PostId::new(raw).expect("post id")
    }

    #[fixture]
    fn post() -> Post {
        let at = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .expect("timestamp");
        Post {
            id: pid(5),
            user_id: uid(1),
            title: "Title".to_owned(),
            content: "Content".to_owned(),
            tags: vec!["go".to_owned()],
            created_at: at,
            updated_at: at,
            version: 2,
        }
    }

    fn role(id: i64, name: &str, level: i32) -> Role {
        Role {
            id: RoleId::new(id).expect("role id"),
            name: name.to_owned(),
            description: String::new(),
            level,
        }
    }

    #[derive(Default)]
    struct Mocks {
        posts: MockPostRepository,
        users: MockUserRepository,
        roles: MockRoleRepository,
        cache: Option<MockEntityCache>,
    }

    impl Mocks {
        fn build(self) -> PostService {
            let cache = match self.cache {
                Some(mock) => CacheAside::new(Arc::new(mock), Duration::from_secs(60)),
                None => CacheAside::disabled(),
            };
            PostService::new(
                PostStores {
                    posts: Arc::new(self.posts),
                    comments: Arc::new(MockCommentRepository::new()),
                    feed: Arc::new(MockFeedRepository::new()),
                    users: Arc::new(self.users),
                    roles: Arc::new(self.roles),
                },
                cache,
            )
        }
    }

    fn invalidation_cache() -> MockEntityCache {
        let mut cache = MockEntityCache::new();
        cache
            .expect_delete()
            .with(eq(CacheKey::entity("post", 5)))
            .times(1)
            .return_once(|_| Ok(()));
        cache
    }

    #[rstest]
    #[tokio::test]
    async fn owner_update_bumps_version_and_invalidates(post: Post) {
        let mut mocks = Mocks::default();
        let stored = post.clone();
        mocks
            .posts
            .expect_find_by_id()
            .return_once(move |_| Ok(stored));
        let mut updated = post.clone();
        updated.title = "New".to_owned();
        updated.version = 3;
        let returned = updated.clone();
        mocks
            .posts
            .expect_update()
            .withf(|update| update.expected_version() == 2 && update.title() == "New")
            .return_once(move |_| Ok(returned));
        mocks.cache = Some(invalidation_cache());

        let patch = PostPatch {
            title: Some("New".to_owned()),
            ..PostPatch::default()
        };
        let result = mocks
            .build()
            .update(uid(1), pid(5), patch, 2)
            .await
            .expect("update succeeds");
        assert_eq!(result, updated);
    }

    #[rstest]
    #[tokio::test]
    async fn stale_version_is_a_conflict(post: Post) {
        let mut mocks = Mocks::default();
        mocks.posts.expect_find_by_id().return_once(move |_| Ok(post));
        mocks
            .posts
            .expect_update()
            .return_once(|_| Err(StoreError::version_mismatch(1_u32, 2_u32)));

        let err = mocks
            .build()
            .update(uid(1), pid(5), PostPatch::default(), 1)
            .await
            .expect_err("stale version");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[rstest]
    #[tokio::test]
    async fn stranger_without_rank_is_forbidden(post: Post) {
        let mut mocks = Mocks::default();
        mocks.posts.expect_find_by_id().return_once(move |_| Ok(post));
        mocks.posts.expect_update().never();
        mocks.users.expect_find_by_id().return_once(|id| {
            Ok(User {
                id,
                username: "eve".to_owned(),
                email: "eve@example.com".to_owned(),
                role_id: RoleId::new(1).expect("role id"),
                is_active: true,
                created_at: Utc::now(),
            })
        });
        mocks
            .roles
            .expect_find_by_id()
            .return_once(|_| Ok(role(1, "user", 1)));
        mocks
            .roles
            .expect_find_by_name()
            .with(eq("moderator"))
            .return_once(|_| Ok(role(2, "moderator", 2)));

        let err = mocks
            .build()
            .update(uid(9), pid(5), PostPatch::default(), 2)
            .await
            .expect_err("forbidden");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }

    #[rstest]
    #[tokio::test]
    async fn admin_may_delete_foreign_post(post: Post) {
        let mut mocks = Mocks::default();
        mocks.posts.expect_find_by_id().return_once(move |_| Ok(post));
        mocks
            .posts
            .expect_delete()
            .with(eq(pid(5)))
            .times(1)
            .return_once(|_| Ok(()));
        mocks.users.expect_find_by_id().return_once(|id| {
            Ok(User {
                id,
                username: "root".to_owned(),
                email: "root@example.com".to_owned(),
                role_id: RoleId::new(3).expect("role id"),
                is_active: true,
                created_at: Utc::now(),
            })
        });
        mocks
            .roles
            .expect_find_by_id()
            .return_once(|_| Ok(role(3, "admin", 3)));
        mocks
            .roles
            .expect_find_by_name()
            .with(eq("admin"))
            .return_once(|_| Ok(role(3, "admin", 3)));
        mocks.cache = Some(invalidation_cache());

        mocks
            .build()
            .delete(uid(2), pid(5))
            .await
            .expect("admin delete");
    }

    #[tokio::test]
    async fn deleting_missing_post_is_not_found() {
        let mut mocks = Mocks::default();
        mocks
            .posts
            .expect_find_by_id()
            .return_once(|_| Err(StoreError::not_found("post 5")));
        mocks.posts.expect_delete().never();

        let err = mocks
            .build()
            .delete(uid(1), pid(5))
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn invalid_merge_never_reaches_store(post: Post) {
        let mut mocks = Mocks::default();
        mocks.posts.expect_find_by_id().return_once(move |_| Ok(post));
        mocks.posts.expect_update().never();

        let patch = PostPatch {
            title: Some(" ".to_owned()),
            ..PostPatch::default()
        };
        let err = mocks
            .build()
            .update(uid(1), pid(5), patch, 2)
            .await
            .expect_err("invalid");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }
}
