//! Shared wiring for the behaviour suites: domain services over the
//! in-memory store, cache and clock.

use std::sync::Arc;

use mockable::Clock;
use social_backend::domain::{
    CacheAside, NewPost, Post, PostService, User, UserService, DEFAULT_CACHE_TTL,
};
use social_backend::test_support::{MemoryEntityCache, MemoryStore, MutableClock};

#[derive(Clone)]
pub struct World {
    pub clock: Arc<MutableClock>,
    pub store: Arc<MemoryStore>,
    pub cache: Arc<MemoryEntityCache>,
    pub posts: PostService,
    pub users: UserService,
}

impl World {
    pub fn new() -> Self {
        let clock = Arc::new(MutableClock::at_epoch());
        let shared_clock: Arc<dyn Clock + Send + Sync> = clock.clone();
        let store = Arc::new(MemoryStore::new(Arc::clone(&shared_clock)));
        let cache = Arc::new(MemoryEntityCache::new(Arc::clone(&shared_clock)));
        let reader = CacheAside::new(cache.clone(), DEFAULT_CACHE_TTL);
        let posts = PostService::new(store.post_stores(), reader.clone());
        let users = UserService::new(store.user_stores(), reader, shared_clock);
        Self {
            clock,
            store,
            cache,
            posts,
            users,
        }
    }

    pub fn user(&self, name: &str) -> User {
        self.store.seed_user(name, "user")
    }

    /// Publish a post as `author`, one second after the previous one.
    pub async fn publish(&self, author: &User, title: &str, tags: &[&str]) -> Post {
        self.clock.advance_seconds(1);
        let post = NewPost::new(author.id, title, format!("{title} body"), tags.iter().copied())
            .expect("valid post");
        self.posts.create(post).await.expect("post created")
    }
}
