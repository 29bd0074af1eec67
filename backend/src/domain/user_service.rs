//! Registration, activation, profile and follow use-cases.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use mockable::Clock;
use tracing::info;

use super::ports::{CacheKey, FollowerRepository, RoleRepository, UserRepository};
use super::role::DEFAULT_ROLE;
use super::{
    CacheAside, Error, FollowEdge, Invitation, InvitationToken, NewUser, PasswordHash,
    Registration, User, UserId,
};

/// Cache entity kind for users.
pub const USER_CACHE_KIND: &str = "user";
/// Default lifetime of an activation invitation.
pub const DEFAULT_INVITATION_TTL: Duration = Duration::from_secs(5 * 60 * 60);

/// Result of a registration: the inactive account and the token to deliver.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub user: User,
    pub token: InvitationToken,
}

/// Stores used by [`UserService`].
#[derive(Clone)]
pub struct UserStores {
    pub users: Arc<dyn UserRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub followers: Arc<dyn FollowerRepository>,
}

/// User use-cases shared by the HTTP handlers.
#[derive(Clone)]
pub struct UserService {
    stores: UserStores,
    cache: CacheAside,
    clock: Arc<dyn Clock + Send + Sync>,
    invitation_ttl: Duration,
}

fn user_key(id: UserId) -> CacheKey {
    CacheKey::entity(USER_CACHE_KIND, id.get())
}

impl UserService {
    /// Build the service.
    pub fn new(stores: UserStores, cache: CacheAside, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            stores,
            cache,
            clock,
            invitation_ttl: DEFAULT_INVITATION_TTL,
        }
    }

    /// Override how long invitations stay valid.
    #[must_use]
    pub fn with_invitation_ttl(mut self, ttl: Duration) -> Self {
        self.invitation_ttl = ttl;
        self
    }

    /// Create an inactive account and its invitation atomically.
    pub async fn register(&self, registration: Registration) -> Result<RegisteredUser, Error> {
        let password_hash = PasswordHash::from_plaintext(registration.password()).map_err(|err| {
            tracing::error!(error = %err, "password hashing failed");
            Error::internal("Internal server error")
        })?;
        let role = self.stores.roles.find_by_name(DEFAULT_ROLE).await?;
        let ttl = TimeDelta::from_std(self.invitation_ttl)
            .map_err(|_| Error::internal("invitation lifetime out of range"))?;

        let token = InvitationToken::generate();
        let invitation = Invitation {
            digest: token.digest(),
            expires_at: self.clock.utc() + ttl,
        };
        let new_user = NewUser {
            username: registration.username().to_owned(),
            email: registration.email().to_owned(),
            password_hash,
            role_id: role.id,
        };

        let user = self
            .stores
            .users
            .create_and_invite(&new_user, &invitation)
            .await?;
        info!(user_id = %user.id, "user registered");
        Ok(RegisteredUser { user, token })
    }

    /// Activate the account holding `token`.
    pub async fn activate(&self, token: &InvitationToken) -> Result<UserId, Error> {
        let user_id = self
            .stores
            .users
            .activate(&token.digest(), self.clock.utc())
            .await?;
        self.cache.invalidate(&user_key(user_id)).await;
        info!(%user_id, "user activated");
        Ok(user_id)
    }

    /// Read a user through the cache.
    pub async fn find(&self, id: UserId) -> Result<User, Error> {
        let users = Arc::clone(&self.stores.users);
        self.cache
            .read(&user_key(id), || async move { Ok(users.find_by_id(id).await?) })
            .await
    }

    /// `follower` starts following `followed`.
    pub async fn follow(&self, follower: UserId, followed: UserId) -> Result<(), Error> {
        let edge = FollowEdge::new(follower, followed)?;
        self.stores.followers.follow(&edge).await?;
        Ok(())
    }

    /// `follower` stops following `followed`.
    pub async fn unfollow(&self, follower: UserId, followed: UserId) -> Result<(), Error> {
        let edge = FollowEdge::new(follower, followed)?;
        self.stores.followers.unfollow(&edge).await?;
        Ok(())
    }
}
