//! Directed follow relationships between users.

use super::{Error, UserId};

/// A follower → followed edge. Users cannot follow themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FollowEdge {
    follower: UserId,
    followed: UserId,
}

impl FollowEdge {
    /// Validate the edge.
    pub fn new(follower: UserId, followed: UserId) -> Result<Self, Error> {
        if follower == followed {
            return Err(Error::invalid_request("users cannot follow themselves"));
        }
        Ok(Self { follower, followed })
    }

    /// User doing the following.
    pub fn follower(&self) -> UserId {
        self.follower
    }

    /// User being followed.
    pub fn followed(&self) -> UserId {
        self.followed
    }
}
