//! Positive integer identifiers for stored entities.
//!
//! Identifiers are assigned by the store. Zero and negative values never
//! name a row, so they are rejected before any store round trip.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Error;

/// Rejected identifier value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} id must be a positive integer, got {value}")]
pub struct IdValidationError {
    kind: &'static str,
    value: i64,
}

impl From<IdValidationError> for Error {
    fn from(value: IdValidationError) -> Self {
        Self::invalid_request(value.to_string())
    }
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "i64", into = "i64")]
        pub struct $name(i64);

        impl $name {
            /// Validate and wrap a raw identifier.
            pub fn new(value: i64) -> Result<Self, IdValidationError> {
                if value <= 0 {
                    return Err(IdValidationError { kind: $kind, value });
                }
                Ok(Self(value))
            }

            /// Raw identifier value.
            #[must_use]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl TryFrom<i64> for $name {
            type Error = IdValidationError;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a user account.
    UserId,
    "user"
);
define_id!(
    /// Identifier of a post.
    PostId,
    "post"
);
define_id!(
    /// Identifier of a comment.
    CommentId,
    "comment"
);
define_id!(
    /// Identifier of a role.
    RoleId,
    "role"
);
