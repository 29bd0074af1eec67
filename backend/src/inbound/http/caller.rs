//! Caller identity supplied by the authentication collaborator.
//!
//! The authenticating proxy forwards the verified user id in `x-user-id`.
//! Handlers that act on behalf of a user take [`Caller`] as an extractor.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload};

use crate::domain::{Error, UserId};

/// Header carrying the authenticated user id.
pub const CALLER_HEADER: &str = "x-user-id";

/// Authenticated caller of the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(UserId);

impl Caller {
    /// Identifier of the calling user.
    pub fn user_id(self) -> UserId {
        self.0
    }

    fn from_header(value: Option<&str>) -> Result<Self, Error> {
        let raw = value.ok_or_else(|| Error::unauthorized("missing caller identity"))?;
        raw.trim()
            .parse::<i64>()
            .ok()
            .and_then(|id| UserId::new(id).ok())
            .map(Self)
            .ok_or_else(|| Error::unauthorized("malformed caller identity"))
    }
}

impl FromRequest for Caller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let header = req
            .headers()
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok());
        ready(Self::from_header(header))
    }
}
