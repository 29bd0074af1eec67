//! Registration, invitation expiry, activation and follows.

mod common;

use std::time::Duration;

use common::World;
use rstest::{fixture, rstest};
use social_backend::domain::{ErrorCode, InvitationToken, Registration};

#[fixture]
fn world() -> World {
    World::new()
}

fn registration(name: &str) -> Registration {
    Registration::new(name, format!("{name}@example.com"), "secret").expect("valid registration")
}

#[rstest]
#[tokio::test]
async fn registration_creates_an_inactive_user(world: World) {
    let registered = world.users.register(registration("linus")).await.expect("register");

    assert!(!registered.user.is_active);
    assert_eq!(registered.user.username, "linus");
    assert!(!registered.token.expose().is_empty());
}

#[rstest]
#[case("linus", "other@example.com", "users_username_key")]
#[case("other", "linus@example.com", "users_email_key")]
#[tokio::test]
async fn duplicates_conflict_naming_the_constraint(
    world: World,
    #[case] username: &str,
    #[case] email: &str,
    #[case] constraint: &str,
) {
    world.users.register(registration("linus")).await.expect("first");
    let duplicate = Registration::new(username, email, "secret").expect("valid");

    let err = world.users.register(duplicate).await.expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.details().expect("details")["constraint"], constraint);
}

#[rstest]
#[tokio::test]
async fn tokens_activate_once(world: World) {
    let registered = world.users.register(registration("linus")).await.expect("register");

    let activated = world.users.activate(&registered.token).await.expect("activate");
    let again = world.users.activate(&registered.token).await.expect_err("consumed");

    assert_eq!(activated, registered.user.id);
    assert_eq!(again.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn expired_invitations_do_not_activate(world: World) {
    let registered = world.users.register(registration("linus")).await.expect("register");
    world.clock.advance(Duration::from_secs(5 * 60 * 60));

    let err = world.users.activate(&registered.token).await.expect_err("expired");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(!world.users.find(registered.user.id).await.expect("user").is_active);
}

#[rstest]
#[tokio::test]
async fn unknown_tokens_are_not_found(world: World) {
    let token = InvitationToken::parse("no-such-token").expect("token");
    let err = world.users.activate(&token).await.expect_err("unknown");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn follow_edges_are_unique(world: World) {
    let a = world.user("a");
    let b = world.user("b");

    world.users.follow(a.id, b.id).await.expect("follow");
    let err = world.users.follow(a.id, b.id).await.expect_err("duplicate");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn follow_rejects_self_and_unknown_users(world: World) {
    let a = world.user("a");
    let ghost = social_backend::domain::UserId::new(404).expect("id");

    let own = world.users.follow(a.id, a.id).await.expect_err("self follow");
    let unknown = world.users.follow(a.id, ghost).await.expect_err("unknown");
    let missing = world.users.unfollow(a.id, ghost).await.expect_err("no edge");

    assert_eq!(own.code(), ErrorCode::InvalidRequest);
    assert_eq!(unknown.code(), ErrorCode::InvalidRequest);
    assert_eq!(missing.code(), ErrorCode::NotFound);
}
