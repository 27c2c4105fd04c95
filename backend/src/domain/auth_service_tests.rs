//! Tests for the authentication service.

use std::sync::Arc;

use rstest::rstest;

use super::*;
use crate::domain::ports::{
    AuthTokenRepositoryError, MockAuthTokenRepository, MockPasswordHasher, MockUserRepository,
    StoredCredentials,
};
use crate::domain::{ErrorCode, RegistrationDraft};
use crate::test_support::{FixtureClock, fixture_now, sample_user};

type Service = AuthServiceImpl<MockUserRepository, MockAuthTokenRepository, MockPasswordHasher>;

fn service(
    users: MockUserRepository,
    tokens: MockAuthTokenRepository,
    hasher: MockPasswordHasher,
) -> Service {
    AuthServiceImpl::new(
        Arc::new(users),
        Arc::new(tokens),
        Arc::new(hasher),
        Arc::new(FixtureClock::new(fixture_now())),
    )
}

fn registration() -> RegistrationRequest {
    RegistrationRequest::try_from(RegistrationDraft {
        name: "Ada Lovelace".to_owned(),
        email: "Ada@Example.com".to_owned(),
        password: "correct horse".to_owned(),
        role: "student".to_owned(),
        instruments: vec!["Piano".to_owned()],
        location: Some("London".to_owned()),
    })
    .expect("valid registration")
}

fn credentials(password: &str) -> LoginCredentials {
    LoginCredentials::try_from_parts("ada@example.com", password).expect("valid credentials")
}

fn hashing_hasher() -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|password| Ok(format!("hashed:{password}")));
    hasher
}

#[tokio::test]
async fn register_hashes_password_and_issues_token() {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .withf(|user, hash| {
            user.email.as_ref() == "ada@example.com"
                && user.role == Role::Student
                && user.profile.instruments == vec!["Piano".to_owned()]
                && hash == "hashed:correct horse"
        })
        .times(1)
        .return_once(|_, _| Ok(()));
    let mut tokens = MockAuthTokenRepository::new();
    tokens
        .expect_store()
        .withf(|token| {
            token.expires_at - token.created_at
                == TimeDelta::hours(i64::from(DEFAULT_TOKEN_TTL_HOURS))
                && token.digest.len() == 64
        })
        .times(1)
        .return_once(|_| Ok(()));

    let session = service(users, tokens, hashing_hasher())
        .register(registration())
        .await
        .expect("registration succeeds");

    assert_eq!(session.user.name.as_ref(), "Ada Lovelace");
    assert_eq!(session.user.created_at, fixture_now());
    assert!(!session.token.expose().is_empty());
}

#[tokio::test]
async fn register_reports_duplicate_email_as_conflict() {
    let mut users = MockUserRepository::new();
    users
        .expect_insert()
        .return_once(|_, _| Err(UserPersistenceError::duplicate_email("ada@example.com")));
    let mut tokens = MockAuthTokenRepository::new();
    tokens.expect_store().times(0);

    let err = service(users, tokens, hashing_hasher())
        .register(registration())
        .await
        .expect_err("duplicate email");

    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[rstest]
#[case::unknown_email(false)]
#[case::wrong_password(true)]
#[tokio::test]
async fn login_failures_share_one_message(#[case] known: bool) {
    let mut users = MockUserRepository::new();
    users.expect_find_credentials().return_once(move |_| {
        Ok(known.then(|| StoredCredentials {
            user: sample_user(Role::Student, "Ada Lovelace"),
            password_hash: "stored".to_owned(),
        }))
    });
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().returning(|_, _| Ok(false));

    let err = service(users, MockAuthTokenRepository::new(), hasher)
        .login(credentials("wrong"))
        .await
        .expect_err("login fails");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), BAD_CREDENTIALS);
}

#[tokio::test]
async fn login_issues_token_for_valid_password() {
    let user = sample_user(Role::Teacher, "Ada Lovelace");
    let user_id = user.id;
    let mut users = MockUserRepository::new();
    users.expect_find_credentials().return_once(move |_| {
        Ok(Some(StoredCredentials {
            user,
            password_hash: "stored".to_owned(),
        }))
    });
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .withf(|password, hash| password == "secret123" && hash == "stored")
        .return_once(|_, _| Ok(true));
    let mut tokens = MockAuthTokenRepository::new();
    tokens
        .expect_store()
        .withf(move |token| token.user_id == user_id)
        .times(1)
        .return_once(|_| Ok(()));

    let session = service(users, tokens, hasher)
        .login(credentials("secret123"))
        .await
        .expect("login succeeds");

    assert_eq!(session.user.id, user_id);
}

#[tokio::test]
async fn authenticate_looks_up_token_digest() {
    let token = AuthToken::from_presented("presented-token");
    let digest = token.digest();
    let user = sample_user(Role::Student, "Ada Lovelace");
    let expected = AuthenticatedUser::from(&user);
    let mut tokens = MockAuthTokenRepository::new();
    tokens
        .expect_find_user()
        .withf(move |candidate, now| candidate == digest && *now == fixture_now())
        .times(1)
        .return_once(move |_, _| Ok(Some(user)));

    let resolved = service(MockUserRepository::new(), tokens, MockPasswordHasher::new())
        .authenticate(&token)
        .await
        .expect("token resolves");

    assert_eq!(resolved, expected);
}

#[tokio::test]
async fn authenticate_rejects_unknown_tokens() {
    let mut tokens = MockAuthTokenRepository::new();
    tokens.expect_find_user().return_once(|_, _| Ok(None));

    let err = service(MockUserRepository::new(), tokens, MockPasswordHasher::new())
        .authenticate(&AuthToken::from_presented("stale"))
        .await
        .expect_err("unknown token");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn authenticate_maps_pool_failures_to_service_unavailable() {
    let mut tokens = MockAuthTokenRepository::new();
    tokens
        .expect_find_user()
        .return_once(|_, _| Err(AuthTokenRepositoryError::connection("pool timeout")));

    let err = service(MockUserRepository::new(), tokens, MockPasswordHasher::new())
        .authenticate(&AuthToken::from_presented("any"))
        .await
        .expect_err("pool failure");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn ensure_admin_skips_existing_accounts() {
    let mut users = MockUserRepository::new();
    users.expect_find_credentials().return_once(|_| {
        Ok(Some(StoredCredentials {
            user: sample_user(Role::Admin, "Root Admin"),
            password_hash: "stored".to_owned(),
        }))
    });
    users.expect_insert().times(0);

    let created = service(users, MockAuthTokenRepository::new(), MockPasswordHasher::new())
        .ensure_admin(credentials("bootstrap-pass"))
        .await
        .expect("bootstrap check succeeds");

    assert!(!created);
}

#[tokio::test]
async fn ensure_admin_creates_missing_admin() {
    let mut users = MockUserRepository::new();
    users.expect_find_credentials().return_once(|_| Ok(None));
    users
        .expect_insert()
        .withf(|user, _| user.role == Role::Admin)
        .times(1)
        .return_once(|_, _| Ok(()));

    let created = service(users, MockAuthTokenRepository::new(), hashing_hasher())
        .ensure_admin(credentials("bootstrap-pass"))
        .await
        .expect("bootstrap succeeds");

    assert!(created);
}
