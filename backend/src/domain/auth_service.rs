//! Account registration, login, and bearer token resolution.
//!
//! Raw tokens never reach persistence: only their SHA-256 digest is stored,
//! and lookups resolve the digest and its owner in a single query.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::profile_service::map_user_error;
use crate::domain::ports::{
    AuthService, AuthTokenRepository, PasswordHasher, StoredToken, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    AuthSession, AuthToken, AuthenticatedUser, DisplayName, Error, LoginCredentials,
    RegistrationRequest, Role, User, UserId, UserProfile,
};

/// Token lifetime used when none is configured.
pub const DEFAULT_TOKEN_TTL_HOURS: u32 = 168;

const BAD_CREDENTIALS: &str = "invalid email or password";
const ADMIN_DISPLAY_NAME: &str = "Administrator";

/// Authentication service implementing [`AuthService`].
#[derive(Clone)]
pub struct AuthServiceImpl<U, T, H> {
    users: Arc<U>,
    tokens: Arc<T>,
    hasher: Arc<H>,
    clock: Arc<dyn Clock>,
    token_ttl: TimeDelta,
}

impl<U, T, H> AuthServiceImpl<U, T, H> {
    /// Service issuing tokens valid for the default TTL.
    pub fn new(users: Arc<U>, tokens: Arc<T>, hasher: Arc<H>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            tokens,
            hasher,
            clock,
            token_ttl: TimeDelta::hours(i64::from(DEFAULT_TOKEN_TTL_HOURS)),
        }
    }

    /// Override how long issued tokens stay valid.
    #[must_use]
    pub fn with_token_ttl_hours(mut self, hours: u32) -> Self {
        self.token_ttl = TimeDelta::hours(i64::from(hours.max(1)));
        self
    }
}

impl<U, T, H> AuthServiceImpl<U, T, H>
where
    U: UserRepository,
    T: AuthTokenRepository,
    H: PasswordHasher + 'static,
{
    async fn hash_password(&self, password: Zeroizing<String>) -> Result<String, Error> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(password.as_str()))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(Error::from)
    }

    async fn verify_password(
        &self,
        password: Zeroizing<String>,
        hash: String,
    ) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.verify(password.as_str(), &hash))
            .await
            .map_err(|err| Error::internal(format!("password verification task failed: {err}")))?
            .map_err(Error::from)
    }

    async fn issue_token(&self, user: &User, now: DateTime<Utc>) -> Result<AuthToken, Error> {
        let token = AuthToken::generate();
        self.tokens
            .store(&StoredToken {
                digest: token.digest(),
                user_id: user.id,
                created_at: now,
                expires_at: now + self.token_ttl,
            })
            .await
            .map_err(Error::from)?;
        Ok(token)
    }

    /// Remove expired tokens, returning how many were deleted.
    pub async fn purge_expired_tokens(&self) -> Result<u64, Error> {
        self.tokens
            .purge_expired(self.clock.utc())
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl<U, T, H> AuthService for AuthServiceImpl<U, T, H>
where
    U: UserRepository,
    T: AuthTokenRepository,
    H: PasswordHasher + 'static,
{
    async fn register(&self, request: RegistrationRequest) -> Result<AuthSession, Error> {
        let now = self.clock.utc();
        let hash = self
            .hash_password(Zeroizing::new(request.password().to_owned()))
            .await?;
        let user = User {
            id: UserId::random(),
            name: request.name().clone(),
            email: request.email().clone(),
            role: request.role(),
            profile: UserProfile {
                instruments: request.instruments().to_vec(),
                location: request.location().map(str::to_owned),
                ..UserProfile::default()
            },
            created_at: now,
            updated_at: now,
        };
        self.users
            .insert(&user, &hash)
            .await
            .map_err(map_user_error)?;
        let token = self.issue_token(&user, now).await?;
        info!(user_id = %user.id, role = %user.role, "account registered");
        Ok(AuthSession { token, user })
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<AuthSession, Error> {
        let Some(stored) = self
            .users
            .find_credentials(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        };
        let verified = self
            .verify_password(
                Zeroizing::new(credentials.password().to_owned()),
                stored.password_hash,
            )
            .await?;
        if !verified {
            return Err(Error::unauthorized(BAD_CREDENTIALS));
        }
        let token = self.issue_token(&stored.user, self.clock.utc()).await?;
        info!(user_id = %stored.user.id, "login succeeded");
        Ok(AuthSession {
            token,
            user: stored.user,
        })
    }

    async fn authenticate(&self, token: &AuthToken) -> Result<AuthenticatedUser, Error> {
        self.tokens
            .find_user(&token.digest(), self.clock.utc())
            .await
            .map_err(Error::from)?
            .map(|user| AuthenticatedUser::from(&user))
            .ok_or_else(|| Error::unauthorized("invalid or expired token"))
    }

    async fn logout(&self, token: &AuthToken) -> Result<(), Error> {
        self.tokens
            .revoke(&token.digest())
            .await
            .map_err(Error::from)
    }

    async fn ensure_admin(&self, credentials: LoginCredentials) -> Result<bool, Error> {
        if let Some(existing) = self
            .users
            .find_credentials(credentials.email())
            .await
            .map_err(map_user_error)?
        {
            if existing.user.role != Role::Admin {
                warn!(
                    email = %credentials.email(),
                    role = %existing.user.role,
                    "bootstrap admin email belongs to a non-admin account"
                );
            }
            return Ok(false);
        }

        let now = self.clock.utc();
        let hash = self
            .hash_password(Zeroizing::new(credentials.password().to_owned()))
            .await?;
        let admin = User {
            id: UserId::random(),
            name: DisplayName::new(ADMIN_DISPLAY_NAME)?,
            email: credentials.email().clone(),
            role: Role::Admin,
            profile: UserProfile::default(),
            created_at: now,
            updated_at: now,
        };
        match self.users.insert(&admin, &hash).await {
            Ok(()) => {
                info!(user_id = %admin.id, "bootstrap admin created");
                Ok(true)
            }
            Err(UserPersistenceError::DuplicateEmail { .. }) => Ok(false),
            Err(err) => Err(map_user_error(err)),
        }
    }
}

#[cfg(test)]
#[path = "auth_service_tests.rs"]
mod tests;
