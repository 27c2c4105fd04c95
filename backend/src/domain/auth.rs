//! Authentication primitives: credentials, registration, and bearer tokens.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a port or service.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::user::{
    DisplayName, EmailAddress, Role, User, UserId, UserValidationError, normalise_instruments,
};
use super::Error;

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 8;
const TOKEN_BYTES: usize = 32;

/// Domain error returned when login or registration values are invalid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthValidationError {
    /// Password was blank.
    #[error("password must not be empty")]
    EmptyPassword,
    /// Password shorter than [`PASSWORD_MIN`].
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum length.
        min: usize,
    },
    /// Self-registration as an administrator was attempted.
    #[error("role must be student or teacher")]
    RoleNotRegistrable,
    /// A user field failed validation.
    #[error(transparent)]
    User(#[from] UserValidationError),
}

impl AuthValidationError {
    /// API field name the error refers to.
    pub fn field(&self) -> &'static str {
        match self {
            Self::EmptyPassword | Self::PasswordTooShort { .. } => "password",
            Self::RoleNotRegistrable => "role",
            Self::User(inner) => inner.field(),
        }
    }
}

/// Validated login credentials used by authentication services.
///
/// ## Invariants
/// - `email` is normalised through [`EmailAddress`].
/// - `password` is required to be non-empty but retains caller-provided
///   whitespace to avoid surprising credential comparisons.
///
/// # Examples
/// ```
/// use musiconthego::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("Ada@Example.com", "password").unwrap();
/// assert_eq!(creds.email().as_ref(), "ada@example.com");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    email: EmailAddress,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, AuthValidationError> {
        let email = EmailAddress::new(email)?;
        if password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        Ok(Self {
            email,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Normalised email used for lookups.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Raw registration inputs as received from a client.
#[derive(Debug, Clone, Default)]
pub struct RegistrationDraft {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub instruments: Vec<String>,
    pub location: Option<String>,
}

/// Validated account registration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    name: DisplayName,
    email: EmailAddress,
    password: Zeroizing<String>,
    role: Role,
    instruments: Vec<String>,
    location: Option<String>,
}

impl RegistrationRequest {
    /// Display name to register.
    pub fn name(&self) -> &DisplayName {
        &self.name
    }

    /// Normalised email address.
    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    /// Plain-text password, only for hashing.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Requested role; never admin.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Trimmed, de-duplicated instruments.
    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }
}

impl TryFrom<RegistrationDraft> for RegistrationRequest {
    type Error = AuthValidationError;

    fn try_from(draft: RegistrationDraft) -> Result<Self, Self::Error> {
        let name = DisplayName::new(&draft.name)?;
        let email = EmailAddress::new(&draft.email)?;
        let role: Role = draft.role.parse()?;
        if role == Role::Admin {
            return Err(AuthValidationError::RoleNotRegistrable);
        }
        if draft.password.is_empty() {
            return Err(AuthValidationError::EmptyPassword);
        }
        if draft.password.chars().count() < PASSWORD_MIN {
            return Err(AuthValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        let instruments = normalise_instruments(draft.instruments)?;
        let location = draft
            .location
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        Ok(Self {
            name,
            email,
            password: Zeroizing::new(draft.password),
            role,
            instruments,
            location,
        })
    }
}

/// Opaque bearer token handed to clients.
///
/// The raw value never reaches persistence; only [`AuthToken::digest`] does.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(Zeroizing<String>);

impl AuthToken {
    /// Generate a fresh random token.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0_u8; TOKEN_BYTES]);
        rand::thread_rng().fill_bytes(&mut bytes[..]);
        Self(Zeroizing::new(URL_SAFE_NO_PAD.encode(&bytes[..])))
    }

    /// Wrap a token presented by a client.
    pub fn from_presented(raw: impl Into<String>) -> Self {
        Self(Zeroizing::new(raw.into()))
    }

    /// Raw token string.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    /// Lower-case hex SHA-256 digest used as the storage key.
    pub fn digest(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AuthToken(<redacted>)")
    }
}

/// Identity resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub role: Role,
    pub name: String,
}

impl AuthenticatedUser {
    /// Ensure the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), Error> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(Error::forbidden(format!(
                "{} accounts may not perform this action",
                self.role
            )))
        }
    }

    /// Admins bypass ownership checks.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<&User> for AuthenticatedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            name: user.name.to_string(),
        }
    }
}

/// Token plus profile returned after registration or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: AuthToken,
    pub user: User,
}

impl From<AuthValidationError> for super::Error {
    fn from(err: AuthValidationError) -> Self {
        Self::invalid_field(err.field(), "invalid_value", err.to_string())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn draft() -> RegistrationDraft {
        RegistrationDraft {
            name: "Ada Lovelace".to_owned(),
            email: "ada@example.com".to_owned(),
            password: "correct horse".to_owned(),
            role: "student".to_owned(),
            instruments: vec!["Piano".to_owned()],
            location: Some("  ".to_owned()),
        }
    }

    #[rstest]
    #[case("", "pw")]
    #[case("not-an-email", "pw")]
    fn invalid_login_email(#[case] email: &str, #[case] password: &str) {
        let err = LoginCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err.field(), "email");
    }

    #[rstest]
    fn empty_login_password() {
        let err = LoginCredentials::try_from_parts("a@b.io", "").expect_err("must fail");
        assert_eq!(err, AuthValidationError::EmptyPassword);
    }

    #[rstest]
    fn registration_normalises_fields() {
        let request = RegistrationRequest::try_from(draft()).expect("valid registration");
        assert_eq!(request.role(), Role::Student);
        assert_eq!(request.location(), None);
        assert_eq!(request.instruments(), ["Piano".to_owned()]);
    }

    #[rstest]
    fn registration_rejects_admin_role() {
        let mut draft = draft();
        draft.role = "admin".to_owned();
        assert_eq!(
            RegistrationRequest::try_from(draft),
            Err(AuthValidationError::RoleNotRegistrable)
        );
    }

    #[rstest]
    fn registration_rejects_short_password() {
        let mut draft = draft();
        draft.password = "short".to_owned();
        assert_eq!(
            RegistrationRequest::try_from(draft),
            Err(AuthValidationError::PasswordTooShort { min: PASSWORD_MIN })
        );
    }

    #[rstest]
    fn generated_tokens_are_unique_and_url_safe() {
        let first = AuthToken::generate();
        let second = AuthToken::generate();
        assert_ne!(first, second);
        assert_eq!(first.expose().len(), 43);
        assert!(
            first
                .expose()
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[rstest]
    fn digest_is_stable_hex() {
        let token = AuthToken::from_presented("abc");
        assert_eq!(
            token.digest(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(format!("{token:?}"), "AuthToken(<redacted>)");
    }

    #[rstest]
    fn require_role_rejects_other_roles() {
        let user = AuthenticatedUser {
            id: UserId::random(),
            role: Role::Student,
            name: "Ada".to_owned(),
        };
        assert!(user.require_role(&[Role::Student, Role::Admin]).is_ok());
        let err = user.require_role(&[Role::Teacher]).expect_err("forbidden");
        assert_eq!(err.code(), crate::domain::ErrorCode::Forbidden);
    }
}
