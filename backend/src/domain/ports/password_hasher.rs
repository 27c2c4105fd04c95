//! Port for one-way password hashing.

use super::define_port_error;

define_port_error! {
    /// Errors raised by password hashing adapters.
    pub enum PasswordHashError {
        /// Hashing failed.
        Hash { message: String } => InternalError, "password hashing failed: {message}",
        /// A stored hash could not be parsed.
        MalformedHash { message: String } => InternalError,
            "stored password hash is malformed: {message}",
    }
}

/// Derive and verify password hashes.
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync {
    /// Hash `password` with a fresh salt, returning a self-describing string.
    fn hash(&self, password: &str) -> Result<String, PasswordHashError>;

    /// Check `password` against a previously produced hash.
    fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError>;
}
