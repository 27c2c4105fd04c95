//! Application configuration loaded via OrthoConfig.
//!
//! Every key may come from the environment (`MOTG_` prefix), a config file,
//! or the command line. Optional keys fall back to the defaults below.

use std::net::{AddrParseError, IpAddr, SocketAddr};

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_TOKEN_TTL_HOURS};

const DEFAULT_BIND_HOST: &str = "0.0.0.0";
const DEFAULT_BIND_PORT: u16 = 8080;
const DEFAULT_CLOUDINARY_FOLDER: &str = "musiconthego";

/// Process-wide settings for the API server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MOTG")]
pub struct AppSettings {
    /// Interface to listen on.
    pub bind_host: Option<String>,
    /// Port to listen on.
    pub bind_port: Option<u16>,
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Lifetime of issued bearer tokens.
    pub token_ttl_hours: Option<u32>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    /// Root folder for uploaded media.
    pub cloudinary_folder: Option<String>,
    /// Upload ceiling in bytes.
    pub max_upload_bytes: Option<usize>,
    /// Comma-separated WebSocket Origin allow-list.
    pub allowed_origins: Option<String>,
    /// Bootstrap admin account created at startup when absent.
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl AppSettings {
    /// Listener address.
    ///
    /// # Errors
    ///
    /// Returns an error when `bind_host` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr, AddrParseError> {
        let host: IpAddr = self
            .bind_host
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_BIND_HOST)
            .parse()?;
        Ok(SocketAddr::new(
            host,
            self.bind_port.unwrap_or(DEFAULT_BIND_PORT),
        ))
    }

    /// Non-blank database URL, if configured.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Bearer token lifetime, defaulting to one week.
    pub fn token_ttl_hours(&self) -> u32 {
        self.token_ttl_hours.unwrap_or(DEFAULT_TOKEN_TTL_HOURS)
    }

    /// Upload folder, `musiconthego` unless configured.
    pub fn cloudinary_folder(&self) -> String {
        self.cloudinary_folder
            .clone()
            .filter(|folder| !folder.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLOUDINARY_FOLDER.to_owned())
    }

    /// Upload size cap in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes.unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    /// Allowed origins with blanks dropped; empty means any origin.
    pub fn allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Both bootstrap admin credentials, when set.
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_email.as_deref(), self.admin_password.as_deref()) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and defaults.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const KEYS: [&str; 13] = [
        "MOTG_BIND_HOST",
        "MOTG_BIND_PORT",
        "MOTG_DATABASE_URL",
        "MOTG_TOKEN_TTL_HOURS",
        "MOTG_CLOUDINARY_CLOUD_NAME",
        "MOTG_CLOUDINARY_API_KEY",
        "MOTG_CLOUDINARY_API_SECRET",
        "MOTG_CLOUDINARY_FOLDER",
        "MOTG_MAX_UPLOAD_BYTES",
        "MOTG_ALLOWED_ORIGINS",
        "MOTG_ADMIN_EMAIL",
        "MOTG_ADMIN_PASSWORD",
        "MOTG_CONFIG_PATH",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("musiconthego")]).expect("config should load")
    }

    fn env_with(overrides: &[(&str, &str)]) -> Vec<(&'static str, Option<String>)> {
        KEYS.iter()
            .map(|key| {
                let value = overrides
                    .iter()
                    .find(|(name, _)| name == key)
                    .map(|(_, value)| (*value).to_owned());
                (*key, value)
            })
            .collect()
    }

    #[rstest]
    fn defaults_apply_when_unset() {
        let _guard = lock_env(env_with(&[]));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), "0.0.0.0:8080".parse());
        assert_eq!(settings.database_url(), None);
        assert_eq!(settings.token_ttl_hours(), DEFAULT_TOKEN_TTL_HOURS);
        assert_eq!(settings.cloudinary_folder(), "musiconthego");
        assert_eq!(settings.max_upload_bytes(), DEFAULT_MAX_UPLOAD_BYTES);
        assert!(settings.allowed_origins().is_empty());
        assert!(settings.admin_credentials().is_none());
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env(env_with(&[
            ("MOTG_BIND_HOST", "127.0.0.1"),
            ("MOTG_BIND_PORT", "9090"),
            ("MOTG_DATABASE_URL", "postgres://motg@localhost/motg"),
            ("MOTG_TOKEN_TTL_HOURS", "24"),
            ("MOTG_CLOUDINARY_FOLDER", "staging"),
            ("MOTG_MAX_UPLOAD_BYTES", "2048"),
            (
                "MOTG_ALLOWED_ORIGINS",
                "https://app.example.com, ,http://localhost:19006",
            ),
            ("MOTG_ADMIN_EMAIL", "admin@example.com"),
            ("MOTG_ADMIN_PASSWORD", "hunter22!"),
        ]));

        let settings = load_from_empty_args();
        assert_eq!(settings.bind_addr(), "127.0.0.1:9090".parse());
        assert_eq!(settings.database_url(), Some("postgres://motg@localhost/motg"));
        assert_eq!(settings.token_ttl_hours(), 24);
        assert_eq!(settings.cloudinary_folder(), "staging");
        assert_eq!(settings.max_upload_bytes(), 2048);
        assert_eq!(
            settings.allowed_origins(),
            vec!["https://app.example.com", "http://localhost:19006"]
        );
        assert_eq!(
            settings.admin_credentials(),
            Some(("admin@example.com", "hunter22!"))
        );
    }

    #[rstest]
    fn hostnames_are_not_bind_addresses() {
        let _guard = lock_env(env_with(&[("MOTG_BIND_HOST", "localhost")]));

        assert!(load_from_empty_args().bind_addr().is_err());
    }

    #[rstest]
    fn blank_database_url_counts_as_missing() {
        let _guard = lock_env(env_with(&[("MOTG_DATABASE_URL", "   ")]));

        assert_eq!(load_from_empty_args().database_url(), None);
    }
}
