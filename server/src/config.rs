//! Server configuration module.
//!
//! This module provides configuration loading for the lost & found server
//! from environment variables.
//!
//! # Environment Variables
//!
//! - `LOSTFOUND_JWT_SECRET`: HS256 secret for session tokens (required)
//! - `LOSTFOUND_LISTEN_PORT`: Port to listen on (default: `5000`)
//! - `LOSTFOUND_DATA_DIRECTORY`: Directory holding the database snapshot (default: `./data`)
//! - `LOSTFOUND_UPLOAD_DIRECTORY`: Directory for uploaded images (default: `./uploads`)
//! - `LOSTFOUND_PUBLIC_URL`: Base URL used in image links (default: `http://localhost:{port}`)
//!
//! # Invariants
//!
//! - `jwt_secret` is never empty
//! - `listen_port` is always a valid port number (1-65535)
//! - `public_url` never ends with `/`

use std::path::PathBuf;

use crate::auth::SigningKey;

const JWT_SECRET_VAR: &str = "LOSTFOUND_JWT_SECRET";
const LISTEN_PORT_VAR: &str = "LOSTFOUND_LISTEN_PORT";
const DATA_DIRECTORY_VAR: &str = "LOSTFOUND_DATA_DIRECTORY";
const UPLOAD_DIRECTORY_VAR: &str = "LOSTFOUND_UPLOAD_DIRECTORY";
const PUBLIC_URL_VAR: &str = "LOSTFOUND_PUBLIC_URL";

/// Server configuration.
///
/// # Pre-conditions
///
/// When constructed via `from_env()`:
/// - `LOSTFOUND_JWT_SECRET` must be set and non-empty
/// - All other values, when set, must be valid for their respective types
///
/// # Post-conditions
///
/// - `listen_port` is always in the valid range (1-65535)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Secret shared by token issuance and verification.
    pub jwt_secret: SigningKey,
    /// Port to listen on for HTTP connections.
    pub listen_port: u16,
    /// Directory where the database snapshot is stored.
    pub data_directory: PathBuf,
    /// Directory where uploaded images are written.
    pub upload_directory: PathBuf,
    /// Base URL clients use to reach this server.
    pub public_url: String,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// An environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// An environment variable has an invalid value.
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

impl ServerConfig {
    /// Default port for the server.
    pub const DEFAULT_PORT: u16 = 5000;
    /// Default data directory.
    pub const DEFAULT_DATA_DIRECTORY: &'static str = "./data";
    /// Default upload directory.
    pub const DEFAULT_UPLOAD_DIRECTORY: &'static str = "./uploads";
    /// File name of the database snapshot inside `data_directory`.
    pub const SNAPSHOT_FILE_NAME: &'static str = "lostfound.json";

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `LOSTFOUND_JWT_SECRET` is not set or is empty
    /// - `LOSTFOUND_LISTEN_PORT` is set but not a valid port number
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = Self::load_jwt_secret(&lookup)?;
        let listen_port = Self::load_listen_port(&lookup)?;
        let data_directory = lookup(DATA_DIRECTORY_VAR)
            .map_or_else(|| PathBuf::from(Self::DEFAULT_DATA_DIRECTORY), PathBuf::from);
        let upload_directory = lookup(UPLOAD_DIRECTORY_VAR)
            .map_or_else(|| PathBuf::from(Self::DEFAULT_UPLOAD_DIRECTORY), PathBuf::from);
        let public_url = lookup(PUBLIC_URL_VAR)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| format!("http://localhost:{listen_port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            jwt_secret,
            listen_port,
            data_directory,
            upload_directory,
            public_url,
        })
    }

    /// Path of the database snapshot file.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_directory.join(Self::SNAPSHOT_FILE_NAME)
    }

    /// Load the signing secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is not set or is empty.
    fn load_jwt_secret(lookup: &impl Fn(&str) -> Option<String>) -> Result<SigningKey, ConfigError> {
        let secret =
            lookup(JWT_SECRET_VAR).ok_or_else(|| ConfigError::MissingEnvVar(JWT_SECRET_VAR.to_string()))?;

        SigningKey::new_hs256(secret).map_err(|e| ConfigError::InvalidValue {
            name: JWT_SECRET_VAR.to_string(),
            message: e.to_string(),
        })
    }

    /// Load the listen port.
    ///
    /// Returns the default if not set.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is set but not a valid port number.
    fn load_listen_port(lookup: &impl Fn(&str) -> Option<String>) -> Result<u16, ConfigError> {
        match lookup(LISTEN_PORT_VAR) {
            Some(value) => match value.parse::<u16>() {
                Ok(port) if port > 0 => Ok(port),
                _ => Err(ConfigError::InvalidValue {
                    name: LISTEN_PORT_VAR.to_string(),
                    message: format!("'{value}' is not a valid port number (must be 1-65535)"),
                }),
            },
            None => Ok(Self::DEFAULT_PORT),
        }
    }
}
