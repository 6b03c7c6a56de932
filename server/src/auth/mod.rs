//! Authentication and authorization.
//!
//! Token issuance and verification, password digests, the request
//! authentication filter and the ownership policy for mutating handlers.
//!
//! # Pre-conditions
//! - The signing secret is loaded once at startup.
//!
//! # Post-conditions
//! - Authentication state is immutable once the server starts.
//!
//! # Invariants
//! - No session state exists; every request is authenticated from its token alone.

pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod ownership;
pub mod signing_key;

pub use credentials::CredentialError;
pub use jwt::{TOKEN_LIFETIME_SECS, TokenCodec, TokenError};
pub use middleware::{AuthenticatedUser, require_auth};
pub use signing_key::{SigningKey, SigningKeyError};
