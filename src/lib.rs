//! Rusty Auth - session and token management engine
//!
//! This library verifies username/password credentials, issues signed
//! session tokens delivered as cookies, and tracks every live session so
//! any of them can be revoked individually or in bulk.

pub mod auth;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod security;
pub mod security_logger;
pub mod storage;

// Re-export main components
pub use auth::{AuthEngine, CredentialVerifier, Token, TokenCodec, WhoAmI};
pub use config::AuthConfig;
pub use constants::*;
pub use error::{Result, RustyAuthError};
