use std::error::Error;
use std::fmt;

/// Message handed to callers for every rejected authentication attempt
pub const FORBIDDEN_MESSAGE: &str = "Forbidden: invalid credentials";

#[derive(Debug)]
pub enum RustyAuthError {
    // Credential errors (bad username, bad password and inactive account
    // all collapse into this one)
    InvalidCredentials,

    // Token errors
    TokenInvalid(String),
    TokenExpired,

    // Session errors
    SessionNotFound(String),
    NotFound(String),

    // Storage errors
    StorageError(String),

    // Hashing errors
    HashError(String),

    // Configuration errors
    ConfigError(String),
}

impl RustyAuthError {
    /// True for every outcome that the transport reports as forbidden
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials
                | Self::TokenInvalid(_)
                | Self::TokenExpired
                | Self::SessionNotFound(_)
        )
    }

    /// Caller-facing text. Authentication failures never reveal which check failed.
    pub fn to_forbidden_message(&self) -> String {
        if self.is_forbidden() {
            FORBIDDEN_MESSAGE.to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for RustyAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "Invalid credentials"),
            Self::TokenInvalid(msg) => write!(f, "Invalid token: {}", msg),
            Self::TokenExpired => write!(f, "Token expired"),
            Self::SessionNotFound(id) => write!(f, "Session not found: {}", id),
            Self::NotFound(what) => write!(f, "Not found: {}", what),
            Self::StorageError(msg) => write!(f, "Storage error: {}", msg),
            Self::HashError(msg) => write!(f, "Hashing error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for RustyAuthError {}

impl From<jsonwebtoken::errors::Error> for RustyAuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => RustyAuthError::TokenExpired,
            _ => RustyAuthError::TokenInvalid(err.to_string()),
        }
    }
}

impl From<argon2::password_hash::Error> for RustyAuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        RustyAuthError::HashError(err.to_string())
    }
}

// Generic result type for RustyAuth
pub type Result<T> = std::result::Result<T, RustyAuthError>;
