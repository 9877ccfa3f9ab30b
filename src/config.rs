//! Engine configuration module
//! Handles signing key, token lifetime and cookie parameters

use crate::constants::{
    DEFAULT_COOKIE_NAME, DEFAULT_MIN_AUTH_MS, DEFAULT_TOKEN_TTL_SECS, ENV_COOKIE_DOMAIN,
    ENV_COOKIE_NAME, ENV_COOKIE_SECURE, ENV_ISSUER, ENV_JWT_SECRET, ENV_JWT_SECRET_FALLBACK,
    ENV_MIN_AUTH_MS, ENV_TOKEN_TTL_SECS, MAX_TOKEN_TTL_SECS,
};
use crate::error::{Result, RustyAuthError};
use std::env;
use std::time::Duration;

/// Authentication engine configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC key for token signing/validation, shared by every instance
    pub jwt_secret: String,
    /// Token lifetime. `None` disables expiry checks.
    pub token_ttl: Option<Duration>,
    /// Optional `iss` claim written into and required from every token
    pub issuer: Option<String>,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_domain: Option<String>,
    /// Minimum wall time of a rejected login
    pub min_auth_duration: Duration,
}

impl AuthConfig {
    /// Build a configuration around a validated secret, everything else at defaults
    pub fn new(jwt_secret: impl Into<String>) -> Result<Self> {
        let jwt_secret = jwt_secret.into();
        Self::validate_jwt_secret(&jwt_secret)?;

        Ok(Self {
            jwt_secret,
            token_ttl: Some(Duration::from_secs(DEFAULT_TOKEN_TTL_SECS)),
            issuer: None,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            cookie_secure: true,
            cookie_domain: None,
            min_auth_duration: Duration::from_millis(DEFAULT_MIN_AUTH_MS),
        })
    }

    /// Set the token lifetime; `None` issues tokens that never expire
    pub fn with_token_ttl(mut self, ttl: Option<Duration>) -> Result<Self> {
        Self::validate_token_ttl(ttl)?;
        self.token_ttl = ttl;
        Ok(self)
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    pub fn with_min_auth_duration(mut self, duration: Duration) -> Self {
        self.min_auth_duration = duration;
        self
    }

    /// Token lifetimes are whole seconds, from one second up to `MAX_TOKEN_TTL_SECS`
    pub fn validate_token_ttl(ttl: Option<Duration>) -> Result<Option<chrono::Duration>> {
        let ttl = match ttl {
            Some(ttl) => ttl,
            None => return Ok(None),
        };

        let secs = ttl.as_secs();
        if secs == 0 || secs > MAX_TOKEN_TTL_SECS {
            return Err(RustyAuthError::ConfigError(format!(
                "token lifetime must be between 1 and {} seconds, got {:?}",
                MAX_TOKEN_TTL_SECS, ttl
            )));
        }

        i64::try_from(secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .map(Some)
            .ok_or_else(|| {
                RustyAuthError::ConfigError(format!("token lifetime {:?} is out of range", ttl))
            })
    }

    /// Validate that the signing key meets security requirements
    fn validate_jwt_secret(secret: &str) -> Result<()> {
        if secret.len() < 32 {
            return Err(RustyAuthError::ConfigError(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "changeme",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.to_lowercase().contains(pattern) {
                return Err(RustyAuthError::ConfigError(format!(
                    "JWT secret contains insecure pattern '{}'. Please use a secure random secret generated with: openssl rand -base64 32",
                    pattern
                )));
            }
        }

        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(RustyAuthError::ConfigError(
                "JWT secret should contain mixed characters (letters, numbers, symbols) for security".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from environment variables, reading `.env` first if present
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Environment variables loaded from {}", path.display()),
            Err(e) => log::debug!("No .env file loaded: {}", e),
        }
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup(ENV_JWT_SECRET)
            .or_else(|| lookup(ENV_JWT_SECRET_FALLBACK))
            .ok_or_else(|| {
                RustyAuthError::ConfigError(
                    "JWT_SECRET environment variable is required for security. \
                     Generate one with: openssl rand -base64 32"
                        .to_string(),
                )
            })?;

        let mut config = Self::new(jwt_secret)?;

        if let Some(raw) = lookup(ENV_TOKEN_TTL_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                RustyAuthError::ConfigError(format!(
                    "{} must be a number of seconds, got '{}'",
                    ENV_TOKEN_TTL_SECS, raw
                ))
            })?;
            // 0 disables expiry
            config = if secs == 0 {
                config.with_token_ttl(None)?
            } else {
                config.with_token_ttl(Some(Duration::from_secs(secs)))?
            };
        }

        if let Some(name) = lookup(ENV_COOKIE_NAME) {
            let name = name.trim();
            if name.is_empty() || name.contains(|c: char| c == ';' || c == '=' || c.is_whitespace()) {
                return Err(RustyAuthError::ConfigError(format!(
                    "{} is not a valid cookie name",
                    ENV_COOKIE_NAME
                )));
            }
            config = config.with_cookie_name(name);
        }

        config.cookie_secure = lookup(ENV_COOKIE_SECURE)
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(true); // SECURITY: Default to secure cookies

        config.cookie_domain = lookup(ENV_COOKIE_DOMAIN).filter(|d| !d.trim().is_empty());

        if let Some(raw) = lookup(ENV_MIN_AUTH_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| {
                RustyAuthError::ConfigError(format!(
                    "{} must be a number of milliseconds, got '{}'",
                    ENV_MIN_AUTH_MS, raw
                ))
            })?;
            config = config.with_min_auth_duration(Duration::from_millis(ms));
        }

        config.issuer = lookup(ENV_ISSUER).filter(|i| !i.trim().is_empty());

        if !config.cookie_secure {
            log::warn!("Session cookie is configured without the Secure attribute");
        }

        Ok(config)
    }
}
