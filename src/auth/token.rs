use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

use crate::clock::{SharedClock, SystemClock};
use crate::config::AuthConfig;
use crate::constants::MAX_TOKEN_LENGTH;
use crate::error::{Result, RustyAuthError};
use crate::storage::Session;

/// JWT Claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Session ID the token is bound to
    pub sid: String,
    /// Username at login time
    pub username: String,
    /// Issued at (as UTC timestamp)
    pub iat: i64,
    /// Expiration time (as UTC timestamp), absent when tokens never expire
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Unique token id
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// A signed token together with the data it carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Encoded JWT, also the cookie value
    pub token: String,
    pub session_id: String,
    pub user_id: String,
    pub username: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

fn timestamp_to_utc(ts: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0)
        .single()
        .ok_or_else(|| RustyAuthError::TokenInvalid("timestamp out of range".to_string()))
}

/// Issues and parses signed session tokens
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
    issuer: Option<String>,
    clock: SharedClock,
}

impl TokenCodec {
    /// Creates a codec with a signing secret and optional token lifetime.
    /// Lifetimes outside what `AuthConfig` accepts are a `ConfigError`.
    pub fn new(secret: &str, ttl: Option<std::time::Duration>, clock: SharedClock) -> Result<Self> {
        let ttl = AuthConfig::validate_token_ttl(ttl)?;

        let mut validation = Validation::new(Algorithm::HS256);
        // Freshness is checked against the injected clock in `parse`
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
            issuer: None,
            clock,
        })
    }

    /// Require and stamp an `iss` claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        let issuer = issuer.into();
        self.validation.set_issuer(&[issuer.as_str()]);
        self.validation.required_spec_claims.insert("iss".to_string());
        self.issuer = Some(issuer);
        self
    }

    pub fn from_config(config: &AuthConfig, clock: SharedClock) -> Result<Self> {
        let codec = Self::new(&config.jwt_secret, config.token_ttl, clock)?;
        Ok(match &config.issuer {
            Some(issuer) => codec.with_issuer(issuer.clone()),
            None => codec,
        })
    }

    /// Codec on the wall clock
    pub fn with_system_clock(secret: &str, ttl: Option<std::time::Duration>) -> Result<Self> {
        Self::new(secret, ttl, Arc::new(SystemClock))
    }

    /// Generates a token bound to the session.
    ///
    /// `iat` is the clock truncated to whole seconds and `exp` is exactly
    /// `iat + ttl`, so the token lives for the full lifetime in token time.
    pub fn issue(&self, session: &Session) -> Result<Token> {
        let issued_at = timestamp_to_utc(self.clock.now().timestamp())?;
        let expires_at = match self.ttl {
            Some(ttl) => Some(issued_at.checked_add_signed(ttl).ok_or_else(|| {
                RustyAuthError::ConfigError("token expiry is out of range".to_string())
            })?),
            None => None,
        };

        let claims = Claims {
            sub: session.user_id.clone(),
            sid: session.session_id.clone(),
            username: session.username.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.map(|e| e.timestamp()),
            jti: uuid::Uuid::new_v4().to_string(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| RustyAuthError::TokenInvalid(format!("Failed to generate token: {}", e)))?;

        Ok(Token {
            token,
            session_id: claims.sid,
            user_id: claims.sub,
            username: claims.username,
            issued_at,
            expires_at,
        })
    }

    /// Validates signature and freshness and decodes the claims.
    /// Does not check whether the session still exists.
    pub fn get_claims(&self, token: &str) -> Result<Claims> {
        if token.is_empty() || token.len() > MAX_TOKEN_LENGTH {
            return Err(RustyAuthError::TokenInvalid("bad token length".to_string()));
        }
        if token.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(RustyAuthError::TokenInvalid(
                "token contains invalid characters".to_string(),
            ));
        }

        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)?.claims;

        if claims.sub.is_empty() || claims.sid.is_empty() {
            return Err(RustyAuthError::TokenInvalid("missing subject or session".to_string()));
        }

        match (self.ttl, claims.exp) {
            (_, Some(exp)) if self.clock.now().timestamp() >= exp => {
                Err(RustyAuthError::TokenExpired)
            }
            (Some(_), None) => Err(RustyAuthError::TokenInvalid(
                "token carries no expiry".to_string(),
            )),
            _ => Ok(claims),
        }
    }

    /// Parses a token string into a `Token`
    pub fn parse(&self, token: &str) -> Result<Token> {
        let claims = self.get_claims(token)?;

        Ok(Token {
            token: token.to_string(),
            issued_at: timestamp_to_utc(claims.iat)?,
            expires_at: claims.exp.map(timestamp_to_utc).transpose()?,
            session_id: claims.sid,
            user_id: claims.sub,
            username: claims.username,
        })
    }
}

/// Extracts bearer token from Authorization header
pub fn extract_bearer_token(auth_header: &str) -> Option<String> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
