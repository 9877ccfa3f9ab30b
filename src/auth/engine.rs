//! Login, identity lookup, logout and session administration
//!
//! A caller is either anonymous or holds a token bound to a live session.
//! Every operation returns plain values; the transport decides how they map
//! onto status codes, cookies and headers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::auth::cookie::SessionCookie;
use crate::auth::credentials::CredentialVerifier;
use crate::auth::token::{Token, TokenCodec};
use crate::auth::user::{SharedUserRepository, UserRecord};
use crate::clock::SharedClock;
use crate::config::AuthConfig;
use crate::error::{Result, RustyAuthError};
use crate::security::AuthTimer;
use crate::security_logger::{init_security_logger, log_security_event, SecurityEvent};
use crate::storage::{MemorySessionStore, Session, SessionStats, SharedSessionStore};

/// Who the caller is once their token resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: String,
    pub session_id: String,
    pub username: String,
}

impl From<&Token> for Identity {
    fn from(token: &Token) -> Self {
        Self {
            user_id: token.user_id.clone(),
            session_id: token.session_id.clone(),
            username: token.username.clone(),
        }
    }
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: Token,
    pub cookie: SessionCookie,
    pub session: Session,
}

/// Result of an identity check
#[derive(Debug, Clone)]
pub enum WhoAmI {
    /// Token resolved; a fresh token and cookie replace the presented one
    Authenticated {
        identity: Identity,
        token: Token,
        cookie: SessionCookie,
    },
    /// Not logged in. `clear_cookie` is set when a stale cookie was presented.
    Anonymous { clear_cookie: Option<SessionCookie> },
}

impl WhoAmI {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, WhoAmI::Authenticated { .. })
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            WhoAmI::Authenticated { identity, .. } => Some(identity),
            WhoAmI::Anonymous { .. } => None,
        }
    }
}

/// Login body as it arrives from the transport; either field may be missing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

pub struct AuthEngine {
    config: AuthConfig,
    verifier: CredentialVerifier,
    codec: TokenCodec,
    sessions: SharedSessionStore,
    users: SharedUserRepository,
}

impl AuthEngine {
    pub fn new(
        config: AuthConfig,
        verifier: CredentialVerifier,
        codec: TokenCodec,
        sessions: SharedSessionStore,
        users: SharedUserRepository,
    ) -> Self {
        init_security_logger();
        Self {
            config,
            verifier,
            codec,
            sessions,
            users,
        }
    }

    /// Wire an engine with an in-memory session store
    pub fn from_config(
        config: AuthConfig,
        users: SharedUserRepository,
        clock: SharedClock,
    ) -> Result<Self> {
        let verifier = CredentialVerifier::new(users.clone());
        let codec = TokenCodec::from_config(&config, clock.clone())?;
        let sessions: SharedSessionStore = Arc::new(MemorySessionStore::with_clock(clock));
        Ok(Self::new(config, verifier, codec, sessions, users))
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Verify credentials, open a new session and issue its token
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome> {
        let timer = AuthTimer::new(self.config.min_auth_duration);

        let user = match self.verifier.verify(username, password).await {
            Ok(user) => user,
            Err(e) => {
                log_security_event(SecurityEvent::AuthenticationFailed {
                    username: Some(username.to_string()).filter(|u| !u.is_empty()),
                    reason: e.to_string(),
                })
                .await;
                timer.wait().await;
                return Err(e);
            }
        };

        let session = self.sessions.create(&user.id, &user.username).await?;
        let token = match self.codec.issue(&session) {
            Ok(token) => token,
            Err(e) => {
                // No token, no session
                self.sessions.revoke(&session.session_id).await?;
                return Err(e);
            }
        };

        log_security_event(SecurityEvent::AuthenticationSuccess {
            user_id: user.id.clone(),
            session_id: session.session_id.clone(),
        })
        .await;

        let cookie = SessionCookie::for_token(&self.config, &token);
        Ok(LoginOutcome {
            token,
            cookie,
            session,
        })
    }

    /// Login from a transport body where fields may be absent
    pub async fn login_with(&self, credentials: Credentials) -> Result<LoginOutcome> {
        let username = credentials.username.unwrap_or_default();
        let password = credentials.password.unwrap_or_default();
        self.login(&username, &password).await
    }

    /// Resolve a token to its live session without re-issuing it.
    ///
    /// Used in front of every route that needs a logged-in caller.
    pub async fn authenticate(&self, token: &str) -> Result<Token> {
        let (token, _) = self.resolve(token).await?;
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<(Token, Session)> {
        let token = match self.codec.parse(token) {
            Ok(token) => token,
            Err(e) => {
                log_security_event(SecurityEvent::TokenValidationFailed {
                    reason: e.to_string(),
                })
                .await;
                return Err(e);
            }
        };

        let session = self
            .sessions
            .get(&token.session_id)
            .await?
            .filter(|s| s.user_id == token.user_id)
            .ok_or_else(|| RustyAuthError::SessionNotFound(token.session_id.clone()))?;

        self.ensure_account_usable(&session).await?;
        Ok((token, session))
    }

    async fn ensure_account_usable(&self, session: &Session) -> Result<UserRecord> {
        let record = self.users.find_by_username(&session.username).await?;
        match record {
            Some(user) if user.is_active && user.id == session.user_id => Ok(user),
            _ => {
                let removed = self.sessions.revoke_user(&session.user_id).await?;
                log_security_event(SecurityEvent::InactiveAccountSession {
                    user_id: session.user_id.clone(),
                    session_id: session.session_id.clone(),
                })
                .await;
                log::debug!("Dropped {} sessions of unusable account", removed);
                Err(RustyAuthError::SessionNotFound(session.session_id.clone()))
            }
        }
    }

    /// Identify the caller from a cookie value. Anything unresolvable is anonymous.
    pub async fn who_am_i(&self, cookie_value: Option<&str>) -> Result<WhoAmI> {
        let presented = match cookie_value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => value,
            None => return Ok(WhoAmI::Anonymous { clear_cookie: None }),
        };

        let session = match self.resolve(presented).await {
            Ok((_, session)) => session,
            Err(e) if e.is_forbidden() => {
                log::debug!("Presented token not accepted: {}", e);
                return Ok(WhoAmI::Anonymous {
                    clear_cookie: Some(SessionCookie::cleared(&self.config)),
                });
            }
            Err(e) => return Err(e),
        };

        // Sliding refresh
        let token = self.codec.issue(&session)?;

        log_security_event(SecurityEvent::TokenRefreshed {
            user_id: token.user_id.clone(),
            session_id: token.session_id.clone(),
        })
        .await;

        Ok(WhoAmI::Authenticated {
            identity: Identity::from(&token),
            cookie: SessionCookie::for_token(&self.config, &token),
            token,
        })
    }

    /// End the caller's session. Returns false if it was already gone.
    pub async fn logout(&self, current: &Token) -> Result<bool> {
        let removed = self.sessions.revoke(&current.session_id).await?;
        if removed {
            log_security_event(SecurityEvent::SessionRevoked {
                user_id: current.user_id.clone(),
                session_id: current.session_id.clone(),
                reason: "logout".to_string(),
            })
            .await;
        }
        Ok(removed)
    }

    /// Cookie the transport sets after logout
    pub fn cleared_cookie(&self) -> SessionCookie {
        SessionCookie::cleared(&self.config)
    }

    /// Every live session of every user
    pub async fn list_sessions(&self) -> Result<Vec<Session>> {
        self.sessions.all().await
    }

    /// Live sessions of one user
    pub async fn list_user_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        self.sessions.list_by_user(user_id).await
    }

    pub async fn session_stats(&self) -> Result<SessionStats> {
        self.sessions.stats().await
    }

    /// Revoke a session by id; an unknown id is a no-op
    pub async fn clear_session_by_id(&self, session_id: &str) -> Result<bool> {
        let session = self.sessions.get(session_id).await?;
        let removed = self.sessions.revoke(session_id).await?;

        if let (true, Some(session)) = (removed, session) {
            log_security_event(SecurityEvent::SessionRevoked {
                user_id: session.user_id,
                session_id: session.session_id,
                reason: "administrative".to_string(),
            })
            .await;
        }
        Ok(removed)
    }

    /// Revoke every other session of the user owning `session_id`
    pub async fn clear_all_except_self(&self, session_id: &str) -> Result<usize> {
        let current = self
            .sessions
            .get(session_id)
            .await?
            .ok_or_else(|| RustyAuthError::SessionNotFound(session_id.to_string()))?;

        let count = self
            .sessions
            .revoke_all_except(&current.user_id, session_id)
            .await?;

        log_security_event(SecurityEvent::BulkRevocation {
            user_id: current.user_id,
            kept_session_id: Some(session_id.to_string()),
            count,
        })
        .await;
        Ok(count)
    }

    /// Public hashing utility
    pub fn hash(&self, value: &str) -> String {
        CredentialVerifier::hash(value)
    }

    /// Public comparison utility
    pub fn is_equals(&self, value: &str, digest: &str) -> bool {
        CredentialVerifier::equals(value, digest)
    }
}
