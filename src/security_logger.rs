//! Security-focused logging module to track authentication events

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Types of security events to track
#[derive(Debug, Clone, PartialEq)]
pub enum SecurityEvent {
    // Credential checks
    AuthenticationFailed { username: Option<String>, reason: String },
    AuthenticationSuccess { user_id: String, session_id: String },

    // Token handling
    TokenValidationFailed { reason: String },
    TokenRefreshed { user_id: String, session_id: String },

    // Session lifecycle
    SessionRevoked { user_id: String, session_id: String, reason: String },
    BulkRevocation { user_id: String, kept_session_id: Option<String>, count: usize },
    InactiveAccountSession { user_id: String, session_id: String },

    // System security
    ConfigurationError { component: String, error: String },
}

impl SecurityEvent {
    /// Stable key used for counters and alert thresholds
    pub fn key(&self) -> &'static str {
        match self {
            SecurityEvent::AuthenticationFailed { .. } => "auth_failed",
            SecurityEvent::AuthenticationSuccess { .. } => "auth_success",
            SecurityEvent::TokenValidationFailed { .. } => "token_validation_failed",
            SecurityEvent::TokenRefreshed { .. } => "token_refreshed",
            SecurityEvent::SessionRevoked { .. } => "session_revoked",
            SecurityEvent::BulkRevocation { .. } => "bulk_revocation",
            SecurityEvent::InactiveAccountSession { .. } => "inactive_account_session",
            SecurityEvent::ConfigurationError { .. } => "config_error",
        }
    }
}

/// Shorten an identifier for log output
pub fn redact_id(id: &str) -> String {
    let prefix: String = id.chars().take(8).collect();
    format!("{}…", prefix)
}

#[derive(Debug, Clone)]
struct TimestampedEvent {
    event: SecurityEvent,
    timestamp: Instant,
}

/// Security logger for tracking and alerting on security events
pub struct SecurityLogger {
    events: Arc<RwLock<Vec<TimestampedEvent>>>,
    event_counts: Arc<RwLock<HashMap<&'static str, usize>>>,
    max_events: usize,
    alert_thresholds: HashMap<&'static str, usize>,
}

impl SecurityLogger {
    pub fn new() -> Self {
        Self::with_capacity(10000)
    }

    /// Create a logger keeping at most `max_events` recent events
    pub fn with_capacity(max_events: usize) -> Self {
        let mut alert_thresholds = HashMap::new();
        alert_thresholds.insert("auth_failed", 5);
        alert_thresholds.insert("token_validation_failed", 10);
        alert_thresholds.insert("inactive_account_session", 1);
        alert_thresholds.insert("config_error", 1);

        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            event_counts: Arc::new(RwLock::new(HashMap::new())),
            max_events,
            alert_thresholds,
        }
    }

    /// Log a security event
    pub async fn log_event(&self, event: SecurityEvent) {
        let event_key = event.key();

        {
            let mut events = self.events.write().await;
            events.push(TimestampedEvent {
                event: event.clone(),
                timestamp: Instant::now(),
            });

            // Limit memory usage
            if events.len() > self.max_events {
                let events_to_remove = events.len() - self.max_events;
                events.drain(0..events_to_remove);
            }
        }

        {
            let mut counts = self.event_counts.write().await;
            let count = counts.entry(event_key).or_insert(0);
            *count += 1;

            if let Some(&threshold) = self.alert_thresholds.get(event_key) {
                if *count >= threshold {
                    log::error!("SECURITY ALERT: {} events of type '{}' detected", count, event_key);
                    log::error!("Sample event: {:?}", event);
                    *count = 0;
                }
            }
        }

        match event {
            SecurityEvent::AuthenticationFailed { username, reason } => {
                log::warn!("SECURITY: Authentication failed - User: {:?}, Reason: {}", username, reason);
            }
            SecurityEvent::AuthenticationSuccess { user_id, session_id } => {
                log::info!(
                    "SECURITY: Authentication success - User: {}, Session: {}",
                    user_id,
                    redact_id(&session_id)
                );
            }
            SecurityEvent::TokenValidationFailed { reason } => {
                log::debug!("SECURITY: Token validation failed - Reason: {}", reason);
            }
            SecurityEvent::TokenRefreshed { user_id, session_id } => {
                log::debug!(
                    "SECURITY: Token refreshed - User: {}, Session: {}",
                    user_id,
                    redact_id(&session_id)
                );
            }
            SecurityEvent::SessionRevoked { user_id, session_id, reason } => {
                log::info!(
                    "SECURITY: Session revoked - User: {}, Session: {}, Reason: {}",
                    user_id,
                    redact_id(&session_id),
                    reason
                );
            }
            SecurityEvent::BulkRevocation { user_id, kept_session_id, count } => {
                log::info!(
                    "SECURITY: Bulk revocation - User: {}, Kept: {:?}, Removed: {}",
                    user_id,
                    kept_session_id.as_deref().map(redact_id),
                    count
                );
            }
            SecurityEvent::InactiveAccountSession { user_id, session_id } => {
                log::warn!(
                    "SECURITY: Session presented for inactive or missing account - User: {}, Session: {}",
                    user_id,
                    redact_id(&session_id)
                );
            }
            SecurityEvent::ConfigurationError { component, error } => {
                log::error!("SECURITY: Configuration error - Component: {}, Error: {}", component, error);
            }
        }
    }

    /// Get recent security events
    pub async fn get_recent_events(&self, duration: Duration) -> Vec<SecurityEvent> {
        let events = self.events.read().await;
        let now = Instant::now();

        events
            .iter()
            .filter(|event| now.duration_since(event.timestamp) <= duration)
            .map(|event| event.event.clone())
            .collect()
    }

    /// Counters since the last alert for each event type
    pub async fn get_event_stats(&self) -> HashMap<&'static str, usize> {
        self.event_counts.read().await.clone()
    }

    /// Drop events older than `max_age`
    pub async fn cleanup_old_events(&self, max_age: Duration) {
        let mut events = self.events.write().await;
        let now = Instant::now();
        events.retain(|event| now.duration_since(event.timestamp) <= max_age);
    }
}

impl Default for SecurityLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Global security logger instance - thread-safe singleton
static SECURITY_LOGGER: OnceLock<Arc<SecurityLogger>> = OnceLock::new();

/// Initialize the global security logger
pub fn init_security_logger() -> Arc<SecurityLogger> {
    SECURITY_LOGGER
        .get_or_init(|| Arc::new(SecurityLogger::new()))
        .clone()
}

/// Get the global security logger
pub fn get_security_logger() -> Option<Arc<SecurityLogger>> {
    SECURITY_LOGGER.get().cloned()
}

/// Log a security event using the global logger, falling back to plain logging
pub async fn log_security_event(event: SecurityEvent) {
    match get_security_logger() {
        Some(logger) => logger.log_event(event).await,
        None => log::debug!("Security event (logger not initialised): {:?}", event.key()),
    }
}
