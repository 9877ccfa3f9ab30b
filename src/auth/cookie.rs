//! Session cookie rendering
//!
//! The cookie value is the token itself; this module only decides the
//! attributes and formats `Set-Cookie` values for whatever transport sits on top.

use serde::Serialize;

use crate::auth::token::Token;
use crate::config::AuthConfig;
use crate::constants::DEFAULT_COOKIE_PATH;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    /// Seconds; `None` makes it a browser-session cookie, `Some(0)` clears it
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: SameSite,
    pub path: String,
    pub domain: Option<String>,
}

impl SessionCookie {
    /// Cookie carrying a freshly issued token
    pub fn for_token(config: &AuthConfig, token: &Token) -> Self {
        let max_age = token
            .expires_at
            .map(|exp| (exp - token.issued_at).num_seconds().max(0));

        Self {
            name: config.cookie_name.clone(),
            value: token.token.clone(),
            max_age,
            http_only: true,
            secure: config.cookie_secure,
            same_site: SameSite::Lax,
            path: DEFAULT_COOKIE_PATH.to_string(),
            domain: config.cookie_domain.clone(),
        }
    }

    /// Expired, empty cookie that makes the browser drop the session cookie
    pub fn cleared(config: &AuthConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            value: String::new(),
            max_age: Some(0),
            http_only: true,
            secure: config.cookie_secure,
            same_site: SameSite::Lax,
            path: DEFAULT_COOKIE_PATH.to_string(),
            domain: config.cookie_domain.clone(),
        }
    }

    /// Render as a `Set-Cookie` header value
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}; Path={}", self.name, self.value, self.path);
        if let Some(domain) = &self.domain {
            out.push_str(&format!("; Domain={}", domain));
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        out.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        out
    }
}

/// Extract a cookie value from a `Cookie` request header
pub fn parse_cookie_header(header: &str, name: &str) -> Option<String> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
