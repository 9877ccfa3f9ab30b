// Cookie defaults
pub const DEFAULT_COOKIE_NAME: &str = "session_token";
pub const DEFAULT_COOKIE_PATH: &str = "/";

// Token defaults
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 86400;
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;
pub const MAX_TOKEN_LENGTH: usize = 4096;

// Failed logins never complete faster than this
pub const DEFAULT_MIN_AUTH_MS: u64 = 100;

// Session identifiers are 32 random bytes, hex encoded
pub const SESSION_ID_BYTES: usize = 32;

// Environment variables
pub const ENV_JWT_SECRET: &str = "RUSTY_AUTH_JWT_SECRET";
pub const ENV_JWT_SECRET_FALLBACK: &str = "JWT_SECRET";
pub const ENV_TOKEN_TTL_SECS: &str = "RUSTY_AUTH_TOKEN_TTL_SECS";
pub const ENV_COOKIE_NAME: &str = "RUSTY_AUTH_COOKIE_NAME";
pub const ENV_COOKIE_SECURE: &str = "RUSTY_AUTH_COOKIE_SECURE";
pub const ENV_COOKIE_DOMAIN: &str = "RUSTY_AUTH_COOKIE_DOMAIN";
pub const ENV_MIN_AUTH_MS: &str = "RUSTY_AUTH_MIN_AUTH_MS";
pub const ENV_ISSUER: &str = "RUSTY_AUTH_ISSUER";
