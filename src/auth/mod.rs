//! Authentication and session management

pub mod cookie;
pub mod credentials;
pub mod engine;
pub mod token;
pub mod user;

// Re-export main components
pub use cookie::{parse_cookie_header, SameSite, SessionCookie};
pub use credentials::{hash_password, CredentialVerifier};
pub use engine::{AuthEngine, Credentials, Identity, LoginOutcome, WhoAmI};
pub use token::{extract_bearer_token, Claims, Token, TokenCodec};
pub use user::{MemoryUserRepository, SharedUserRepository, UserRecord, UserRepository};
