//! Storage for live sessions

pub mod session_store;

pub use session_store::{
    generate_session_id, MemorySessionStore, Session, SessionStats,
    SessionStore, SharedSessionStore,
};
