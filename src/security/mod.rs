//! Security utilities shared by the authentication components

pub mod timing;

pub use timing::{add_auth_delay, constant_time_eq, constant_time_eq_bytes, AuthTimer};
