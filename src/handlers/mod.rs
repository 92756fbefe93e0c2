//! HTTP handlers: decode requests, call the service, map outcomes to status codes.

pub mod user;
pub use user::*;
