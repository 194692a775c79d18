//! Request middleware.

pub mod connection_limit;

pub use connection_limit::{ClientIp, connection_limit_middleware};
