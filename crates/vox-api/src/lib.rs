//! Voice-clone job service: configuration, data layout and the HTTP server.

pub mod config;
pub mod layout;
pub mod server;
pub mod shutdown;
