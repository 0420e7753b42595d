//! Library surface of the gateway binary, so handler tests can assemble the
//! router in-process instead of spawning the server.

pub mod app;
pub mod fanout;
pub mod http;
