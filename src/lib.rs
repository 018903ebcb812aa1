//! Easyhttp - HTTP/1.0 and HTTP/1.1 from first principles.
//!
//! A protocol engine providing both a client and a server directly over
//! TCP (optionally TLS): wire framing, chunked transfer in both directions,
//! keep-alive connection handling, cookies, and glob-pattern routing.

pub mod client;
pub mod config;
pub mod http;
pub mod server;

mod net;
