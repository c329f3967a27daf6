//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 boundary of artistdb: artist, location and
//! event methods plus health and metrics.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
