//! JSON-RPC API Layer
//!
//! JSON-RPC 2.0 server for SubSync: sessions, OAuth, listing and transfers.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use handler::RpcHandler;
pub use server::{RpcServer, RpcServerConfig};
