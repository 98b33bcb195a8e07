//! Newline-delimited JSON-RPC over a Unix socket

pub mod connection;
pub mod protocol;
pub mod server;

pub use connection::{ConnectionError, MessageWriter, RequestReader};
pub use protocol::{JsonRpcError, Notification, Request, RequestId, Response};
pub use server::IpcServer;
