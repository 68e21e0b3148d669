//! Client side of the soar-actions JSON-RPC interface
//!
//! Used by the `fire` and `submit-function` commands to talk to a service
//! listening on a Unix domain socket.

pub mod transport;

pub use transport::JsonRpcClient;
