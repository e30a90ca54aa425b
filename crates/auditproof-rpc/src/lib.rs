// crates/auditproof-rpc/src/lib.rs
//
// auditproof-rpc: JSON-RPC server and handlers for the auditproof daemon.
//
// A single tonic service accepts JSON envelopes of the form
// `{method, params}` and dispatches them to handlers grouped by API area.
// Every response carries an HTTP-equivalent status code.

pub mod handlers;
pub mod middleware;
pub mod server;

// Re-export the main server type for ergonomic access.
pub use server::{AuditProofRpcServer, JsonRpcRequest, JsonRpcResponse, RpcConfig, RpcServices};
