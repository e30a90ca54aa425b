// crates/auditproof-rpc/src/middleware.rs
//
// Logging interceptor for the RPC server.

use tonic::{Request, Status};

/// Log every incoming request before it reaches the JSON-RPC dispatcher.
pub fn logging_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    let user_agent = req
        .metadata()
        .get("user-agent")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    tracing::debug!("Incoming RPC request (user-agent: {})", user_agent);
    Ok(req)
}
