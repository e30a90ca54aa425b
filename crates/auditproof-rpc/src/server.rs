// crates/auditproof-rpc/src/server.rs
//
// RPC server setup: AuditProofRpcServer and RpcConfig.
//
// Uses a JSON-RPC-over-gRPC approach. A single tonic unary service accepts
// JSON-encoded requests with a method field, dispatches to the appropriate
// handler, and returns JSON-encoded responses. Failures carry the
// HTTP-equivalent status code of the underlying error.

use std::sync::Arc;

use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use serde::{Deserialize, Serialize};
use tonic::transport::Server;
use tonic::Status;

use auditproof_core::error::AuditProofError;
use auditproof_ledger::LocalChain;
use auditproof_orchestrator::{AdmissionService, IssuanceService, VerificationService};
use auditproof_store::{CredentialStore, MetricsAggregator};

use crate::handlers;
use crate::middleware;

// ---------------------------------------------------------------------------
// RpcConfig
// ---------------------------------------------------------------------------

/// Configuration for the RPC server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Host to bind to (e.g., "127.0.0.1" or "0.0.0.0").
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 50061,
        }
    }
}

// ---------------------------------------------------------------------------
// JSON-RPC Envelope
// ---------------------------------------------------------------------------

/// A JSON-RPC-style request envelope.
/// The client sends a method name and a JSON params payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// The RPC method to invoke (e.g., "admin/approve-auditor").
    pub method: String,
    /// JSON-encoded parameters for the method.
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A JSON-RPC-style response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// Whether the request succeeded.
    pub success: bool,
    /// HTTP-equivalent status code (200 on success).
    pub code: u16,
    /// The result data (if success).
    pub result: Option<serde_json::Value>,
    /// Error message (if not success).
    pub error: Option<String>,
}

impl JsonRpcResponse {
    fn ok(value: serde_json::Value) -> Self {
        Self {
            success: true,
            code: 200,
            result: Some(value),
            error: None,
        }
    }

    fn err(e: &AuditProofError) -> Self {
        Self {
            success: false,
            code: e.status_code(),
            result: None,
            error: Some(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// RpcServices
// ---------------------------------------------------------------------------

/// Everything the handlers need, constructed once by the daemon.
#[derive(Clone)]
pub struct RpcServices {
    pub chain: Arc<LocalChain>,
    pub admission: Arc<AdmissionService>,
    pub issuance: Arc<IssuanceService>,
    pub verification: Arc<VerificationService>,
    pub credentials: Arc<CredentialStore>,
    pub metrics: Arc<MetricsAggregator>,
}

// ---------------------------------------------------------------------------
// AuditProofRpcServer
// ---------------------------------------------------------------------------

/// The RPC server for the auditproof daemon.
#[derive(Clone)]
pub struct AuditProofRpcServer {
    config: RpcConfig,
    services: RpcServices,
}

impl std::fmt::Debug for AuditProofRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditProofRpcServer")
            .field("config", &self.config)
            .finish()
    }
}

impl AuditProofRpcServer {
    pub fn new(config: RpcConfig, services: RpcServices) -> Self {
        Self { config, services }
    }

    /// Start the RPC server and listen for requests.
    ///
    /// This binds to the configured address and serves requests until
    /// the process is terminated.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        tracing::info!("auditproof RPC server starting on {}", addr);

        let service = AuditProofServiceImpl {
            services: self.services.clone(),
        };

        Server::builder()
            .accept_http1(true)
            .add_service(tonic::service::interceptor::InterceptedService::new(
                AuditProofJsonRpcServer::new(service),
                middleware::logging_interceptor,
            ))
            .serve(addr)
            .await?;

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// The internal service implementation that holds shared state
/// and dispatches JSON-RPC calls to the appropriate handler.
#[derive(Clone)]
struct AuditProofServiceImpl {
    services: RpcServices,
}

impl AuditProofServiceImpl {
    /// Dispatch a JSON-RPC request to the appropriate handler based on the method name.
    async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let method = request.method.clone();
        let services = &self.services;

        let result = match request.method.as_str() {
            // Admin
            "admin/approve-auditor" => {
                let admission = services.admission.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::admin::handle_approve_auditor(&admission, r).await
                })
                .await
            }
            "admin/applications" => {
                let admission = services.admission.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::admin::handle_list_applications(&admission, r).await
                })
                .await
            }
            "admin/reject-application" => {
                let admission = services.admission.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::admin::handle_reject_application(&admission, r).await
                })
                .await
            }
            "admin/revoke-auditor" => {
                let admission = services.admission.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::admin::handle_revoke_auditor(&admission, r).await
                })
                .await
            }

            // Applications
            "applications/submit" => {
                let admission = services.admission.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::applications::handle_submit_application(&admission, r).await
                })
                .await
            }

            // Credentials
            "credentials/issue" => {
                let issuance = services.issuance.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::credentials::handle_issue_credential(&issuance, r).await
                })
                .await
            }
            "credentials/get" => {
                let credentials = services.credentials.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::credentials::handle_get_credential(&credentials, r).await
                })
                .await
            }
            "credentials/list" => {
                let credentials = services.credentials.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::credentials::handle_list_credentials(&credentials, r).await
                })
                .await
            }

            // Proofs
            "proofs/generate" => {
                let issuance = services.issuance.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::proofs::handle_generate_proof(&issuance, r).await
                })
                .await
            }
            "proofs/verify" => {
                let verification = services.verification.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::proofs::handle_verify_proof(&verification, r).await
                })
                .await
            }

            // Metrics
            "metrics/get" => {
                let metrics = services.metrics.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::metrics::handle_get_metrics(&metrics, r).await
                })
                .await
            }

            // Node
            "node/health" => {
                let chain = services.chain.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::node::handle_get_health(&chain, r).await
                })
                .await
            }

            // Chain
            "auditors/list" => {
                let chain = services.chain.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::chain::handle_list_auditors(&chain, r).await
                })
                .await
            }
            "auditors/get" => {
                let chain = services.chain.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::chain::handle_get_auditor(chain.as_ref(), r).await
                })
                .await
            }
            "chain/nonce" => {
                let chain = services.chain.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::chain::handle_get_nonce(chain.as_ref(), r).await
                })
                .await
            }
            "chain/send-transaction" => {
                let chain = services.chain.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::chain::handle_send_transaction(chain.as_ref(), r).await
                })
                .await
            }
            "chain/receipt" => {
                let chain = services.chain.clone();
                dispatch_handler(request.params, |r| async move {
                    handlers::chain::handle_get_receipt(chain.as_ref(), r).await
                })
                .await
            }

            _ => Err(AuditProofError::NotFound(format!(
                "Unknown method: {}",
                request.method
            ))),
        };

        match result {
            Ok(value) => {
                tracing::debug!("{} -> 200", method);
                JsonRpcResponse::ok(value)
            }
            Err(e) => {
                let response = JsonRpcResponse::err(&e);
                if response.code >= 500 {
                    tracing::warn!("{} -> {}: {}", method, response.code, e);
                } else {
                    tracing::debug!("{} -> {}: {}", method, response.code, e);
                }
                response
            }
        }
    }
}

/// Generic dispatch helper: deserialize params into a request type,
/// call the handler, and serialize the result to JSON.
async fn dispatch_handler<Req, Resp, F, Fut>(
    params: serde_json::Value,
    handler: F,
) -> Result<serde_json::Value, AuditProofError>
where
    Req: serde::de::DeserializeOwned,
    Resp: serde::Serialize,
    F: FnOnce(Req) -> Fut,
    Fut: std::future::Future<Output = Result<Resp, AuditProofError>>,
{
    // A missing params object decodes like an empty one.
    let params = if params.is_null() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        params
    };
    let request: Req = serde_json::from_value(params)
        .map_err(|e| AuditProofError::Validation(format!("Failed to deserialize request: {}", e)))?;
    let response = handler(request).await?;
    Ok(serde_json::to_value(response)?)
}

// ---------------------------------------------------------------------------
// Tonic Service Wiring
// ---------------------------------------------------------------------------
// A single gRPC service with one method. The request and response are raw
// bytes (JSON-encoded JsonRpcRequest/Response), so no proto codegen is
// needed.

/// The tonic service wrapper. Implements the low-level gRPC service
/// by accepting bytes, deserializing as JSON-RPC, and dispatching.
#[derive(Clone)]
pub struct AuditProofJsonRpcServer {
    inner: AuditProofServiceImpl,
}

impl std::fmt::Debug for AuditProofJsonRpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditProofJsonRpcServer").finish()
    }
}

impl AuditProofJsonRpcServer {
    fn new(inner: AuditProofServiceImpl) -> Self {
        Self { inner }
    }
}

impl tonic::server::NamedService for AuditProofJsonRpcServer {
    const NAME: &'static str = "auditproof.rpc.AuditProofService";
}

impl<B> tower_service::Service<http::Request<B>> for AuditProofJsonRpcServer
where
    B: HttpBody + Send + 'static,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    B::Data: Send,
{
    type Response = http::Response<tonic::body::BoxBody>;
    type Error = std::convert::Infallible;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let inner = self.inner.clone();

        Box::pin(async move {
            let body_bytes = match collect_body(req.into_body()).await {
                Ok(b) => b,
                Err(e) => {
                    tracing::error!("Failed to read request body: {}", e);
                    let err = AuditProofError::Validation(format!("Failed to read request body: {}", e));
                    return Ok(build_response(&JsonRpcResponse::err(&err)));
                }
            };

            let rpc_request: JsonRpcRequest = match serde_json::from_slice(&body_bytes) {
                Ok(r) => r,
                Err(e) => {
                    let err = AuditProofError::Validation(format!("Invalid JSON-RPC request: {}", e));
                    return Ok(build_response(&JsonRpcResponse::err(&err)));
                }
            };

            let rpc_response = inner.dispatch(rpc_request).await;
            Ok(build_response(&rpc_response))
        })
    }
}

/// Collect the body of an HTTP request into bytes.
async fn collect_body<B>(body: B) -> Result<Vec<u8>, String>
where
    B: HttpBody + Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    B::Data: Send,
{
    let mut collected = Vec::new();
    let mut body = std::pin::pin!(body);

    loop {
        match std::future::poll_fn(|cx| HttpBody::poll_frame(body.as_mut(), cx)).await {
            Some(Ok(frame)) => {
                if let Ok(data) = frame.into_data() {
                    use bytes::Buf;
                    collected.extend_from_slice(data.chunk());
                }
            }
            Some(Err(e)) => return Err(e.into().to_string()),
            None => break,
        }
    }

    Ok(collected)
}

/// Build an HTTP response carrying a JSON-RPC envelope. The transport
/// status is always 200; the envelope's `code` carries the outcome.
fn build_response(response: &JsonRpcResponse) -> http::Response<tonic::body::BoxBody> {
    let json = serde_json::to_vec(response).unwrap_or_default();
    let body = tonic::body::BoxBody::new(
        http_body_util::Full::new(bytes::Bytes::from(json))
            .map_err(|e| Status::internal(format!("body error: {}", e))),
    );

    let mut http_response = http::Response::new(body);
    http_response.headers_mut().insert(
        http::header::CONTENT_TYPE,
        http::HeaderValue::from_static("application/json"),
    );
    http_response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use auditproof_core::chain::{ContractCall, SignedCall};
    use auditproof_core::credential::Credential;
    use auditproof_core::crypto::{id_to_bytes32, Keypair};
    use auditproof_core::types::Bytes32;
    use auditproof_ledger::ChainConfig;
    use auditproof_orchestrator::{
        CredentialIssuer, GeneratedProof, IssueRequest, IssuedCredential, SigningContext,
    };
    use auditproof_store::ApplicationStore;
    use auditproof_verify::TrustedProver;

    struct OfflineIssuer;

    #[async_trait]
    impl CredentialIssuer for OfflineIssuer {
        async fn issue(&self, _request: &IssueRequest) -> Result<IssuedCredential, AuditProofError> {
            Err(AuditProofError::UpstreamUnavailable("offline".to_string()))
        }

        async fn generate_proof(&self, _credential: &Credential) -> Result<GeneratedProof, AuditProofError> {
            Err(AuditProofError::UpstreamUnavailable("offline".to_string()))
        }

        fn has_verifier(&self) -> bool {
            false
        }
    }

    const AUDITOR: &str = "0xaaa1000000000000000000000000000000000001";
    const PROJECT: &str = "0x9000000000000000000000000000000000000009";
    const SUMMARY: &str = "0x3333333333333333333333333333333333333333333333333333333333333333";

    fn service() -> AuditProofServiceImpl {
        let admin = Keypair::generate();
        let prover_key = Keypair::generate();
        let chain = Arc::new(
            LocalChain::genesis(
                admin.address(),
                prover_key.address(),
                ChainConfig {
                    block_time: Duration::from_millis(1),
                    ..ChainConfig::default()
                },
            )
            .unwrap(),
        );
        let prover = Arc::new(TrustedProver::new(prover_key, chain.verifier().context_id()));
        let signer = Arc::new(SigningContext::new(admin, chain.clone()));
        let credentials = Arc::new(CredentialStore::in_memory());
        let metrics = Arc::new(MetricsAggregator::in_memory(200));

        let services = RpcServices {
            admission: Arc::new(AdmissionService::new(
                signer.clone(),
                Arc::new(ApplicationStore::in_memory()),
            )),
            issuance: Arc::new(
                IssuanceService::new(Arc::new(OfflineIssuer), credentials.clone(), metrics.clone())
                    .with_prover(prover),
            ),
            verification: Arc::new(VerificationService::new(
                signer,
                Arc::new(chain.verifier().clone()),
                credentials.clone(),
                metrics.clone(),
            )),
            credentials,
            metrics,
            chain,
        };
        AuditProofServiceImpl { services }
    }

    async fn call(svc: &AuditProofServiceImpl, method: &str, params: serde_json::Value) -> JsonRpcResponse {
        svc.dispatch(JsonRpcRequest {
            method: method.to_string(),
            params,
        })
        .await
    }

    #[tokio::test]
    async fn test_unknown_method_is_404() {
        let svc = service();
        let resp = call(&svc, "polyp/submit", json!({})).await;
        assert!(!resp.success);
        assert_eq!(resp.code, 404);
    }

    #[tokio::test]
    async fn test_approve_and_conflict_codes() {
        let svc = service();
        let resp = call(&svc, "admin/approve-auditor", json!({ "auditorAddress": AUDITOR })).await;
        assert_eq!(resp.code, 200, "{:?}", resp.error);
        let result = resp.result.unwrap();
        assert_eq!(result["auditor"]["isApproved"], json!(true));
        assert!(result["txHash"].as_str().unwrap().starts_with("0x"));

        let resp = call(&svc, "admin/approve-auditor", json!({ "auditorAddress": AUDITOR })).await;
        assert_eq!(resp.code, 400);

        let resp = call(&svc, "admin/approve-auditor", json!({ "auditorAddress": "nope" })).await;
        assert_eq!(resp.code, 400);
    }

    #[tokio::test]
    async fn test_application_flow() {
        let svc = service();
        let resp = call(&svc, "admin/reject-application", json!({ "walletAddress": AUDITOR })).await;
        assert_eq!(resp.code, 404);

        let resp = call(&svc, "applications/submit", json!({ "walletAddress": AUDITOR })).await;
        assert_eq!(resp.code, 200);
        let resp = call(&svc, "admin/reject-application", json!({ "walletAddress": AUDITOR })).await;
        assert_eq!(resp.result.unwrap(), json!({ "ok": true }));

        let resp = call(&svc, "admin/applications", json!({ "status": "rejected" })).await;
        assert_eq!(resp.result.unwrap()["count"], json!(1));
        let resp = call(&svc, "admin/applications", serde_json::Value::Null).await;
        assert_eq!(resp.code, 200);
    }

    #[tokio::test]
    async fn test_issue_get_and_generate() {
        let svc = service();
        let resp = call(&svc, "credentials/issue", json!({ "issuer": AUDITOR })).await;
        assert_eq!(resp.code, 400);

        let resp = call(
            &svc,
            "credentials/issue",
            json!({ "issuer": AUDITOR, "subject": PROJECT, "summaryHash": SUMMARY, "status": "Verified" }),
        )
        .await;
        assert_eq!(resp.code, 200, "{:?}", resp.error);
        let credential = resp.result.unwrap();
        let id = credential["id"].as_str().unwrap().to_string();
        assert_eq!(credential["synthesized"], json!(true));

        let resp = call(&svc, "credentials/get", json!({ "id": id })).await;
        assert_eq!(resp.code, 200);
        let resp = call(&svc, "credentials/list", json!({ "subject": PROJECT.to_uppercase().replace("0X", "0x") })).await;
        assert_eq!(resp.result.unwrap()["count"], json!(1));

        let resp = call(&svc, "proofs/generate", json!({ "credentialId": id })).await;
        let proof = resp.result.unwrap();
        assert_eq!(proof["valid"], json!(true));
        assert!(proof["proof"].is_object());

        let resp = call(&svc, "metrics/get", json!({})).await;
        assert_eq!(resp.result.unwrap()["proofGeneration"]["count"], json!(1));
    }

    #[tokio::test]
    async fn test_health_reports_deployment() {
        let svc = service();
        let resp = call(&svc, "node/health", json!({})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["status"], json!("ok"));
        assert_eq!(result["network"], json!("local"));
        assert_eq!(
            result["registryAddress"],
            json!(svc.services.chain.registry_address().to_string())
        );
    }

    #[tokio::test]
    async fn test_registry_listing_and_health_counts() {
        let svc = service();
        let resp = call(&svc, "auditors/list", serde_json::Value::Null).await;
        assert_eq!(resp.result.unwrap()["count"], json!(0));

        let second = "0xaaa1000000000000000000000000000000000002";
        for address in [AUDITOR, second] {
            let resp = call(&svc, "admin/approve-auditor", json!({ "auditorAddress": address })).await;
            assert_eq!(resp.code, 200, "{:?}", resp.error);
        }
        let resp = call(&svc, "admin/revoke-auditor", json!({ "auditorAddress": AUDITOR })).await;
        assert_eq!(resp.code, 200, "{:?}", resp.error);

        let resp = call(&svc, "auditors/list", json!({})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["count"], json!(2));
        assert_eq!(result["approvedCount"], json!(1));
        assert_eq!(result["auditors"][0]["address"], json!(AUDITOR));
        assert_eq!(result["auditors"][0]["isApproved"], json!(false));

        let resp = call(&svc, "auditors/list", json!({ "approvedOnly": true })).await;
        let result = resp.result.unwrap();
        assert_eq!(result["count"], json!(1));
        assert_eq!(result["auditors"][0]["address"], json!(second));

        let resp = call(&svc, "node/health", json!({})).await;
        let result = resp.result.unwrap();
        assert_eq!(result["auditorCount"], json!(2));
        assert_eq!(result["approvedAuditorCount"], json!(1));
        assert_eq!(
            result["admin"],
            json!(svc.services.chain.admin().await.to_string())
        );
    }

    #[tokio::test]
    async fn test_client_signed_anchor() {
        let svc = service();
        let auditor = Keypair::generate();
        let resp = call(
            &svc,
            "admin/approve-auditor",
            json!({ "auditorAddress": auditor.address().to_string() }),
        )
        .await;
        assert_eq!(resp.code, 200);

        let resp = call(&svc, "chain/nonce", json!({ "address": auditor.address().to_string() })).await;
        assert_eq!(resp.result.unwrap()["nonce"], json!(0));

        let signed = SignedCall::sign(
            &auditor,
            ContractCall::AnchorCredential {
                credential_id: id_to_bytes32("cred-1"),
                summary_hash: Bytes32([9u8; 32]),
                auditor: auditor.address(),
            },
            0,
        )
        .unwrap();
        let resp = call(&svc, "chain/send-transaction", json!({ "signedCall": signed })).await;
        assert_eq!(resp.code, 200, "{:?}", resp.error);
        let tx_hash = resp.result.unwrap()["txHash"].clone();

        let resp = call(&svc, "chain/receipt", json!({ "txHash": tx_hash })).await;
        assert_eq!(resp.code, 200);
        let resp = call(&svc, "auditors/get", json!({ "address": auditor.address().to_string() })).await;
        assert_eq!(resp.result.unwrap()["credentialCount"], json!(1));

        // Replaying the same signed call reuses a spent nonce.
        let resp = call(&svc, "chain/send-transaction", json!({ "signedCall": signed })).await;
        assert_eq!(resp.code, 500);
    }

    #[tokio::test]
    async fn test_malformed_params_are_400() {
        let svc = service();
        let resp = call(&svc, "admin/applications", json!({ "status": 7 })).await;
        assert_eq!(resp.code, 400);
        assert!(resp.error.unwrap().contains("Failed to deserialize request"));
    }
}
