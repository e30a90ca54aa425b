// crates/auditproof-daemon/src/config.rs
//
// Runtime configuration for the auditproof daemon.
// Loaded from a TOML file or populated with sensible defaults.

use std::fs;
use std::time::Duration;

use serde::Deserialize;

use auditproof_orchestrator::{Air3Settings, FinalizerConfig, RetryPolicy};

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Directory for snapshots and key files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Host address for the RPC server.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    /// Port for the RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Hex-encoded secret of the admin identity. Generated on first start.
    #[serde(default = "default_admin_key_path")]
    pub admin_key_path: String,

    /// Hex-encoded secret of the local trusted prover. Generated on first start.
    #[serde(default = "default_prover_key_path")]
    pub prover_key_path: String,

    /// Address the ledger trusts for proof attestations. Defaults to the
    /// local prover's address.
    #[serde(default)]
    pub trusted_signer: Option<String>,

    /// Deployment label hashed into the verifier context id.
    #[serde(default = "default_verifier_context")]
    pub verifier_context: String,

    /// Network label reported by `node/health`.
    #[serde(default = "default_network")]
    pub network: String,

    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,

    #[serde(default = "default_score_retry_delay_secs")]
    pub score_retry_delay_secs: u64,

    #[serde(default = "default_score_max_attempts")]
    pub score_max_attempts: u32,

    #[serde(default = "default_finalizer_concurrency")]
    pub finalizer_concurrency: usize,

    /// Local chain confirmation latency.
    #[serde(default = "default_block_time_ms")]
    pub block_time_ms: u64,

    /// Samples kept per metric kind.
    #[serde(default = "default_metrics_window")]
    pub metrics_window: usize,

    #[serde(default)]
    pub issuer: IssuerConfig,
}

/// The `[issuer]` table: the external credential issuer.
#[derive(Debug, Clone, Deserialize)]
pub struct IssuerConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub partner_id: Option<String>,
    #[serde(default)]
    pub issuer_did: Option<String>,
    /// Without a verifier DID, proofs are always synthesized locally.
    #[serde(default)]
    pub verifier_did: Option<String>,
    /// Fall back to local synthesis on any issuer error, not only on
    /// network failures.
    #[serde(default)]
    pub fallback_on_error: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_data_dir() -> String {
    "~/.auditproof/data".to_string()
}

fn default_rpc_host() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    50061
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_admin_key_path() -> String {
    "~/.auditproof/keys/admin.key".to_string()
}

fn default_prover_key_path() -> String {
    "~/.auditproof/keys/prover.key".to_string()
}

fn default_verifier_context() -> String {
    "auditproof-local".to_string()
}

fn default_network() -> String {
    "local".to_string()
}

fn default_confirmation_timeout_secs() -> u64 {
    60
}

fn default_score_retry_delay_secs() -> u64 {
    30
}

fn default_score_max_attempts() -> u32 {
    3
}

fn default_finalizer_concurrency() -> usize {
    4
}

fn default_block_time_ms() -> u64 {
    500
}

fn default_metrics_window() -> usize {
    200
}

fn default_api_base() -> String {
    "https://api.sandbox.air3.com".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for IssuerConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            partner_id: None,
            issuer_did: None,
            verifier_did: None,
            fallback_on_error: false,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            admin_key_path: default_admin_key_path(),
            prover_key_path: default_prover_key_path(),
            trusted_signer: None,
            verifier_context: default_verifier_context(),
            network: default_network(),
            confirmation_timeout_secs: default_confirmation_timeout_secs(),
            score_retry_delay_secs: default_score_retry_delay_secs(),
            score_max_attempts: default_score_max_attempts(),
            finalizer_concurrency: default_finalizer_concurrency(),
            block_time_ms: default_block_time_ms(),
            metrics_window: default_metrics_window(),
            issuer: IssuerConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: DaemonConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn finalizer(&self) -> FinalizerConfig {
        FinalizerConfig {
            confirmation_timeout: self.confirmation_timeout(),
            retry: RetryPolicy {
                max_attempts: self.score_max_attempts,
                delay: Duration::from_secs(self.score_retry_delay_secs),
            },
            concurrency: self.finalizer_concurrency,
        }
    }

    pub fn air3(&self) -> Air3Settings {
        Air3Settings {
            api_base: self.issuer.api_base.clone(),
            partner_id: self.issuer.partner_id.clone(),
            issuer_did: self.issuer.issuer_did.clone(),
            verifier_did: self.issuer.verifier_did.clone(),
            request_timeout: Duration::from_secs(self.issuer.request_timeout_secs),
        }
    }
}

/// Expand `~` at the start of a path to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
