// crates/auditproof-daemon/src/main.rs
//
// Binary entrypoint for the auditproof daemon.
//
// Loads configuration, initializes tracing, loads (or creates) the admin
// and prover keys, deploys the local chain, opens the off-chain stores,
// wires the orchestration services, starts the background finalizer, and
// serves the JSON-RPC API until interrupted.

mod config;
mod keys;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use config::{expand_tilde, DaemonConfig};

use auditproof_core::types::Address;
use auditproof_ledger::{ChainConfig, LocalChain};
use auditproof_orchestrator::{
    AdmissionService, Air3Issuer, Finalizer, IssuanceService, SigningContext, VerificationService,
};
use auditproof_reputation::{HandleReputation, HandleWeights};
use auditproof_rpc::{AuditProofRpcServer, RpcConfig, RpcServices};
use auditproof_store::{ApplicationStore, CredentialStore, MetricsAggregator, Snapshot};
use auditproof_verify::TrustedProver;

/// auditproof daemon: auditor admission, credential anchoring, and proof
/// verification over a local chain.
#[derive(Parser, Debug)]
#[command(name = "auditproof-daemon", version = "0.1.0", about = "auditproof trust pipeline daemon")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "~/.auditproof/config.toml")]
    config: String,

    /// Override the configured RPC port.
    #[arg(long)]
    rpc_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration first so its log level can seed the filter.
    let loaded = DaemonConfig::load(&args.config);
    let mut daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    // Initialize tracing subscriber for structured logging. RUST_LOG wins.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match &loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", args.config),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            args.config,
            e
        ),
    }

    if let Some(port) = args.rpc_port {
        daemon_config.rpc_port = port;
    }

    tracing::info!("auditproof daemon v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Data directory: {}", daemon_config.data_dir);
    tracing::info!(
        "RPC endpoint: {}:{}",
        daemon_config.rpc_host,
        daemon_config.rpc_port
    );

    // ---------------------------------------------------------------
    // Identities
    // ---------------------------------------------------------------
    let admin = keys::load_or_generate(&expand_tilde(&daemon_config.admin_key_path), "admin")?;
    let prover_key =
        keys::load_or_generate(&expand_tilde(&daemon_config.prover_key_path), "prover")?;

    let trusted_signer = match &daemon_config.trusted_signer {
        Some(raw) => Address::parse(raw)?,
        None => prover_key.address(),
    };

    // ---------------------------------------------------------------
    // Chain
    // ---------------------------------------------------------------
    let chain = Arc::new(LocalChain::genesis(
        admin.address(),
        trusted_signer,
        ChainConfig {
            network: daemon_config.network.clone(),
            block_time: Duration::from_millis(daemon_config.block_time_ms),
            verifier_context: daemon_config.verifier_context.clone(),
        },
    )?);
    let prover = Arc::new(TrustedProver::new(prover_key, chain.verifier().context_id()));

    // ---------------------------------------------------------------
    // Off-chain stores
    // ---------------------------------------------------------------
    let data_dir = expand_tilde(&daemon_config.data_dir);
    std::fs::create_dir_all(&data_dir)?;
    let snapshot = |name: &str| Snapshot::new(Path::new(&data_dir).join(name));

    let applications = Arc::new(ApplicationStore::open(snapshot("applications.json")).await?);
    let credentials = Arc::new(CredentialStore::open(snapshot("credentials.json")).await?);
    let metrics = Arc::new(
        MetricsAggregator::open(snapshot("metrics.json"), daemon_config.metrics_window).await,
    );

    // ---------------------------------------------------------------
    // Services
    // ---------------------------------------------------------------
    let signer = Arc::new(SigningContext::new(admin, chain.clone()));
    tracing::info!("Admin identity: {}", signer.address());

    let mut issuance = IssuanceService::new(
        Arc::new(Air3Issuer::new(daemon_config.air3())),
        credentials.clone(),
        metrics.clone(),
    )
    .with_fallback_on_error(daemon_config.issuer.fallback_on_error);
    if prover.address() == trusted_signer {
        issuance = issuance.with_prover(prover.clone());
    } else {
        tracing::warn!(
            "Trusted signer {} is not the local prover {}; synthesized proofs will not be attested",
            trusted_signer,
            prover.address()
        );
    }
    if daemon_config.issuer.verifier_did.is_none() {
        tracing::info!("No verifier DID configured; proofs are generated locally");
    }
    let issuance = Arc::new(issuance);

    let finalizer = Finalizer::new(
        signer.clone(),
        Arc::new(HandleReputation::new(HandleWeights::default())),
        daemon_config.finalizer(),
    )
    .with_issuance(issuance.clone())
    .spawn();

    let admission = Arc::new(
        AdmissionService::new(signer.clone(), applications).with_finalizer(finalizer),
    );
    let verification = Arc::new(
        VerificationService::new(
            signer.clone(),
            Arc::new(chain.verifier().clone()),
            credentials.clone(),
            metrics.clone(),
        )
        .with_confirmation_timeout(daemon_config.confirmation_timeout()),
    );

    // ---------------------------------------------------------------
    // RPC
    // ---------------------------------------------------------------
    let rpc_server = AuditProofRpcServer::new(
        RpcConfig {
            host: daemon_config.rpc_host.clone(),
            port: daemon_config.rpc_port,
        },
        RpcServices {
            chain,
            admission,
            issuance,
            verification,
            credentials,
            metrics,
        },
    );

    tokio::select! {
        result = rpc_server.start() => {
            if let Err(e) = result {
                tracing::error!("RPC server error: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupt received");
        }
    }

    tracing::info!("auditproof daemon shut down");
    Ok(())
}
