// crates/auditproof-cli/src/commands/status.rs
//
// `auditproof health` and `auditproof metrics`.

use serde_json::{json, Value};

use crate::output::{format_json, OutputFormat};
use crate::rpc_client::RpcClient;

/// Run the health command.
pub async fn health(client: &RpcClient, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let health: Value = client.call("node/health", json!({})).await?;
    if format == OutputFormat::Json {
        println!("{}", format_json(&health));
        return Ok(());
    }

    println!("auditproof v{}", health["version"].as_str().unwrap_or("?"));
    println!();
    println!("Node Status");
    println!("-----------");
    println!("  Status:         {}", health["status"].as_str().unwrap_or("unknown"));
    println!("  Network:        {}", health["network"].as_str().unwrap_or("-"));
    println!("  Block:          {}", health["blockNumber"]);
    println!("  Registry:       {}", health["registryAddress"].as_str().unwrap_or("-"));
    println!("  Ledger:         {}", health["ledgerAddress"].as_str().unwrap_or("-"));
    println!("  Trusted signer: {}", health["trustedSigner"].as_str().unwrap_or("-"));
    Ok(())
}

/// Run the metrics command.
pub async fn metrics(client: &RpcClient, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let report: Value = client.call("metrics/get", json!({})).await?;
    if format == OutputFormat::Json {
        println!("{}", format_json(&report));
        return Ok(());
    }

    let generation = &report["proofGeneration"];
    let verification = &report["proofVerification"];
    println!("Proof generation");
    println!("  Samples:  {}", generation["count"]);
    println!("  Average:  {:.1} ms", generation["averageMs"].as_f64().unwrap_or(0.0));
    println!("  Median:   {:.1} ms", generation["medianMs"].as_f64().unwrap_or(0.0));
    println!();
    println!("Proof verification");
    println!("  Samples:      {}", verification["count"]);
    println!("  Average gas:  {:.0}", verification["averageGas"].as_f64().unwrap_or(0.0));
    println!("  Median gas:   {:.0}", verification["medianGas"].as_f64().unwrap_or(0.0));
    println!(
        "  Success rate: {:.1}%",
        verification["successRate"].as_f64().unwrap_or(0.0)
    );
    Ok(())
}
