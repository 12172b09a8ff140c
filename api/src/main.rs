//! ZK Credential Key Setup
//!
//! Runs (or reloads) the Groth16 setup of every circuit kind and prints the
//! verifying key references to hand out to verifiers.
//!
//! ```text
//! ┌────────────────┐     ┌────────────────┐     ┌────────────────┐
//! │  .env / env    │────▶│    KeyCache    │────▶│   KEY_DIR      │
//! │  Config        │     │  get(kind) ×N  │     │  <kind>.pk/.vk │
//! └────────────────┘     └────────────────┘     └────────────────┘
//! ```
//!
//! Without `KEY_DIR` the keys live only as long as this process, which is
//! only useful as a smoke test of the setup itself.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zk_credential_api::{Config, CredentialProver};
use zk_credential_circuits::CircuitKind;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // RUST_LOG=zk_credential_circuits=debug for per-proof detail
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zk_credential_api=debug,zk_credential_circuits=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        environment = ?config.environment,
        workers = config.worker_threads,
        key_dir = ?config.key_dir,
        "Configuration loaded"
    );
    if config.key_dir.is_none() {
        tracing::warn!("KEY_DIR not set, keys will not outlive this process");
    }

    let prover = CredentialProver::from_config(&config);

    for kind in CircuitKind::ALL {
        let keys = prover.keys().get(kind).await?;
        tracing::info!(
            circuit = %kind,
            constraints = keys.system.num_constraints(),
            public_inputs = keys.keys.verifying_key.num_public_inputs(),
            proving_key_bytes = keys.proving_key_size,
            verifying_key_bytes = keys.verifying_key_size,
            verifying_key_ref = %keys.verifying_key_ref,
            "Keys ready"
        );
        println!("{}\t{}", kind, keys.verifying_key_ref);
    }

    tracing::info!(fresh_setups = prover.keys().setup_count(), "Setup complete");
    Ok(())
}
