//! ZK Credential Service Library
//!
//! # Overview
//!
//! Service layer around the credential proof engine: keys are set up once
//! per circuit kind and cached, proving and verification run on a bounded
//! pool of blocking workers, and every request carries a timeout.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    zk-credential-api                      │
//! │                                                           │
//! │  ┌───────────┐   ┌──────────────────┐   ┌─────────────┐   │
//! │  │   Types   │──▶│ CredentialProver │──▶│  KeyCache   │   │
//! │  └───────────┘   └────────┬─────────┘   └──────┬──────┘   │
//! │                           │                    │          │
//! │                           ▼                    ▼          │
//! │                   ┌──────────────┐      ┌─────────────┐   │
//! │                   │  WorkerPool  │      │  KeyStore   │   │
//! │                   └──────┬───────┘      └─────────────┘   │
//! └──────────────────────────┼────────────────────────────────┘
//!                            ▼
//!                 ┌──────────────────────┐
//!                 │ zk-credential-circuits│
//!                 └──────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: environment configuration
//! - `error`: service error type
//! - `services`: prover façade, key cache, key store, worker pool
//! - `types`: request / response types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use zk_credential_api::{Config, CredentialProver};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let prover = CredentialProver::from_config(&config);
//!
//!     let generated = prover.generate_proof(request).await?;
//!     let verdict = prover.verify_proof((&generated).into()).await?;
//!     assert!(verdict.valid);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod services;
pub mod types;

pub use config::Config;
pub use error::ServiceError;
pub use services::{CredentialProver, KeyCache, WorkerPool};
pub use types::{GeneratedProof, ProofRequest, VerifyRequest, VerifyResponse};
