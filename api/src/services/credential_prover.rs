//! Credential Prover Service
//!
//! `GenerateProof` and `VerifyProof` over the proof engine.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CredentialProver                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  request ──▶ claims → field values (async, cheap)             │
//! │                 │                                             │
//! │                 ▼                                             │
//! │  ┌──────────────────────┐    ┌─────────────────────────────┐  │
//! │  │      KeyCache        │    │        WorkerPool           │  │
//! │  │  one load/kind       │───▶│  witness → prove → encode   │  │
//! │  │  store → setup       │    │  (spawn_blocking, bounded)  │  │
//! │  └──────────────────────┘    └─────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request runs inside a span carrying a fresh `request_id`. Private
//! values never reach a log line.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use rand::rngs::OsRng;
use tracing::Instrument;
use uuid::Uuid;
use zk_credential_circuits::{
    encode, prove, verify_encoded, Assignments, DocumentCommitment, Fr, PublicInputs,
    WitnessBuilder,
};

use super::key_cache::{CircuitKeys, KeyCache};
use super::key_store::{FsKeyStore, KeyStore, MemoryKeyStore};
use super::worker_pool::WorkerPool;
use crate::config::Config;
use crate::error::ServiceError;
use crate::types::{
    decode_hex, CredentialClaims, GeneratedProof, ProofRequest, VerifyRequest, VerifyResponse,
};

type Values = Vec<(&'static str, Fr)>;

pub struct CredentialProver {
    cache: Arc<KeyCache>,
    pool: WorkerPool,
    proof_timeout: Duration,
}

impl CredentialProver {
    pub fn new(config: &Config, store: Arc<dyn KeyStore>) -> Self {
        let pool = WorkerPool::new(config.worker_threads);
        let cache = Arc::new(KeyCache::new(store, pool.clone(), config.setup_timeout));
        Self {
            cache,
            pool,
            proof_timeout: config.proof_timeout,
        }
    }

    /// Persist keys under `KEY_DIR` when configured, in memory otherwise.
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn KeyStore> = match &config.key_dir {
            Some(dir) => Arc::new(FsKeyStore::new(dir)),
            None => Arc::new(MemoryKeyStore::new()),
        };
        Self::new(config, store)
    }

    pub fn keys(&self) -> &KeyCache {
        &self.cache
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub async fn generate_proof(&self, request: ProofRequest) -> Result<GeneratedProof, ServiceError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("generate_proof", %request_id, circuit = %request.kind());
        self.generate(request_id, request).instrument(span).await
    }

    pub async fn verify_proof(&self, request: VerifyRequest) -> Result<VerifyResponse, ServiceError> {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("verify_proof", %request_id, circuit = %request.kind);
        self.verify(request).instrument(span).await
    }

    async fn generate(
        &self,
        request_id: Uuid,
        request: ProofRequest,
    ) -> Result<GeneratedProof, ServiceError> {
        let kind = request.kind();
        let keys = self.cache.get(kind).await?;

        let commitment = DocumentCommitment::from_document(&request.document);
        let (private, public) = claim_values(&request.claims, &commitment)?;

        let started = Instant::now();
        let unit_keys = keys.clone();
        let (proof_bytes, inputs) = self
            .pool
            .run(self.proof_timeout, move || prove_unit(&unit_keys, &private, &public))
            .await??;
        let generation_time_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            size_bytes = proof_bytes.len(),
            generation_time_ms,
            "Proof generated"
        );

        Ok(GeneratedProof {
            request_id,
            kind,
            commitment_digest: commitment.to_hex(),
            size_bytes: proof_bytes.len(),
            proof_bytes: hex::encode(&proof_bytes),
            verifying_key_ref: keys.verifying_key_ref.clone(),
            public_inputs: inputs.to_hex(),
            generation_time_ms,
            created_at: Utc::now(),
        })
    }

    async fn verify(&self, request: VerifyRequest) -> Result<VerifyResponse, ServiceError> {
        // Keys made now could never match a reference issued earlier
        let keys = self
            .cache
            .get_stored(request.kind)
            .await?
            .ok_or_else(|| ServiceError::UnknownVerifyingKey(request.verifying_key_ref.clone()))?;

        let requested_ref = request
            .verifying_key_ref
            .strip_prefix("0x")
            .unwrap_or(&request.verifying_key_ref);
        if !keys.verifying_key_ref.eq_ignore_ascii_case(requested_ref) {
            return Err(ServiceError::UnknownVerifyingKey(request.verifying_key_ref));
        }

        let proof_bytes = decode_hex("proof_bytes", &request.proof_bytes)?;
        let inputs = PublicInputs::from_hex(request.kind, &request.public_inputs)
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

        let valid = self
            .pool
            .run(self.proof_timeout, move || {
                verify_encoded(&keys.keys.verifying_key, &inputs, &proof_bytes)
            })
            .await??;

        tracing::info!(valid, "Proof checked");
        Ok(VerifyResponse { valid })
    }
}

fn claim_values(
    claims: &CredentialClaims,
    commitment: &DocumentCommitment,
) -> Result<(Values, Values), ServiceError> {
    Ok(match claims {
        CredentialClaims::Identity(claims) => {
            let (private, public) = claims.to_values(commitment)?;
            (private.assignments(), public.assignments())
        }
        CredentialClaims::Degree(claims) => {
            let (private, public) = claims.to_values(commitment)?;
            (private.assignments(), public.assignments())
        }
    })
}

/// Blocking body of a proof request; runs on a worker thread.
fn prove_unit(
    keys: &CircuitKeys,
    private: &[(&'static str, Fr)],
    public: &[(&'static str, Fr)],
) -> Result<(Vec<u8>, PublicInputs), ServiceError> {
    let witness = WitnessBuilder::new(keys.system.clone()).build(private, public)?;
    let proof = prove(&keys.keys.proving_key, &witness, &mut OsRng)?;
    Ok((encode(&proof)?, witness.public_inputs()))
}
