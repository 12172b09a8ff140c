//! Services Module
//!
//! - `credential_prover`: `GenerateProof` / `VerifyProof`
//! - `key_cache`: per-kind key pairs, set up at most once
//! - `key_store`: key persistence (memory, filesystem)
//! - `worker_pool`: bounded blocking workers with per-unit timeout

pub mod credential_prover;
pub mod key_cache;
pub mod key_store;
pub mod worker_pool;

pub use credential_prover::CredentialProver;
pub use key_cache::{CircuitKeys, KeyCache};
pub use key_store::{FsKeyStore, KeyStore, MemoryKeyStore, StoredKeys};
pub use worker_pool::WorkerPool;
