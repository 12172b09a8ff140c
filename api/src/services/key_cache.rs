//! Key Cache
//!
//! Owns the Groth16 key pair of every circuit kind for the process lifetime.
//!
//! # Lifecycle
//!
//! ```text
//! empty ──first get(kind)──▶ loading ──ok──▶ ready (immutable, shared via Arc)
//!                              │
//!                              └──error──▶ empty (next get retries)
//! ```
//!
//! A load runs as its own task: it tries the key store first, falls back to
//! a fresh setup and persists the result. Callers only wait on it. A caller
//! that gives up after `setup_timeout` leaves the load running, and every
//! later `get` for that kind joins the same load. There is never more than
//! one setup in flight per kind.
//!
//! [`KeyCache::get_stored`] never falls back to setup. Verification uses it:
//! a key generated on demand could not match any reference a client holds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{watch, OnceCell};
use zk_credential_circuits::codec::artifact_ref;
use zk_credential_circuits::{
    decode, define, encode, setup, CircuitKind, ConstraintSystem, KeyPair, ProvingKey,
    VerifyingKey,
};

use super::key_store::{KeyStore, StoredKeys};
use super::worker_pool::WorkerPool;
use crate::error::ServiceError;

/// Ready-to-use key material of one circuit kind.
#[derive(Debug)]
pub struct CircuitKeys {
    pub system: Arc<ConstraintSystem>,
    pub keys: KeyPair,
    /// Hex Keccak256 of the encoded verifying key
    pub verifying_key_ref: String,
    pub proving_key_size: usize,
    pub verifying_key_size: usize,
}

/// What a load does when the store has no usable pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnMiss {
    Setup,
    Skip,
}

type Outcome = Result<Option<Arc<CircuitKeys>>, ServiceError>;

#[derive(Default)]
struct Slot {
    ready: OnceCell<Arc<CircuitKeys>>,
    /// Present while a load task runs; settles to `Some(outcome)`
    loading: Mutex<Option<watch::Receiver<Option<Outcome>>>>,
}

enum Joined {
    Ready(Arc<CircuitKeys>),
    Waiting(watch::Receiver<Option<Outcome>>),
}

pub struct KeyCache {
    slots: HashMap<CircuitKind, Arc<Slot>>,
    store: Arc<dyn KeyStore>,
    pool: WorkerPool,
    setup_timeout: Duration,
    setups: Arc<AtomicUsize>,
}

impl KeyCache {
    pub fn new(store: Arc<dyn KeyStore>, pool: WorkerPool, setup_timeout: Duration) -> Self {
        Self {
            slots: CircuitKind::ALL
                .into_iter()
                .map(|kind| (kind, Arc::new(Slot::default())))
                .collect(),
            store,
            pool,
            setup_timeout,
            setups: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Keys for `kind`, loading or generating them on first demand.
    pub async fn get(&self, kind: CircuitKind) -> Result<Arc<CircuitKeys>, ServiceError> {
        // Joining a store-only load that found nothing frees the slot; go again
        loop {
            if let Some(keys) = self.obtain(kind, OnMiss::Setup).await? {
                return Ok(keys);
            }
        }
    }

    /// Keys for `kind` if loaded or persisted. Never runs setup.
    pub async fn get_stored(
        &self,
        kind: CircuitKind,
    ) -> Result<Option<Arc<CircuitKeys>>, ServiceError> {
        self.obtain(kind, OnMiss::Skip).await
    }

    /// Keys for `kind` if already loaded; never touches the store.
    pub fn peek(&self, kind: CircuitKind) -> Option<Arc<CircuitKeys>> {
        self.slots.get(&kind).and_then(|slot| slot.ready.get().cloned())
    }

    /// Fresh key generations performed by this cache (store hits excluded)
    pub fn setup_count(&self) -> usize {
        self.setups.load(Ordering::SeqCst)
    }

    async fn obtain(&self, kind: CircuitKind, on_miss: OnMiss) -> Outcome {
        let slot = self.slot(kind)?;
        if let Some(keys) = slot.ready.get() {
            tracing::debug!(circuit = %kind, "Key cache hit");
            return Ok(Some(keys.clone()));
        }

        let mut outcome = match self.join_or_start(kind, slot, on_miss)? {
            Joined::Ready(keys) => return Ok(Some(keys)),
            Joined::Waiting(outcome) => outcome,
        };

        let result = match tokio::time::timeout(self.setup_timeout, outcome.wait_for(Option::is_some)).await {
            Ok(Ok(settled)) => match (*settled).clone() {
                Some(outcome) => outcome,
                None => Err(abandoned(kind)),
            },
            Ok(Err(_)) => Err(abandoned(kind)),
            Err(_) => {
                tracing::warn!(
                    circuit = %kind,
                    timeout_ms = self.setup_timeout.as_millis() as u64,
                    "Gave up waiting for keys, load continues"
                );
                Err(ServiceError::Cancelled(self.setup_timeout))
            }
        };
        result
    }

    fn join_or_start(
        &self,
        kind: CircuitKind,
        slot: &Arc<Slot>,
        on_miss: OnMiss,
    ) -> Result<Joined, ServiceError> {
        let mut loading = slot
            .loading
            .lock()
            .map_err(|_| ServiceError::Storage("key cache lock poisoned".to_string()))?;

        // A load may have finished since the unlocked check
        if let Some(keys) = slot.ready.get() {
            return Ok(Joined::Ready(keys.clone()));
        }
        if let Some(outcome) = loading.as_ref() {
            return Ok(Joined::Waiting(outcome.clone()));
        }

        let (sender, outcome) = watch::channel(None);
        *loading = Some(outcome.clone());
        drop(loading);

        self.spawn_load(kind, slot.clone(), on_miss, sender);
        Ok(Joined::Waiting(outcome))
    }

    fn spawn_load(
        &self,
        kind: CircuitKind,
        slot: Arc<Slot>,
        on_miss: OnMiss,
        sender: watch::Sender<Option<Outcome>>,
    ) {
        let pool = self.pool.clone();
        let store = self.store.clone();
        let setups = self.setups.clone();

        tokio::spawn(async move {
            let started = Instant::now();
            let outcome = pool
                .execute(move || load_keys(kind, store.as_ref(), &setups, on_miss))
                .await
                .and_then(|loaded| loaded)
                .map(|keys| keys.map(Arc::new));

            match &outcome {
                Ok(Some(keys)) => {
                    tracing::info!(
                        circuit = %kind,
                        verifying_key_ref = %keys.verifying_key_ref,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Keys ready"
                    );
                    let _ = slot.ready.set(keys.clone());
                }
                Ok(None) => tracing::debug!(circuit = %kind, "No persisted keys"),
                Err(e) => tracing::error!(circuit = %kind, error = %e, "Key initialisation failed"),
            }

            if let Ok(mut loading) = slot.loading.lock() {
                *loading = None;
            }
            sender.send_replace(Some(outcome));
        });
    }

    fn slot(&self, kind: CircuitKind) -> Result<&Arc<Slot>, ServiceError> {
        self.slots
            .get(&kind)
            .ok_or_else(|| ServiceError::InvalidInput(format!("unsupported circuit `{}`", kind)))
    }
}

fn abandoned(kind: CircuitKind) -> ServiceError {
    ServiceError::WorkerPanicked(format!("key load for `{}` ended without a result", kind))
}

/// Blocking body of a cache load; runs on a worker thread.
fn load_keys(
    kind: CircuitKind,
    store: &dyn KeyStore,
    setups: &AtomicUsize,
    on_miss: OnMiss,
) -> Result<Option<CircuitKeys>, ServiceError> {
    let system = Arc::new(define(kind)?);

    if let Some(keys) = load_persisted(&system, store) {
        return Ok(Some(keys));
    }

    match on_miss {
        OnMiss::Skip => Ok(None),
        OnMiss::Setup => generate(system, store, setups).map(Some),
    }
}

fn load_persisted(system: &Arc<ConstraintSystem>, store: &dyn KeyStore) -> Option<CircuitKeys> {
    let kind = system.kind();
    match store.load(kind) {
        Ok(Some(stored)) => match restore(system, &stored) {
            Ok(keys) => {
                tracing::info!(circuit = %kind, "Loaded keys from store");
                Some(keys)
            }
            Err(e) => {
                tracing::warn!(circuit = %kind, error = %e, "Stored keys rejected");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(circuit = %kind, error = %e, "Key store unreadable");
            None
        }
    }
}

fn generate(
    system: Arc<ConstraintSystem>,
    store: &dyn KeyStore,
    setups: &AtomicUsize,
) -> Result<CircuitKeys, ServiceError> {
    setups.fetch_add(1, Ordering::SeqCst);
    let keys = setup(&system)?;

    let stored = StoredKeys {
        proving_key: encode(&keys.proving_key)?,
        verifying_key: encode(&keys.verifying_key)?,
    };
    store.save(system.kind(), &stored)?;

    Ok(assemble(system, keys, &stored))
}

fn restore(system: &Arc<ConstraintSystem>, stored: &StoredKeys) -> Result<CircuitKeys, ServiceError> {
    let proving_key: ProvingKey = decode(&stored.proving_key)?;
    let verifying_key: VerifyingKey = decode(&stored.verifying_key)?;

    let fingerprint = system.fingerprint();
    for (kind, key_fingerprint) in [
        (proving_key.kind(), proving_key.fingerprint()),
        (verifying_key.kind(), verifying_key.fingerprint()),
    ] {
        if kind != system.kind() || key_fingerprint != &fingerprint {
            return Err(ServiceError::Storage(format!(
                "stored {} key does not match the compiled {} circuit",
                kind,
                system.kind()
            )));
        }
    }

    let keys = KeyPair {
        proving_key,
        verifying_key,
    };
    if !keys.is_consistent() {
        return Err(ServiceError::Storage(format!(
            "stored {} proving and verifying keys come from different setups",
            system.kind()
        )));
    }
    Ok(assemble(system.clone(), keys, stored))
}

fn assemble(system: Arc<ConstraintSystem>, keys: KeyPair, stored: &StoredKeys) -> CircuitKeys {
    CircuitKeys {
        system,
        keys,
        verifying_key_ref: artifact_ref(&stored.verifying_key),
        proving_key_size: stored.proving_key.len(),
        verifying_key_size: stored.verifying_key.len(),
    }
}
