//! Groth16 Proving
//!
//! Proving is CPU-bound (multi-scalar multiplications over the whole
//! constraint system). Callers that serve requests should run it on a
//! blocking thread, never on an async executor.

use std::fmt;
use std::time::Instant;

use ark_groth16::Groth16;
use ark_snark::SNARK;
use rand::{CryptoRng, RngCore};

use crate::circuit::CircuitKind;
use crate::error::ProveError;
use crate::r1cs::CompiledCircuit;
use crate::setup::ProvingKey;
use crate::witness::Witness;
use crate::Bn254;

/// Groth16 proof tagged with the circuit it was produced for.
#[derive(Clone, PartialEq)]
pub struct Proof {
    kind: CircuitKind,
    inner: ark_groth16::Proof<Bn254>,
}

impl Proof {
    pub(crate) fn from_parts(kind: CircuitKind, inner: ark_groth16::Proof<Bn254>) -> Self {
        Self { kind, inner }
    }

    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub(crate) fn inner(&self) -> &ark_groth16::Proof<Bn254> {
        &self.inner
    }

    #[cfg(test)]
    pub(crate) fn inner_mut(&mut self) -> &mut ark_groth16::Proof<Bn254> {
        &mut self.inner
    }
}

impl fmt::Debug for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Proof").field("kind", &self.kind).finish_non_exhaustive()
    }
}

/// Produce a proof that `witness` satisfies the circuit `pk` was generated for.
///
/// The witness has already been checked against every constraint, so a
/// failure here is a key/witness mismatch or a backend fault, never bad
/// user input.
pub fn prove<R: RngCore + CryptoRng>(
    pk: &ProvingKey,
    witness: &Witness,
    rng: &mut R,
) -> Result<Proof, ProveError> {
    if pk.kind() != witness.kind() {
        return Err(ProveError::KeyMismatch {
            key: pk.kind(),
            witness: witness.kind(),
        });
    }
    if pk.fingerprint() != &witness.system().fingerprint() {
        return Err(ProveError::FingerprintMismatch);
    }

    let started = Instant::now();
    let circuit = CompiledCircuit::with_assignment(witness.system(), witness.assignment());
    let inner = Groth16::<Bn254>::prove(pk.inner(), circuit, rng)
        .map_err(|e| ProveError::Backend(e.to_string()))?;

    tracing::debug!(
        circuit = %witness.kind(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Proof generated"
    );

    Ok(Proof::from_parts(witness.kind(), inner))
}
