//! Groth16 Key Generation
//!
//! Groth16 needs a circuit-specific trusted setup: the randomness used here
//! (the "toxic waste") would let its holder forge proofs. [`setup`] draws it
//! from the operating system and drops it when key generation returns; no
//! copy survives in this process.
//!
//! Both keys carry the circuit kind and the Keccak fingerprint of the
//! constraint system they were generated for, so a key can never be paired
//! with a witness or proof of another shape.

use std::fmt;
use std::time::Instant;

use ark_groth16::{Groth16, PreparedVerifyingKey};
use ark_relations::r1cs::SynthesisError;
use ark_snark::SNARK;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};

use crate::circuit::{CircuitKind, ConstraintSystem};
use crate::error::SetupError;
use crate::r1cs::CompiledCircuit;
use crate::{Bn254, Fr};

/// Secret-free but large: used by the prover only.
#[derive(Clone)]
pub struct ProvingKey {
    kind: CircuitKind,
    fingerprint: [u8; 32],
    inner: ark_groth16::ProvingKey<Bn254>,
}

impl ProvingKey {
    pub(crate) fn from_parts(
        kind: CircuitKind,
        fingerprint: [u8; 32],
        inner: ark_groth16::ProvingKey<Bn254>,
    ) -> Self {
        Self {
            kind,
            fingerprint,
            inner,
        }
    }

    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    pub(crate) fn inner(&self) -> &ark_groth16::ProvingKey<Bn254> {
        &self.inner
    }
}

impl fmt::Debug for ProvingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvingKey")
            .field("kind", &self.kind)
            .field("fingerprint", &hex::encode(&self.fingerprint[..8]))
            .finish_non_exhaustive()
    }
}

/// Public verification parameters, kept alongside their pairing-ready form.
#[derive(Clone)]
pub struct VerifyingKey {
    kind: CircuitKind,
    fingerprint: [u8; 32],
    inner: ark_groth16::VerifyingKey<Bn254>,
    prepared: PreparedVerifyingKey<Bn254>,
}

impl VerifyingKey {
    pub(crate) fn from_parts(
        kind: CircuitKind,
        fingerprint: [u8; 32],
        inner: ark_groth16::VerifyingKey<Bn254>,
    ) -> Result<Self, SynthesisError> {
        let prepared = <Groth16<Bn254> as SNARK<Fr>>::process_vk(&inner)?;
        Ok(Self {
            kind,
            fingerprint,
            inner,
            prepared,
        })
    }

    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    /// Number of public inputs a proof under this key is checked against
    pub fn num_public_inputs(&self) -> usize {
        self.inner.gamma_abc_g1.len().saturating_sub(1)
    }

    pub(crate) fn inner(&self) -> &ark_groth16::VerifyingKey<Bn254> {
        &self.inner
    }

    pub(crate) fn prepared(&self) -> &PreparedVerifyingKey<Bn254> {
        &self.prepared
    }
}

impl PartialEq for VerifyingKey {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.fingerprint == other.fingerprint && self.inner == other.inner
    }
}

impl Eq for VerifyingKey {}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifyingKey")
            .field("kind", &self.kind)
            .field("fingerprint", &hex::encode(&self.fingerprint[..8]))
            .field("public_inputs", &self.num_public_inputs())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub proving_key: ProvingKey,
    pub verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Both halves come from the same setup run. Keys from different runs of
    /// the same circuit agree on kind and fingerprint but every proof made
    /// with the pair fails verification.
    pub fn is_consistent(&self) -> bool {
        self.proving_key.kind() == self.verifying_key.kind()
            && self.proving_key.fingerprint() == self.verifying_key.fingerprint()
            && self.proving_key.inner().vk == *self.verifying_key.inner()
    }
}

/// Generate a key pair for `system` with operating-system randomness.
pub fn setup(system: &ConstraintSystem) -> Result<KeyPair, SetupError> {
    setup_with_rng(system, &mut OsRng)
}

/// Generate a key pair with caller-supplied randomness.
///
/// Anyone who can replay `rng` can forge proofs under the resulting keys.
/// Only tests and benchmarks should pass a seeded generator.
pub fn setup_with_rng<R: RngCore + CryptoRng>(
    system: &ConstraintSystem,
    rng: &mut R,
) -> Result<KeyPair, SetupError> {
    let kind = system.kind();
    let started = Instant::now();

    tracing::info!(
        circuit = %kind,
        constraints = system.num_constraints(),
        "Generating Groth16 keys..."
    );

    let (pk, vk) =
        Groth16::<Bn254>::circuit_specific_setup(CompiledCircuit::for_setup(system), rng)
            .map_err(|e| SetupError::BackendFailure(e.to_string()))?;

    if vk.gamma_abc_g1.len() != system.num_public_inputs() + 1 {
        return Err(SetupError::BackendFailure(format!(
            "verifying key expects {} public inputs, circuit declares {}",
            vk.gamma_abc_g1.len().saturating_sub(1),
            system.num_public_inputs()
        )));
    }

    let fingerprint = system.fingerprint();
    let verifying_key = VerifyingKey::from_parts(kind, fingerprint, vk)
        .map_err(|e| SetupError::BackendFailure(e.to_string()))?;
    let keys = KeyPair {
        proving_key: ProvingKey::from_parts(kind, fingerprint, pk),
        verifying_key,
    };

    tracing::info!(
        circuit = %kind,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Groth16 keys generated"
    );

    Ok(keys)
}
