//! Groth16 Verification
//!
//! Cheap relative to proving: one multi-scalar multiplication over the
//! public inputs plus a fixed number of pairings.
//!
//! A proof that decodes but does not verify is `Ok(false)`. Errors are
//! reserved for inputs that cannot be checked at all: undecodable bytes,
//! artifacts of another circuit, or the wrong number of public inputs.

use ark_groth16::Groth16;
use ark_snark::SNARK;

use crate::codec::decode;
use crate::error::VerifyError;
use crate::prover::Proof;
use crate::setup::VerifyingKey;
use crate::witness::PublicInputs;
use crate::Bn254;

pub fn verify(vk: &VerifyingKey, inputs: &PublicInputs, proof: &Proof) -> Result<bool, VerifyError> {
    if proof.kind() != vk.kind() {
        return Err(VerifyError::KeyMismatch {
            key: vk.kind(),
            other: proof.kind(),
            found: "proof",
        });
    }
    if inputs.kind() != vk.kind() {
        return Err(VerifyError::KeyMismatch {
            key: vk.kind(),
            other: inputs.kind(),
            found: "public inputs",
        });
    }

    let expected = vk.num_public_inputs();
    let actual = inputs.values().len();
    if expected != actual {
        return Err(VerifyError::PublicInputCount { expected, actual });
    }

    // The backend only fails on an input/key length disagreement
    let verdict =
        Groth16::<Bn254>::verify_with_processed_vk(vk.prepared(), inputs.values(), proof.inner())
            .map_err(|_| VerifyError::PublicInputCount { expected, actual })?;

    tracing::debug!(circuit = %vk.kind(), verdict, "Proof verified");
    Ok(verdict)
}

/// Decode `proof_bytes` and verify them.
pub fn verify_encoded(
    vk: &VerifyingKey,
    inputs: &PublicInputs,
    proof_bytes: &[u8],
) -> Result<bool, VerifyError> {
    let proof: Proof = decode(proof_bytes)?;
    verify(vk, inputs, &proof)
}
