//! Artifact Codec
//!
//! Every persisted or transmitted artifact (proof, proving key, verifying
//! key) uses one self-describing layout:
//!
//! ```text
//! ┌────────────────┬────────────┬──────────┬─────────────────────────┐
//! │ format_version │ circuit_id │ curve_id │ payload                 │
//! │     1 byte     │   1 byte   │  1 byte  │ arkworks, compressed    │
//! └────────────────┴────────────┴──────────┴─────────────────────────┘
//! ```
//!
//! Keys prefix their payload with the 32-byte constraint-system fingerprint.
//! Decoding validates every group element (on-curve and subgroup checks) and
//! rejects trailing bytes, so a successful decode is a well-formed artifact.
//!
//! A BN254 proof is always 3 + 128 = 131 bytes.

use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use sha3::{Digest, Keccak256};

use crate::circuit::CircuitKind;
use crate::error::CodecError;
use crate::prover::Proof;
use crate::setup::{ProvingKey, VerifyingKey};
use crate::Bn254;

pub const FORMAT_VERSION: u8 = 1;

/// Curve identifier for BN254, the only curve supported
pub const CURVE_BN254: u8 = 1;

const HEADER_LEN: usize = 3;
const FINGERPRINT_LEN: usize = 32;

/// Anything that travels in the versioned envelope.
pub trait Artifact: Sized {
    fn circuit(&self) -> CircuitKind;

    fn write_payload(&self, out: &mut Vec<u8>) -> Result<(), CodecError>;

    /// Consume the payload from the front of `payload`.
    fn read_payload(kind: CircuitKind, payload: &mut &[u8]) -> Result<Self, CodecError>;
}

pub fn encode<A: Artifact>(artifact: &A) -> Result<Vec<u8>, CodecError> {
    let mut out = vec![FORMAT_VERSION, artifact.circuit().id(), CURVE_BN254];
    artifact.write_payload(&mut out)?;
    Ok(out)
}

pub fn decode<A: Artifact>(bytes: &[u8]) -> Result<A, CodecError> {
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated);
    }

    let (version, circuit_id, curve_id) = (bytes[0], bytes[1], bytes[2]);
    if version != FORMAT_VERSION {
        return Err(CodecError::VersionMismatch(version));
    }
    let kind = CircuitKind::from_id(circuit_id).ok_or(CodecError::UnknownCircuit(circuit_id))?;
    if curve_id != CURVE_BN254 {
        return Err(CodecError::UnsupportedCurve(curve_id));
    }

    let mut payload = &bytes[HEADER_LEN..];
    let artifact = A::read_payload(kind, &mut payload)?;
    if !payload.is_empty() {
        return Err(CodecError::Malformed(format!(
            "{} trailing bytes",
            payload.len()
        )));
    }
    Ok(artifact)
}

/// Stable reference for an encoded artifact: hex Keccak256 of its bytes.
pub fn artifact_ref(bytes: &[u8]) -> String {
    hex::encode(Keccak256::digest(bytes))
}

impl Artifact for Proof {
    fn circuit(&self) -> CircuitKind {
        self.kind()
    }

    fn write_payload(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        self.inner().serialize_compressed(&mut *out)?;
        Ok(())
    }

    fn read_payload(kind: CircuitKind, payload: &mut &[u8]) -> Result<Self, CodecError> {
        let inner = ark_groth16::Proof::<Bn254>::deserialize_compressed(&mut *payload)?;
        Ok(Proof::from_parts(kind, inner))
    }
}

impl Artifact for ProvingKey {
    fn circuit(&self) -> CircuitKind {
        self.kind()
    }

    fn write_payload(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend_from_slice(self.fingerprint());
        self.inner().serialize_compressed(&mut *out)?;
        Ok(())
    }

    fn read_payload(kind: CircuitKind, payload: &mut &[u8]) -> Result<Self, CodecError> {
        let fingerprint = read_fingerprint(payload)?;
        let inner = ark_groth16::ProvingKey::<Bn254>::deserialize_compressed(&mut *payload)?;
        Ok(ProvingKey::from_parts(kind, fingerprint, inner))
    }
}

impl Artifact for VerifyingKey {
    fn circuit(&self) -> CircuitKind {
        self.kind()
    }

    fn write_payload(&self, out: &mut Vec<u8>) -> Result<(), CodecError> {
        out.extend_from_slice(self.fingerprint());
        self.inner().serialize_compressed(&mut *out)?;
        Ok(())
    }

    fn read_payload(kind: CircuitKind, payload: &mut &[u8]) -> Result<Self, CodecError> {
        let fingerprint = read_fingerprint(payload)?;
        let inner = ark_groth16::VerifyingKey::<Bn254>::deserialize_compressed(&mut *payload)?;
        VerifyingKey::from_parts(kind, fingerprint, inner)
            .map_err(|e| CodecError::Malformed(e.to_string()))
    }
}

fn read_fingerprint(payload: &mut &[u8]) -> Result<[u8; 32], CodecError> {
    if payload.len() < FINGERPRINT_LEN {
        return Err(CodecError::Truncated);
    }
    let (head, rest) = payload.split_at(FINGERPRINT_LEN);
    let mut fingerprint = [0u8; FINGERPRINT_LEN];
    fingerprint.copy_from_slice(head);
    *payload = rest;
    Ok(fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::define;
    use crate::identity::{IdentityPrivate, IdentityPublic, REGION_CONSTANT};
    use crate::prover::prove;
    use crate::setup::{setup_with_rng, KeyPair};
    use crate::witness::{Assignments, WitnessBuilder};
    use crate::Fr;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn identity_fixture(seed: u64) -> (KeyPair, Proof) {
        let mut rng = StdRng::seed_from_u64(seed);
        let system = define(CircuitKind::Identity).unwrap();
        let keys = setup_with_rng(&system, &mut rng).unwrap();

        let private = IdentityPrivate {
            identity_digest: Fr::from(101u64),
            secret: Fr::from(202u64),
            biometric_digest: Fr::from(303u64),
        };
        let public = IdentityPublic {
            authority_digest: Fr::from(404u64),
            issue_date: 18_500,
            region_code: REGION_CONSTANT,
        };
        let witness = WitnessBuilder::for_kind(CircuitKind::Identity)
            .unwrap()
            .build(&private.assignments(), &public.assignments())
            .unwrap();
        let proof = prove(&keys.proving_key, &witness, &mut rng).unwrap();
        (keys, proof)
    }

    #[test]
    fn test_proof_layout() {
        let (_, proof) = identity_fixture(1);
        let bytes = encode(&proof).unwrap();

        assert_eq!(bytes.len(), 131, "3 header bytes + A, B, C compressed");
        assert_eq!(bytes[0], FORMAT_VERSION);
        assert_eq!(bytes[1], CircuitKind::Identity.id());
        assert_eq!(bytes[2], CURVE_BN254);

        let decoded: Proof = decode(&bytes).unwrap();
        assert_eq!(decoded, proof);
    }

    #[test]
    fn test_proof_size_is_constant() {
        let (_, first) = identity_fixture(2);
        let (_, second) = identity_fixture(3);
        assert_eq!(encode(&first).unwrap().len(), encode(&second).unwrap().len());
    }

    #[test]
    fn test_keys_decode_with_fingerprint() {
        let (keys, _) = identity_fixture(4);

        let vk_bytes = encode(&keys.verifying_key).unwrap();
        let vk: VerifyingKey = decode(&vk_bytes).unwrap();
        assert_eq!(vk, keys.verifying_key);

        let pk_bytes = encode(&keys.proving_key).unwrap();
        let pk: ProvingKey = decode(&pk_bytes).unwrap();
        assert_eq!(pk.fingerprint(), keys.proving_key.fingerprint());
        assert_eq!(pk.kind(), CircuitKind::Identity);
    }

    #[test]
    fn test_truncated_input() {
        let (keys, proof) = identity_fixture(5);
        let bytes = encode(&proof).unwrap();

        assert_eq!(decode::<Proof>(&[]), Err(CodecError::Truncated));
        assert_eq!(decode::<Proof>(&bytes[..2]), Err(CodecError::Truncated));
        assert_eq!(decode::<Proof>(&bytes[..100]), Err(CodecError::Truncated));

        let vk_bytes = encode(&keys.verifying_key).unwrap();
        assert_eq!(
            decode::<VerifyingKey>(&vk_bytes[..HEADER_LEN + 10]),
            Err(CodecError::Truncated)
        );
    }

    #[test]
    fn test_header_rejections() {
        let (_, proof) = identity_fixture(6);
        let bytes = encode(&proof).unwrap();

        let mut wrong_version = bytes.clone();
        wrong_version[0] = 2;
        assert_eq!(decode::<Proof>(&wrong_version), Err(CodecError::VersionMismatch(2)));

        let mut unknown_circuit = bytes.clone();
        unknown_circuit[1] = 0x7f;
        assert_eq!(decode::<Proof>(&unknown_circuit), Err(CodecError::UnknownCircuit(0x7f)));

        let mut other_curve = bytes.clone();
        other_curve[2] = 2;
        assert_eq!(decode::<Proof>(&other_curve), Err(CodecError::UnsupportedCurve(2)));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let (_, proof) = identity_fixture(7);
        let mut bytes = encode(&proof).unwrap();
        bytes.push(0);
        assert!(matches!(decode::<Proof>(&bytes), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn test_artifact_ref_is_stable() {
        let (keys, _) = identity_fixture(8);
        let bytes = encode(&keys.verifying_key).unwrap();
        assert_eq!(artifact_ref(&bytes), artifact_ref(&bytes));
        assert_eq!(artifact_ref(&bytes).len(), 64);
        assert_ne!(artifact_ref(&bytes), artifact_ref(&bytes[..bytes.len() - 1]));
    }
}
