//! Credential Proof Engine - arkworks R1CS + Groth16
//!
//! Proves that an identity record or an academic degree satisfies a fixed
//! predicate without revealing the record itself.
//!
//! # Pipeline
//!
//! ```text
//! CircuitDescriptor ──compile──▶ ConstraintSystem ──setup──▶ (ProvingKey, VerifyingKey)
//!
//! document bytes ──▶ DocumentCommitment ──┐
//!                                         ├──▶ WitnessBuilder::build ──▶ Witness
//! private / public values ────────────────┘
//!
//! (ProvingKey, Witness)                  ──prove──▶  Proof
//! (VerifyingKey, PublicInputs, Proof)    ──verify──▶ bool
//! ```
//!
//! # Available Circuits
//!
//! | Circuit | Private | Public | Constraints |
//! |---------|---------|--------|-------------|
//! | Identity | identity_digest, secret, biometric_digest | authority_digest, issue_date, region_code | 4 |
//! | Degree | degree_digest, student_id, issue_date | institution_digest, valid_until | ~325 |
//!
//! The degree circuit pays for its `issue_date <= valid_until` check with a
//! 64-bit decomposition of both operands (R1CS has no lookup tables).
//!
//! # Example
//! ```ignore
//! use zk_credential_circuits::*;
//!
//! let system = std::sync::Arc::new(define(CircuitKind::Degree)?);
//! let keys = setup(&system)?;
//!
//! let witness = WitnessBuilder::new(system)
//!     .build(&private.assignments(), &public.assignments())?;
//! let proof = prove(&keys.proving_key, &witness, &mut rand::rngs::OsRng)?;
//!
//! assert!(verify(&keys.verifying_key, &witness.public_inputs(), &proof)?);
//! ```

pub mod circuit;
pub mod codec;
pub mod commitment;
pub mod degree;
pub mod error;
pub mod gadgets;
pub mod identity;
pub mod prover;
pub mod setup;
pub mod verifier;
pub mod witness;

mod r1cs;

#[cfg(test)]
mod tests;

/// Pairing-friendly curve every circuit is proven over
pub use ark_bn254::Bn254;

/// Scalar field of [`Bn254`]; every circuit variable lives here
pub type Fr = ark_bn254::Fr;

pub use circuit::{
    define, CircuitBuilder, CircuitDescriptor, CircuitKind, ConstraintSystem, Operand, Wire,
};
pub use codec::{decode, encode, Artifact};
pub use commitment::DocumentCommitment;
pub use degree::{DegreePrivate, DegreePublic};
pub use error::{CircuitError, CodecError, ProveError, SetupError, VerifyError, WitnessError};
pub use identity::{IdentityPrivate, IdentityPublic, REGION_CONSTANT};
pub use prover::{prove, Proof};
pub use setup::{setup, setup_with_rng, KeyPair, ProvingKey, VerifyingKey};
pub use verifier::{verify, verify_encoded};
pub use witness::{Assignments, PublicInputs, Witness, WitnessBuilder};
