//! Error types for the credential proof engine
//!
//! One enum per failure family. A `false` verification verdict is not an
//! error: tampered or forged proofs come back as `Ok(false)` from the verifier.

use thiserror::Error;

use crate::circuit::CircuitKind;

/// Malformed predicate definition. Always a build-time defect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("malformed circuit: {0}")]
    Malformed(String),
}

/// Key generation failure. Fatal for the circuit kind until retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("setup backend failure: {0}")]
    BackendFailure(String),

    #[error(transparent)]
    Circuit(#[from] CircuitError),
}

/// Caller supplied values that do not fit the predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WitnessError {
    #[error("constraint #{index} violated: {label}")]
    ConstraintViolated { index: usize, label: String },

    #[error("no value supplied for `{0}`")]
    MissingAssignment(String),

    #[error("`{0}` is not a variable of this circuit (or has the wrong visibility)")]
    UnexpectedAssignment(String),

    #[error("`{0}` assigned more than once")]
    DuplicateAssignment(String),

    #[error(transparent)]
    Circuit(#[from] CircuitError),
}

/// Internal key/witness mismatch or backend failure while proving.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProveError {
    #[error("proving key is for {key}, witness is for {witness}")]
    KeyMismatch { key: CircuitKind, witness: CircuitKind },

    #[error("proving key was generated for a different constraint system")]
    FingerprintMismatch,

    #[error("prover backend failure: {0}")]
    Backend(String),
}

/// Malformed verification input. Distinct from a `false` verdict.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("bad proof encoding: {0}")]
    BadProofEncoding(#[from] CodecError),

    #[error("verifying key is for {key}, {found} belongs to {other}")]
    KeyMismatch {
        key: CircuitKind,
        other: CircuitKind,
        found: &'static str,
    },

    #[error("expected {expected} public inputs, got {actual}")]
    PublicInputCount { expected: usize, actual: usize },
}

/// Corrupt or incompatible serialized data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("input truncated")]
    Truncated,

    #[error("unsupported format version {0}")]
    VersionMismatch(u8),

    #[error("unknown circuit id {0}")]
    UnknownCircuit(u8),

    #[error("unsupported curve id {0}")]
    UnsupportedCurve(u8),

    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<ark_serialize::SerializationError> for CodecError {
    fn from(err: ark_serialize::SerializationError) -> Self {
        match err {
            // Readers are byte slices, so an I/O error can only mean EOF
            ark_serialize::SerializationError::IoError(_) => CodecError::Truncated,
            other => CodecError::Malformed(other.to_string()),
        }
    }
}
