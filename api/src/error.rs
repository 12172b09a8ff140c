//! Error Handling Module
//!
//! One service-level error wrapping every proof-engine failure family plus
//! the failures only the service layer can produce (timeouts, storage,
//! worker faults).
//!
//! # Design Decision
//!
//! Each variant is either a client error (the request itself is at fault and
//! resubmitting it unchanged will fail again) or an operator error (keys,
//! storage or workers need attention). The HTTP façade maps the former to
//! 4xx and the latter to 5xx.

use std::time::Duration;

use thiserror::Error;
use zk_credential_circuits::{
    CircuitError, CodecError, ProveError, SetupError, VerifyError, WitnessError,
};

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    // ============ Client errors ============
    #[error("witness rejected: {0}")]
    Witness(#[from] WitnessError),

    #[error("verification failed: {0}")]
    Verify(#[from] VerifyError),

    #[error("undecodable artifact: {0}")]
    Codec(#[from] CodecError),

    #[error("unknown verifying key `{0}`")]
    UnknownVerifyingKey(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // ============ Operator errors ============
    #[error("request cancelled after {0:?}")]
    Cancelled(Duration),

    #[error("circuit definition error: {0}")]
    Circuit(#[from] CircuitError),

    #[error("key setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("proof generation failed: {0}")]
    Prove(#[from] ProveError),

    #[error("key storage error: {0}")]
    Storage(String),

    #[error("worker failed: {0}")]
    WorkerPanicked(String),
}

impl ServiceError {
    /// Whether the caller, not the service, must change something
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::Witness(_)
                | ServiceError::Verify(_)
                | ServiceError::Codec(_)
                | ServiceError::UnknownVerifyingKey(_)
                | ServiceError::InvalidInput(_)
        )
    }

    /// Stable machine-readable code for the JSON façade
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Witness(_) => "WITNESS_REJECTED",
            ServiceError::Verify(_) => "VERIFICATION_ERROR",
            ServiceError::Codec(_) => "BAD_ENCODING",
            ServiceError::UnknownVerifyingKey(_) => "UNKNOWN_VERIFYING_KEY",
            ServiceError::InvalidInput(_) => "INVALID_INPUT",
            ServiceError::Cancelled(_) => "CANCELLED",
            ServiceError::Circuit(_) => "CIRCUIT_ERROR",
            ServiceError::Setup(_) => "SETUP_FAILED",
            ServiceError::Prove(_) => "PROOF_GENERATION_FAILED",
            ServiceError::Storage(_) => "STORAGE_ERROR",
            ServiceError::WorkerPanicked(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_split() {
        let rejected = ServiceError::from(WitnessError::MissingAssignment("secret".into()));
        assert!(rejected.is_client_error());
        assert_eq!(rejected.code(), "WITNESS_REJECTED");

        let bad_bytes = ServiceError::from(VerifyError::BadProofEncoding(CodecError::Truncated));
        assert!(bad_bytes.is_client_error());

        let setup = ServiceError::from(SetupError::BackendFailure("oom".into()));
        assert!(!setup.is_client_error());

        let storage = ServiceError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert!(!storage.is_client_error());
        assert_eq!(storage.code(), "STORAGE_ERROR");
    }

    #[test]
    fn test_cancelled_message() {
        let err = ServiceError::Cancelled(Duration::from_millis(250));
        assert_eq!(err.to_string(), "request cancelled after 250ms");
        assert!(!err.is_client_error());
    }
}
