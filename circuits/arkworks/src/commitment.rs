//! Commitment Helper
//!
//! Binds a proof to specific, undisclosed document content.
//!
//! # Algorithm
//!
//! digest = Keccak256(document bytes)
//! field element = digest read big-endian, reduced mod r
//!
//! The field element becomes a private circuit input, so the proof commits to
//! the document without revealing it. The digest itself is sensitive: it is
//! handed back to the requester but must not be stored next to the document.

use std::fmt;

use ark_ff::PrimeField;
use sha3::{Digest, Keccak256};

use crate::Fr;

#[derive(Clone, PartialEq, Eq)]
pub struct DocumentCommitment {
    digest: [u8; 32],
}

impl DocumentCommitment {
    pub fn from_document(document: &[u8]) -> Self {
        Self {
            digest: Keccak256::digest(document).into(),
        }
    }

    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }

    pub fn to_field(&self) -> Fr {
        Fr::from_be_bytes_mod_order(&self.digest)
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.digest))
    }
}

// Never print the digest: it is a private circuit input
impl fmt::Debug for DocumentCommitment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DocumentCommitment(..)")
    }
}

/// Digest auxiliary byte inputs (issuer names, biometric templates) into the field.
pub fn digest_to_field(bytes: &[u8]) -> Fr {
    DocumentCommitment::from_document(bytes).to_field()
}
