//! Request / Response Types
//!
//! The contracts exchanged with the surrounding system (JSON façade,
//! storage layer). Byte strings travel as hex; dates as ISO-8601 calendar
//! dates, converted to days since the Unix epoch before entering a circuit.

use ark_ff::PrimeField;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zk_credential_circuits::commitment::digest_to_field;
use zk_credential_circuits::{
    CircuitKind, DegreePrivate, DegreePublic, DocumentCommitment, Fr, IdentityPrivate,
    IdentityPublic,
};

use crate::error::ServiceError;

/// `GenerateProof` input.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProofRequest {
    /// Raw credential document; only its digest enters the proof
    #[serde(with = "hex_bytes")]
    pub document: Vec<u8>,
    pub claims: CredentialClaims,
}

impl ProofRequest {
    pub fn kind(&self) -> CircuitKind {
        self.claims.kind()
    }
}

impl std::fmt::Debug for ProofRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProofRequest")
            .field("document_len", &self.document.len())
            .field("claims", &self.claims)
            .finish()
    }
}

/// Kind-specific claims, tagged with the proof type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "proof_type")]
pub enum CredentialClaims {
    #[serde(rename = "identity_proof")]
    Identity(IdentityClaims),
    #[serde(rename = "degree_verification")]
    Degree(DegreeClaims),
}

impl CredentialClaims {
    pub fn kind(&self) -> CircuitKind {
        match self {
            CredentialClaims::Identity(_) => CircuitKind::Identity,
            CredentialClaims::Degree(_) => CircuitKind::Degree,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct IdentityClaims {
    /// Holder secret, hex, at most 32 bytes
    pub secret: String,
    #[serde(with = "hex_bytes")]
    pub biometric_template: Vec<u8>,
    pub issuing_authority: String,
    pub issue_date: NaiveDate,
    pub region_code: u64,
}

// Secret and biometric template stay out of logs
impl std::fmt::Debug for IdentityClaims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityClaims")
            .field("issuing_authority", &self.issuing_authority)
            .field("issue_date", &self.issue_date)
            .field("region_code", &self.region_code)
            .finish_non_exhaustive()
    }
}

impl IdentityClaims {
    pub fn to_values(
        &self,
        commitment: &DocumentCommitment,
    ) -> Result<(IdentityPrivate, IdentityPublic), ServiceError> {
        let private = IdentityPrivate {
            identity_digest: commitment.to_field(),
            secret: parse_secret(&self.secret)?,
            biometric_digest: digest_to_field(&self.biometric_template),
        };
        let public = IdentityPublic {
            authority_digest: digest_to_field(self.issuing_authority.as_bytes()),
            issue_date: days_since_epoch(self.issue_date)?,
            region_code: self.region_code,
        };
        Ok((private, public))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DegreeClaims {
    pub student_id: String,
    pub institution: String,
    pub issue_date: NaiveDate,
    pub valid_until: NaiveDate,
}

impl DegreeClaims {
    pub fn to_values(
        &self,
        commitment: &DocumentCommitment,
    ) -> Result<(DegreePrivate, DegreePublic), ServiceError> {
        let private = DegreePrivate {
            degree_digest: commitment.to_field(),
            student_id: digest_to_field(self.student_id.as_bytes()),
            issue_date: days_since_epoch(self.issue_date)?,
        };
        let public = DegreePublic {
            institution_digest: digest_to_field(self.institution.as_bytes()),
            valid_until: days_since_epoch(self.valid_until)?,
        };
        Ok((private, public))
    }
}

/// `GenerateProof` output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedProof {
    pub request_id: Uuid,
    pub kind: CircuitKind,
    /// `0x`-prefixed Keccak256 of the document. Sensitive: never store it
    /// next to the document.
    pub commitment_digest: String,
    /// Codec layout, hex
    pub proof_bytes: String,
    pub verifying_key_ref: String,
    /// Verifier-order public inputs, `0x`-prefixed 32-byte hex each
    pub public_inputs: Vec<String>,
    pub size_bytes: usize,
    pub generation_time_ms: u64,
    pub created_at: DateTime<Utc>,
}

/// `VerifyProof` input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub kind: CircuitKind,
    pub proof_bytes: String,
    pub verifying_key_ref: String,
    pub public_inputs: Vec<String>,
}

impl From<&GeneratedProof> for VerifyRequest {
    fn from(proof: &GeneratedProof) -> Self {
        Self {
            kind: proof.kind,
            proof_bytes: proof.proof_bytes.clone(),
            verifying_key_ref: proof.verifying_key_ref.clone(),
            public_inputs: proof.public_inputs.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub valid: bool,
}

/// Calendar date as days since 1970-01-01. Earlier dates are rejected.
pub fn days_since_epoch(date: NaiveDate) -> Result<u64, ServiceError> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)
        .ok_or_else(|| ServiceError::InvalidInput("epoch out of range".to_string()))?;
    let days = date.signed_duration_since(epoch).num_days();
    u64::try_from(days)
        .map_err(|_| ServiceError::InvalidInput(format!("date {} is before 1970-01-01", date)))
}

/// Decode `0x`-optional hex.
pub fn decode_hex(field: &str, value: &str) -> Result<Vec<u8>, ServiceError> {
    hex::decode(value.strip_prefix("0x").unwrap_or(value))
        .map_err(|e| ServiceError::InvalidInput(format!("{}: {}", field, e)))
}

fn parse_secret(secret: &str) -> Result<Fr, ServiceError> {
    let bytes = decode_hex("secret", secret)?;
    if bytes.is_empty() || bytes.len() > 32 {
        return Err(ServiceError::InvalidInput(format!(
            "secret: expected 1 to 32 bytes, got {}",
            bytes.len()
        )));
    }
    Ok(Fr::from_be_bytes_mod_order(&bytes))
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
    }
}
