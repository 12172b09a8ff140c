//! Identity Circuit
//!
//! Proves possession of a validly issued identity record for a fixed region
//! without revealing the record digest or the holder's secret.
//!
//! # Variables
//!
//! | Name | Visibility |
//! |------|------------|
//! | identity_digest | private |
//! | secret | private |
//! | biometric_digest | private |
//! | authority_digest | public |
//! | issue_date | public |
//! | region_code | public |
//!
//! # Circuit Constraints
//! 1. identity_digest != 0
//! 2. secret != 0
//! 3. authority_digest != 0
//! 4. region_code == REGION_CONSTANT

use crate::circuit::{CircuitBuilder, CircuitDescriptor, CircuitKind};
use crate::witness::Assignments;
use crate::Fr;

/// Region every identity proof is bound to
pub const REGION_CONSTANT: u64 = 14;

pub fn descriptor() -> CircuitDescriptor {
    let mut builder = CircuitBuilder::new(CircuitKind::Identity);

    // ======== Private Inputs ========
    let identity_digest = builder.declare_private("identity_digest");
    let secret = builder.declare_private("secret");
    // Bound into the witness but not constrained (yet)
    builder.declare_private("biometric_digest");

    // ======== Public Inputs ========
    let authority_digest = builder.declare_public("authority_digest");
    builder.declare_public("issue_date");
    let region_code = builder.declare_public("region_code");

    builder.assert_not_equal(identity_digest, 0u64);
    builder.assert_not_equal(secret, 0u64);
    builder.assert_not_equal(authority_digest, 0u64);
    builder.assert_equal(region_code, REGION_CONSTANT);

    builder.finish()
}

/// Private values of an identity proof
#[derive(Clone)]
pub struct IdentityPrivate {
    pub identity_digest: Fr,
    pub secret: Fr,
    pub biometric_digest: Fr,
}

impl Assignments for IdentityPrivate {
    fn assignments(&self) -> Vec<(&'static str, Fr)> {
        vec![
            ("identity_digest", self.identity_digest),
            ("secret", self.secret),
            ("biometric_digest", self.biometric_digest),
        ]
    }
}

/// Public values of an identity proof, in verifier order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityPublic {
    pub authority_digest: Fr,
    /// Days since the Unix epoch
    pub issue_date: u64,
    pub region_code: u64,
}

impl Assignments for IdentityPublic {
    fn assignments(&self) -> Vec<(&'static str, Fr)> {
        vec![
            ("authority_digest", self.authority_digest),
            ("issue_date", Fr::from(self.issue_date)),
            ("region_code", Fr::from(self.region_code)),
        ]
    }
}
