//! Degree Circuit
//!
//! Proves a degree was issued by a claimed institution and is still within
//! validity, without revealing the student or the exact issue date.
//!
//! # Variables
//!
//! | Name | Visibility |
//! |------|------------|
//! | degree_digest | private |
//! | student_id | private |
//! | issue_date | private |
//! | institution_digest | public |
//! | valid_until | public |
//!
//! # Circuit Constraints
//! 1. degree_digest != 0
//! 2. student_id != 0
//! 3. issue_date <= valid_until (64-bit comparison, ~320 constraints)

use crate::circuit::{CircuitBuilder, CircuitDescriptor, CircuitKind};
use crate::witness::Assignments;
use crate::Fr;

pub fn descriptor() -> CircuitDescriptor {
    let mut builder = CircuitBuilder::new(CircuitKind::Degree);

    // ======== Private Inputs ========
    let degree_digest = builder.declare_private("degree_digest");
    let student_id = builder.declare_private("student_id");
    let issue_date = builder.declare_private("issue_date");

    // ======== Public Inputs ========
    // Institution is disclosed but not constrained beyond being bound to the proof
    builder.declare_public("institution_digest");
    let valid_until = builder.declare_public("valid_until");

    builder.assert_not_equal(degree_digest, 0u64);
    builder.assert_not_equal(student_id, 0u64);
    builder.assert_less_or_equal(issue_date, valid_until);

    builder.finish()
}

/// Private values of a degree proof
#[derive(Clone)]
pub struct DegreePrivate {
    pub degree_digest: Fr,
    pub student_id: Fr,
    /// Days since the Unix epoch
    pub issue_date: u64,
}

impl Assignments for DegreePrivate {
    fn assignments(&self) -> Vec<(&'static str, Fr)> {
        vec![
            ("degree_digest", self.degree_digest),
            ("student_id", self.student_id),
            ("issue_date", Fr::from(self.issue_date)),
        ]
    }
}

/// Public values of a degree proof, in verifier order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegreePublic {
    pub institution_digest: Fr,
    /// Days since the Unix epoch
    pub valid_until: u64,
}

impl Assignments for DegreePublic {
    fn assignments(&self) -> Vec<(&'static str, Fr)> {
        vec![
            ("institution_digest", self.institution_digest),
            ("valid_until", Fr::from(self.valid_until)),
        ]
    }
}
