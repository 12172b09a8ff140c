//! Witness Builder
//!
//! Binds concrete values to a compiled circuit and checks every constraint
//! before anything reaches the prover.
//!
//! # Flow
//!
//! 1. Public values are placed in verifier order
//! 2. Private inputs and gadget hints are evaluated in allocation order
//! 3. Every constraint is evaluated; the first violation is reported
//!
//! Failing here is cheaper than failing inside Groth16 and gives a usable
//! diagnostic (the label of the violated assertion).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use ark_ff::{BigInteger, PrimeField};

use crate::circuit::{Assignment, CircuitKind, ConstraintSystem, PrivateSource};
use crate::error::{CircuitError, CodecError, WitnessError};
use crate::Fr;

/// Named values for one visibility class of a circuit.
pub trait Assignments {
    fn assignments(&self) -> Vec<(&'static str, Fr)>;
}

/// Values satisfying every constraint of one compiled system.
#[derive(Clone)]
pub struct Witness {
    system: Arc<ConstraintSystem>,
    assignment: Assignment,
}

impl Witness {
    pub fn kind(&self) -> CircuitKind {
        self.system.kind()
    }

    pub fn system(&self) -> &ConstraintSystem {
        &self.system
    }

    pub fn public_inputs(&self) -> PublicInputs {
        PublicInputs {
            kind: self.kind(),
            values: self.assignment.public().to_vec(),
        }
    }

    pub(crate) fn assignment(&self) -> &Assignment {
        &self.assignment
    }
}

// Private values stay out of logs
impl fmt::Debug for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Witness")
            .field("kind", &self.kind())
            .field("variables", &self.system.num_variables())
            .finish_non_exhaustive()
    }
}

pub struct WitnessBuilder {
    system: Arc<ConstraintSystem>,
}

impl WitnessBuilder {
    pub fn new(system: Arc<ConstraintSystem>) -> Self {
        Self { system }
    }

    pub fn for_kind(kind: CircuitKind) -> Result<Self, CircuitError> {
        Ok(Self::new(Arc::new(crate::circuit::define(kind)?)))
    }

    pub fn system(&self) -> &Arc<ConstraintSystem> {
        &self.system
    }

    pub fn build(
        &self,
        private_values: &[(&str, Fr)],
        public_values: &[(&str, Fr)],
    ) -> Result<Witness, WitnessError> {
        let assignment = self.assign(private_values, public_values)?;

        if let Some((index, constraint)) = self.system.first_violation(&assignment) {
            tracing::debug!(
                circuit = %self.system.kind(),
                index,
                label = %constraint.label,
                "witness rejected"
            );
            return Err(WitnessError::ConstraintViolated {
                index,
                label: constraint.label.clone(),
            });
        }

        Ok(Witness {
            system: Arc::clone(&self.system),
            assignment,
        })
    }

    /// Complete assignment without the constraint check
    pub(crate) fn assign(
        &self,
        private_values: &[(&str, Fr)],
        public_values: &[(&str, Fr)],
    ) -> Result<Assignment, WitnessError> {
        let mut private = index_values(private_values)?;
        let mut public = index_values(public_values)?;
        let mut assignment = Assignment::default();

        for name in self.system.public_inputs() {
            let value = public
                .remove(name.as_str())
                .ok_or_else(|| WitnessError::MissingAssignment(name.clone()))?;
            assignment.public.push(value);
        }

        for source in self.system.private_sources() {
            let value = match source {
                PrivateSource::Input(name) => private
                    .remove(name.as_str())
                    .ok_or_else(|| WitnessError::MissingAssignment(name.clone()))?,
                PrivateSource::Hint(hint) => hint.evaluate(&assignment),
            };
            assignment.private.push(value);
        }

        if let Some(name) = private.keys().chain(public.keys()).next() {
            return Err(WitnessError::UnexpectedAssignment(name.to_string()));
        }

        Ok(assignment)
    }
}

fn index_values<'a>(values: &[(&'a str, Fr)]) -> Result<HashMap<&'a str, Fr>, WitnessError> {
    let mut indexed = HashMap::with_capacity(values.len());
    for (name, value) in values {
        if indexed.insert(*name, *value).is_some() {
            return Err(WitnessError::DuplicateAssignment(name.to_string()));
        }
    }
    Ok(indexed)
}

/// Public inputs of a proof, in verifier order, tagged with their circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicInputs {
    kind: CircuitKind,
    values: Vec<Fr>,
}

impl PublicInputs {
    pub fn new(kind: CircuitKind, values: Vec<Fr>) -> Self {
        Self { kind, values }
    }

    /// Order values by the circuit's public declarations.
    pub fn from_assignments(
        system: &ConstraintSystem,
        values: &impl Assignments,
    ) -> Result<Self, WitnessError> {
        let mut indexed = index_values(&values.assignments())?;
        let ordered = system
            .public_inputs()
            .iter()
            .map(|name| {
                indexed
                    .remove(name.as_str())
                    .ok_or_else(|| WitnessError::MissingAssignment(name.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(name) = indexed.keys().next() {
            return Err(WitnessError::UnexpectedAssignment(name.to_string()));
        }
        Ok(Self::new(system.kind(), ordered))
    }

    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub fn values(&self) -> &[Fr] {
        &self.values
    }

    /// `0x`-prefixed, 32-byte big-endian hex per value
    pub fn to_hex(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|value| format!("0x{}", hex::encode(value.into_bigint().to_bytes_be())))
            .collect()
    }

    /// Inverse of [`PublicInputs::to_hex`]; non-canonical encodings are rejected.
    pub fn from_hex<S: AsRef<str>>(kind: CircuitKind, encoded: &[S]) -> Result<Self, CodecError> {
        let values = encoded
            .iter()
            .map(|s| parse_field_hex(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(kind, values))
    }
}

fn parse_field_hex(s: &str) -> Result<Fr, CodecError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits)
        .map_err(|e| CodecError::Malformed(format!("public input `{}`: {}", s, e)))?;
    if bytes.len() != 32 {
        return Err(CodecError::Malformed(format!(
            "public input `{}`: expected 32 bytes, got {}",
            s,
            bytes.len()
        )));
    }
    let value = Fr::from_be_bytes_mod_order(&bytes);
    if value.into_bigint().to_bytes_be() != bytes {
        return Err(CodecError::Malformed(format!(
            "public input `{}` is not a canonical field element",
            s
        )));
    }
    Ok(value)
}
