//! Circuit Descriptor
//!
//! A circuit is declared as an ordered list of statements: variable
//! declarations and assertions between operands. [`CircuitBuilder`] is the
//! only way to produce one, and it exposes exactly three relations:
//!
//! | Builder call | Compiled form |
//! |--------------|---------------|
//! | `assert_equal(x, y)` | `(x - y) · 1 = 0` |
//! | `assert_not_equal(x, y)` | `(x - y) · inv = 1` |
//! | `assert_less_or_equal(x, y)` | 64-bit decomposition + bitwise compare |
//!
//! [`compile`] flattens a descriptor into a [`ConstraintSystem`].

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::CircuitError;
use crate::Fr;

pub(crate) mod compiler;
mod lc;

pub use compiler::{compile, Constraint, ConstraintSystem, Hint, PrivateSource};
pub use lc::{Assignment, LinearCombination, Variable};

/// Width of operands accepted by `assert_less_or_equal`
pub const COMPARISON_BITS: usize = 64;

/// The closed set of predicates this engine can prove.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CircuitKind {
    #[serde(rename = "identity_proof")]
    Identity,
    #[serde(rename = "degree_verification")]
    Degree,
}

impl CircuitKind {
    pub const ALL: [CircuitKind; 2] = [CircuitKind::Identity, CircuitKind::Degree];

    /// Stable one-byte identifier embedded in every encoded artifact
    pub fn id(self) -> u8 {
        match self {
            CircuitKind::Identity => 1,
            CircuitKind::Degree => 2,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CircuitKind::Identity => "identity_proof",
            CircuitKind::Degree => "degree_verification",
        }
    }

    pub fn descriptor(self) -> CircuitDescriptor {
        match self {
            CircuitKind::Identity => crate::identity::descriptor(),
            CircuitKind::Degree => crate::degree::descriptor(),
        }
    }
}

impl fmt::Display for CircuitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CircuitKind {
    type Err = CircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CircuitError::Malformed(format!("unknown circuit kind `{}`", s)))
    }
}

/// Compile the fixed descriptor of `kind`.
pub fn define(kind: CircuitKind) -> Result<ConstraintSystem, CircuitError> {
    compile(&kind.descriptor())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Witness-only, never revealed
    Private,
    /// Known to the verifier
    Public,
}

/// Handle to a declared variable, in declaration order. Only valid in the
/// builder that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wire {
    builder: u64,
    index: usize,
}

impl Wire {
    pub fn index(self) -> usize {
        self.index
    }

    pub(crate) fn builder(self) -> u64 {
        self.builder
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Wire(Wire),
    Constant(Fr),
}

impl From<Wire> for Operand {
    fn from(wire: Wire) -> Self {
        Operand::Wire(wire)
    }
}

impl From<Fr> for Operand {
    fn from(value: Fr) -> Self {
        Operand::Constant(value)
    }
}

impl From<u64> for Operand {
    fn from(value: u64) -> Self {
        Operand::Constant(Fr::from(value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Equal,
    NotEqual,
    LessOrEqual,
}

impl Relation {
    pub fn symbol(self) -> &'static str {
        match self {
            Relation::Equal => "==",
            Relation::NotEqual => "!=",
            Relation::LessOrEqual => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Declare {
        name: String,
        visibility: Visibility,
    },
    Assert {
        relation: Relation,
        left: Operand,
        right: Operand,
    },
}

/// Declarative predicate definition, produced by [`CircuitBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitDescriptor {
    kind: CircuitKind,
    builder: u64,
    statements: Vec<Statement>,
}

impl CircuitDescriptor {
    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub(crate) fn builder(&self) -> u64 {
        self.builder
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }
}

static NEXT_BUILDER: AtomicU64 = AtomicU64::new(0);

/// Typed builder for [`CircuitDescriptor`]s.
#[derive(Debug)]
pub struct CircuitBuilder {
    kind: CircuitKind,
    id: u64,
    statements: Vec<Statement>,
    declared: usize,
}

impl CircuitBuilder {
    pub fn new(kind: CircuitKind) -> Self {
        Self {
            kind,
            id: NEXT_BUILDER.fetch_add(1, Ordering::Relaxed),
            statements: Vec::new(),
            declared: 0,
        }
    }

    pub fn declare_private(&mut self, name: &str) -> Wire {
        self.declare(name, Visibility::Private)
    }

    pub fn declare_public(&mut self, name: &str) -> Wire {
        self.declare(name, Visibility::Public)
    }

    pub fn assert_equal(&mut self, x: impl Into<Operand>, y: impl Into<Operand>) {
        self.assert(Relation::Equal, x.into(), y.into());
    }

    pub fn assert_not_equal(&mut self, x: impl Into<Operand>, y: impl Into<Operand>) {
        self.assert(Relation::NotEqual, x.into(), y.into());
    }

    /// Both operands must fit in [`COMPARISON_BITS`] bits.
    pub fn assert_less_or_equal(&mut self, x: impl Into<Operand>, y: impl Into<Operand>) {
        self.assert(Relation::LessOrEqual, x.into(), y.into());
    }

    pub fn finish(self) -> CircuitDescriptor {
        CircuitDescriptor {
            kind: self.kind,
            builder: self.id,
            statements: self.statements,
        }
    }

    fn declare(&mut self, name: &str, visibility: Visibility) -> Wire {
        self.statements.push(Statement::Declare {
            name: name.to_string(),
            visibility,
        });
        let wire = Wire {
            builder: self.id,
            index: self.declared,
        };
        self.declared += 1;
        wire
    }

    fn assert(&mut self, relation: Relation, left: Operand, right: Operand) {
        self.statements.push(Statement::Assert {
            relation,
            left,
            right,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_ids_round_trip() {
        for kind in CircuitKind::ALL {
            assert_eq!(CircuitKind::from_id(kind.id()), Some(kind));
            assert_eq!(kind.as_str().parse::<CircuitKind>().unwrap(), kind);
        }
        assert_eq!(CircuitKind::from_id(0), None);
        assert!("passport".parse::<CircuitKind>().is_err());
    }

    #[test]
    fn test_kind_serde_names() {
        let json = serde_json::to_string(&CircuitKind::Degree).unwrap();
        assert_eq!(json, "\"degree_verification\"");

        let kind: CircuitKind = serde_json::from_str("\"identity_proof\"").unwrap();
        assert_eq!(kind, CircuitKind::Identity);
    }

    #[test]
    fn test_field_and_integer_constants_are_operands() {
        assert_eq!(Operand::from(Fr::from(14u64)), Operand::Constant(Fr::from(14u64)));
        assert_eq!(Operand::from(14u64), Operand::from(Fr::from(14u64)));

        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        let code = builder.declare_public("region_code");
        builder.assert_equal(code, Fr::from(14u64));
        assert!(compile(&builder.finish()).is_ok());
    }

    #[test]
    fn test_builder_records_statements_in_order() {
        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        let a = builder.declare_private("a");
        let b = builder.declare_public("b");
        builder.assert_equal(a, b);

        let descriptor = builder.finish();
        assert_eq!(descriptor.statements().len(), 3);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert!(matches!(
            descriptor.statements()[2],
            Statement::Assert {
                relation: Relation::Equal,
                ..
            }
        ));
    }
}
