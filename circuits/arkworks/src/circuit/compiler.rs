//! Constraint Compiler
//!
//! Flattens a [`CircuitDescriptor`] into rank-1 constraints `a · b = c`.
//!
//! # Compilation rules
//! 1. A wire must be declared (in this descriptor, earlier) before it is used.
//! 2. Variable names are unique.
//! 3. Assertions that reduce to constants are folded: always-true ones are
//!    dropped, always-false ones reject the whole descriptor.
//! 4. Every auxiliary variable carries a [`Hint`] so the witness builder can
//!    compute it from the values before it.

use std::collections::HashSet;

use ark_ff::{BigInteger, Field, One, PrimeField, Zero};
use sha3::{Digest, Keccak256};

use super::lc::{Assignment, LinearCombination, Variable};
use super::{CircuitDescriptor, CircuitKind, Operand, Relation, Statement, Visibility, COMPARISON_BITS};
use crate::error::CircuitError;
use crate::gadgets::comparison;
use crate::Fr;

/// How the witness builder obtains the value of an auxiliary variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hint {
    /// `1 / lc`, or zero when `lc` evaluates to zero
    Inverse(LinearCombination),
    /// Bit `index` (little-endian) of `source`
    Bit {
        source: LinearCombination,
        index: usize,
    },
    Product(LinearCombination, LinearCombination),
}

impl Hint {
    pub fn evaluate(&self, assignment: &Assignment) -> Fr {
        match self {
            Hint::Inverse(lc) => lc.evaluate(assignment).inverse().unwrap_or_else(Fr::zero),
            Hint::Bit { source, index } => {
                let value = source.evaluate(assignment).into_bigint();
                if value.get_bit(*index) {
                    Fr::one()
                } else {
                    Fr::zero()
                }
            }
            Hint::Product(a, b) => a.evaluate(assignment) * b.evaluate(assignment),
        }
    }
}

/// Origin of each private variable, in allocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrivateSource {
    /// Declared private input, supplied by the caller
    Input(String),
    /// Auxiliary variable introduced by a gadget
    Hint(Hint),
}

/// `a · b = c`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub a: LinearCombination,
    pub b: LinearCombination,
    pub c: LinearCombination,
    /// Source assertion, for diagnostics
    pub label: String,
}

impl Constraint {
    pub fn is_satisfied(&self, assignment: &Assignment) -> bool {
        self.a.evaluate(assignment) * self.b.evaluate(assignment) == self.c.evaluate(assignment)
    }
}

/// Compiled, immutable constraint system for one [`CircuitKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintSystem {
    kind: CircuitKind,
    public: Vec<String>,
    private: Vec<PrivateSource>,
    constraints: Vec<Constraint>,
    fingerprint: [u8; 32],
}

impl ConstraintSystem {
    pub fn kind(&self) -> CircuitKind {
        self.kind
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Public input names, in verifier order
    pub fn public_inputs(&self) -> &[String] {
        &self.public
    }

    pub fn num_public_inputs(&self) -> usize {
        self.public.len()
    }

    pub fn private_sources(&self) -> &[PrivateSource] {
        &self.private
    }

    pub fn num_private_inputs(&self) -> usize {
        self.private
            .iter()
            .filter(|source| matches!(source, PrivateSource::Input(_)))
            .count()
    }

    pub fn num_auxiliary(&self) -> usize {
        self.private.len() - self.num_private_inputs()
    }

    /// Including the constant `One`
    pub fn num_variables(&self) -> usize {
        1 + self.public.len() + self.private.len()
    }

    /// Keccak256 over the compiled system; keys embed it.
    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }

    /// Index and constraint of the first violation, if any
    pub fn first_violation(&self, assignment: &Assignment) -> Option<(usize, &Constraint)> {
        self.constraints
            .iter()
            .enumerate()
            .find(|(_, constraint)| !constraint.is_satisfied(assignment))
    }
}

/// Mutable state while lowering assertions; handed to gadgets.
#[derive(Debug, Default)]
pub(crate) struct Lowering {
    public: Vec<String>,
    private: Vec<PrivateSource>,
    constraints: Vec<Constraint>,
    label: String,
}

impl Lowering {
    pub(crate) fn alloc(&mut self, hint: Hint) -> Variable {
        self.private.push(PrivateSource::Hint(hint));
        Variable::Private(self.private.len() - 1)
    }

    pub(crate) fn enforce(&mut self, a: LinearCombination, b: LinearCombination, c: LinearCombination) {
        let label = self.label.clone();
        self.constraints.push(Constraint { a, b, c, label });
    }

    /// Like [`Lowering::enforce`], with a gadget-specific detail appended to the label
    pub(crate) fn enforce_detailed(
        &mut self,
        a: LinearCombination,
        b: LinearCombination,
        c: LinearCombination,
        detail: &str,
    ) {
        let label = format!("{} ({})", self.label, detail);
        self.constraints.push(Constraint { a, b, c, label });
    }

    #[cfg(test)]
    pub(crate) fn declare_input(&mut self, name: &str) -> Variable {
        self.declare(name, Visibility::Private)
    }

    #[cfg(test)]
    pub(crate) fn private_sources(&self) -> &[PrivateSource] {
        &self.private
    }

    #[cfg(test)]
    pub(crate) fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    fn declare(&mut self, name: &str, visibility: Visibility) -> Variable {
        match visibility {
            Visibility::Public => {
                self.public.push(name.to_string());
                Variable::Public(self.public.len() - 1)
            }
            Visibility::Private => {
                self.private.push(PrivateSource::Input(name.to_string()));
                Variable::Private(self.private.len() - 1)
            }
        }
    }
}

/// Compile a descriptor into a constraint system.
pub fn compile(descriptor: &CircuitDescriptor) -> Result<ConstraintSystem, CircuitError> {
    let mut lowering = Lowering::default();
    let mut wires: Vec<(String, Variable)> = Vec::new();
    let mut names = HashSet::new();

    for (position, statement) in descriptor.statements().iter().enumerate() {
        match statement {
            Statement::Declare { name, visibility } => {
                if name.is_empty() {
                    return Err(CircuitError::Malformed(format!(
                        "statement {}: empty variable name",
                        position
                    )));
                }
                if !names.insert(name.as_str()) {
                    return Err(CircuitError::Malformed(format!(
                        "statement {}: `{}` declared twice",
                        position, name
                    )));
                }
                let var = lowering.declare(name, *visibility);
                wires.push((name.clone(), var));
            }
            Statement::Assert {
                relation,
                left,
                right,
            } => {
                let (x, x_label) = resolve(left, &wires, descriptor.builder(), position)?;
                let (y, y_label) = resolve(right, &wires, descriptor.builder(), position)?;
                lowering.label = format!("{} {} {}", x_label, relation.symbol(), y_label);
                lower(&mut lowering, *relation, x, y)?;
            }
        }
    }

    let kind = descriptor.kind();
    let fingerprint = fingerprint(kind, &lowering);
    let system = ConstraintSystem {
        kind,
        public: lowering.public,
        private: lowering.private,
        constraints: lowering.constraints,
        fingerprint,
    };

    tracing::debug!(
        circuit = %kind,
        constraints = system.num_constraints(),
        public = system.num_public_inputs(),
        private = system.num_private_inputs(),
        auxiliary = system.num_auxiliary(),
        "circuit compiled"
    );

    Ok(system)
}

fn resolve(
    operand: &Operand,
    wires: &[(String, Variable)],
    builder: u64,
    position: usize,
) -> Result<(LinearCombination, String), CircuitError> {
    match operand {
        Operand::Constant(value) => Ok((LinearCombination::constant(*value), constant_label(*value))),
        Operand::Wire(wire) if wire.builder() != builder => Err(CircuitError::Malformed(format!(
            "statement {}: wire #{} was issued by another builder",
            position,
            wire.index()
        ))),
        Operand::Wire(wire) => wires
            .get(wire.index())
            .map(|(name, var)| (LinearCombination::from(*var), name.clone()))
            .ok_or_else(|| {
                CircuitError::Malformed(format!(
                    "statement {}: wire #{} referenced before declaration",
                    position,
                    wire.index()
                ))
            }),
    }
}

fn lower(
    lowering: &mut Lowering,
    relation: Relation,
    x: LinearCombination,
    y: LinearCombination,
) -> Result<(), CircuitError> {
    let difference = x.clone() - &y;
    let folded = difference.as_constant();

    match relation {
        Relation::Equal => match folded {
            Some(value) if value.is_zero() => Ok(()),
            Some(_) => Err(unsatisfiable(lowering)),
            None => {
                lowering.enforce(difference, LinearCombination::one(), LinearCombination::zero());
                Ok(())
            }
        },
        Relation::NotEqual => match folded {
            Some(value) if value.is_zero() => Err(unsatisfiable(lowering)),
            Some(_) => Ok(()),
            None => {
                comparison::enforce_not_equal(lowering, difference);
                Ok(())
            }
        },
        Relation::LessOrEqual => {
            if let (Some(a), Some(b)) = (x.as_constant(), y.as_constant()) {
                return match (small_constant(a), small_constant(b)) {
                    (Some(a), Some(b)) if a <= b => Ok(()),
                    _ => Err(unsatisfiable(lowering)),
                };
            }
            if folded.is_some() {
                // Same wire on both sides
                return Ok(());
            }
            for constant in [x.as_constant(), y.as_constant()].into_iter().flatten() {
                if small_constant(constant).is_none() {
                    return Err(unsatisfiable(lowering));
                }
            }
            comparison::enforce_less_or_equal(lowering, &x, &y, COMPARISON_BITS);
            Ok(())
        }
    }
}

fn unsatisfiable(lowering: &Lowering) -> CircuitError {
    CircuitError::Malformed(format!("`{}` can never be satisfied", lowering.label))
}

fn constant_label(value: Fr) -> String {
    match small_constant(value) {
        Some(small) => small.to_string(),
        None => format!("0x{}", hex::encode(value.into_bigint().to_bytes_be())),
    }
}

fn small_constant(value: Fr) -> Option<u64> {
    let bigint = value.into_bigint();
    if bigint.num_bits() as usize > COMPARISON_BITS {
        return None;
    }
    bigint.as_ref().first().copied()
}

fn fingerprint(kind: CircuitKind, lowering: &Lowering) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"zk-credential-circuit/v1");
    hasher.update([kind.id()]);

    hasher.update((lowering.public.len() as u64).to_le_bytes());
    for name in &lowering.public {
        hash_str(&mut hasher, name);
    }

    hasher.update((lowering.private.len() as u64).to_le_bytes());
    for source in &lowering.private {
        match source {
            PrivateSource::Input(name) => {
                hasher.update([0u8]);
                hash_str(&mut hasher, name);
            }
            PrivateSource::Hint(Hint::Inverse(lc)) => {
                hasher.update([1u8]);
                hash_lc(&mut hasher, lc);
            }
            PrivateSource::Hint(Hint::Bit { source, index }) => {
                hasher.update([2u8]);
                hash_lc(&mut hasher, source);
                hasher.update((*index as u64).to_le_bytes());
            }
            PrivateSource::Hint(Hint::Product(a, b)) => {
                hasher.update([3u8]);
                hash_lc(&mut hasher, a);
                hash_lc(&mut hasher, b);
            }
        }
    }

    hasher.update((lowering.constraints.len() as u64).to_le_bytes());
    for constraint in &lowering.constraints {
        hash_lc(&mut hasher, &constraint.a);
        hash_lc(&mut hasher, &constraint.b);
        hash_lc(&mut hasher, &constraint.c);
    }

    hasher.finalize().into()
}

fn hash_str(hasher: &mut Keccak256, value: &str) {
    hasher.update((value.len() as u64).to_le_bytes());
    hasher.update(value.as_bytes());
}

fn hash_lc(hasher: &mut Keccak256, lc: &LinearCombination) {
    hasher.update((lc.terms().count() as u64).to_le_bytes());
    for (var, coeff) in lc.terms() {
        let (tag, index) = match var {
            Variable::One => (0u8, 0usize),
            Variable::Public(index) => (1, index),
            Variable::Private(index) => (2, index),
        };
        hasher.update([tag]);
        hasher.update((index as u64).to_le_bytes());
        hasher.update(coeff.into_bigint().to_bytes_le());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::CircuitBuilder;

    fn malformed(descriptor: &CircuitDescriptor) -> String {
        match compile(descriptor) {
            Err(CircuitError::Malformed(msg)) => msg,
            Ok(_) => panic!("descriptor should not compile"),
        }
    }

    #[test]
    fn test_equal_compiles_to_single_constraint() {
        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        let code = builder.declare_public("region_code");
        builder.assert_equal(code, 14u64);

        let system = compile(&builder.finish()).unwrap();
        assert_eq!(system.num_constraints(), 1);
        assert_eq!(system.num_auxiliary(), 0);
        assert_eq!(system.constraints()[0].label, "region_code == 14");
    }

    #[test]
    fn test_not_equal_introduces_inverse() {
        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        let secret = builder.declare_private("secret");
        builder.assert_not_equal(secret, 0u64);

        let system = compile(&builder.finish()).unwrap();
        assert_eq!(system.num_constraints(), 1);
        assert_eq!(system.num_private_inputs(), 1);
        assert_eq!(system.num_auxiliary(), 1);
        assert!(matches!(
            system.private_sources()[1],
            PrivateSource::Hint(Hint::Inverse(_))
        ));
    }

    #[test]
    fn test_less_or_equal_bit_decomposition() {
        let mut builder = CircuitBuilder::new(CircuitKind::Degree);
        let issue = builder.declare_private("issue_date");
        let until = builder.declare_public("valid_until");
        builder.assert_less_or_equal(issue, until);

        let system = compile(&builder.finish()).unwrap();

        // 2 operands × (64 boolean + 1 packing) + 3 per bit + 1 final
        assert_eq!(system.num_constraints(), 2 * (COMPARISON_BITS + 1) + 3 * COMPARISON_BITS + 1);
        // 2 × 64 bits + 3 per bit
        assert_eq!(system.num_auxiliary(), 2 * COMPARISON_BITS + 3 * COMPARISON_BITS);
    }

    #[test]
    fn test_wire_from_another_builder_is_rejected() {
        let mut other = CircuitBuilder::new(CircuitKind::Identity);
        let first = other.declare_private("a");
        other.declare_private("b");
        let third = other.declare_private("c");

        // Index past the end of this builder
        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        let a = builder.declare_private("a");
        builder.assert_equal(a, third);
        assert!(malformed(&builder.finish()).contains("another builder"));

        // Index that exists here too must not bind to the local variable
        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        let a = builder.declare_private("a");
        builder.declare_private("b");
        builder.assert_equal(first, 5u64);
        builder.assert_equal(a, 5u64);
        assert_eq!(first.index(), a.index());
        assert!(malformed(&builder.finish()).contains("another builder"));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        builder.declare_private("secret");
        builder.declare_public("secret");

        assert!(malformed(&builder.finish()).contains("declared twice"));
    }

    #[test]
    fn test_constant_folding() {
        // Always true: dropped
        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        let x = builder.declare_private("x");
        builder.assert_equal(3u64, 3u64);
        builder.assert_not_equal(3u64, 4u64);
        builder.assert_less_or_equal(3u64, 4u64);
        builder.assert_less_or_equal(x, x);
        builder.assert_equal(x, x);
        let system = compile(&builder.finish()).unwrap();
        assert_eq!(system.num_constraints(), 0);

        // Always false: rejected
        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        builder.assert_equal(14u64, 15u64);
        assert!(malformed(&builder.finish()).contains("14 == 15"));

        let mut builder = CircuitBuilder::new(CircuitKind::Identity);
        let x = builder.declare_private("x");
        builder.assert_not_equal(x, x);
        assert!(malformed(&builder.finish()).contains("x != x"));

        let mut builder = CircuitBuilder::new(CircuitKind::Degree);
        builder.assert_less_or_equal(5u64, 4u64);
        assert!(compile(&builder.finish()).is_err());
    }

    #[test]
    fn test_comparison_constant_out_of_range() {
        let mut builder = CircuitBuilder::new(CircuitKind::Degree);
        let x = builder.declare_private("x");
        builder.assert_less_or_equal(x, Fr::from(u128::from(u64::MAX) + 1));

        assert!(compile(&builder.finish()).is_err());
    }

    #[test]
    fn test_fingerprint_is_deterministic_and_distinct() {
        let identity_a = crate::circuit::define(CircuitKind::Identity).unwrap();
        let identity_b = crate::circuit::define(CircuitKind::Identity).unwrap();
        let degree = crate::circuit::define(CircuitKind::Degree).unwrap();

        assert_eq!(identity_a.fingerprint(), identity_b.fingerprint());
        assert_ne!(identity_a.fingerprint(), degree.fingerprint());
    }
}
