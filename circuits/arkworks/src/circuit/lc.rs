//! Variables, linear combinations and assignments

use std::collections::BTreeMap;
use std::ops::{Add, Sub};

use ark_ff::{One, Zero};

use crate::Fr;

/// Reference to a value living in the field.
///
/// Public and private variables are numbered independently, in allocation
/// order. Auxiliary variables introduced by gadgets are private.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Variable {
    /// The constant `1`
    One,
    Public(usize),
    Private(usize),
}

/// `Σ coeff · var`. Zero coefficients are never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearCombination {
    terms: BTreeMap<Variable, Fr>,
}

impl LinearCombination {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::constant(Fr::one())
    }

    pub fn constant(value: Fr) -> Self {
        let mut lc = Self::zero();
        lc.add_term(Variable::One, value);
        lc
    }

    pub fn add_term(&mut self, var: Variable, coeff: Fr) {
        let entry = self.terms.entry(var).or_insert_with(Fr::zero);
        *entry += coeff;
        if entry.is_zero() {
            self.terms.remove(&var);
        }
    }

    pub fn scaled(&self, factor: Fr) -> Self {
        let mut lc = Self::zero();
        for (var, coeff) in self.terms() {
            lc.add_term(var, coeff * factor);
        }
        lc
    }

    pub fn terms(&self) -> impl Iterator<Item = (Variable, Fr)> + '_ {
        self.terms.iter().map(|(var, coeff)| (*var, *coeff))
    }

    /// `Some(c)` when the combination references no variable besides `One`
    pub fn as_constant(&self) -> Option<Fr> {
        match self.terms.len() {
            0 => Some(Fr::zero()),
            1 => self.terms.get(&Variable::One).copied(),
            _ => None,
        }
    }

    pub fn evaluate(&self, assignment: &Assignment) -> Fr {
        self.terms()
            .map(|(var, coeff)| coeff * assignment.value(var))
            .sum()
    }
}

impl From<Variable> for LinearCombination {
    fn from(var: Variable) -> Self {
        let mut lc = Self::zero();
        lc.add_term(var, Fr::one());
        lc
    }
}

impl Add<&LinearCombination> for LinearCombination {
    type Output = LinearCombination;

    fn add(mut self, rhs: &LinearCombination) -> Self::Output {
        for (var, coeff) in rhs.terms() {
            self.add_term(var, coeff);
        }
        self
    }
}

impl Sub<&LinearCombination> for LinearCombination {
    type Output = LinearCombination;

    fn sub(mut self, rhs: &LinearCombination) -> Self::Output {
        for (var, coeff) in rhs.terms() {
            self.add_term(var, -coeff);
        }
        self
    }
}

/// Concrete values for every variable of a constraint system.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    pub(crate) public: Vec<Fr>,
    pub(crate) private: Vec<Fr>,
}

impl Assignment {
    /// Unassigned variables read as zero; the constraint check catches them.
    pub fn value(&self, var: Variable) -> Fr {
        match var {
            Variable::One => Fr::one(),
            Variable::Public(index) => self.public.get(index).copied().unwrap_or_else(Fr::zero),
            Variable::Private(index) => self.private.get(index).copied().unwrap_or_else(Fr::zero),
        }
    }

    pub fn public(&self) -> &[Fr] {
        &self.public
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terms_merge_and_cancel() {
        let x = LinearCombination::from(Variable::Private(0));
        let y = LinearCombination::from(Variable::Public(0));

        let diff = x.clone() - &y;
        assert_eq!(diff.terms().count(), 2);
        assert_eq!(diff.as_constant(), None);

        let cancelled = diff + &y - &x;
        assert_eq!(cancelled, LinearCombination::zero());
        assert_eq!(cancelled.as_constant(), Some(Fr::zero()));
    }

    #[test]
    fn test_evaluate() {
        let assignment = Assignment {
            public: vec![Fr::from(7u64)],
            private: vec![Fr::from(3u64)],
        };

        // 2·priv0 - pub0 + 5 = 6 - 7 + 5 = 4
        let lc = LinearCombination::from(Variable::Private(0)).scaled(Fr::from(2u64))
            - &LinearCombination::from(Variable::Public(0))
            + &LinearCombination::constant(Fr::from(5u64));

        assert_eq!(lc.evaluate(&assignment), Fr::from(4u64));
    }
}
