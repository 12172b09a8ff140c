//! Range Check Gadget (bit decomposition)
//!
//! Proves `value ∈ [0, 2^bits)` by allocating `bits` boolean variables and
//! constraining their weighted sum back to `value`.
//!
//! # Constraints
//! - `b_i · (b_i - 1) = 0` for every bit
//! - `(Σ 2^i · b_i - value) · 1 = 0`
//!
//! `bits + 1` constraints in total. A value ≥ 2^bits has no satisfying
//! assignment: the packing constraint fails.

use ark_ff::{Field, One};

use crate::circuit::compiler::Lowering;
use crate::circuit::{Hint, LinearCombination, Variable};
use crate::Fr;

/// Decompose `value` into `bits` boolean variables, least significant first.
pub(crate) fn decompose(
    lowering: &mut Lowering,
    value: &LinearCombination,
    bits: usize,
) -> Vec<Variable> {
    let decomposed: Vec<Variable> = (0..bits)
        .map(|index| {
            lowering.alloc(Hint::Bit {
                source: value.clone(),
                index,
            })
        })
        .collect();

    for (index, bit) in decomposed.iter().enumerate() {
        let b = LinearCombination::from(*bit);
        lowering.enforce_detailed(
            b.clone(),
            b - &LinearCombination::one(),
            LinearCombination::zero(),
            &format!("bit {} boolean", index),
        );
    }

    let mut packed = LinearCombination::zero();
    let mut weight = Fr::one();
    for bit in &decomposed {
        packed.add_term(*bit, weight);
        weight.double_in_place();
    }
    lowering.enforce_detailed(
        packed - value,
        LinearCombination::one(),
        LinearCombination::zero(),
        "bit packing",
    );

    decomposed
}
