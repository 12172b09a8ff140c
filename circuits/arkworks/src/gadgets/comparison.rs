//! Comparison Gadgets
//!
//! # Not-equal
//! `x != y` ⟺ `x - y` has an inverse. One auxiliary `inv`, one constraint:
//! `(x - y) · inv = 1`.
//!
//! # Less-or-equal
//! Both operands are decomposed into `BITS` booleans (see `range_check`),
//! then compared from the most significant bit down:
//!
//! ```text
//! eq_BITS = 1, lt = 0
//! for i in BITS-1 ..= 0:
//!     both_i  = x_i · y_i
//!     diff_i  = x_i + y_i - 2·both_i         (x_i xor y_i)
//!     lt_i    = eq_{i+1} · (y_i - both_i)    (first differing bit has y_i = 1)
//!     eq_i    = eq_{i+1} · (1 - diff_i)
//!     lt     += lt_i
//! (lt + eq_0) · 1 = 1
//! ```
//!
//! At most one `lt_i` can be 1 and it excludes `eq_0 = 1`, so the final
//! constraint holds exactly when `x < y` or `x = y`.
//!
//! Cost: `2·(BITS + 1)` for the decompositions, `3·BITS + 1` for the compare.

use super::range_check::decompose;
use crate::circuit::compiler::Lowering;
use crate::circuit::{Hint, LinearCombination};
use crate::Fr;

/// `difference != 0`
pub(crate) fn enforce_not_equal(lowering: &mut Lowering, difference: LinearCombination) {
    let inverse = lowering.alloc(Hint::Inverse(difference.clone()));
    lowering.enforce(
        difference,
        LinearCombination::from(inverse),
        LinearCombination::one(),
    );
}

/// `x <= y` for operands in `[0, 2^bits)`
pub(crate) fn enforce_less_or_equal(
    lowering: &mut Lowering,
    x: &LinearCombination,
    y: &LinearCombination,
    bits: usize,
) {
    let x_bits = decompose(lowering, x, bits);
    let y_bits = decompose(lowering, y, bits);

    let two = Fr::from(2u64);
    let mut equal_so_far = LinearCombination::one();
    let mut less = LinearCombination::zero();

    for index in (0..bits).rev() {
        let xi = LinearCombination::from(x_bits[index]);
        let yi = LinearCombination::from(y_bits[index]);

        let both = LinearCombination::from(lowering.alloc(Hint::Product(xi.clone(), yi.clone())));
        lowering.enforce_detailed(xi.clone(), yi.clone(), both.clone(), &format!("bit {} and", index));

        let differ = xi + &yi - &both.scaled(two);
        let only_y = yi - &both;

        let less_here = LinearCombination::from(
            lowering.alloc(Hint::Product(equal_so_far.clone(), only_y.clone())),
        );
        lowering.enforce_detailed(
            equal_so_far.clone(),
            only_y,
            less_here.clone(),
            &format!("bit {} less", index),
        );
        less = less + &less_here;

        let same = LinearCombination::one() - &differ;
        let still_equal =
            LinearCombination::from(lowering.alloc(Hint::Product(equal_so_far.clone(), same.clone())));
        lowering.enforce_detailed(
            equal_so_far,
            same,
            still_equal.clone(),
            &format!("bit {} equal", index),
        );
        equal_so_far = still_equal;
    }

    lowering.enforce_detailed(
        less + &equal_so_far,
        LinearCombination::one(),
        LinearCombination::one(),
        "ordering",
    );
}
