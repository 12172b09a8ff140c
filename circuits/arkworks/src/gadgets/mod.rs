//! R1CS Gadgets
//!
//! Lowerings for the relations R1CS cannot express in a single `a · b = c`:
//! - `range_check`: little-endian bit decomposition with booleanity checks
//! - `comparison`: `!=` via an inverse witness, `<=` over bit vectors

pub mod comparison;
pub mod range_check;
