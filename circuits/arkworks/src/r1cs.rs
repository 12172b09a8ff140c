//! Replays a compiled [`ConstraintSystem`] into arkworks.
//!
//! Groth16 setup and proving consume an `ark_relations` constraint
//! synthesizer. Setup runs without an assignment (values are never
//! requested in setup mode); proving runs with the witness' assignment.

use ark_r1cs_std::{alloc::AllocVar, fields::fp::AllocatedFp};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystemRef, LinearCombination as ArkLinearCombination,
    SynthesisError, Variable as ArkVariable,
};

use crate::circuit::{Assignment, ConstraintSystem, LinearCombination, Variable};
use crate::Fr;

pub(crate) struct CompiledCircuit<'a> {
    system: &'a ConstraintSystem,
    assignment: Option<&'a Assignment>,
}

impl<'a> CompiledCircuit<'a> {
    /// Shape only, for key generation
    pub(crate) fn for_setup(system: &'a ConstraintSystem) -> Self {
        Self {
            system,
            assignment: None,
        }
    }

    pub(crate) fn with_assignment(system: &'a ConstraintSystem, assignment: &'a Assignment) -> Self {
        Self {
            system,
            assignment: Some(assignment),
        }
    }

    fn value(&self, var: Variable) -> Result<Fr, SynthesisError> {
        self.assignment
            .map(|assignment| assignment.value(var))
            .ok_or(SynthesisError::AssignmentMissing)
    }
}

impl ConstraintSynthesizer<Fr> for CompiledCircuit<'_> {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        // ======== Allocate Public Inputs ========
        let mut public = Vec::with_capacity(self.system.num_public_inputs());
        for index in 0..self.system.num_public_inputs() {
            let allocated =
                AllocatedFp::<Fr>::new_input(cs.clone(), || self.value(Variable::Public(index)))?;
            public.push(allocated.variable);
        }

        // ======== Allocate Private Inputs + Auxiliaries ========
        let mut private = Vec::with_capacity(self.system.private_sources().len());
        for index in 0..self.system.private_sources().len() {
            let allocated =
                AllocatedFp::<Fr>::new_witness(cs.clone(), || self.value(Variable::Private(index)))?;
            private.push(allocated.variable);
        }

        let lower = |lc: &LinearCombination| -> Result<ArkLinearCombination<Fr>, SynthesisError> {
            lc.terms()
                .map(|(var, coeff)| {
                    let var = match var {
                        Variable::One => Some(ArkVariable::One),
                        Variable::Public(index) => public.get(index).copied(),
                        Variable::Private(index) => private.get(index).copied(),
                    };
                    var.map(|var| (coeff, var)).ok_or(SynthesisError::MissingCS)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(ArkLinearCombination)
        };

        // ======== Constraints ========
        for constraint in self.system.constraints() {
            cs.enforce_constraint(
                lower(&constraint.a)?,
                lower(&constraint.b)?,
                lower(&constraint.c)?,
            )?;
        }

        Ok(())
    }
}
