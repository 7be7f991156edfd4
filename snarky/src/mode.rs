//! Execution modes and the scoped guards used to enter them.
//!
//! A mode is always entered through a guard borrowing the [RunState]. The
//! guard installs a fresh state (variables, constraint system) and puts the
//! previous one back when it is dropped, whether the guarded code returned,
//! failed, or panicked.

use std::ops::{Deref, DerefMut};

use ark_ff::PrimeField;
use log::debug;
use strum_macros::Display;

use crate::{
    constraint_system::ConstraintSystem,
    errors::{SnarkyCompilationError, SnarkyResult},
    lowering::SnarkyConstraintSystem,
    runner::RunState,
    variables::VariableTable,
    witness::Witness,
};

/// What the operations of a [RunState] do.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display)]
pub enum Mode {
    /// Nothing has been entered: every operation fails.
    #[default]
    Idle,
    /// Constraints are recorded, witness computations are skipped.
    ConstraintGeneration,
    /// Witnesses are computed and every constraint is checked against them,
    /// nothing is recorded.
    WitnessGeneration,
    /// Witnesses are computed and constraints recorded. Constraints are also
    /// checked unless [RunState::set_eval_constraints] turned it off.
    Prover,
}

impl Mode {
    pub fn has_witness(self) -> bool {
        matches!(self, Mode::WitnessGeneration | Mode::Prover)
    }

    pub fn records_constraints(self) -> bool {
        matches!(self, Mode::ConstraintGeneration | Mode::Prover)
    }
}

/// The part of a [RunState] that belongs to one mode.
#[derive(Debug)]
pub(crate) struct Frame<F: PrimeField> {
    pub mode: Mode,
    pub vars: VariableTable<F>,
    pub system: Option<SnarkyConstraintSystem<F>>,
    pub prover_block_depth: usize,
}

/// Holds the frame that was live before a mode was entered.
struct Scope<'a, F: PrimeField> {
    state: &'a mut RunState<F>,
    saved: Option<Frame<F>>,
}

impl<'a, F: PrimeField> Scope<'a, F> {
    fn enter(state: &'a mut RunState<F>, mode: Mode, capacity: usize) -> Self {
        let system = mode
            .records_constraints()
            .then(|| SnarkyConstraintSystem::new(state.config));
        let fresh = Frame {
            mode,
            vars: VariableTable::with_capacity(capacity),
            system,
            prover_block_depth: 0,
        };
        debug!("entering {mode} mode (from {})", state.mode);
        let saved = state.swap_frame(fresh);
        Scope {
            state,
            saved: Some(saved),
        }
    }
}

impl<F: PrimeField> Drop for Scope<'_, F> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            let left = self.state.swap_frame(saved);
            debug!("leaving {} mode (back to {})", left.mode, self.state.mode);
        }
    }
}

macro_rules! guard {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        pub struct $name<'a, F: PrimeField>(Scope<'a, F>);

        impl<F: PrimeField> Deref for $name<'_, F> {
            type Target = RunState<F>;

            fn deref(&self) -> &RunState<F> {
                &*self.0.state
            }
        }

        impl<F: PrimeField> DerefMut for $name<'_, F> {
            fn deref_mut(&mut self) -> &mut RunState<F> {
                &mut *self.0.state
            }
        }
    };
}

guard!(
    /// Guard of [Mode::ConstraintGeneration], see [RunState::enter_constraint_system].
    ConstraintSystemGuard
);
guard!(
    /// Guard of [Mode::WitnessGeneration], see [RunState::enter_generate_witness].
    WitnessGuard
);
guard!(
    /// Guard of [Mode::Prover], see [RunState::enter_as_prover].
    ProverGuard
);

impl<'a, F: PrimeField> ConstraintSystemGuard<'a, F> {
    pub(crate) fn new(state: &'a mut RunState<F>) -> Self {
        Self(Scope::enter(state, Mode::ConstraintGeneration, 0))
    }

    /// Freezes the recorded constraint system and leaves the mode.
    pub fn finish(mut self) -> SnarkyResult<ConstraintSystem<F>> {
        self.finalize()
    }
}

impl<'a, F: PrimeField> WitnessGuard<'a, F> {
    pub(crate) fn new(state: &'a mut RunState<F>) -> Self {
        Self(Scope::enter(state, Mode::WitnessGeneration, 0))
    }

    /// Returns the computed witness and leaves the mode.
    pub fn finish(self) -> Witness<F> {
        self.witness()
    }
}

impl<'a, F: PrimeField> ProverGuard<'a, F> {
    pub(crate) fn new(state: &'a mut RunState<F>, expected_size: usize) -> Self {
        Self(Scope::enter(state, Mode::Prover, expected_size))
    }

    /// Returns the recorded constraint system along with the witness, and
    /// leaves the mode.
    pub fn finish(mut self) -> SnarkyResult<(ConstraintSystem<F>, Witness<F>)> {
        let witness = self.witness();
        let system = self.finalize()?;
        Ok((system, witness))
    }
}

impl<F: PrimeField> RunState<F> {
    /// Lowers the system being recorded, consuming it.
    fn finalize(&mut self) -> SnarkyResult<ConstraintSystem<F>> {
        let system = self
            .system
            .take()
            .ok_or(SnarkyCompilationError::EmptySystem)?;
        system.finalize(&mut self.vars)
    }
}
