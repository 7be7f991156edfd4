//! A [RunState] shared between threads.

use std::sync::{Mutex, MutexGuard};

use ark_ff::PrimeField;
use log::warn;

use crate::{config::OptimizationConfig, runner::RunState};

/// One compilation context behind a lock, for embeddings that reach the same
/// context from several threads. Only one of them compiles at a time; work
/// on the resulting (immutable) constraint systems can then run anywhere.
#[derive(Debug, Default)]
pub struct Session<F: PrimeField> {
    state: Mutex<RunState<F>>,
}

impl<F: PrimeField> Session<F> {
    pub fn new(config: OptimizationConfig) -> Self {
        Session {
            state: Mutex::new(RunState::with_config(config)),
        }
    }

    /// Locks the context. A thread that panicked while holding it has
    /// already restored the state through the mode guards, so a poisoned
    /// lock is taken over.
    pub fn lock(&self) -> MutexGuard<'_, RunState<F>> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("recovering a compilation session poisoned by a panic");
            poisoned.into_inner()
        })
    }
}
