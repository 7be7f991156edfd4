//! Per-session selection of the optimization passes run while lowering a
//! circuit to gates.

use std::str::FromStr;

use log::warn;
use strum_macros::{Display, EnumIter, EnumString};

/// Name of the environment variable read by [OptimizationConfig::from_env].
pub const OPTIMIZATION_ENV_VAR: &str = "SNARKY_OPTIMIZATION";

/// Preset pass lists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum OptimizationMode {
    /// Every pass, with affine unification.
    #[default]
    Aggressive,
    /// Every pass, unifying only plain aliases (`x = y`, `x = c`).
    SnarkyCompatible,
    /// No optional pass: every recorded constraint becomes its own gate.
    Debug,
}

/// How much of `assert_equal` is absorbed into variable equivalence classes
/// instead of producing gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unification {
    Off,
    /// `x = y` and `±x = c`
    Aliases,
    /// any equation over at most two classes, `a·x + b·y + c = 0`
    Affine,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OptimizationConfig {
    /// Products involving constants (and constant-only constraints) produce
    /// no gate.
    pub constant_folding: bool,
    /// Operands are normalized: duplicate variables combined, zero terms
    /// dropped, canonical variable order.
    pub linear_combination: bool,
    pub unification: Unification,
    /// Two generic constraints share one row.
    pub batching: bool,
}

impl OptimizationConfig {
    pub fn aggressive() -> Self {
        OptimizationConfig {
            constant_folding: true,
            linear_combination: true,
            unification: Unification::Affine,
            batching: true,
        }
    }

    pub fn snarky_compatible() -> Self {
        OptimizationConfig {
            unification: Unification::Aliases,
            ..Self::aggressive()
        }
    }

    pub fn debug() -> Self {
        OptimizationConfig {
            constant_folding: false,
            linear_combination: false,
            unification: Unification::Off,
            batching: false,
        }
    }

    /// Reads the preset named by `SNARKY_OPTIMIZATION`, falling back to the
    /// default preset when it is unset or unknown.
    pub fn from_env() -> Self {
        match std::env::var(OPTIMIZATION_ENV_VAR) {
            Ok(name) => match OptimizationMode::from_str(name.trim()) {
                Ok(mode) => mode.into(),
                Err(_) => {
                    warn!("unknown {OPTIMIZATION_ENV_VAR} value `{name}`, using the default passes");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        OptimizationMode::default().into()
    }
}

impl From<OptimizationMode> for OptimizationConfig {
    fn from(mode: OptimizationMode) -> Self {
        match mode {
            OptimizationMode::Aggressive => Self::aggressive(),
            OptimizationMode::SnarkyCompatible => Self::snarky_compatible(),
            OptimizationMode::Debug => Self::debug(),
        }
    }
}
