//! The circuit-generation and witness-generation logic.

use ark_ff::PrimeField;
use log::debug;

use crate::{
    config::OptimizationConfig,
    constraint::{AnnotatedConstraint, Constraint, RangeCheckVariant},
    constraint_system::ConstraintSystem,
    cvar::FieldVar,
    errors::{SnarkyCompilationError, SnarkyResult, SnarkyRuntimeError},
    gate::GateType,
    generic::GenericGate,
    lowering::SnarkyConstraintSystem,
    mode::{ConstraintSystemGuard, Frame, Mode, ProverGuard, WitnessGuard},
    variables::VariableTable,
    witness::Witness,
};

/// The state used when compiling a circuit, or when generating its witness.
///
/// Every operation first looks at the current [Mode]. Modes are entered
/// through guards ([Self::enter_constraint_system],
/// [Self::enter_generate_witness], [Self::enter_as_prover]) which restore the
/// previous state when dropped.
#[derive(Debug)]
pub struct RunState<F>
where
    F: PrimeField,
{
    pub(crate) mode: Mode,

    /// Variables allocated in the current mode, with their witness when one
    /// is known.
    pub(crate) vars: VariableTable<F>,

    /// The constraint system being recorded.
    /// If not set, the constraints are not recorded.
    pub(crate) system: Option<SnarkyConstraintSystem<F>>,

    /// Passes used by the constraint systems entered from now on.
    pub(crate) config: OptimizationConfig,

    /// If set, the prover checks every constraint as it is added.
    /// This is useful to fail early when an assertion does not hold.
    eval_constraints: bool,

    /// Number of [Self::as_prover] blocks currently running.
    prover_block_depth: usize,
}

//
// witness generation
//

/// A witness generation environment.
/// This is passed to any closure in [RunState::compute] so that they can access the witness generation environment.
pub trait WitnessGeneration<F>
where
    F: PrimeField,
{
    /// Allows the caller to obtain the value behind a circuit variable.
    fn read_var(&self, var: &FieldVar<F>) -> SnarkyResult<F>;

    /// Whether the caller runs inside a [RunState::as_prover] block.
    fn run_in_prover_block(&self) -> bool;
}

impl<F: PrimeField, G: WitnessGeneration<F>> WitnessGeneration<F> for &G {
    fn read_var(&self, var: &FieldVar<F>) -> SnarkyResult<F> {
        G::read_var(*self, var)
    }

    fn run_in_prover_block(&self) -> bool {
        G::run_in_prover_block(*self)
    }
}

impl<F: PrimeField> WitnessGeneration<F> for &dyn WitnessGeneration<F> {
    fn read_var(&self, var: &FieldVar<F>) -> SnarkyResult<F> {
        (**self).read_var(var)
    }

    fn run_in_prover_block(&self) -> bool {
        (**self).run_in_prover_block()
    }
}

impl<F> WitnessGeneration<F> for RunState<F>
where
    F: PrimeField,
{
    fn read_var(&self, var: &FieldVar<F>) -> SnarkyResult<F> {
        if !self.mode.has_witness() {
            return Err(SnarkyRuntimeError::mode("read_var", self.mode).into());
        }
        var.eval(&|idx: usize| -> SnarkyResult<F> { Ok(self.vars.witness(idx)?) })
    }

    fn run_in_prover_block(&self) -> bool {
        self.prover_block_depth > 0
    }
}

impl<F> Default for RunState<F>
where
    F: PrimeField,
{
    fn default() -> Self {
        Self::new()
    }
}

//
// modes
//

impl<F> RunState<F>
where
    F: PrimeField,
{
    /// Creates an idle state, with the passes selected by
    /// [OptimizationConfig::from_env].
    pub fn new() -> Self {
        Self::with_config(OptimizationConfig::from_env())
    }

    pub fn with_config(config: OptimizationConfig) -> Self {
        RunState {
            mode: Mode::Idle,
            vars: VariableTable::new(),
            system: None,
            config,
            eval_constraints: true,
            prover_block_depth: 0,
        }
    }

    /// Changes the passes of the constraint systems entered from now on.
    /// A system already being recorded keeps the passes it started with.
    pub fn set_optimization(&mut self, config: impl Into<OptimizationConfig>) {
        self.config = config.into();
    }

    pub fn optimization(&self) -> OptimizationConfig {
        self.config
    }

    /// Whether products involving constants are folded, as decided by the
    /// system being recorded if any.
    pub fn constant_folding(&self) -> bool {
        self.system
            .as_ref()
            .map_or(self.config.constant_folding, |system| {
                system.config().constant_folding
            })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether witness values are available.
    pub fn run_in_prover(&self) -> bool {
        self.mode.has_witness()
    }

    /// Turns off (or back on) the checking of constraints as they are added
    /// in [Mode::Prover]. Constraints are recorded either way.
    pub fn set_eval_constraints(&mut self, enabled: bool) {
        self.eval_constraints = enabled;
    }

    pub fn eval_constraints(&self) -> bool {
        self.eval_constraints
    }

    /// Discards the variables and the constraints of the current mode, and
    /// goes back to [Mode::Idle].
    ///
    /// Guards entered before keep the state they saved: dropping them
    /// still restores it.
    pub fn reset(&mut self) {
        debug!("resetting from {} mode", self.mode);
        self.swap_frame(Frame {
            mode: Mode::Idle,
            vars: VariableTable::new(),
            system: None,
            prover_block_depth: 0,
        });
    }

    pub(crate) fn swap_frame(&mut self, frame: Frame<F>) -> Frame<F> {
        let Frame {
            mode,
            vars,
            system,
            prover_block_depth,
        } = frame;
        Frame {
            mode: std::mem::replace(&mut self.mode, mode),
            vars: std::mem::replace(&mut self.vars, vars),
            system: std::mem::replace(&mut self.system, system),
            prover_block_depth: std::mem::replace(
                &mut self.prover_block_depth,
                prover_block_depth,
            ),
        }
    }

    /// Enters [Mode::ConstraintGeneration] with an empty constraint system.
    pub fn enter_constraint_system(&mut self) -> ConstraintSystemGuard<'_, F> {
        ConstraintSystemGuard::new(self)
    }

    /// Enters [Mode::WitnessGeneration].
    pub fn enter_generate_witness(&mut self) -> WitnessGuard<'_, F> {
        WitnessGuard::new(self)
    }

    /// Enters [Mode::Prover], reserving room for `expected_size` variables.
    pub fn enter_as_prover(&mut self, expected_size: usize) -> ProverGuard<'_, F> {
        ProverGuard::new(self, expected_size)
    }

    /// Runs `circuit` in [Mode::ConstraintGeneration] and returns the
    /// resulting constraint system.
    pub fn constraint_system<FUNC>(&mut self, circuit: FUNC) -> SnarkyResult<ConstraintSystem<F>>
    where
        FUNC: FnOnce(&mut RunState<F>) -> SnarkyResult<()>,
    {
        let mut guard = self.enter_constraint_system();
        circuit(&mut *guard)?;
        guard.finish()
    }

    /// Runs `circuit` in [Mode::WitnessGeneration] and returns the witness.
    pub fn generate_witness<FUNC>(&mut self, circuit: FUNC) -> SnarkyResult<Witness<F>>
    where
        FUNC: FnOnce(&mut RunState<F>) -> SnarkyResult<()>,
    {
        let mut guard = self.enter_generate_witness();
        circuit(&mut *guard)?;
        Ok(guard.finish())
    }

    /// Runs `circuit` in [Mode::Prover] and returns both the constraint
    /// system and the witness.
    pub fn prove<FUNC>(
        &mut self,
        expected_size: usize,
        circuit: FUNC,
    ) -> SnarkyResult<(ConstraintSystem<F>, Witness<F>)>
    where
        FUNC: FnOnce(&mut RunState<F>) -> SnarkyResult<()>,
    {
        let mut guard = self.enter_as_prover(expected_size);
        circuit(&mut *guard)?;
        guard.finish()
    }

    /// The witness computed so far in the current mode.
    pub fn witness(&self) -> Witness<F> {
        Witness::new(self.vars.witnesses().to_vec(), self.vars.public_input_size())
    }

    /// Lowers a copy of the system being recorded, leaving the recording
    /// untouched. Fails with [SnarkyCompilationError::EmptySystem] outside of
    /// the modes that record constraints.
    pub fn compile(&self) -> SnarkyResult<ConstraintSystem<F>> {
        let system = self
            .system
            .clone()
            .ok_or(SnarkyCompilationError::EmptySystem)?;
        let mut vars = self.vars.clone();
        system.finalize(&mut vars)
    }

    fn check_mode(&self, operation: &'static str) -> SnarkyResult<()> {
        match self.mode {
            Mode::Idle => Err(SnarkyRuntimeError::mode(operation, self.mode).into()),
            _ => Ok(()),
        }
    }
}

//
// circuit generation
//

impl<F> RunState<F>
where
    F: PrimeField,
{
    /// Allocates `size` public inputs. They must come before any other
    /// variable. `values` is required when witnesses are computed, and
    /// ignored otherwise.
    pub fn public_inputs(
        &mut self,
        size: usize,
        values: Option<Vec<F>>,
    ) -> SnarkyResult<Vec<FieldVar<F>>> {
        self.check_mode("public_inputs")?;
        if self.vars.len() != self.vars.public_input_size() {
            return Err(SnarkyCompilationError::PublicInputAfterVariables(self.vars.len()).into());
        }

        let values: Vec<Option<F>> = if self.mode.has_witness() {
            let values = values.unwrap_or_default();
            if values.len() != size {
                return Err(SnarkyRuntimeError::PubInputMismatch(values.len(), size).into());
            }
            values.into_iter().map(Some).collect()
        } else {
            vec![None; size]
        };

        Ok(values
            .into_iter()
            .map(|value| FieldVar::Var(self.vars.alloc_public(value)))
            .collect())
    }

    /// Allocates a new variable without any witness.
    pub fn alloc_var(&mut self) -> SnarkyResult<FieldVar<F>> {
        self.check_mode("alloc_var")?;
        Ok(FieldVar::Var(self.vars.alloc(None)))
    }

    /// Creates a new non-deterministic variable, and a closure that can
    /// compute it when witnesses are computed. In
    /// [Mode::ConstraintGeneration] the closure is not called.
    pub fn compute<FUNC>(&mut self, to_compute_value: FUNC) -> SnarkyResult<FieldVar<F>>
    where
        FUNC: FnOnce(&dyn WitnessGeneration<F>) -> SnarkyResult<F>,
    {
        let mut vars = self.exists(1, move |env| Ok(vec![to_compute_value(env)?]))?;
        vars.pop()
            .ok_or_else(|| SnarkyRuntimeError::WitnessSizeMismatch(0, 1).into())
    }

    /// Same as [Self::compute], with an optional closure: without one, the
    /// variable has no witness.
    pub fn exists_one<FUNC>(&mut self, to_compute_value: Option<FUNC>) -> SnarkyResult<FieldVar<F>>
    where
        FUNC: FnOnce(&dyn WitnessGeneration<F>) -> SnarkyResult<F>,
    {
        match to_compute_value {
            Some(compute) => self.compute(compute),
            None => self.alloc_var(),
        }
    }

    /// Creates `size` non-deterministic variables, computed together by a
    /// single closure.
    pub fn exists<FUNC>(&mut self, size: usize, to_compute_values: FUNC) -> SnarkyResult<Vec<FieldVar<F>>>
    where
        FUNC: FnOnce(&dyn WitnessGeneration<F>) -> SnarkyResult<Vec<F>>,
    {
        self.check_mode("exists")?;

        let values: Vec<Option<F>> = if self.mode.has_witness() {
            let values = to_compute_values(&*self)?;
            if values.len() != size {
                return Err(SnarkyRuntimeError::WitnessSizeMismatch(values.len(), size).into());
            }
            values.into_iter().map(Some).collect()
        } else {
            vec![None; size]
        };

        Ok(values
            .into_iter()
            .map(|value| FieldVar::Var(self.vars.alloc(value)))
            .collect())
    }

    /// Runs `f` with access to the witness, outside of any constraint.
    /// Does nothing in [Mode::ConstraintGeneration].
    pub fn as_prover<FUNC>(&mut self, f: FUNC) -> SnarkyResult<()>
    where
        FUNC: FnOnce(&dyn WitnessGeneration<F>) -> SnarkyResult<()>,
    {
        self.check_mode("as_prover")?;
        if !self.mode.has_witness() {
            return Ok(());
        }

        self.prover_block_depth += 1;
        let res = f(&*self);
        self.prover_block_depth -= 1;
        res
    }

    /// Adds a constraint: checks it against the witness (if this mode does),
    /// then records it (if this mode does).
    pub fn add_constraint(
        &mut self,
        constraint: Constraint<F>,
        annotation: Option<&'static str>,
    ) -> SnarkyResult<()> {
        self.check_mode("add_constraint")?;
        constraint.check_arity()?;

        let check = match self.mode {
            Mode::WitnessGeneration => true,
            Mode::Prover => self.eval_constraints,
            _ => false,
        };
        if check {
            constraint.check(annotation, &|var: &FieldVar<F>| self.read_var(var))?;
        }

        if let Some(system) = &mut self.system {
            system.add_constraint(
                &mut self.vars,
                AnnotatedConstraint {
                    annotation,
                    constraint,
                },
            )?;
        }

        Ok(())
    }

    /// Creates a constraint for `assert_eq!(x, y)`.
    pub fn assert_equal(
        &mut self,
        annotation: Option<&'static str>,
        x: FieldVar<F>,
        y: FieldVar<F>,
    ) -> SnarkyResult<()> {
        self.add_constraint(Constraint::Equal(x, y), annotation)
    }

    /// Creates a constraint for `assert_eq!(a * b, c)`.
    pub fn assert_r1cs(
        &mut self,
        annotation: Option<&'static str>,
        a: FieldVar<F>,
        b: FieldVar<F>,
        c: FieldVar<F>,
    ) -> SnarkyResult<()> {
        self.add_constraint(Constraint::R1CS(a, b, c), annotation)
    }

    /// Creates a constraint for `assert_eq!(a * a, b)`.
    pub fn assert_square(
        &mut self,
        annotation: Option<&'static str>,
        a: FieldVar<F>,
        b: FieldVar<F>,
    ) -> SnarkyResult<()> {
        self.add_constraint(Constraint::Square(a, b), annotation)
    }

    pub fn assert_boolean(
        &mut self,
        annotation: Option<&'static str>,
        x: FieldVar<F>,
    ) -> SnarkyResult<()> {
        self.add_constraint(Constraint::Boolean(x), annotation)
    }

    /// Constrains `0 <= x < 2^bits`.
    pub fn range_check(
        &mut self,
        annotation: Option<&'static str>,
        x: FieldVar<F>,
        bits: u32,
        variant: RangeCheckVariant,
    ) -> SnarkyResult<()> {
        self.add_constraint(
            Constraint::RangeCheck {
                var: x,
                bits,
                variant,
            },
            annotation,
        )
    }

    /// Adds a gate as given, one variable per register. Fails with
    /// [SnarkyCompilationError::GateOverflow] if the gate kind cannot hold
    /// that many variables or coefficients.
    pub fn raw_gate(
        &mut self,
        annotation: Option<&'static str>,
        kind: GateType,
        vars: Vec<FieldVar<F>>,
        coeffs: Vec<F>,
    ) -> SnarkyResult<()> {
        self.add_constraint(Constraint::Raw { kind, vars, coeffs }, annotation)
    }

    /// Constrains `cl·l + cr·r + co·o + cm·l·r + cc = 0` with the
    /// coefficients of `gate`.
    pub fn generic(
        &mut self,
        annotation: Option<&'static str>,
        gate: GenericGate<F>,
        l: FieldVar<F>,
        r: FieldVar<F>,
        o: FieldVar<F>,
    ) -> SnarkyResult<()> {
        self.raw_gate(
            annotation,
            GateType::Generic,
            vec![l, r, o],
            gate.coeffs().to_vec(),
        )
    }
}
