use std::{
    fmt,
    ops::{Add, Neg, Sub},
};

use ark_ff::PrimeField;

use crate::{
    asm::pretty,
    errors::{SnarkyResult, SnarkyRuntimeError},
    runner::{RunState, WitnessGeneration},
};

/// A circuit variable represents a field element in the circuit.
///
/// Sums and scalings never touch the constraint system: they only build an
/// expression. Sub-expressions made only of constants are folded into a
/// single [FieldVar::Constant] as they are built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldVar<F>
where
    F: PrimeField,
{
    Constant(F),
    Var(usize),
    Add(Box<FieldVar<F>>, Box<FieldVar<F>>),
    Scale(F, Box<FieldVar<F>>),
}

pub type Term<F> = (F, usize);

pub type ScaledFieldVar<F> = (F, FieldVar<F>);

impl<F> FieldVar<F>
where
    F: PrimeField,
{
    pub fn constant(value: F) -> Self {
        FieldVar::Constant(value)
    }

    pub fn zero() -> Self {
        FieldVar::Constant(F::zero())
    }

    pub fn one() -> Self {
        FieldVar::Constant(F::one())
    }

    pub fn to_constant(&self) -> Option<F> {
        match self {
            FieldVar::Constant(x) => Some(*x),
            _ => None,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, FieldVar::Constant(_))
    }

    fn eval_inner(
        &self,
        context: &impl Fn(usize) -> SnarkyResult<F>,
        scale: F,
        res: &mut F,
    ) -> SnarkyResult<()> {
        match self {
            FieldVar::Constant(c) => {
                *res += scale * c;
            }
            FieldVar::Var(v) => {
                *res += scale * context(*v)?;
            }
            FieldVar::Add(a, b) => {
                a.eval_inner(context, scale, res)?;
                b.eval_inner(context, scale, res)?;
            }
            FieldVar::Scale(s, v) => {
                v.eval_inner(context, scale * s, res)?;
            }
        }
        Ok(())
    }

    /// Evaluate the field element associated to a variable (used during witness generation)
    pub fn eval(&self, context: &impl Fn(usize) -> SnarkyResult<F>) -> SnarkyResult<F> {
        let mut res = F::zero();
        self.eval_inner(context, F::one(), &mut res)?;
        Ok(res)
    }

    fn to_constant_and_terms_inner(&self, scale: F, constant: &mut F, terms: &mut Vec<Term<F>>) {
        match self {
            FieldVar::Constant(c) => *constant += scale * c,
            FieldVar::Var(v) => terms.push((scale, *v)),
            FieldVar::Scale(s, t) => t.to_constant_and_terms_inner(scale * s, constant, terms),
            FieldVar::Add(x1, x2) => {
                x1.to_constant_and_terms_inner(scale, constant, terms);
                x2.to_constant_and_terms_inner(scale, constant, terms);
            }
        }
    }

    /// Flattens the expression into a constant and a list of scaled
    /// variables, in left-to-right order. Repeated variables are kept as
    /// separate terms.
    pub fn to_constant_and_terms(&self) -> (F, Vec<Term<F>>) {
        let mut constant = F::zero();
        let mut terms = vec![];
        self.to_constant_and_terms_inner(F::one(), &mut constant, &mut terms);
        (constant, terms)
    }

    pub fn scale(&self, scalar: F) -> Self {
        if scalar.is_zero() {
            return FieldVar::Constant(scalar);
        } else if scalar.is_one() {
            return self.clone();
        }

        match self {
            FieldVar::Constant(x) => FieldVar::Constant(*x * scalar),
            FieldVar::Scale(s, v) => {
                let s = *s * scalar;
                if s.is_one() {
                    (**v).clone()
                } else {
                    FieldVar::Scale(s, v.clone())
                }
            }
            FieldVar::Var(_) | FieldVar::Add(..) => FieldVar::Scale(scalar, Box::new(self.clone())),
        }
    }

    pub fn linear_combination(terms: &[ScaledFieldVar<F>]) -> Self {
        let mut res = FieldVar::zero();
        for (cst, term) in terms {
            res = &res + &term.scale(*cst);
        }
        res
    }

    pub fn sum(vs: &[&Self]) -> Self {
        let terms: Vec<_> = vs.iter().map(|v| (F::one(), (*v).clone())).collect();
        Self::linear_combination(&terms)
    }

    /// Returns `self * other`. Products involving a constant stay linear and
    /// cost nothing (unless constant folding is switched off); any other
    /// product allocates a fresh variable constrained by one multiplication.
    pub fn mul(
        &self,
        other: &Self,
        label: Option<&'static str>,
        cs: &mut RunState<F>,
    ) -> SnarkyResult<Self> {
        if cs.constant_folding() {
            match (self, other) {
                (FieldVar::Constant(x), FieldVar::Constant(y)) => {
                    return Ok(FieldVar::Constant(*x * y))
                }
                (FieldVar::Constant(cst), cvar) | (cvar, FieldVar::Constant(cst)) => {
                    return Ok(cvar.scale(*cst))
                }
                _ => (),
            }
        }

        let self_clone = self.clone();
        let other_clone = other.clone();
        let res = cs.compute(move |env| {
            let x = env.read_var(&self_clone)?;
            let y = env.read_var(&other_clone)?;
            Ok(x * y)
        })?;

        let label = label.or(Some("checked_mul"));
        cs.assert_r1cs(label, self.clone(), other.clone(), res.clone())?;
        Ok(res)
    }

    pub fn square(&self, label: Option<&'static str>, cs: &mut RunState<F>) -> SnarkyResult<Self> {
        if cs.constant_folding() {
            if let FieldVar::Constant(x) = self {
                return Ok(FieldVar::Constant(x.square()));
            }
        }

        let self_clone = self.clone();
        let res = cs.compute(move |env| Ok(env.read_var(&self_clone)?.square()))?;

        cs.assert_square(label.or(Some("checked_square")), self.clone(), res.clone())?;
        Ok(res)
    }

    /// Returns the inverse of `self`, constraining `self * res = 1`.
    pub fn inv(&self, label: Option<&'static str>, cs: &mut RunState<F>) -> SnarkyResult<Self> {
        let label = label.or(Some("field_inv"));
        if cs.constant_folding() {
            if let FieldVar::Constant(x) = self {
                return match x.inverse() {
                    Some(inv) => Ok(FieldVar::Constant(inv)),
                    None => Err(SnarkyRuntimeError::unsatisfied(label, "0 * x = 1", vec![]).into()),
                };
            }
        }

        let self_clone = self.clone();
        let res = cs.compute(move |env| {
            let x = env.read_var(&self_clone)?;
            x.inverse().ok_or_else(|| {
                SnarkyRuntimeError::unsatisfied(label, format!("{self_clone} * x = 1"), vec![pretty(x)])
                    .into()
            })
        })?;

        cs.assert_r1cs(label, self.clone(), res.clone(), FieldVar::one())?;
        Ok(res)
    }

    pub fn div(
        &self,
        other: &Self,
        label: Option<&'static str>,
        cs: &mut RunState<F>,
    ) -> SnarkyResult<Self> {
        let inv = other.inv(label, cs)?;
        self.mul(&inv, label, cs)
    }

    /** [equal_constraints z z_inv r] asserts that
       if z = 0 then r = 1, or
       if z <> 0 then r = 0 and z * z_inv = 1
    */
    fn equal_constraints(cs: &mut RunState<F>, z: Self, z_inv: Self, r: Self) -> SnarkyResult<()> {
        let one_minus_r = FieldVar::one() - &r;
        cs.assert_r1cs(Some("equals_1"), z_inv, z.clone(), one_minus_r)?;
        cs.assert_r1cs(Some("equals_2"), r, z, FieldVar::zero())
    }

    /** [equal_vars z] computes [(r, z_inv)] that satisfy the constraints in
    [equal_constraints z z_inv r].

    In particular, [r] is [1] if [z = 0] and [0] otherwise.
    */
    fn equal_vars(env: &dyn WitnessGeneration<F>, z: &FieldVar<F>) -> SnarkyResult<Vec<F>> {
        let z = env.read_var(z)?;
        Ok(match z.inverse() {
            Some(z_inv) => vec![F::zero(), z_inv],
            None => vec![F::one(), F::zero()],
        })
    }

    /// Returns a boolean variable (`0` or `1`) that is `1` exactly when
    /// `self == other`.
    pub fn equal(&self, cs: &mut RunState<F>, other: &FieldVar<F>) -> SnarkyResult<Self> {
        match (self, other) {
            (FieldVar::Constant(x), FieldVar::Constant(y)) => Ok(if x == y {
                FieldVar::one()
            } else {
                FieldVar::zero()
            }),
            _ => {
                let z = self - other;
                let z_clone = z.clone();
                let mut vars = cs.exists(2, move |env| Self::equal_vars(env, &z_clone))?;
                let z_inv = vars.pop().ok_or(SnarkyRuntimeError::WitnessSizeMismatch(1, 2))?;
                let res = vars.pop().ok_or(SnarkyRuntimeError::WitnessSizeMismatch(0, 2))?;
                Self::equal_constraints(cs, z, z_inv, res.clone())?;
                Ok(res)
            }
        }
    }

    /// `if b then then_ else else_`, where `b` is assumed to be boolean.
    pub fn if_(
        b: &FieldVar<F>,
        then_: &FieldVar<F>,
        else_: &FieldVar<F>,
        cs: &mut RunState<F>,
    ) -> SnarkyResult<Self> {
        match b {
            FieldVar::Constant(x) if x.is_one() => Ok(then_.clone()),
            FieldVar::Constant(x) if x.is_zero() => Ok(else_.clone()),
            _ => {
                let diff = then_ - else_;
                let selected = b.mul(&diff, Some("if_"), cs)?;
                Ok(&selected + else_)
            }
        }
    }
}

impl<F> fmt::Display for FieldVar<F>
where
    F: PrimeField,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldVar::Constant(c) => write!(f, "{}", pretty(*c)),
            FieldVar::Var(v) => write!(f, "v{v}"),
            FieldVar::Add(a, b) => write!(f, "({a} + {b})"),
            FieldVar::Scale(s, v) => write!(f, "{}*{v}", pretty(*s)),
        }
    }
}

//
// Traits
//

impl<F> Add for &FieldVar<F>
where
    F: PrimeField,
{
    type Output = FieldVar<F>;

    fn add(self, other: Self) -> Self::Output {
        match (self, other) {
            (FieldVar::Constant(x), y) | (y, FieldVar::Constant(x)) if x.is_zero() => y.clone(),
            (FieldVar::Constant(x), FieldVar::Constant(y)) => FieldVar::Constant(*x + y),
            (_, _) => FieldVar::Add(Box::new(self.clone()), Box::new(other.clone())),
        }
    }
}

impl<F> Add<Self> for FieldVar<F>
where
    F: PrimeField,
{
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        &self + &other
    }
}

impl<'a, F> Add<&'a Self> for FieldVar<F>
where
    F: PrimeField,
{
    type Output = Self;

    fn add(self, other: &Self) -> Self::Output {
        &self + other
    }
}

impl<F> Add<FieldVar<F>> for &FieldVar<F>
where
    F: PrimeField,
{
    type Output = FieldVar<F>;

    fn add(self, other: FieldVar<F>) -> Self::Output {
        self + &other
    }
}

impl<F> Sub for &FieldVar<F>
where
    F: PrimeField,
{
    type Output = FieldVar<F>;

    fn sub(self, other: Self) -> Self::Output {
        match (self, other) {
            (FieldVar::Constant(x), FieldVar::Constant(y)) => FieldVar::Constant(*x - y),
            _ => self + &other.scale(-F::one()),
        }
    }
}

impl<F> Sub<FieldVar<F>> for FieldVar<F>
where
    F: PrimeField,
{
    type Output = FieldVar<F>;

    fn sub(self, other: FieldVar<F>) -> Self::Output {
        &self - &other
    }
}

impl<'a, F> Sub<&'a FieldVar<F>> for FieldVar<F>
where
    F: PrimeField,
{
    type Output = FieldVar<F>;

    fn sub(self, other: &Self) -> Self::Output {
        &self - other
    }
}

impl<F> Sub<FieldVar<F>> for &FieldVar<F>
where
    F: PrimeField,
{
    type Output = FieldVar<F>;

    fn sub(self, other: FieldVar<F>) -> Self::Output {
        self - &other
    }
}

impl<F> Neg for &FieldVar<F>
where
    F: PrimeField,
{
    type Output = FieldVar<F>;

    fn neg(self) -> Self::Output {
        self.scale(-F::one())
    }
}

impl<F> Neg for FieldVar<F>
where
    F: PrimeField,
{
    type Output = FieldVar<F>;

    fn neg(self) -> Self::Output {
        self.scale(-F::one())
    }
}
