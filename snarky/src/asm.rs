//! An ASM-like language to print a human-friendly version of a circuit.

use core::hash::Hash;
use std::collections::HashMap;

use ark_ff::PrimeField;

use crate::{
    constraint_system::ConstraintSystem,
    gate::{Gate, GateType},
    generic::{GENERIC_COEFFS, GENERIC_REGISTERS},
};

/// Print a field in a negative form if it's past the half point.
pub fn pretty<F: PrimeField>(ff: F) -> String {
    let bigint: num_bigint::BigUint = ff.into();
    let inv: num_bigint::BigUint = ff.neg().into(); // splits the field into positive and negative elements
    if inv < bigint {
        format!("-{inv}")
    } else {
        bigint.to_string()
    }
}

impl<F> ConstraintSystem<F>
where
    F: PrimeField,
{
    /// One block per row: the gate with its coefficients, then the variable
    /// held by each used register. Long coefficients are hoisted into
    /// `c{idx}` definitions at the top.
    pub fn to_asm(&self) -> String {
        let mut res = String::new();

        // vars
        let mut vars = OrderedHashSet::default();

        for Gate { coeffs, .. } in self.gates() {
            extract_vars_from_coeffs(&mut vars, coeffs);
        }

        for (idx, var) in vars.iter().enumerate() {
            res.push_str(&format!("c{idx} = {}\n", pretty(*var)));
        }

        // gates
        for (row, Gate { typ, coeffs, wires }) in self.gates().iter().enumerate() {
            // gate
            {
                let is_pub = if row < self.public_input_size() {
                    "pub."
                } else {
                    ""
                };
                res.push_str(&format!("row{row}.{is_pub}{typ}<"));
                let coeffs = parse_coeffs(&vars, coeffs);

                if matches!(typ, GateType::Generic) && coeffs.len() > GENERIC_COEFFS {
                    // for the double generic gate, split the coeffs in two parts
                    let (gen1, gen2) = coeffs.split_at(GENERIC_COEFFS);
                    res.push_str(&gen1.join(","));
                    res.push_str("><");
                    res.push_str(&gen2.join(","));
                } else {
                    res.push_str(&coeffs.join(","));
                }

                res.push_str(">\n");
            }

            // registers
            {
                let mut wires1 = vec![];
                let mut wires2 = vec![];

                for (col, wire) in wires.iter().enumerate() {
                    if *wire == 0 {
                        continue;
                    }
                    let var = format!("v{}", wire - 1);
                    if matches!(typ, GateType::Generic) {
                        let cell = format!(".{}={var}", generic_cols(col));
                        if col < GENERIC_REGISTERS {
                            wires1.push(cell);
                        } else {
                            wires2.push(cell);
                        }
                    } else {
                        wires1.push(format!("[{col}]={var}"));
                    }
                }

                for cells in [wires1, wires2] {
                    if !cells.is_empty() {
                        res.push_str(&cells.join(", "));
                        res.push('\n');
                    }
                }
            }

            res.push('\n');
        }

        res
    }
}

fn generic_cols(col: usize) -> &'static str {
    match col {
        0 => "l1",
        1 => "r1",
        2 => "o1",
        3 => "l2",
        4 => "r2",
        5 => "o2",
        x => unreachable!("invalid generic column: {x}"),
    }
}

fn extract_vars_from_coeffs<F: PrimeField>(vars: &mut OrderedHashSet<F>, coeffs: &[F]) {
    for coeff in coeffs {
        let s = pretty(*coeff);
        if s.len() >= 5 {
            vars.insert(*coeff);
        }
    }
}

fn parse_coeffs<F: PrimeField>(vars: &OrderedHashSet<F>, coeffs: &[F]) -> Vec<String> {
    coeffs
        .iter()
        .map(|x| {
            let s = pretty(*x);
            match vars.pos(x) {
                Some(var_idx) if s.len() >= 5 => format!("c{var_idx}"),
                _ => s,
            }
        })
        .collect()
}

/// Very dumb way to write an ordered hash set.
#[derive(Default)]
pub struct OrderedHashSet<T> {
    map: HashMap<T, usize>,
    ordered: Vec<T>,
}

impl<T> OrderedHashSet<T>
where
    T: Eq + Hash + Clone,
{
    pub fn insert(&mut self, value: T) -> bool {
        if self.map.contains_key(&value) {
            return false;
        }
        self.map.insert(value.clone(), self.ordered.len());
        self.ordered.push(value);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.ordered.iter()
    }

    pub fn pos(&self, value: &T) -> Option<usize> {
        self.map.get(value).copied()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}
