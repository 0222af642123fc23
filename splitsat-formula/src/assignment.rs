//! Dense and sparse variable assignments.
use std::collections::BTreeMap;
use std::fmt;

use crate::lit::{Lit, Var};

/// A dense assignment mapping every variable of a formula to true, false or undefined.
///
/// Covers a fixed range of variables; variables outside that range are not part of the
/// assignment. An assignment is *complete* when no covered variable is left undefined.
#[derive(Clone, Default, Eq, PartialEq)]
pub struct Assignment {
    values: Vec<Option<bool>>,
}

impl Assignment {
    /// Creates an assignment covering `var_count` variables, all undefined.
    pub fn new(var_count: usize) -> Assignment {
        Assignment {
            values: vec![None; var_count],
        }
    }

    /// Number of variables covered by this assignment.
    pub fn var_count(&self) -> usize {
        self.values.len()
    }

    /// The value of a variable.
    ///
    /// Panics when the variable is not covered.
    pub fn value(&self, var: Var) -> Option<bool> {
        self.values[var.index()]
    }

    /// Sets the value of a variable.
    ///
    /// Panics when the variable is not covered.
    pub fn set(&mut self, var: Var, value: Option<bool>) {
        self.values[var.index()] = value;
    }

    /// Whether the literal is made true by this assignment.
    pub fn satisfies(&self, lit: Lit) -> bool {
        self.values[lit.index()] == Some(lit.is_positive())
    }

    /// Whether no covered variable is left undefined.
    pub fn is_complete(&self) -> bool {
        self.values.iter().all(|value| value.is_some())
    }

    /// Two assignments are compatible when they cover the same variables and no variable is true
    /// in one and false in the other.
    pub fn is_compatible(&self, other: &Assignment) -> bool {
        self.var_count() == other.var_count()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(left, right)| match (left, right) {
                    (Some(left), Some(right)) => left == right,
                    _ => true,
                })
    }

    /// Sets every undefined variable to the given polarity.
    pub fn complete_with(&mut self, polarity: bool) {
        for value in self.values.iter_mut() {
            value.get_or_insert(polarity);
        }
    }

    /// The literals of all defined variables, in variable order.
    pub fn to_lits(&self) -> Vec<Lit> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(index, value)| value.map(|polarity| Lit::from_index(index, polarity)))
            .collect()
    }
}

/// Lists defined variables as signed DIMACS numbers and undefined variables as `?n`.
impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (index, value) in self.values.iter().enumerate() {
            if index > 0 {
                write!(f, " ")?;
            }
            match value {
                Some(polarity) => write!(f, "{}", Lit::from_index(index, *polarity))?,
                None => write!(f, "?{}", Var::from_index(index))?,
            }
        }
        Ok(())
    }
}

/// A sparse assignment over a chosen subset of variables.
///
/// Used for cut-set truth tables, where allocating a formula sized [`Assignment`] for every
/// enumerated row would be wasteful. Variables without an entry are undefined.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PartialAssignment {
    values: BTreeMap<Var, bool>,
}

impl PartialAssignment {
    /// Creates an empty sparse assignment.
    pub fn new() -> PartialAssignment {
        PartialAssignment::default()
    }

    /// The value of a variable, `None` when the variable has no entry.
    pub fn value(&self, var: Var) -> Option<bool> {
        self.values.get(&var).copied()
    }

    /// Sets the value of a variable.
    pub fn set(&mut self, var: Var, value: bool) {
        self.values.insert(var, value);
    }

    /// Number of variables with an entry.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no variable has an entry.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the literal is made true by this assignment.
    pub fn satisfies(&self, lit: Lit) -> bool {
        self.value(lit.var()) == Some(lit.is_positive())
    }

    /// Iterates over all entries in variable order.
    pub fn iter(&self) -> impl Iterator<Item = (Var, bool)> + '_ {
        self.values.iter().map(|(&var, &value)| (var, value))
    }

    /// No variable is defined with opposite values in `self` and `other`.
    pub fn is_compatible(&self, other: &PartialAssignment) -> bool {
        self.iter()
            .all(|(var, value)| other.value(var).map_or(true, |other| other == value))
    }

    /// No variable is defined here and with the opposite value in the dense assignment.
    ///
    /// Entries for variables the dense assignment does not cover are ignored.
    pub fn is_compatible_with(&self, other: &Assignment) -> bool {
        self.iter().all(|(var, value)| {
            var.index() >= other.var_count() || other.value(var).map_or(true, |other| other == value)
        })
    }

    /// The literals fixing every entry, in variable order. Suitable as unit clauses.
    pub fn to_units(&self) -> Vec<Lit> {
        self.iter().map(|(var, value)| var.lit(value)).collect()
    }

    /// The clause ruling out exactly this assignment.
    pub fn blocking_clause(&self) -> Vec<Lit> {
        self.iter().map(|(var, value)| var.lit(!value)).collect()
    }
}

/// All `2^n` assignments of the given variables.
///
/// Rows are ordered trying `true` before `false` on each variable, earlier variables varying
/// slowest. The exponential blowup is the caller's responsibility to bound.
pub fn truth_table(vars: &[Var]) -> Vec<PartialAssignment> {
    let mut rows = Vec::with_capacity(1usize.checked_shl(vars.len() as u32).unwrap_or(0));
    let mut row = PartialAssignment::new();
    fill_truth_table(&mut rows, vars, &mut row);
    rows
}

fn fill_truth_table(rows: &mut Vec<PartialAssignment>, vars: &[Var], row: &mut PartialAssignment) {
    match vars.split_first() {
        None => rows.push(row.clone()),
        Some((&var, rest)) => {
            row.set(var, true);
            fill_truth_table(rows, rest, row);
            row.set(var, false);
            fill_truth_table(rows, rest, row);
        }
    }
}
