//! CNF formulas.
use std::cmp::max;
use std::fmt;
use std::iter::Extend;
use std::ops::Range;

use crate::assignment::Assignment;
use crate::lit::Lit;
use crate::solution::SolvingResult;

/// Summary statistics over clause lengths or variable occurrence counts.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Stats {
    pub avg: f64,
    pub min: usize,
    pub max: usize,
}

/// A formula in conjunctive normal form.
///
/// All clauses live in a single literal buffer and are addressed by index. This keeps the
/// formula compact and makes sub-formula construction during partitioning a cheap projection of
/// clause indices.
///
/// Formulas are value types: transformations build new formulas, the original stays untouched.
#[derive(Clone, Default, Eq)]
pub struct CnfFormula {
    var_count: usize,
    literals: Vec<Lit>,
    clause_ranges: Vec<Range<usize>>,
}

impl CnfFormula {
    /// Creates an empty formula without variables.
    pub fn new() -> CnfFormula {
        CnfFormula::default()
    }

    /// Creates an empty formula that already declares `var_count` variables.
    pub fn with_var_count(var_count: usize) -> CnfFormula {
        CnfFormula {
            var_count,
            ..CnfFormula::default()
        }
    }

    /// Number of declared variables.
    ///
    /// This counts unused variables below the largest used one, so a vector of this length can
    /// be indexed with any variable of the formula.
    pub fn var_count(&self) -> usize {
        self.var_count
    }

    /// Raises the number of declared variables.
    ///
    /// Does nothing when the formula already declares at least `count` variables.
    pub fn set_var_count(&mut self, count: usize) {
        self.var_count = max(self.var_count, count);
    }

    /// Number of clauses.
    pub fn len(&self) -> usize {
        self.clause_ranges.len()
    }

    /// Whether the formula has no clauses.
    ///
    /// A formula without clauses is satisfied by every assignment.
    pub fn is_empty(&self) -> bool {
        self.clause_ranges.is_empty()
    }

    /// Appends a clause, raising the variable count to cover its literals.
    ///
    /// `literals` can be an `IntoIterator<Item = Lit>` or `IntoIterator<Item = &Lit>`.
    pub fn add_clause<L>(&mut self, literals: impl IntoIterator<Item = L>)
    where
        Vec<Lit>: Extend<L>,
    {
        let begin = self.literals.len();
        self.literals.extend(literals);
        let end = self.literals.len();

        for &lit in self.literals[begin..end].iter() {
            self.var_count = max(lit.index() + 1, self.var_count);
        }

        self.clause_ranges.push(begin..end);
    }

    /// The clause with the given index.
    pub fn clause(&self, index: usize) -> &[Lit] {
        &self.literals[self.clause_ranges[index].clone()]
    }

    /// Iterates over all clauses in order.
    pub fn iter(&self) -> impl Iterator<Item = &[Lit]> {
        let literals = &self.literals;
        self.clause_ranges
            .iter()
            .map(move |range| &literals[range.clone()])
    }

    /// Evaluates the formula under an assignment.
    ///
    /// Returns `Undefined` when the assignment covers fewer variables than the formula
    /// declares. Otherwise the result is `Satisfiable` iff every clause contains at least one
    /// literal made true by the assignment, and `Unsatisfiable` otherwise.
    pub fn apply(&self, assignment: &Assignment) -> SolvingResult {
        if self.var_count > assignment.var_count() {
            return SolvingResult::Undefined;
        }

        for clause in self.iter() {
            if !clause.iter().any(|&lit| assignment.satisfies(lit)) {
                return SolvingResult::Unsatisfiable;
            }
        }
        SolvingResult::Satisfiable
    }

    /// Clauses per declared variable, 0 for a formula without variables.
    pub fn density(&self) -> f64 {
        if self.var_count == 0 {
            0.0
        } else {
            self.len() as f64 / self.var_count as f64
        }
    }

    /// Length statistics over all clauses.
    ///
    /// On a formula without clauses `avg` is NaN and `min` is `usize::MAX`; check
    /// [`is_empty`](CnfFormula::is_empty) before consulting these.
    pub fn clause_length_stats(&self) -> Stats {
        let mut sum = 0usize;
        let mut min = usize::max_value();
        let mut max = 0;

        for clause in self.iter() {
            sum += clause.len();
            min = min.min(clause.len());
            max = max.max(clause.len());
        }

        Stats {
            avg: sum as f64 / self.len() as f64,
            min,
            max,
        }
    }

    /// Occurrence statistics counting how often each declared variable appears in clauses,
    /// ignoring polarity.
    ///
    /// On a formula without variables `avg` is NaN and `min` is `usize::MAX`.
    pub fn variable_occurrence_stats(&self) -> Stats {
        let mut counts = vec![0usize; self.var_count];
        for clause in self.iter() {
            for lit in clause {
                counts[lit.index()] += 1;
            }
        }

        let mut sum = 0usize;
        let mut min = usize::max_value();
        let mut max = 0;
        for &count in counts.iter() {
            sum += count;
            min = min.min(count);
            max = max.max(count);
        }

        Stats {
            avg: sum as f64 / self.var_count as f64,
            min,
            max,
        }
    }
}

/// Converts any iterable of [`Lit`] iterables into a formula.
impl<F, I, L> From<F> for CnfFormula
where
    F: IntoIterator<Item = I>,
    I: IntoIterator<Item = L>,
    Vec<Lit>: Extend<L>,
{
    fn from(formula: F) -> CnfFormula {
        let mut cnf_formula = CnfFormula::new();
        for clause in formula {
            cnf_formula.add_clause(clause);
        }
        cnf_formula
    }
}

impl fmt::Debug for CnfFormula {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(&self.var_count(), f)?;
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PartialEq for CnfFormula {
    fn eq(&self, other: &CnfFormula) -> bool {
        self.var_count() == other.var_count()
            && self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(left, right)| left == right)
    }
}

#[cfg(any(test, feature = "proptest-strategies"))]
#[doc(hidden)]
pub mod strategy {
    use super::*;

    use proptest::{collection::SizeRange, prelude::*, *};

    use crate::lit::strategy::lit;

    pub fn vec_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = Vec<Vec<Lit>>> {
        let clauses = clauses.into();
        let clause_len = clause_len.into();

        // Not using ind_flat_map makes shrinking too expensive
        vars.prop_ind_flat_map(move |vars| {
            collection::vec(
                collection::vec(lit(0..vars), clause_len.clone()),
                clauses.clone(),
            )
        })
    }

    pub fn cnf_formula(
        vars: impl Strategy<Value = usize>,
        clauses: impl Into<SizeRange>,
        clause_len: impl Into<SizeRange>,
    ) -> impl Strategy<Value = CnfFormula> {
        vec_formula(vars, clauses, clause_len).prop_map(|clauses| CnfFormula::from(clauses))
    }
}

#[cfg(test)]
mod tests {
    use super::{strategy::*, *};

    use proptest::*;

    use crate::lit::Var;

    #[test]
    fn simple_roundtrip() {
        let input = cnf![
            1, 2, 3;
            -1, -2;
            7, 2;
            ;
            4, 5;
        ];

        let formula = CnfFormula::from(input.iter().cloned());

        for (clause, &ref_clause) in formula.iter().zip(input.iter()) {
            assert_eq!(clause, ref_clause);
        }

        assert_eq!(formula.var_count(), 7);
        assert_eq!(formula.len(), 5);
        assert_eq!(formula.clause(2), &[lit!(7), lit!(2)][..]);
    }

    #[test]
    fn apply_covers_three_verdicts() {
        let formula = cnf_formula![
            1, 2;
            -2, 3;
        ];

        assert_eq!(formula.apply(&Assignment::new(2)), SolvingResult::Undefined);

        let mut assignment = Assignment::new(3);
        assignment.complete_with(true);
        assert_eq!(formula.apply(&assignment), SolvingResult::Satisfiable);

        assignment.set(Var::from_dimacs(3), Some(false));
        assignment.set(Var::from_dimacs(1), Some(false));
        assert_eq!(formula.apply(&assignment), SolvingResult::Unsatisfiable);
    }

    #[test]
    fn empty_formula_is_satisfied() {
        let formula = CnfFormula::with_var_count(4);
        let mut assignment = Assignment::new(4);
        assignment.complete_with(false);
        assert_eq!(formula.apply(&assignment), SolvingResult::Satisfiable);
    }

    #[test]
    fn statistics() {
        let formula = cnf_formula![
            1, 2, 3;
            -1, -2;
            2;
        ];

        assert_eq!(formula.density(), 1.0);

        let lengths = formula.clause_length_stats();
        assert_eq!(lengths.avg, 2.0);
        assert_eq!(lengths.min, 1);
        assert_eq!(lengths.max, 3);

        let occurrences = formula.variable_occurrence_stats();
        assert_eq!(occurrences.avg, 2.0);
        assert_eq!(occurrences.min, 1);
        assert_eq!(occurrences.max, 3);
    }

    #[test]
    fn statistics_on_empty_formula() {
        let formula = CnfFormula::new();
        assert_eq!(formula.density(), 0.0);

        let lengths = formula.clause_length_stats();
        assert!(lengths.avg.is_nan());
        assert_eq!(lengths.min, usize::max_value());
        assert_eq!(lengths.max, 0);
    }

    proptest! {
        #[test]
        fn roundtrip_from_vec(input in vec_formula(1..200usize, 0..1000, 0..10)) {
            let formula = CnfFormula::from(input.iter().map(|clause| clause.iter().cloned()));

            for (clause, ref_clause) in formula.iter().zip(input.iter()) {
                prop_assert_eq!(clause, &ref_clause[..]);
            }

            let var_count = input
                .iter()
                .flat_map(|clause| clause.iter().map(|lit| lit.index() + 1))
                .max()
                .unwrap_or(0);

            prop_assert_eq!(formula.var_count(), var_count);
        }
    }
}
