//! Cut set construction and the optimistic cut assignment.
use rustc_hash::FxHashMap;

use splitsat_formula::{Assignment, CnfFormula, Lit};

use crate::deadline::Deadline;
use crate::error::SolverError;
use crate::partition::VarSet;

/// The variables occurring in two or more partitions.
///
/// Both polarities of a cut variable are cut literals; membership of a literal is decided by
/// its variable alone.
pub fn cut_set(partitions: &[VarSet], deadline: &Deadline) -> Result<VarSet, SolverError> {
    let mut variables = Vec::new();
    for partition in partitions {
        deadline.check()?;
        variables.extend(partition.iter().copied());
    }
    variables.sort_unstable();

    let mut cut = VarSet::new();
    for pair in variables.windows(2) {
        if pair[0] == pair[1] {
            cut.insert(pair[1]);
        }
    }
    Ok(cut)
}

/// Assigns every cut variable its majority polarity in `formula`.
///
/// A tie with at least one occurrence goes to true; cut variables that occur in no clause stay
/// undefined. All other variables of the returned assignment are undefined as well.
pub fn optimistic_assignment(
    formula: &CnfFormula,
    cut: &VarSet,
    deadline: &Deadline,
) -> Result<Assignment, SolverError> {
    let mut counts: FxHashMap<Lit, usize> = FxHashMap::default();
    for clause in formula.iter() {
        deadline.check()?;
        for &lit in clause {
            if cut.contains(&lit.var()) {
                *counts.entry(lit).or_insert(0) += 1;
            }
        }
    }

    let mut assignment = Assignment::new(formula.var_count());
    for &var in cut.iter() {
        deadline.check()?;
        let positive = counts.get(&var.positive()).copied().unwrap_or(0);
        let negative = counts.get(&var.negative()).copied().unwrap_or(0);

        if positive > negative {
            assignment.set(var, Some(true));
        } else if positive < negative {
            assignment.set(var, Some(false));
        } else if positive > 0 {
            assignment.set(var, Some(true));
        }
    }
    Ok(assignment)
}

#[cfg(test)]
mod tests {
    use super::*;

    use splitsat_formula::{cnf_formula, vars, Var};

    fn var_set(vars: &[Var]) -> VarSet {
        vars.iter().copied().collect()
    }

    #[test]
    fn cut_contains_shared_variables_only() {
        let partitions = vec![
            var_set(&vars![1, 2, 3]),
            var_set(&vars![3, 4]),
            var_set(&vars![4, 5, 1]),
        ];
        let cut = cut_set(&partitions, &Deadline::unbounded()).unwrap();
        assert_eq!(cut, var_set(&vars![1, 3, 4]));
    }

    #[test]
    fn disjoint_partitions_have_empty_cut() {
        let partitions = vec![var_set(&vars![1, 2]), var_set(&vars![3, 4])];
        let cut = cut_set(&partitions, &Deadline::unbounded()).unwrap();
        assert!(cut.is_empty());
    }

    #[test]
    fn optimistic_assignment_follows_majority_polarity() {
        let formula = cnf_formula![
            1, 2;
            1, -2;
            -1, -2;
            -3, 4;
            4, 5;
            1, -5;
        ];
        // pretend all five variables are shared
        let cut = var_set(&vars![1, 2, 3, 4, 5]);

        let assignment = optimistic_assignment(&formula, &cut, &Deadline::unbounded()).unwrap();

        let mut expected = Assignment::new(5);
        // variable 1: three positive vs one negative occurrence
        expected.set(Var::from_dimacs(1), Some(true));
        // variable 2: one positive vs two negative occurrences
        expected.set(Var::from_dimacs(2), Some(false));
        // variable 3: only negative occurrences
        expected.set(Var::from_dimacs(3), Some(false));
        // variable 4: only positive occurrences
        expected.set(Var::from_dimacs(4), Some(true));
        // variable 5: a tie with occurrences goes to true
        expected.set(Var::from_dimacs(5), Some(true));

        assert_eq!(assignment, expected);
    }

    #[test]
    fn optimistic_assignment_leaves_vacuous_variables_undefined() {
        let formula = {
            let mut formula = cnf_formula![1, 2;];
            formula.set_var_count(3);
            formula
        };
        let cut = var_set(&vars![3]);

        let assignment = optimistic_assignment(&formula, &cut, &Deadline::unbounded()).unwrap();
        assert_eq!(assignment, Assignment::new(3));
    }
}
