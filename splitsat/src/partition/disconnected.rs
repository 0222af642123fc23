//! Connected component partitioning.
use std::mem::take;

use splitsat_formula::CnfFormula;

use crate::deadline::Deadline;
use crate::error::SolverError;

use super::{clause_vars, VarSet};

/// Computes the connected components of the variable incidence graph.
///
/// Two variables are adjacent when they occur together in some clause. The components are
/// pairwise disjoint, so the resulting cut set is always empty.
pub(super) fn partition(
    formula: &CnfFormula,
    deadline: &Deadline,
) -> Result<Vec<VarSet>, SolverError> {
    // one slot per variable holding the neighbourhood collected so far
    let mut slots: Vec<VarSet> = vec![VarSet::new(); formula.var_count()];

    for clause in formula.iter() {
        deadline.check()?;
        let vars = clause_vars(clause);
        for &var in vars.iter() {
            slots[var.index()].extend(vars.iter().copied());
        }
    }

    // fold every component into the slot of its lowest variable
    for index in 0..slots.len() {
        loop {
            deadline.check()?;
            let absorb = slots[index]
                .iter()
                .map(|var| var.index())
                .find(|&other| other != index && !slots[other].is_empty());
            match absorb {
                Some(other) => {
                    let absorbed = take(&mut slots[other]);
                    slots[index].extend(absorbed);
                }
                None => break,
            }
        }
    }

    Ok(slots.into_iter().filter(|slot| !slot.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    use splitsat_formula::{cnf_formula, vars};

    #[test]
    fn splits_independent_components() {
        let formula = cnf_formula![
            1, 2;
            -1, -2;
            3, 4;
            -3, -4;
        ];

        let partitions = partition(&formula, &Deadline::unbounded()).unwrap();
        assert_eq!(partitions.len(), 2);
        assert_eq!(partitions[0], vars![1, 2].iter().copied().collect());
        assert_eq!(partitions[1], vars![3, 4].iter().copied().collect());
    }

    #[test]
    fn chained_clauses_form_one_component() {
        let formula = cnf_formula![
            1, 2;
            2, 3;
            3, 4;
        ];

        let partitions = partition(&formula, &Deadline::unbounded()).unwrap();
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0], vars![1, 2, 3, 4].iter().copied().collect());
    }

    #[test]
    fn empty_formula_has_no_components() {
        let partitions = partition(&CnfFormula::new(), &Deadline::unbounded()).unwrap();
        assert!(partitions.is_empty());
    }
}
