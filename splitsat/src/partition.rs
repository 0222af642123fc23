//! Partition strategies.
//!
//! A strategy turns a formula into a list of variable sets whose pairwise shared variables (the
//! cut set) are expected, but not required, to be small. The solver shell decides with
//! [`Strategy::is_good`] whether a partitioning is worth the cut enumeration it entails.
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use splitsat_formula::{CnfFormula, Lit, Var};

use crate::deadline::Deadline;
use crate::error::SolverError;

mod disconnected;
mod fast;
mod greedy;
pub(crate) mod one_point;

/// The variables of one partition, ordered for deterministic iteration.
pub type VarSet = BTreeSet<Var>;

/// The set of variables a clause touches.
pub fn clause_vars(clause: &[Lit]) -> VarSet {
    clause.iter().map(|lit| lit.var()).collect()
}

/// Number of variables two sets share.
pub fn connectivity(left: &VarSet, right: &VarSet) -> usize {
    if left.len() > right.len() {
        return connectivity(right, left);
    }
    left.iter().filter(|var| right.contains(var)).count()
}

/// Whether two sets share at least one variable.
pub fn is_connected(left: &VarSet, right: &VarSet) -> bool {
    if left.len() > right.len() {
        return is_connected(right, left);
    }
    left.iter().any(|var| right.contains(var))
}

/// Projects the clauses with the given indices into a fresh formula.
///
/// The projection declares as many variables as the source formula, so sub-formula models can
/// be spliced back without renumbering.
pub(crate) fn project_clauses(formula: &CnfFormula, clauses: &[usize]) -> CnfFormula {
    let mut sub = CnfFormula::with_var_count(formula.var_count());
    for &index in clauses {
        sub.add_clause(formula.clause(index));
    }
    sub
}

/// Partitioning strategy used by [`PartitionSolver`](crate::solver::PartitionSolver).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Strategy {
    /// Connected components of the variable incidence graph. The cleanest decomposition with an
    /// always empty cut, but industrial formulas rarely fall apart into components.
    Disconnected,
    /// A cheap linear sweep absorbing clauses into the partition currently being grown.
    Fast,
    /// A fixed number of seed partitions grown by connectivity.
    Greedy { partitions: usize },
    /// Single articulation point decomposition with truth table gluing.
    OnePoint,
}

impl Default for Strategy {
    fn default() -> Strategy {
        Strategy::Greedy { partitions: 2 }
    }
}

impl Strategy {
    /// Computes the candidate partitions of `formula`. Empty sets are already filtered out.
    pub fn partition(
        &self,
        formula: &CnfFormula,
        deadline: &Deadline,
    ) -> Result<Vec<VarSet>, SolverError> {
        match *self {
            Strategy::Disconnected => disconnected::partition(formula, deadline),
            Strategy::Fast => fast::partition(formula, deadline),
            Strategy::Greedy { partitions } => greedy::partition(formula, partitions, deadline),
            Strategy::OnePoint => {
                Ok(one_point::decompose(formula, deadline)?.var_sets())
            }
        }
    }

    /// Whether a partitioning is worth the cut enumeration it entails.
    ///
    /// Rejecting sends the whole formula to the backend instead.
    pub fn is_good(&self, partitions: &[VarSet], cut: &VarSet) -> bool {
        match *self {
            // the enumeration visits 2^cut assignments; demand more partitions than that
            Strategy::Disconnected => match 1usize.checked_shl(cut.len() as u32) {
                Some(limit) => partitions.len() > limit,
                None => false,
            },
            // the cheapest fallback accepts anything
            Strategy::Fast => true,
            Strategy::Greedy { .. } => partitions.len() > 1,
            Strategy::OnePoint => partitions.len() > 1 && cut.len() <= partitions.len(),
        }
    }

    /// Name used in logs and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Disconnected => "disconnected",
            Strategy::Fast => "fast",
            Strategy::Greedy { .. } => "greedy",
            Strategy::OnePoint => "one-point",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = UnknownStrategy;

    fn from_str(name: &str) -> Result<Strategy, UnknownStrategy> {
        match name {
            "disconnected" => Ok(Strategy::Disconnected),
            "fast" => Ok(Strategy::Fast),
            "greedy" => Ok(Strategy::default()),
            "one-point" => Ok(Strategy::OnePoint),
            _ => Err(UnknownStrategy(name.to_owned())),
        }
    }
}

/// Error for strategy names [`FromStr`] does not recognize.
#[derive(Debug, thiserror::Error)]
#[error("unknown partitioning strategy: {0}")]
pub struct UnknownStrategy(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    use splitsat_formula::{lits, vars};

    fn var_set(vars: &[Var]) -> VarSet {
        vars.iter().copied().collect()
    }

    #[test]
    fn clause_vars_ignore_polarity_and_duplicates() {
        assert_eq!(
            clause_vars(&lits![1, -2, 2, -1]),
            var_set(&vars![1, 2])
        );
    }

    #[test]
    fn connectivity_counts_shared_variables() {
        let left = var_set(&vars![1, 2, 3]);
        let right = var_set(&vars![2, 3, 4]);
        assert_eq!(connectivity(&left, &right), 2);
        assert!(is_connected(&left, &right));

        let disjoint = var_set(&vars![5, 6]);
        assert_eq!(connectivity(&left, &disjoint), 0);
        assert!(!is_connected(&left, &disjoint));
    }

    #[test]
    fn goodness_bounds_the_cut() {
        let partitions = vec![var_set(&vars![1]), var_set(&vars![2]), var_set(&vars![3])];
        let empty_cut = VarSet::new();
        let wide_cut = var_set(&vars![1, 2, 3, 4]);

        assert!(Strategy::Disconnected.is_good(&partitions, &empty_cut));
        assert!(!Strategy::Disconnected.is_good(&partitions, &var_set(&vars![1, 2])));
        assert!(Strategy::Fast.is_good(&partitions, &wide_cut));
        assert!(Strategy::default().is_good(&partitions, &wide_cut));
        assert!(!Strategy::default().is_good(&partitions[..1], &empty_cut));
        assert!(Strategy::OnePoint.is_good(&partitions, &var_set(&vars![1, 2, 3])));
        assert!(!Strategy::OnePoint.is_good(&partitions, &wide_cut));
    }

    #[test]
    fn strategy_names_roundtrip() {
        for &strategy in &[
            Strategy::Disconnected,
            Strategy::Fast,
            Strategy::default(),
            Strategy::OnePoint,
        ] {
            assert_eq!(strategy.name().parse::<Strategy>().unwrap(), strategy);
        }
        assert!("cdcl".parse::<Strategy>().is_err());
    }
}
