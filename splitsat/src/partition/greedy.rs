//! Seeded greedy partitioning.
use std::cmp::Reverse;
use std::collections::BTreeSet;

use vec_mut_scan::VecMutScan;

use splitsat_formula::CnfFormula;

use crate::deadline::Deadline;
use crate::error::SolverError;

use super::{clause_vars, connectivity, VarSet};

/// Grows a fixed number of seed partitions by connectivity.
///
/// The seeds are the clause variable sets overlapping the already chosen seeds least. Two
/// growth passes follow: the first assigns every clause sharing a variable with some partition
/// to the best connected one, the second distributes the leftover orphan clauses.
pub(super) fn partition(
    formula: &CnfFormula,
    seeds: usize,
    deadline: &Deadline,
) -> Result<Vec<VarSet>, SolverError> {
    if formula.len() < 2 || seeds == 0 {
        return Ok(vec![]);
    }
    deadline.check()?;

    // distinct clause variable sets, largest first
    let distinct: BTreeSet<VarSet> = formula.iter().map(clause_vars).collect();
    let mut pool: Vec<VarSet> = distinct.into_iter().collect();
    pool.sort_by_key(|vars| Reverse(vars.len()));

    let mut partitions = seed_partitions(&mut pool, seeds, deadline)?;

    assign_clauses(&mut partitions, &mut pool, 1, deadline)?;
    assign_clauses(&mut partitions, &mut pool, 0, deadline)?;

    partitions.retain(|partition| !partition.is_empty());
    Ok(partitions)
}

/// Picks `seeds` sets from the pool, each overlapping the picks so far as little as possible,
/// ties going to the larger set.
fn seed_partitions(
    pool: &mut Vec<VarSet>,
    seeds: usize,
    deadline: &Deadline,
) -> Result<Vec<VarSet>, SolverError> {
    let mut partitions = Vec::with_capacity(seeds);
    for _ in 0..seeds {
        deadline.check()?;
        if pool.is_empty() {
            break;
        }
        let best = pool
            .iter()
            .enumerate()
            .min_by_key(|(_, vars)| (max_connectivity(&partitions, vars), Reverse(vars.len())))
            .map(|(index, _)| index)
            .unwrap();
        partitions.push(pool.remove(best));
    }
    Ok(partitions)
}

/// The largest overlap between `vars` and any of the given partitions.
fn max_connectivity(partitions: &[VarSet], vars: &VarSet) -> usize {
    partitions
        .iter()
        .map(|partition| connectivity(partition, vars))
        .max()
        .unwrap_or(0)
}

/// Merges every pool entry overlapping some partition by at least `threshold` variables into
/// its best connected partition, ties going to the smaller partition.
fn assign_clauses(
    partitions: &mut [VarSet],
    pool: &mut Vec<VarSet>,
    threshold: usize,
    deadline: &Deadline,
) -> Result<(), SolverError> {
    let mut expired = false;
    let mut scan = VecMutScan::new(pool);
    while let Some(vars) = scan.next() {
        if deadline.expired() {
            expired = true;
            break;
        }
        let (best, overlap) = partitions
            .iter()
            .enumerate()
            .map(|(index, partition)| (index, connectivity(partition, &vars)))
            .min_by_key(|&(index, overlap)| (Reverse(overlap), partitions[index].len(), index))
            .expect("at least one partition");
        if overlap >= threshold {
            let vars = vars.remove();
            partitions[best].extend(vars);
        }
    }
    drop(scan);
    if expired {
        return Err(SolverError::DeadlineExceeded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use splitsat_formula::{cnf_formula, vars};

    #[test]
    fn separates_two_loose_clusters() {
        let formula = cnf_formula![
            1, 2, 3;
            4, 5, 6;
            -1, 2;
            -4, 5;
            3, -2;
            6, -5;
        ];

        let partitions = partition(&formula, 2, &Deadline::unbounded()).unwrap();
        assert_eq!(partitions.len(), 2);

        let first: VarSet = vars![1, 2, 3].iter().copied().collect();
        let second: VarSet = vars![4, 5, 6].iter().copied().collect();
        assert!(partitions.contains(&first));
        assert!(partitions.contains(&second));
    }

    #[test]
    fn orphan_clauses_end_up_somewhere() {
        let formula = cnf_formula![
            1, 2;
            1, -2;
            7, 8;
        ];

        let partitions = partition(&formula, 2, &Deadline::unbounded()).unwrap();
        let all: VarSet = partitions.iter().flatten().copied().collect();
        assert!(all.contains(&splitsat_formula::var!(7)));
        assert!(all.contains(&splitsat_formula::var!(8)));
    }

    #[test]
    fn tiny_formulas_are_not_partitioned() {
        let formula = cnf_formula![1, 2;];
        let partitions = partition(&formula, 2, &Deadline::unbounded()).unwrap();
        assert!(partitions.is_empty());
    }
}
