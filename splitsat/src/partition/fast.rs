//! Linear sweep partitioning.
use std::cmp::Reverse;

use itertools::Itertools;
use vec_mut_scan::VecMutScan;

use splitsat_formula::CnfFormula;

use crate::deadline::Deadline;
use crate::error::SolverError;

use super::{clause_vars, is_connected, VarSet};

/// Greedy linear sweep.
///
/// Clauses are taken largest first, as larger clauses touch more variables and anchor a
/// partition better. Each clause is absorbed into the partition currently being grown as soon
/// as it shares a variable with it; once a full pass absorbs nothing, the next leftover clause
/// anchors a new partition and the sweep continues there.
pub(super) fn partition(
    formula: &CnfFormula,
    deadline: &Deadline,
) -> Result<Vec<VarSet>, SolverError> {
    let mut pool: Vec<VarSet> = formula
        .iter()
        .sorted_by_key(|clause| Reverse(clause.len()))
        .map(clause_vars)
        .collect();

    let mut partitions: Vec<VarSet> = Vec::new();
    if pool.is_empty() {
        return Ok(partitions);
    }
    partitions.push(pool.remove(0));
    let mut current = 0;

    while !pool.is_empty() {
        deadline.check()?;

        let mut absorbed_any = false;
        let mut expired = false;
        let mut scan = VecMutScan::new(&mut pool);
        while let Some(vars) = scan.next() {
            if deadline.expired() {
                expired = true;
                break;
            }
            if is_connected(&partitions[current], &vars) {
                let vars = vars.remove();
                partitions[current].extend(vars);
                absorbed_any = true;
            }
        }
        drop(scan);
        if expired {
            return Err(SolverError::DeadlineExceeded);
        }

        if !absorbed_any {
            partitions.push(pool.remove(0));
            current += 1;
        }
    }

    Ok(partitions)
}
