//! Single articulation point decomposition.
//!
//! Targets formulas shaped like several dense blocks joined through a small set of shared
//! variables. The structural phase glues clauses into blocks until only the shared variables
//! connect them; the solving phase enumerates a truth table over every peripheral block's
//! shared variables, turns unsatisfiable rows into blocking clauses of a center problem and
//! splices one surviving row per block into the final model.
use std::cmp::Reverse;

use log::{debug, info};

use splitsat_formula::{
    truth_table, CnfFormula, PartialAssignment, Solution, SolvingResult, Var,
};

use crate::backend::SatSolver;
use crate::cut;
use crate::deadline::Deadline;
use crate::error::SolverError;

use super::{clause_vars, connectivity, is_connected, project_clauses, VarSet};

/// One block of the decomposition: clause indices plus the variables they touch.
#[derive(Clone, Debug)]
struct Block {
    clauses: Vec<usize>,
    vars: VarSet,
}

impl Block {
    fn absorb(&mut self, other: Block) {
        self.clauses.extend(other.clauses);
        self.vars.extend(other.vars);
    }
}

/// Result of the structural phase: glued blocks, the largest one last, plus the clauses that
/// share no variable with the rest of the formula.
pub(crate) struct Decomposition {
    blocks: Vec<Block>,
    loose_clauses: Vec<usize>,
}

impl Decomposition {
    /// The blocks as plain variable sets, for cut computation and goodness checks.
    pub(crate) fn var_sets(&self) -> Vec<VarSet> {
        self.blocks.iter().map(|block| block.vars.clone()).collect()
    }
}

/// Runs the structural phase on `formula`.
pub(crate) fn decompose(
    formula: &CnfFormula,
    deadline: &Deadline,
) -> Result<Decomposition, SolverError> {
    // every clause starts as its own block, largest first
    let mut order: Vec<usize> = (0..formula.len()).collect();
    order.sort_by_key(|&index| Reverse(formula.clause(index).len()));

    let mut blocks: Vec<Block> = order
        .into_iter()
        .map(|index| Block {
            clauses: vec![index],
            vars: clause_vars(formula.clause(index)),
        })
        .collect();
    let mut loose_clauses = Vec::new();

    merge_connected(&mut blocks, deadline)?;
    sweep_lonely(&mut blocks, &mut loose_clauses, deadline)?;
    merge_connected(&mut blocks, deadline)?;
    absorb_singletons(&mut blocks, deadline)?;
    merge_connected(&mut blocks, deadline)?;

    // the center block goes last: most clauses, ties by most variables
    blocks.sort_by_key(|block| (block.clauses.len(), block.vars.len()));

    Ok(Decomposition {
        blocks,
        loose_clauses,
    })
}

/// Repeatedly merges any two blocks sharing at least two variables, until none such remain.
fn merge_connected(blocks: &mut Vec<Block>, deadline: &Deadline) -> Result<(), SolverError> {
    loop {
        let mut merged = false;
        let mut left = 0;
        while left < blocks.len() {
            deadline.check()?;
            let mut right = left + 1;
            while right < blocks.len() {
                if connectivity(&blocks[left].vars, &blocks[right].vars) >= 2 {
                    let other = blocks.remove(right);
                    blocks[left].absorb(other);
                    merged = true;
                } else {
                    right += 1;
                }
            }
            left += 1;
        }
        if !merged {
            return Ok(());
        }
    }
}

/// Resolves single clause blocks: a block overlapping exactly one other block is merged into
/// it, a block overlapping nothing becomes a loose clause, anything else is left alone.
fn sweep_lonely(
    blocks: &mut Vec<Block>,
    loose_clauses: &mut Vec<usize>,
    deadline: &Deadline,
) -> Result<(), SolverError> {
    let mut index = 0;
    while index < blocks.len() {
        deadline.check()?;
        if blocks[index].clauses.len() != 1 {
            index += 1;
            continue;
        }
        let mut neighbours = (0..blocks.len()).filter(|&other| {
            other != index && is_connected(&blocks[other].vars, &blocks[index].vars)
        });
        match (neighbours.next(), neighbours.next()) {
            (None, _) => {
                let block = blocks.remove(index);
                loose_clauses.push(block.clauses[0]);
            }
            (Some(only), None) => {
                let block = blocks.remove(index);
                let target = if only > index { only - 1 } else { only };
                blocks[target].absorb(block);
            }
            _ => index += 1,
        }
    }
    Ok(())
}

/// Folds every remaining single clause block into the smallest block it shares a variable
/// with, if any.
fn absorb_singletons(blocks: &mut Vec<Block>, deadline: &Deadline) -> Result<(), SolverError> {
    let mut index = 0;
    while index < blocks.len() {
        deadline.check()?;
        if blocks[index].clauses.len() != 1 {
            index += 1;
            continue;
        }
        let target = (0..blocks.len())
            .filter(|&other| {
                other != index && is_connected(&blocks[other].vars, &blocks[index].vars)
            })
            .min_by_key(|&other| (blocks[other].vars.len(), other));
        match target {
            Some(other) => {
                let block = blocks.remove(index);
                let target = if other > index { other - 1 } else { other };
                blocks[target].absorb(block);
            }
            None => index += 1,
        }
    }
    Ok(())
}

/// The rows of one peripheral block's truth table together with the backend's verdicts.
struct PeripheralTable<'a> {
    block: &'a Block,
    rows: Vec<PartialAssignment>,
    solutions: Vec<Solution>,
}

/// Solves `formula` by one point decomposition, falling back to the backend on the whole
/// formula when the decomposition is not worth its truth table enumeration.
pub(crate) fn solve(
    formula: &CnfFormula,
    backend: &mut dyn SatSolver,
    deadline: &Deadline,
) -> Result<Solution, SolverError> {
    let decomposition = decompose(formula, deadline)?;
    let var_sets = decomposition.var_sets();
    let cut = cut::cut_set(&var_sets, deadline)?;

    if var_sets.len() <= 1 || cut.len() > var_sets.len() {
        debug!(
            "one-point: rejected decomposition ({} blocks, cut of {}), solving directly",
            var_sets.len(),
            cut.len()
        );
        deadline.check()?;
        return backend.solve(formula, deadline.remaining());
    }
    info!(
        "one-point: {} blocks with a cut of {}, {} loose clause(s)",
        var_sets.len(),
        cut.len(),
        decomposition.loose_clauses.len()
    );

    let (center, peripherals) = decomposition
        .blocks
        .split_last()
        .expect("checked above to have blocks");

    // solve every peripheral once per assignment of its shared variables
    let mut tables = Vec::with_capacity(peripherals.len());
    for block in peripherals {
        deadline.check()?;
        let shared: Vec<Var> = block.vars.intersection(&cut).copied().collect();
        let rows = truth_table(&shared);
        let problems: Vec<CnfFormula> = rows
            .iter()
            .map(|row| {
                let mut problem = project_clauses(formula, &block.clauses);
                for unit in row.to_units() {
                    problem.add_clause(&[unit]);
                }
                problem
            })
            .collect();
        let solutions = backend.solve_batch(&problems, deadline.remaining())?;
        tables.push(PeripheralTable {
            block,
            rows,
            solutions,
        });
    }

    // center problem: the center clauses plus one blocking clause per failed row
    let mut center_problem = project_clauses(formula, &center.clauses);
    let mut blocked = 0;
    for table in tables.iter() {
        for (row, solution) in table.rows.iter().zip(table.solutions.iter()) {
            deadline.check()?;
            match solution.result {
                SolvingResult::Satisfiable => {}
                SolvingResult::Unsatisfiable => {
                    center_problem.add_clause(&row.blocking_clause());
                    blocked += 1;
                }
                // a backend gave up on a row; no sound center problem can be built
                SolvingResult::Undefined => return Ok(Solution::undefined()),
            }
        }
    }
    debug!(
        "one-point: center problem has {} clauses, {} of them blocking",
        center_problem.len(),
        blocked
    );

    deadline.check()?;
    let center_solution = backend.solve(&center_problem, deadline.remaining())?;
    let mut assignment = match center_solution.result {
        SolvingResult::Satisfiable => center_solution
            .assignment
            .ok_or_else(|| SolverError::invariant("satisfiable center solution without assignment"))?,
        SolvingResult::Unsatisfiable => return Ok(Solution::unsatisfiable()),
        SolvingResult::Undefined => return Ok(Solution::undefined()),
    };

    // splice the matching row's model into the center model, block by block
    for table in tables.iter() {
        deadline.check()?;
        let row_index = table
            .rows
            .iter()
            .enumerate()
            .position(|(index, row)| {
                table.solutions[index].result.is_satisfiable()
                    && row.is_compatible_with(&assignment)
            })
            .ok_or_else(|| SolverError::invariant("no truth table row matches the center model"))?;
        let sub_assignment = table.solutions[row_index]
            .assignment
            .as_ref()
            .ok_or_else(|| SolverError::invariant("satisfiable sub-solution without assignment"))?;

        for &var in table.block.vars.iter() {
            // shared variables keep their center model value
            if cut.contains(&var) {
                continue;
            }
            assignment.set(var, sub_assignment.value(var));
        }
        // pin any shared variable the center model left open
        for (var, value) in table.rows[row_index].iter() {
            if assignment.value(var).is_none() {
                assignment.set(var, Some(value));
            }
        }
    }

    // loose clauses constrain variables nothing else touches
    for &index in decomposition.loose_clauses.iter() {
        let clause = formula.clause(index);
        if clause.iter().any(|&lit| assignment.satisfies(lit)) {
            continue;
        }
        match clause.first() {
            Some(&lit) => assignment.set(lit.var(), Some(lit.is_positive())),
            // an empty clause cannot be satisfied by anything
            None => return Ok(Solution::unsatisfiable()),
        }
    }

    assignment.complete_with(false);
    match formula.apply(&assignment) {
        SolvingResult::Satisfiable => Ok(Solution::satisfiable(assignment)),
        _ => Err(SolverError::invariant(
            "merged one-point model does not satisfy the formula",
        )),
    }
}
