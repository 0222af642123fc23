//! The partitioning meta solver.
use std::time::Duration;

use log::{debug, info};

use splitsat_formula::{Assignment, CnfFormula, Lit, Solution, SolvingResult, Var};

use crate::backend::SatSolver;
use crate::cut;
use crate::deadline::Deadline;
use crate::error::SolverError;
use crate::partition::{one_point, Strategy, VarSet};

/// Solves formulas by decomposing them into loosely coupled sub-formulas and dispatching those
/// to an injected backend solver.
///
/// The solver never decides a formula itself. When a decomposition is not worth its cut
/// enumeration the whole formula goes to the backend unchanged, so a `PartitionSolver` is never
/// worse than its backend on the same input, up to partitioning overhead.
///
/// A `PartitionSolver` implements [`SatSolver`], so partitioners can be nested.
pub struct PartitionSolver {
    strategy: Strategy,
    backend: Option<Box<dyn SatSolver>>,
}

impl PartitionSolver {
    /// Creates a solver using the given strategy.
    ///
    /// A backend must be injected with
    /// [`set_partition_solver`](PartitionSolver::set_partition_solver) before solving.
    pub fn new(strategy: Strategy) -> PartitionSolver {
        PartitionSolver {
            strategy,
            backend: None,
        }
    }

    /// Injects the backend used for sub-formulas and fallbacks.
    pub fn set_partition_solver(&mut self, backend: Box<dyn SatSolver>) {
        self.backend = Some(backend);
    }

    /// The strategy this solver partitions with.
    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Solves `formula`, optionally within a wall clock budget.
    ///
    /// An exceeded deadline is reported as an undefined solution, never as an error; errors are
    /// reserved for a missing backend, backend faults and broken invariants.
    pub fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<Solution, SolverError> {
        let deadline = Deadline::start(timeout);
        let backend = self.backend.as_mut().ok_or(SolverError::NoBackend)?;
        match solve_with(self.strategy, backend.as_mut(), formula, &deadline) {
            Err(SolverError::DeadlineExceeded) => Ok(Solution::undefined()),
            other => other,
        }
    }
}

impl SatSolver for PartitionSolver {
    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<Solution, SolverError> {
        PartitionSolver::solve(self, formula, timeout)
    }
}

fn solve_with(
    strategy: Strategy,
    backend: &mut dyn SatSolver,
    formula: &CnfFormula,
    deadline: &Deadline,
) -> Result<Solution, SolverError> {
    if formula.is_empty() {
        // without clauses every complete assignment is a model
        let mut assignment = Assignment::new(formula.var_count());
        assignment.complete_with(false);
        return Ok(Solution::satisfiable(assignment));
    }
    if formula.iter().any(|clause| clause.is_empty()) {
        // an empty clause defeats any assignment; it also has no variables, so no
        // partition would ever receive it
        return Ok(Solution::unsatisfiable());
    }

    if let Strategy::OnePoint = strategy {
        // one point gluing replaces the generic cut enumeration entirely
        return one_point::solve(formula, backend, deadline);
    }

    let mut partitions = strategy.partition(formula, deadline)?;
    partitions.retain(|partition| !partition.is_empty());

    if partitions.len() <= 1 {
        debug!(
            "{}: {} partition(s), solving directly",
            strategy.name(),
            partitions.len()
        );
        deadline.check()?;
        return backend.solve(formula, deadline.remaining());
    }

    let cut = cut::cut_set(&partitions, deadline)?;
    if !strategy.is_good(&partitions, &cut) {
        info!(
            "{}: rejected partitioning ({} partitions, cut of {}), solving directly",
            strategy.name(),
            partitions.len(),
            cut.len()
        );
        deadline.check()?;
        return backend.solve(formula, deadline.remaining());
    }
    info!(
        "{}: {} partitions with a cut of {}",
        strategy.name(),
        partitions.len(),
        cut.len()
    );

    // first try fixing every cut variable to its majority polarity
    let guess = cut::optimistic_assignment(formula, &cut, deadline)?;
    let trial = merge_subsolutions(formula, &partitions, &cut, &guess, backend, deadline)?;
    match trial.result {
        SolvingResult::Satisfiable => return Ok(trial),
        // a backend gave up; enumerating further cut assignments cannot be trusted
        SolvingResult::Undefined => return Ok(trial),
        // an unsatisfiable guess proves nothing, enumerate all cut assignments
        SolvingResult::Unsatisfiable => {}
    }

    let mut assignment = Assignment::new(formula.var_count());
    enumerate(formula, &partitions, &cut, &mut assignment, 0, backend, deadline)
}

/// Walks the cut variables in index order, trying true before false, and attempts a merge at
/// every complete cut assignment.
///
/// Exponential in the cut size; the strategy's goodness check is what bounds this. The single
/// assignment is mutated on the way down and reset on the way back up.
fn enumerate(
    formula: &CnfFormula,
    partitions: &[VarSet],
    cut: &VarSet,
    assignment: &mut Assignment,
    from_index: usize,
    backend: &mut dyn SatSolver,
    deadline: &Deadline,
) -> Result<Solution, SolverError> {
    deadline.check()?;

    let next = (from_index..formula.var_count())
        .find(|&index| cut.contains(&Var::from_index(index)));
    let index = match next {
        // every cut variable is assigned, attempt to merge
        None => return merge_subsolutions(formula, partitions, cut, assignment, backend, deadline),
        Some(index) => index,
    };
    let var = Var::from_index(index);

    for &value in [true, false].iter() {
        assignment.set(var, Some(value));
        let solution = enumerate(
            formula,
            partitions,
            cut,
            assignment,
            index + 1,
            backend,
            deadline,
        )?;
        match solution.result {
            SolvingResult::Unsatisfiable => {}
            // found a model, or a backend gave up and the enumeration must stop
            _ => return Ok(solution),
        }
    }
    assignment.set(var, None);

    Ok(Solution::unsatisfiable())
}

/// Tries one cut assignment: conditions the formula on it, routes the remaining clauses to
/// their partitions, dispatches every sub-formula to the backend and splices the sub-models
/// together.
///
/// `Satisfiable` means the returned model satisfies the whole formula. `Unsatisfiable` rejects
/// only this cut assignment. When the cut assignment collapses everything onto a single
/// partition, decomposition buys nothing and the backend gets the whole formula instead.
fn merge_subsolutions(
    formula: &CnfFormula,
    partitions: &[VarSet],
    cut: &VarSet,
    guess: &Assignment,
    backend: &mut dyn SatSolver,
    deadline: &Deadline,
) -> Result<Solution, SolverError> {
    let remaining = simplify_clauses(formula, guess, deadline)?;
    let routed = route_clauses(formula, partitions, &remaining, deadline)?;

    let populated = routed.iter().filter(|clauses| !clauses.is_empty()).count();
    if populated <= 1 {
        debug!(
            "cut assignment leaves {} populated partition(s), solving directly",
            populated
        );
        deadline.check()?;
        return backend.solve(formula, deadline.remaining());
    }

    let problems: Vec<CnfFormula> = routed
        .iter()
        .map(|clauses| conditioned_problem(formula, clauses, guess))
        .collect();

    deadline.check()?;
    let solutions = backend.solve_batch(&problems, deadline.remaining())?;
    if solutions.len() != partitions.len() {
        return Err(SolverError::invariant(
            "backend returned a wrong number of batch solutions",
        ));
    }

    // an undefined sub-solution poisons the whole call, even when another partition already
    // came back unsatisfiable
    if solutions
        .iter()
        .any(|solution| solution.result == SolvingResult::Undefined)
    {
        return Ok(Solution::undefined());
    }
    if solutions
        .iter()
        .any(|solution| solution.result == SolvingResult::Unsatisfiable)
    {
        return Ok(Solution::unsatisfiable());
    }

    let mut assignment = guess.clone();
    for (partition, solution) in partitions.iter().zip(solutions.iter()) {
        deadline.check()?;
        let sub_assignment = solution
            .assignment
            .as_ref()
            .ok_or_else(|| SolverError::invariant("satisfiable sub-solution without assignment"))?;

        for &var in partition.iter() {
            // cut variables keep the guessed value
            if cut.contains(&var) {
                continue;
            }
            assignment.set(var, sub_assignment.value(var));
        }
    }

    assignment.complete_with(false);
    match formula.apply(&assignment) {
        SolvingResult::Satisfiable => Ok(Solution::satisfiable(assignment)),
        _ => Err(SolverError::invariant(
            "merged sub-models do not satisfy the formula",
        )),
    }
}

/// The indices of the clauses not yet satisfied by `guess`.
fn simplify_clauses(
    formula: &CnfFormula,
    guess: &Assignment,
    deadline: &Deadline,
) -> Result<Vec<usize>, SolverError> {
    let mut remaining = Vec::with_capacity(formula.len());
    for (index, clause) in formula.iter().enumerate() {
        deadline.check()?;
        if !clause.iter().any(|&lit| guess.satisfies(lit)) {
            remaining.push(index);
        }
    }
    Ok(remaining)
}

/// Routes every remaining clause to each partition whose variable set it touches.
fn route_clauses(
    formula: &CnfFormula,
    partitions: &[VarSet],
    remaining: &[usize],
    deadline: &Deadline,
) -> Result<Vec<Vec<usize>>, SolverError> {
    let mut routed = vec![Vec::new(); partitions.len()];
    for (partition, clauses) in partitions.iter().zip(routed.iter_mut()) {
        deadline.check()?;
        for &index in remaining {
            if formula
                .clause(index)
                .iter()
                .any(|lit| partition.contains(&lit.var()))
            {
                clauses.push(index);
            }
        }
    }
    Ok(routed)
}

/// Builds one partition's sub-formula, dropping the literals the guess falsifies.
///
/// Clauses satisfied by the guess are already gone, so after dropping, the sub-formulas of one
/// cut assignment contain no variable the guess defines; their models cannot contradict it. A
/// clause losing all its literals this way makes the sub-formula trivially unsatisfiable,
/// rejecting the guess. An empty sub-formula is replaced with a tautology, because some
/// backends reject formulas without clauses.
fn conditioned_problem(formula: &CnfFormula, clauses: &[usize], guess: &Assignment) -> CnfFormula {
    if clauses.is_empty() {
        return tautology(formula.var_count());
    }
    let mut problem = CnfFormula::with_var_count(formula.var_count());
    for &index in clauses {
        let literals: Vec<Lit> = formula
            .clause(index)
            .iter()
            .copied()
            .filter(|&lit| guess.value(lit.var()).is_none())
            .collect();
        problem.add_clause(&literals);
    }
    problem
}

/// A trivially satisfiable stand-in for an empty sub-formula.
fn tautology(var_count: usize) -> CnfFormula {
    let var = Var::from_index(0);
    let mut formula = CnfFormula::with_var_count(var_count.max(1));
    formula.add_clause(&[var.positive(), var.negative()]);
    formula
}
