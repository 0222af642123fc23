//! The backend solver capability interface.
use std::time::Duration;

use splitsat_formula::{CnfFormula, Solution};

use crate::deadline::Deadline;
use crate::error::SolverError;

/// A solver that can decide one CNF formula, optionally within a time budget.
///
/// This is the single capability the partitioning core requires of a backend. Backends are
/// trusted to honour the budget and report `Undefined` when they run out; the core never
/// interrupts a running backend.
pub trait SatSolver {
    /// Decides `formula`, optionally within `timeout`.
    ///
    /// A `Satisfiable` solution must carry an assignment satisfying `formula`.
    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<Solution, SolverError>;

    /// Decides a batch of formulas under one shared budget.
    ///
    /// The provided implementation solves the batch in order, handing each call whatever is
    /// left of the shared budget, and fails with
    /// [`DeadlineExceeded`](SolverError::DeadlineExceeded) once it runs out between calls.
    fn solve_batch(
        &mut self,
        formulas: &[CnfFormula],
        timeout: Option<Duration>,
    ) -> Result<Vec<Solution>, SolverError> {
        let deadline = Deadline::start(timeout);
        let mut solutions = Vec::with_capacity(formulas.len());
        for formula in formulas {
            deadline.check()?;
            solutions.push(self.solve(formula, deadline.remaining())?);
        }
        Ok(solutions)
    }
}

impl SatSolver for Box<dyn SatSolver> {
    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<Solution, SolverError> {
        (**self).solve(formula, timeout)
    }

    fn solve_batch(
        &mut self,
        formulas: &[CnfFormula],
        timeout: Option<Duration>,
    ) -> Result<Vec<Solution>, SolverError> {
        (**self).solve_batch(formulas, timeout)
    }
}
