//! Backend doubles for tests.
use std::cell::RefCell;
use std::rc::Rc;
use std::thread::sleep;
use std::time::Duration;

use splitsat_formula::{Assignment, CnfFormula, Solution, SolvingResult, Var};

use crate::backend::SatSolver;
use crate::deadline::Deadline;
use crate::error::SolverError;

/// Backend deciding formulas by enumerating all assignments.
///
/// Hopeless on real instances but a convenient oracle for small test formulas. Honours the
/// time budget by giving up between assignments.
pub struct BruteForce;

impl SatSolver for BruteForce {
    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<Solution, SolverError> {
        let deadline = Deadline::start(timeout);
        let var_count = formula.var_count();

        let mut assignment = Assignment::new(var_count);
        assignment.complete_with(false);

        loop {
            if deadline.expired() {
                return Ok(Solution::undefined());
            }
            if formula.apply(&assignment) == SolvingResult::Satisfiable {
                return Ok(Solution::satisfiable(assignment));
            }

            // advance the binary counter, lowest variable first
            let mut index = 0;
            loop {
                if index == var_count {
                    return Ok(Solution::unsatisfiable());
                }
                let var = Var::from_index(index);
                if assignment.value(var) == Some(false) {
                    assignment.set(var, Some(true));
                    break;
                }
                assignment.set(var, Some(false));
                index += 1;
            }
        }
    }
}

/// Backend answering every call with the same canned solution.
pub struct ReplyWith(pub Solution);

impl SatSolver for ReplyWith {
    fn solve(
        &mut self,
        _formula: &CnfFormula,
        _timeout: Option<Duration>,
    ) -> Result<Solution, SolverError> {
        Ok(self.0.clone())
    }
}

/// Backend sleeping for a fixed time before giving up.
pub struct Sleepy(pub Duration);

impl SatSolver for Sleepy {
    fn solve(
        &mut self,
        _formula: &CnfFormula,
        _timeout: Option<Duration>,
    ) -> Result<Solution, SolverError> {
        sleep(self.0);
        Ok(Solution::undefined())
    }
}

/// Wrapper recording every formula dispatched to the inner backend.
pub struct Recording<S> {
    inner: S,
    calls: Rc<RefCell<Vec<CnfFormula>>>,
}

impl<S> Recording<S> {
    pub fn new(inner: S) -> Recording<S> {
        Recording {
            inner,
            calls: Rc::new(RefCell::new(vec![])),
        }
    }

    /// Handle on the recorded formulas, usable after the backend was moved into a solver.
    pub fn calls(&self) -> Rc<RefCell<Vec<CnfFormula>>> {
        self.calls.clone()
    }
}

impl<S: SatSolver> SatSolver for Recording<S> {
    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<Solution, SolverError> {
        self.calls.borrow_mut().push(formula.clone());
        self.inner.solve(formula, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use splitsat_formula::cnf_formula;

    #[test]
    fn brute_force_finds_models() {
        let formula = cnf_formula![
            1, 2;
            -1, 2;
            -2, 3;
        ];
        let solution = BruteForce.solve(&formula, None).unwrap();
        assert_eq!(solution.result, SolvingResult::Satisfiable);
        let assignment = solution.assignment.unwrap();
        assert_eq!(formula.apply(&assignment), SolvingResult::Satisfiable);
    }

    #[test]
    fn brute_force_exhausts_unsat_formulas() {
        let formula = cnf_formula![
            1;
            -1;
        ];
        let solution = BruteForce.solve(&formula, None).unwrap();
        assert_eq!(solution.result, SolvingResult::Unsatisfiable);
    }

    #[test]
    fn batch_solving_shares_its_deadline() {
        let problems = vec![cnf_formula![1;], cnf_formula![2;], cnf_formula![3;]];
        let mut sleepy = Sleepy(Duration::from_millis(10));
        match sleepy.solve_batch(&problems, Some(Duration::from_millis(1))) {
            Err(SolverError::DeadlineExceeded) => (),
            other => panic!("unexpected result: {:?}", other),
        }

        let mut brute = BruteForce;
        let solutions = brute.solve_batch(&problems, None).unwrap();
        assert_eq!(solutions.len(), 3);
        assert!(solutions
            .iter()
            .all(|solution| solution.result == SolvingResult::Satisfiable));
    }
}
