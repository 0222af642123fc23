//! A miniature DPLL backend bundled with the command line front end.
//!
//! The partitioning core never decides formulas itself; this reference backend makes the
//! binary usable without wiring up an external solver. Plain unit propagation plus chronological
//! backtracking, checking the time budget at every decision. Serious workloads should inject a
//! real solver instead.
use std::time::Duration;

use splitsat::{Assignment, CnfFormula, Deadline, Lit, SatSolver, Solution, SolverError, Var};

#[derive(Default)]
pub struct DpllSolver;

enum Verdict {
    Sat,
    Unsat,
    Unknown,
}

impl SatSolver for DpllSolver {
    fn solve(
        &mut self,
        formula: &CnfFormula,
        timeout: Option<Duration>,
    ) -> Result<Solution, SolverError> {
        let deadline = Deadline::start(timeout);
        let mut assignment = Assignment::new(formula.var_count());

        match search(formula, &mut assignment, &deadline) {
            Verdict::Sat => {
                assignment.complete_with(false);
                Ok(Solution::satisfiable(assignment))
            }
            Verdict::Unsat => Ok(Solution::unsatisfiable()),
            Verdict::Unknown => Ok(Solution::undefined()),
        }
    }
}

/// What a single pass over all clauses found out.
enum Scan {
    AllSatisfied,
    Conflict,
    Unit(Lit),
    Branch(Lit),
}

fn scan_clauses(formula: &CnfFormula, assignment: &Assignment) -> Scan {
    let mut branch = None;

    for clause in formula.iter() {
        let mut satisfied = false;
        let mut free = None;
        let mut free_count = 0;

        for &lit in clause {
            match assignment.value(lit.var()) {
                Some(value) if value == lit.is_positive() => {
                    satisfied = true;
                    break;
                }
                Some(_) => {}
                None => {
                    free_count += 1;
                    if free.is_none() {
                        free = Some(lit);
                    }
                }
            }
        }
        if satisfied {
            continue;
        }

        match free_count {
            0 => return Scan::Conflict,
            1 => return Scan::Unit(free.expect("counted a free literal")),
            _ => {
                if branch.is_none() {
                    branch = free;
                }
            }
        }
    }

    match branch {
        None => Scan::AllSatisfied,
        Some(lit) => Scan::Branch(lit),
    }
}

fn search(formula: &CnfFormula, assignment: &mut Assignment, deadline: &Deadline) -> Verdict {
    if deadline.expired() {
        return Verdict::Unknown;
    }

    // propagate units until a decision is needed
    let mut trail = Vec::new();
    let branch = loop {
        match scan_clauses(formula, assignment) {
            Scan::AllSatisfied => return Verdict::Sat,
            Scan::Conflict => {
                undo(assignment, &trail);
                return Verdict::Unsat;
            }
            Scan::Unit(lit) => {
                assignment.set(lit.var(), Some(lit.is_positive()));
                trail.push(lit.var());
            }
            Scan::Branch(lit) => break lit,
        }
    };

    for &value in [branch.is_positive(), !branch.is_positive()].iter() {
        assignment.set(branch.var(), Some(value));
        match search(formula, assignment, deadline) {
            Verdict::Unsat => {}
            verdict => return verdict,
        }
    }
    assignment.set(branch.var(), None);

    undo(assignment, &trail);
    Verdict::Unsat
}

fn undo(assignment: &mut Assignment, trail: &[Var]) {
    for &var in trail {
        assignment.set(var, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use splitsat::SolvingResult;
    use splitsat_formula::cnf_formula;

    #[test]
    fn decides_satisfiable_formulas() {
        let formula = cnf_formula![
            1, 2;
            -1, 2;
            -2, 3;
            1, -3;
        ];
        let solution = DpllSolver::default().solve(&formula, None).unwrap();
        assert_eq!(solution.result, SolvingResult::Satisfiable);
        let assignment = solution.assignment.unwrap();
        assert_eq!(formula.apply(&assignment), SolvingResult::Satisfiable);
    }

    #[test]
    fn decides_unsatisfiable_formulas() {
        let formula = cnf_formula![
            1, 2;
            1, -2;
            -1, 2;
            -1, -2;
        ];
        let solution = DpllSolver::default().solve(&formula, None).unwrap();
        assert_eq!(solution.result, SolvingResult::Unsatisfiable);
    }

    #[test]
    fn gives_up_on_an_expired_budget() {
        let formula = cnf_formula![
            1, 2;
            -1, -2;
        ];
        let solution = DpllSolver::default()
            .solve(&formula, Some(Duration::from_millis(0)))
            .unwrap();
        assert_eq!(solution.result, SolvingResult::Undefined);
    }
}
