//! A SAT partitioning meta solver.
//!
//! Splitsat decomposes a CNF formula into sub-formulas that share only a small set of cut
//! variables, dispatches the sub-formulas to a pluggable backend solver and reassembles the
//! sub-models into a model of the whole formula. Four partition strategies are available; each
//! detects when a formula does not decompose well and falls back to the backend on the whole
//! formula. The backend is anything implementing [`SatSolver`]; this crate never decides a
//! formula on its own.
//!
//! All long-running work cooperates with a wall clock budget: an expired budget yields an
//! undefined solution, never a partial model.
pub mod backend;
pub mod cut;
pub mod deadline;
pub mod error;
pub mod partition;
pub mod solver;

#[cfg(test)]
mod test;

pub use backend::SatSolver;
pub use deadline::Deadline;
pub use error::SolverError;
pub use partition::Strategy;
pub use solver::PartitionSolver;

pub use splitsat_formula::{
    truth_table, Assignment, CnfFormula, Lit, PartialAssignment, Solution, SolvingResult, Var,
};
