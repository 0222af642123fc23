//! Error types of the partitioning core.
use thiserror::Error;

/// Possible errors while solving.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The time budget ran out.
    ///
    /// Raised from deadline checks inside the core and converted to an undefined solution at
    /// the public entry point; callers of [`PartitionSolver::solve`](crate::PartitionSolver)
    /// never see this variant.
    #[error("time limit exceeded")]
    DeadlineExceeded,

    /// No backend solver was injected before solving.
    #[error("no partition solver configured")]
    NoBackend,

    /// The backend signalled an internal fault. Propagated verbatim and never retried.
    #[error("backend solver failed: {0}")]
    Backend(#[source] anyhow::Error),

    /// A sub-solution violated a contract of the core, e.g. a satisfiable solution without an
    /// assignment. Always a programmer error, never an input error.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl SolverError {
    pub(crate) fn invariant(message: impl Into<String>) -> SolverError {
        SolverError::InvariantViolation(message.into())
    }
}
