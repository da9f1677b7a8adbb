//! Error Types.
//!
//! Every failure of the tool chain is reported through [`Error`]. Each
//! variant names the offending instruction or cycle so that a failed run
//! can be diagnosed from the message alone. Nothing is recovered silently:
//! a scheduler or simulator run either completes or returns one of these.

use thiserror::Error;

/// Errors produced while parsing, scheduling, or simulating a program.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed program text, unknown opcode, or out-of-range operand.
    #[error("ParseError at instruction {line}: {reason}")]
    Parse {
        /// Index of the offending instruction (or bundle) in its input list.
        line: usize,
        /// Human readable description of the problem.
        reason: String,
    },

    /// A dependency cycle that is not broken by a loop-carried edge.
    #[error("DependencyError: instruction {instruction} is part of a same-iteration dependency cycle")]
    Dependency {
        /// Program index of an instruction on the cycle.
        instruction: usize,
    },

    /// The modulo scheduler or the register allocator gave up.
    #[error("InfeasibleSchedule: {reason}")]
    InfeasibleSchedule {
        /// Why no schedule could be produced.
        reason: String,
    },

    /// The simulation did not terminate within the configured cycle bound.
    #[error("SimulationDivergence: no termination after {cycle} cycles (pc={pc})")]
    SimulationDivergence {
        /// Cycle at which the run was aborted.
        cycle: u64,
        /// Program counter at the time of the abort.
        pc: usize,
    },

    /// A broken internal invariant (scheduler bug), never a user error.
    #[error("internal invariant violated: {0}")]
    Internal(String),

    /// Reading or writing a file failed.
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// File that was being accessed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    /// Builds a [`Error::Parse`] for the instruction at `line`.
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Error::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// Builds an [`Error::InfeasibleSchedule`].
    pub fn infeasible(reason: impl Into<String>) -> Self {
        Error::InfeasibleSchedule {
            reason: reason.into(),
        }
    }

    /// Short kind name used by the CLI when reporting a failure.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Parse { .. } => "ParseError",
            Error::Dependency { .. } => "DependencyError",
            Error::InfeasibleSchedule { .. } => "InfeasibleSchedule",
            Error::SimulationDivergence { .. } => "SimulationDivergence",
            Error::Internal(_) => "Internal",
            Error::Io { .. } => "Io",
            Error::Json(_) => "Json",
            Error::Config(_) => "Config",
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
