//! VLIW core: architectural state, functional units, and the cycle step.

/// Register files and register rotation.
pub mod arch;

/// Cycle step function and the simulated core.
pub mod cpu;

/// Machine state owned by one simulation run.
pub mod state;

/// Per-cycle trace records.
pub mod trace;

/// Functional units.
pub mod units;

pub use cpu::{step, Cpu};
pub use state::MachineState;
