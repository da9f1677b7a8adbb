//! Common types shared by the scheduler and the simulator.
//!
//! This module provides the crate-wide error type, memory access
//! classification, and the architectural constants of the target
//! VLIW machine (register file sizes and the rotating window).

/// Architectural constants of the target machine.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Error types shared by every stage of the tool chain.
pub mod error;

pub use data::AccessType;
pub use error::{Error, Result};

pub use constants::{NUM_PREDICATES, NUM_REGISTERS, ROTATING_BASE, ROTATING_WINDOW};
