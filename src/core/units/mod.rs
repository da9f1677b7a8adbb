//! Functional units of the VLIW core.

/// Integer ALU.
pub mod alu;

/// Loop branch unit.
pub mod bru;

/// Load/store unit and data memory.
pub mod lsu;

/// Three-stage multiply pipeline.
pub mod mult;
