//! Architectural state of the VLIW core.
//!
//! This module contains the register files and the rotation functions that
//! map register and predicate names to physical slots.

/// General-Purpose Register file implementation.
pub mod gpr;

/// Predicate register file implementation.
pub mod pred;

/// Rotating register base arithmetic.
pub mod rotation;
