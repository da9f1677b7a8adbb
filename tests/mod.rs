//! Test module organization.
//!
//! This module organizes all integration tests for the VLIW scheduler and
//! simulator.


/// Register file, rotation and multiply pipeline tests.
mod arch_tests;

/// Common definitions and configuration tests.
mod common_tests;

/// Dependency graph tests.
mod deps_tests;


/// Instruction parsing, rendering and bundle tests.
mod isa_tests;



/// Cycle simulator tests.
mod sim_tests;
