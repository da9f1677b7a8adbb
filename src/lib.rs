//! VLIW Loop Scheduler and Simulator Library.
//!
//! This crate schedules straight-line programs with at most one counted loop
//! for a five-slot VLIW machine and simulates the result cycle by cycle.
//!
//! # Architecture
//!
//! * **Scheduler**: a non-overlapped list schedule (`loop`) and a modulo
//!   schedule (`loop.pip`) that software-pipelines the loop with rotating
//!   registers and stage predicates.
//! * **Machine**: two ALUs, a three-stage multiplier, one memory unit and
//!   one branch unit; 96 registers and 96 predicates, 64 of each rotating.
//! * **Simulator**: deterministic cycle step that emits a JSON trace record
//!   per cycle.
//!
//! # Modules
//!
//! * `common`: Shared constants and error handling.
//! * `config`: Configuration loading and parsing.
//! * `core`: Machine state, functional units and the cycle step.
//! * `isa`: Instructions, opcodes, parsing and bundles.
//! * `program`: Input programs and their dependency graphs.
//! * `sched`: Both schedulers, register allocation and bundle encoding.
//! * `sim`: Simulation harness, file loading and comparison.
//! * `stats`: Simulation statistics.

/// Shared types, constants, and error handling.
pub mod common;

/// Configuration system for the scheduler and the simulator.
///
/// Loads TOML configuration files; every field has a default.
pub mod config;

/// VLIW core implementation: register files, functional units and the
/// cycle step function.
pub mod core;

/// Instruction Set Architecture definitions.
///
/// Opcode table, instruction representation, the assembly parser and the
/// five-slot bundle format.
pub mod isa;

/// Input programs, loop regions and dependency analysis.
pub mod program;

/// Instruction scheduling for both loop kinds.
pub mod sched;

/// Simulation harness, loaders and result comparison.
pub mod sim;

/// Performance statistics collection and reporting.
pub mod stats;
