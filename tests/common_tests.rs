//! Integration tests for common definitions and configuration.

use vliw_pipeliner::common::*;
use vliw_pipeliner::config::Config;

/// Tests the rotating window geometry.
#[test]
fn test_register_file_geometry() {
    assert_eq!(ROTATING_BASE + ROTATING_WINDOW, NUM_REGISTERS);
    assert_eq!(NUM_PREDICATES, NUM_REGISTERS);
}

/// Tests access type mnemonics.
#[test]
fn test_access_type_mnemonic() {
    assert_eq!(AccessType::Read.mnemonic(), "ld");
    assert_eq!(AccessType::Write.mnemonic(), "st");
    assert_ne!(AccessType::Read, AccessType::Write);
}

/// Tests error kind names and messages.
#[test]
fn test_error_kinds() {
    let err = Error::parse(3, "unknown opcode 'divide'");
    assert_eq!(err.kind(), "ParseError");
    assert!(err.to_string().contains("instruction 3"));
    assert!(err.to_string().contains("divide"));

    assert_eq!(Error::infeasible("x").kind(), "InfeasibleSchedule");
    assert_eq!(Error::Dependency { instruction: 0 }.kind(), "DependencyError");

    let div = Error::SimulationDivergence { cycle: 10, pc: 2 };
    assert_eq!(div.kind(), "SimulationDivergence");
    assert!(div.to_string().contains("10 cycles"));
}

/// Tests that an empty configuration yields the defaults.
#[test]
fn test_config_defaults() {
    let config = Config::from_toml("").unwrap();
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.scheduler.max_ii, 1000);
    assert!(config.scheduler.parallel_search);
    assert_eq!(config.simulator.max_cycles, 100_000);
}

/// Tests that a partial configuration keeps defaults for missing fields.
#[test]
fn test_config_partial_override() {
    let config = Config::from_toml(
        r#"
        [scheduler]
        max_ii = 8

        [simulator]
        max_cycles = 50
        "#,
    )
    .unwrap();
    assert_eq!(config.scheduler.max_ii, 8);
    assert!(config.scheduler.parallel_search);
    assert_eq!(config.simulator.max_cycles, 50);
    assert_eq!(config.general.log_level, "info");
}

/// Tests that malformed TOML is reported as a configuration error.
#[test]
fn test_config_rejects_bad_toml() {
    let err = Config::from_toml("[scheduler\nmax_ii = 1").unwrap_err();
    assert_eq!(err.kind(), "Config");
}
