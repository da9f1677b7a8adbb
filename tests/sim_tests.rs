//! Integration tests for the cycle simulator.

use vliw_pipeliner::common::Error;
use vliw_pipeliner::config::{SchedulerConfig, SimulatorConfig};
use vliw_pipeliner::core::trace;
use vliw_pipeliner::core::{step, MachineState};
use vliw_pipeliner::isa::Bundle;
use vliw_pipeliner::program::Program;
use vliw_pipeliner::sched::schedule_program;
use vliw_pipeliner::sim::{self, compare};

const SUM_OF_SQUARES: &[&str] = &[
    "mov LC, 9",
    "mov x1, 0x1000",
    "mov x2, 1",
    "mov x3, 0",
    "mulu x4, x2, x2",
    "add x3, x3, x4",
    "addi x2, x2, 1",
    "st x4, 0(x1)",
    "addi x1, x1, 8",
    "loop 4",
    "st x3, 0(x1)",
];

fn bundles(rows: &[[&str; 5]]) -> Vec<Bundle> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| Bundle::parse(row, i).unwrap())
        .collect()
}

fn run_both(lines: &[&str]) -> (sim::SimulationResult, sim::SimulationResult) {
    let program = Program::from_lines(lines).unwrap();
    let (simple, pip) = schedule_program(&program, &SchedulerConfig::default()).unwrap();
    let config = SimulatorConfig::default();
    (
        sim::run(&simple.bundles().unwrap(), &config).unwrap(),
        sim::run(&pip.bundles().unwrap(), &config).unwrap(),
    )
}

/// Tests that every slot reads the state from before the cycle.
#[test]
fn test_step_reads_pre_cycle_state() {
    let program = bundles(&[["mov x1, 5", "add x2, x1, x1", "nop", "nop", "nop"]]);
    let (state, record) = step(MachineState::new(), &program);

    assert_eq!(state.regs.read(1, 0), 5);
    assert_eq!(state.regs.read(2, 0), 0);
    assert_eq!(state.pc, 1);
    assert_eq!(record.alu0.target_reg, Some(1));
    assert_eq!(record.alu0.value, Some(5));
    assert_eq!(record.alu1.value, Some(0));
    assert_eq!(record.branch.opcode, "nop");
    assert_eq!(record.memory.predicate, None);
}

/// Tests that a false guard suppresses the write but is still traced.
#[test]
fn test_guarded_instruction_is_squashed() {
    let program = bundles(&[
        ["mov p1, false", "mov x1, 7", "nop", "nop", "nop"],
        ["(p1) add x2, x1, x1", "(p2) add x3, x1, x1", "nop", "nop", "nop"],
    ]);
    let (state, _) = step(MachineState::new(), &program);
    let (state, record) = step(state, &program);

    assert_eq!(record.alu0.predicate, Some(false));
    assert_eq!(record.alu0.value, None);
    assert_eq!(record.alu1.predicate, Some(true));
    assert_eq!(state.regs.read(2, 0), 0);
    assert_eq!(state.regs.read(3, 0), 14);
}

/// Tests loads and stores through the memory slot.
#[test]
fn test_memory_slot() {
    let program = bundles(&[
        ["mov x1, 0x100", "mov x2, 99", "nop", "nop", "nop"],
        ["nop", "nop", "nop", "st x2, 8(x1)", "nop"],
        ["nop", "nop", "nop", "ld x3, 8(x1)", "nop"],
    ]);
    let result = sim::run(&program, &SimulatorConfig::default()).unwrap();
    let store = &result.trace[1].memory;
    assert_eq!(store.opcode, "st");
    assert_eq!(store.address, Some(0x108));
    assert_eq!(store.data, Some(99));
    assert_eq!(store.load_dest_reg, None);

    let load = &result.trace[2].memory;
    assert_eq!(load.opcode, "ld");
    assert_eq!(load.load_dest_reg, Some(3));
    assert_eq!(result.final_state.regs.read(3, 0), 99);
    assert_eq!(result.final_state.memory.read(0x108), 99);
}

/// Tests that a multiply is visible in stage 2 two cycles after issue and
/// readable by the consumer three cycles after issue.
#[test]
fn test_multiply_pipeline_in_trace() {
    let program = Program::from_lines(&["mov x1, 3", "mulu x2, x1, x1", "add x3, x2, x1"]).unwrap();
    let (simple, _) = schedule_program(&program, &SchedulerConfig::default()).unwrap();
    let result = sim::run(&simple.bundles().unwrap(), &SimulatorConfig::default()).unwrap();
    let t = &result.trace;

    assert_eq!(t.len(), 5);
    assert_eq!(t[1].multiply[0].result, Some(9));
    assert_eq!(t[1].multiply[0].target_reg, Some(2));
    assert_eq!(t[2].multiply[1].result, Some(9));
    assert_eq!(t[3].multiply[2].result, Some(9));
    assert_eq!(t[2].registers[2], 0);
    assert_eq!(t[3].registers[2], 9);
    assert_eq!(t[4].alu0.value, Some(12));
    assert_eq!(result.stats.mults_retired, 1);
}

/// Tests that the simulation keeps running past the last bundle until the
/// multiply pipeline has drained.
#[test]
fn test_halt_waits_for_multiply() {
    let program = bundles(&[["mov x1, 4", "nop", "nop", "nop", "nop"], ["nop", "nop", "mulu x2, x1, x1", "nop", "nop"]]);
    let result = sim::run(&program, &SimulatorConfig::default()).unwrap();
    assert_eq!(result.trace.len(), 4);
    assert_eq!(result.trace[3].pc, 2);
    assert_eq!(result.final_state.regs.read(2, 0), 16);
}

/// Tests the counted `loop` branch.
#[test]
fn test_plain_loop_counts() {
    let program = bundles(&[
        ["mov LC, 3", "nop", "nop", "nop", "nop"],
        ["addi x1, x1, 2", "nop", "nop", "nop", "loop 1"],
    ]);
    let result = sim::run(&program, &SimulatorConfig::default()).unwrap();
    assert_eq!(result.trace.len(), 5);
    assert_eq!(result.final_state.regs.read(1, 0), 8);
    assert_eq!(result.final_state.lc, 0);
    assert_eq!(result.trace[1].branch.target_pc, Some(1));
    assert_eq!(result.trace[4].branch.target_pc, None);
    assert_eq!(result.stats.loop_iterations, 3);
}

/// Tests rotation, stage predicates and the drain phase of `loop.pip`.
#[test]
fn test_pipelined_loop_rotates() {
    let program = bundles(&[
        ["mov LC, 1", "mov EC, 1", "nop", "nop", "nop"],
        ["mov p32, true", "mov p33, false", "nop", "nop", "nop"],
        ["nop", "nop", "nop", "nop", "loop.pip 2"],
    ]);
    let result = sim::run(&program, &SimulatorConfig::default()).unwrap();
    let t = &result.trace;

    assert_eq!(t.len(), 5);
    assert_eq!((t[2].rbb, t[2].lc, t[2].ec), (1, 0, 1));
    assert!(t[2].predicates[95]);
    assert_eq!((t[3].rbb, t[3].lc, t[3].ec), (2, 0, 0));
    assert!(!t[3].predicates[94]);
    assert_eq!(t[4].rbb, 2);
    assert_eq!(t[4].branch.target_pc, None);
    assert_eq!(result.stats.loop_iterations, 1);
    assert_eq!(result.stats.drain_iterations, 1);
}

/// Tests that a run exceeding the cycle bound diverges.
#[test]
fn test_divergence() {
    let program = bundles(&[
        ["mov LC, 1000", "nop", "nop", "nop", "nop"],
        ["nop", "nop", "nop", "nop", "loop 1"],
    ]);
    let config = SimulatorConfig {
        max_cycles: 50,
        ..SimulatorConfig::default()
    };
    match sim::run(&program, &config) {
        Err(Error::SimulationDivergence { cycle, pc }) => {
            assert_eq!(cycle, 50);
            assert_eq!(pc, 1);
        }
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("expected divergence"),
    }
}

/// Tests that an empty program halts immediately.
#[test]
fn test_empty_program() {
    let result = sim::run(&[], &SimulatorConfig::default()).unwrap();
    assert!(result.trace.is_empty());
    assert_eq!(result.stats.cycles, 0);
}

/// Tests both schedules of the single-add loop end in the same state.
#[test]
fn test_single_add_loop_agrees() {
    let (simple, pip) = run_both(&["mov LC, 2", "add x33, x32, x34", "loop 1"]);
    assert_eq!(simple.trace.len(), 4);
    assert_eq!(pip.trace.len(), 5);
    assert_eq!(pip.final_state.rbb, 2);
    assert_eq!(pip.final_state.ec, 0);
    assert!(compare::final_states_agree(&simple.final_state, &pip.final_state));
}

/// Tests both schedules of the sum of squares.
#[test]
fn test_sum_of_squares_agrees() {
    let (simple, pip) = run_both(SUM_OF_SQUARES);

    for run in [&simple, &pip] {
        let memory = &run.final_state.memory;
        for k in 0..10u64 {
            assert_eq!(memory.read(0x1000 + 8 * k), (k + 1) * (k + 1));
        }
        assert_eq!(memory.read(0x1050), 385);
        assert_eq!(memory.words().len(), 11);
        assert_eq!(run.stats.mults_retired, 10);
    }

    assert_eq!(simple.stats.cycles, 53);
    assert_eq!(pip.stats.cycles, 27);
    assert_eq!(simple.stats.loop_iterations, 9);
    assert_eq!(pip.stats.loop_iterations, 9);
    assert_eq!(pip.stats.drain_iterations, 1);
    assert!(compare::final_states_agree(&simple.final_state, &pip.final_state));
}

/// Tests that the trace is byte-identical across runs.
#[test]
fn test_trace_is_deterministic() {
    let (a, _) = run_both(SUM_OF_SQUARES);
    let (b, _) = run_both(SUM_OF_SQUARES);
    assert_eq!(
        trace::to_json(&a.trace).unwrap(),
        trace::to_json(&b.trace).unwrap()
    );
}

/// Tests the trace record field names.
#[test]
fn test_trace_json_fields() {
    let (_, pip) = run_both(SUM_OF_SQUARES);
    let json = trace::to_json(&pip.trace).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    let records = value.as_array().unwrap();
    assert_eq!(records.len(), 27);

    let first = records[0].as_object().unwrap();
    let mut keys: Vec<&str> = first.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        vec![
            "ALU0",
            "ALU1",
            "Branch",
            "EC",
            "LC",
            "Memory",
            "MemoryData",
            "Multiply",
            "PC",
            "PhysicalRegisterFile",
            "PredicateRegisters",
            "RBB",
        ]
    );
    assert_eq!(first["PhysicalRegisterFile"].as_array().unwrap().len(), 96);
    assert_eq!(first["Multiply"].as_array().unwrap().len(), 3);
    assert!(first["ALU0"].get("targetReg").is_some());
    assert!(first["Memory"].get("loadDestReg").is_some());
    assert_eq!(first["Branch"]["opcode"], "nop");
    assert!(first["Branch"]["targetPC"].is_null());

    let last = records.last().unwrap();
    assert_eq!(last["MemoryData"]["4176"], 385);
}

/// Tests that a tampered memory image is detected.
#[test]
fn test_final_state_disagreement() {
    let (simple, mut pip) = run_both(SUM_OF_SQUARES);
    pip.final_state.memory.write(0x2000, 1);
    assert!(!compare::final_states_agree(&simple.final_state, &pip.final_state));
}

/// Tests that a multiply still in flight when its stage ends keeps its
/// register until it lands, so a neighbouring value is not overwritten.
#[test]
fn test_in_flight_multiply_keeps_its_register() {
    let (simple, pip) = run_both(&[
        "mov LC, 3",
        "mov x7, 0x100",
        "mov x8, 0x1000",
        "mov x2, 5",
        "mov x3, 7",
        "mulu x1, x2, x3",
        "addi x8, x8, 8",
        "loop 5",
        "st x8, 0(x7)",
        "st x1, 8(x7)",
    ]);
    for run in [&simple, &pip] {
        assert_eq!(run.final_state.memory.read(0x100), 0x1000 + 4 * 8);
        assert_eq!(run.final_state.memory.read(0x108), 35);
    }
    assert_eq!(simple.final_state.memory, pip.final_state.memory);
    assert!(compare::final_states_agree(&simple.final_state, &pip.final_state));
}
