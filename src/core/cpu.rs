//! VLIW Core.
//!
//! [`step`] is the whole machine: it takes the state before a cycle and
//! returns the state after it together with the trace record of the
//! cycle. Every slot reads the pre-cycle state under the current rotating
//! base; all writes land together at the end of the cycle in this order:
//!
//! 1. Register writes (ALU0, ALU1, memory load, retiring multiply).
//! 2. Data memory write.
//! 3. Predicate and loop-counter writes from `mov`.
//! 4. Loop control: counters, rotation, stage-0 predicate, PC.
//!
//! [`Cpu`] wraps `step` with the bundle program and statistics.

use log::trace;

use super::arch::rotation::{advance, physical_pred, physical_reg};
use super::state::MachineState;
use super::trace::{AluRecord, BranchRecord, CycleRecord, MemoryRecord, MultiplyRecord};
use super::units::alu::Alu;
use super::units::bru::Bru;
use super::units::lsu::Lsu;
use super::units::mult::MulStage;
use crate::common::constants::{MULT_STAGES, ROTATING_BASE};
use crate::common::AccessType;
use crate::config::SimulatorConfig;
use crate::isa::{Bundle, Instruction, Op, Opcode, Slot, SpecialReg, Unit};
use crate::stats::SimStats;

/// A write produced by an ALU slot.
enum AluWrite {
    Reg(usize, u64),
    Pred(usize, bool),
    Special(SpecialReg, u64),
}

fn guard(inst: &Instruction, state: &MachineState) -> bool {
    inst.guard.map_or(true, |p| state.preds.read(p, state.rbb))
}

fn execute_alu(inst: Option<&Instruction>, state: &MachineState) -> (AluRecord, Option<AluWrite>) {
    let Some(inst) = inst else {
        return (AluRecord::idle(), None);
    };
    let rbb = state.rbb;
    let r = |name: usize| state.regs.read(name, rbb);
    let opcode = inst.opcode();

    let (target_reg, value, write) = match inst.op {
        Op::Add { rd, rs1, rs2 } | Op::Sub { rd, rs1, rs2 } => {
            let v = Alu::execute(opcode, r(rs1), r(rs2));
            let phys = physical_reg(rd, rbb);
            (Some(phys), v, AluWrite::Reg(phys, v))
        }
        Op::Addi { rd, rs1, imm } => {
            let v = Alu::execute(opcode, r(rs1), imm as u64);
            let phys = physical_reg(rd, rbb);
            (Some(phys), v, AluWrite::Reg(phys, v))
        }
        Op::MovReg { rd, rs } => {
            let v = Alu::execute(opcode, r(rs), 0);
            let phys = physical_reg(rd, rbb);
            (Some(phys), v, AluWrite::Reg(phys, v))
        }
        Op::MovImm { rd, imm } => {
            let phys = physical_reg(rd, rbb);
            (Some(phys), imm as u64, AluWrite::Reg(phys, imm as u64))
        }
        Op::MovSpecial { target, imm } => (None, imm, AluWrite::Special(target, imm)),
        Op::MovPred { pd, value } => (
            None,
            value as u64,
            AluWrite::Pred(physical_pred(pd, rbb), value),
        ),
        _ => return (AluRecord::idle(), None),
    };

    let enabled = guard(inst, state);
    let record = AluRecord {
        predicate: Some(enabled),
        opcode: opcode.to_string(),
        target_reg,
        value: enabled.then_some(value),
    };
    (record, enabled.then_some(write))
}

/// Executes one cycle.
///
/// # Arguments
///
/// * `state` - State before the cycle
/// * `program` - The encoded bundles; fetching past the end yields an empty bundle
///
/// # Returns
///
/// The state after the cycle and its trace record.
pub fn step(mut state: MachineState, program: &[Bundle]) -> (MachineState, CycleRecord) {
    let empty = Bundle::empty();
    let bundle = program.get(state.pc).unwrap_or(&empty);
    let rbb = state.rbb;

    // Execute: all reads see the pre-cycle state.
    let (alu0, w0) = execute_alu(bundle.get(Slot::Alu0), &state);
    let (alu1, w1) = execute_alu(bundle.get(Slot::Alu1), &state);

    let mut load_write = None;
    let mut store = None;
    let memory = match bundle.get(Slot::Mem) {
        Some(inst) => {
            let enabled = guard(inst, &state);
            match inst.op {
                Op::Ld { rd, imm, base } => {
                    let addr = Lsu::effective_address(state.regs.read(base, rbb), imm);
                    let data = state.memory.read(addr);
                    let phys = physical_reg(rd, rbb);
                    if enabled {
                        load_write = Some((phys, data));
                    }
                    MemoryRecord {
                        predicate: Some(enabled),
                        opcode: AccessType::Read.mnemonic().to_string(),
                        address: Some(addr),
                        data: enabled.then_some(data),
                        load_dest_reg: Some(phys),
                    }
                }
                Op::St { rs, imm, base } => {
                    let addr = Lsu::effective_address(state.regs.read(base, rbb), imm);
                    let data = state.regs.read(rs, rbb);
                    if enabled {
                        store = Some((addr, data));
                    }
                    MemoryRecord {
                        predicate: Some(enabled),
                        opcode: AccessType::Write.mnemonic().to_string(),
                        address: Some(addr),
                        data: Some(data),
                        load_dest_reg: None,
                    }
                }
                _ => MemoryRecord::idle(),
            }
        }
        None => MemoryRecord::idle(),
    };

    let issue = bundle.get(Slot::Mult).and_then(|inst| match inst.op {
        Op::Mulu { rd, rs1, rs2 } => Some(MulStage {
            predicate: guard(inst, &state),
            dest: physical_reg(rd, rbb),
            result: Alu::execute(
                Opcode::Mulu,
                state.regs.read(rs1, rbb),
                state.regs.read(rs2, rbb),
            ),
        }),
        _ => None,
    });

    let (branch, outcome) = match bundle.get(Slot::Branch) {
        Some(inst) => {
            let enabled = guard(inst, &state);
            let outcome = if enabled {
                Bru::resolve(&inst.op, state.lc, state.ec)
            } else {
                None
            };
            let record = BranchRecord {
                predicate: Some(enabled),
                opcode: inst.opcode().to_string(),
                target_pc: outcome.and_then(|o| o.target),
            };
            (record, outcome)
        }
        None => (BranchRecord::idle(), None),
    };

    // Commit.
    let retiring = state.mult.advance(issue);
    let mut special = Vec::new();
    let mut pred_writes = Vec::new();
    for write in [w0, w1].into_iter().flatten() {
        match write {
            AluWrite::Reg(phys, v) => state.regs.write_physical(phys, v),
            AluWrite::Pred(phys, v) => pred_writes.push((phys, v)),
            AluWrite::Special(target, v) => special.push((target, v)),
        }
    }
    if let Some((phys, v)) = load_write {
        state.regs.write_physical(phys, v);
    }
    if let Some(m) = retiring.filter(|m| m.predicate) {
        state.regs.write_physical(m.dest, m.result);
    }
    if let Some((addr, v)) = store {
        state.memory.write(addr, v);
    }
    for (phys, v) in pred_writes {
        state.preds.write_physical(phys, v);
    }
    for (target, v) in special {
        match target {
            SpecialReg::Lc => state.lc = v,
            SpecialReg::Ec => state.ec = v,
        }
    }

    let mut next_pc = if state.pc < program.len() {
        state.pc + 1
    } else {
        state.pc
    };
    if let Some(o) = outcome {
        state.lc = o.lc;
        state.ec = o.ec;
        if o.rotate {
            state.rbb = advance(state.rbb);
        }
        if let Some(v) = o.stage_predicate {
            state.preds
                .write_physical(physical_pred(ROTATING_BASE, state.rbb), v);
        }
        if let Some(target) = o.target {
            next_pc = target;
        }
    }
    state.pc = next_pc;

    let multiply: [MultiplyRecord; MULT_STAGES] = std::array::from_fn(|k| {
        state
            .mult
            .stage(k)
            .map(|m| MultiplyRecord {
                predicate: Some(m.predicate),
                target_reg: Some(m.dest),
                result: Some(m.result),
            })
            .unwrap_or_default()
    });

    let record = CycleRecord {
        pc: state.pc,
        rbb: state.rbb,
        lc: state.lc,
        ec: state.ec,
        registers: state.regs.snapshot(),
        predicates: state.preds.snapshot(),
        alu0,
        alu1,
        branch,
        memory,
        multiply,
        memory_data: state.memory.words().clone(),
    };
    (state, record)
}

/// The simulated core: machine state, bundle program, and statistics.
pub struct Cpu {
    pub state: MachineState,
    pub program: Vec<Bundle>,
    pub stats: SimStats,
    pub trace: bool,
}

impl Cpu {
    /// Creates a core in reset state for `program`.
    pub fn new(program: Vec<Bundle>, config: &SimulatorConfig) -> Self {
        Self {
            state: MachineState::new(),
            program,
            stats: SimStats::default(),
            trace: config.trace_cycles,
        }
    }

    /// Whether the program has finished.
    pub fn halted(&self) -> bool {
        self.state.halted(self.program.len())
    }

    /// Executes one cycle and returns its trace record.
    pub fn tick(&mut self) -> CycleRecord {
        let before = std::mem::take(&mut self.state);
        let (fetched, lc_before) = (before.pc, before.lc);
        let (after, record) = step(before, &self.program);
        self.state = after;

        self.stats.cycles += 1;
        if self
            .program
            .get(fetched)
            .map_or(false, |b| !b.is_empty())
        {
            self.stats.bundles_issued += 1;
        }
        self.stats.count_unit(Unit::Alu, record.alu0.predicate);
        self.stats.count_unit(Unit::Alu, record.alu1.predicate);
        self.stats.count_unit(Unit::Mult, record.multiply[0].predicate);
        self.stats.count_unit(Unit::Mem, record.memory.predicate);
        self.stats.count_unit(Unit::Branch, record.branch.predicate);
        if record.multiply[MULT_STAGES - 1].predicate == Some(true) {
            self.stats.mults_retired += 1;
        }
        if record.branch.target_pc.is_some() {
            // A taken branch with LC already at zero is draining on EC.
            if lc_before == 0 {
                self.stats.drain_iterations += 1;
            } else {
                self.stats.loop_iterations += 1;
            }
        }

        if self.trace {
            trace!(
                "[Sim] cycle {:>6} pc={:<4} rbb={:<2} lc={} ec={}",
                self.stats.cycles,
                fetched,
                record.rbb,
                record.lc,
                record.ec
            );
        }
        record
    }

    /// Logs the register file at debug level.
    pub fn dump_state(&self) {
        log::debug!(
            "[Sim] pc={} rbb={} lc={} ec={}",
            self.state.pc,
            self.state.rbb,
            self.state.lc,
            self.state.ec
        );
        self.state.regs.dump();
    }
}
