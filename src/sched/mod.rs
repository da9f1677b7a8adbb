//! Instruction Scheduling.
//!
//! Turns a [`Program`] into bundles for the VLIW machine in two ways:
//!
//! * [`simple`]: iterations of the loop do not overlap (`loop` branch).
//! * [`modulo`]: the loop is software pipelined with rotating registers and
//!   stage predicates (`loop.pip` branch).
//!
//! Both schedulers produce a [`Schedule`]: a list of timed [`Entry`] values
//! plus the final renamed instruction of every entry. Register renaming
//! lives in [`rename`] and slot assignment in [`bundle`].

use log::info;
use serde::{Deserialize, Serialize};

use crate::common::Result;
use crate::config::SchedulerConfig;
use crate::isa::{Bundle, Instruction, Slot, Unit};
use crate::program::deps::DepGraph;
use crate::program::Program;

/// Bundle encoder.
pub mod bundle;

/// Modulo scheduler for software-pipelined loops.
pub mod modulo;

/// Register allocation for both schedule kinds.
pub mod rename;

/// Reservation tables.
pub mod resources;

/// Non-overlapped list scheduler.
pub mod simple;

/// Kind of loop a schedule closes with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "loop")]
    Loop,
    #[serde(rename = "loop.pip")]
    LoopPip,
}

/// What an entry issues.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Work {
    /// The program instruction with this index.
    Program(usize),
    /// Copy of a loop-carried value into the register its consumers read
    /// (`mov entry_reg, body_reg`); both fields are program indices.
    CarryMove { entry: usize, body: usize },
    /// `mov EC, stages - 1`
    SetEc,
    /// Initial value of the predicate of `stage` (`true` for stage 0).
    InitStagePredicate { stage: usize },
}

impl Work {
    /// Program index for [`Work::Program`] entries.
    pub fn program_index(&self) -> Option<usize> {
        match *self {
            Work::Program(i) => Some(i),
            _ => None,
        }
    }

    /// Issue resource of the work item.
    pub fn unit(&self, program: &Program) -> Option<Unit> {
        match *self {
            Work::Program(i) => program.get(i).unit(),
            _ => Some(Unit::Alu),
        }
    }
}

/// A scheduled work item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry {
    pub work: Work,
    /// Absolute bundle index.
    pub cycle: usize,
    pub unit: Unit,
    /// Pipeline stage for loop-body entries of a modulo schedule, else 0.
    pub stage: usize,
}

/// A complete schedule with renamed instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schedule {
    pub mode: Mode,
    /// Iteration length (`loop`) or initiation interval (`loop.pip`); 0 without a loop.
    pub ii: usize,
    /// Stage count; 1 for `loop` schedules with a loop, 0 without a loop.
    pub stages: usize,
    /// First bundle of the loop body.
    pub loop_start: Option<usize>,
    /// Number of bundles.
    pub length: usize,
    pub entries: Vec<Entry>,
    /// Final instruction of each entry, parallel to `entries`.
    pub code: Vec<Instruction>,
}

impl Schedule {
    /// Packs the entries into bundles.
    pub fn bundles(&self) -> Result<Vec<Bundle>> {
        Ok(bundle::encode(self)?.0)
    }

    /// Builds the serializable form of the schedule.
    pub fn to_file(&self) -> Result<ScheduleFile> {
        let (bundles, slots) = bundle::encode(self)?;
        let placements = self
            .entries
            .iter()
            .zip(slots)
            .map(|(e, slot)| PlacementRecord {
                instruction: e.work.program_index(),
                cycle: e.cycle,
                slot,
                stage: e.stage,
            })
            .collect();
        Ok(ScheduleFile {
            mode: self.mode,
            ii: self.ii,
            stages: self.stages,
            loop_start: self.loop_start,
            bundles: bundles.iter().map(Bundle::to_text).collect(),
            placements,
        })
    }

    /// Renders the schedule as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_file()?)?)
    }
}

/// Where one entry ended up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Program index, or `null` for instructions added by the scheduler.
    pub instruction: Option<usize>,
    pub cycle: usize,
    pub slot: Slot,
    pub stage: usize,
}

/// On-disk schedule format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleFile {
    pub mode: Mode,
    pub ii: usize,
    pub stages: usize,
    pub loop_start: Option<usize>,
    pub bundles: Vec<[String; 5]>,
    pub placements: Vec<PlacementRecord>,
}

/// Schedules `program` both ways.
///
/// # Returns
///
/// `(simple, pipelined)`, or the first error of either scheduler. No
/// partial result is returned.
pub fn schedule_program(program: &Program, config: &SchedulerConfig) -> Result<(Schedule, Schedule)> {
    let graph = DepGraph::build(program)?;
    info!(
        "[Scheduler] {} instructions, {} dependency edges",
        program.len(),
        graph.edges().len()
    );

    let simple = simple::schedule(program, &graph)?;
    info!(
        "[Scheduler] loop: {} bundles, iteration length {}",
        simple.length, simple.ii
    );

    let pipelined = modulo::schedule(program, &graph, config)?;
    info!(
        "[Scheduler] loop.pip: {} bundles, II {}, {} stages",
        pipelined.length, pipelined.ii, pipelined.stages
    );

    Ok((simple, pipelined))
}
