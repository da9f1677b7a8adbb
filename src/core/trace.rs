//! Cycle Trace Records.
//!
//! One [`CycleRecord`] is emitted per simulated cycle. Register, predicate,
//! counter and memory fields hold the state after the cycle; unit fields
//! describe what each unit did during it. Idle units report opcode `nop`
//! and `null` everywhere else. The field names are fixed by the trace
//! viewer and must not change.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::constants::MULT_STAGES;
use crate::common::Result;

/// Activity of one ALU slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AluRecord {
    pub predicate: Option<bool>,
    pub opcode: String,
    pub target_reg: Option<usize>,
    pub value: Option<u64>,
}

impl AluRecord {
    pub fn idle() -> Self {
        Self {
            predicate: None,
            opcode: "nop".to_string(),
            target_reg: None,
            value: None,
        }
    }
}

/// Activity of the branch unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchRecord {
    pub predicate: Option<bool>,
    pub opcode: String,
    /// Target when the branch was taken.
    #[serde(rename = "targetPC")]
    pub target_pc: Option<usize>,
}

impl BranchRecord {
    pub fn idle() -> Self {
        Self {
            predicate: None,
            opcode: "nop".to_string(),
            target_pc: None,
        }
    }
}

/// Activity of the memory unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    pub predicate: Option<bool>,
    pub opcode: String,
    pub address: Option<u64>,
    /// Loaded or stored word.
    pub data: Option<u64>,
    pub load_dest_reg: Option<usize>,
}

impl MemoryRecord {
    pub fn idle() -> Self {
        Self {
            predicate: None,
            opcode: "nop".to_string(),
            address: None,
            data: None,
            load_dest_reg: None,
        }
    }
}

/// Contents of one multiply stage.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiplyRecord {
    pub predicate: Option<bool>,
    pub target_reg: Option<usize>,
    pub result: Option<u64>,
}

/// State after one cycle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleRecord {
    #[serde(rename = "PC")]
    pub pc: usize,
    #[serde(rename = "RBB")]
    pub rbb: usize,
    #[serde(rename = "LC")]
    pub lc: u64,
    #[serde(rename = "EC")]
    pub ec: u64,
    #[serde(rename = "PhysicalRegisterFile")]
    pub registers: Vec<u64>,
    #[serde(rename = "PredicateRegisters")]
    pub predicates: Vec<bool>,
    #[serde(rename = "ALU0")]
    pub alu0: AluRecord,
    #[serde(rename = "ALU1")]
    pub alu1: AluRecord,
    #[serde(rename = "Branch")]
    pub branch: BranchRecord,
    #[serde(rename = "Memory")]
    pub memory: MemoryRecord,
    #[serde(rename = "Multiply")]
    pub multiply: [MultiplyRecord; MULT_STAGES],
    #[serde(rename = "MemoryData")]
    pub memory_data: BTreeMap<u64, u64>,
}

/// Renders a trace as a JSON array.
pub fn to_json(trace: &[CycleRecord]) -> Result<String> {
    Ok(serde_json::to_string(trace)?)
}
