//! Instruction Bundles.
//!
//! A bundle is the unit of issue: one instruction word with five slots,
//! `[ALU0, ALU1, MULT, MEM, BRANCH]`. Empty slots hold `nop`. Bundles are
//! written to schedule files as five assembly strings and read back by the
//! simulator.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::instruction::Instruction;
use super::opcodes::Unit;
use super::parse::parse_instruction;
use crate::common::constants::BUNDLE_SLOTS;
use crate::common::{Error, Result};

/// Issue slot inside a bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    #[serde(rename = "ALU0")]
    Alu0,
    #[serde(rename = "ALU1")]
    Alu1,
    #[serde(rename = "MULT")]
    Mult,
    #[serde(rename = "MEM")]
    Mem,
    #[serde(rename = "BRANCH")]
    Branch,
}

impl Slot {
    /// All slots in bundle order.
    pub const ALL: [Slot; BUNDLE_SLOTS] = [Slot::Alu0, Slot::Alu1, Slot::Mult, Slot::Mem, Slot::Branch];

    /// Position of the slot inside a bundle.
    pub const fn index(self) -> usize {
        match self {
            Slot::Alu0 => 0,
            Slot::Alu1 => 1,
            Slot::Mult => 2,
            Slot::Mem => 3,
            Slot::Branch => 4,
        }
    }

    /// Issue resource served by the slot.
    pub const fn unit(self) -> Unit {
        match self {
            Slot::Alu0 | Slot::Alu1 => Unit::Alu,
            Slot::Mult => Unit::Mult,
            Slot::Mem => Unit::Mem,
            Slot::Branch => Unit::Branch,
        }
    }

    /// Slots that can hold an instruction of resource `unit`, in fill order.
    pub fn for_unit(unit: Unit) -> &'static [Slot] {
        match unit {
            Unit::Alu => &[Slot::Alu0, Slot::Alu1],
            Unit::Mult => &[Slot::Mult],
            Unit::Mem => &[Slot::Mem],
            Unit::Branch => &[Slot::Branch],
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Slot::Alu0 => "ALU0",
            Slot::Alu1 => "ALU1",
            Slot::Mult => "MULT",
            Slot::Mem => "MEM",
            Slot::Branch => "BRANCH",
        };
        f.write_str(name)
    }
}

/// One VLIW instruction word.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bundle {
    slots: [Option<Instruction>; BUNDLE_SLOTS],
}

impl Bundle {
    /// An empty bundle (all `nop`).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Instruction held by `slot`, if any.
    pub fn get(&self, slot: Slot) -> Option<&Instruction> {
        self.slots[slot.index()].as_ref()
    }

    /// Places `inst` in `slot`.
    ///
    /// # Returns
    ///
    /// An `Internal` error if the slot is taken or does not serve the
    /// instruction's unit.
    pub fn set(&mut self, slot: Slot, inst: Instruction) -> Result<()> {
        if inst.unit() != Some(slot.unit()) {
            return Err(Error::Internal(format!("'{}' cannot issue in slot {}", inst, slot)));
        }
        let cell = &mut self.slots[slot.index()];
        if cell.is_some() {
            return Err(Error::Internal(format!("slot {} is already occupied", slot)));
        }
        *cell = Some(inst);
        Ok(())
    }

    /// Whether every slot is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Renders the bundle as five assembly strings.
    pub fn to_text(&self) -> [String; BUNDLE_SLOTS] {
        std::array::from_fn(|i| match &self.slots[i] {
            Some(inst) => inst.to_string(),
            None => "nop".to_string(),
        })
    }

    /// Parses a bundle from its five assembly strings.
    ///
    /// # Arguments
    ///
    /// * `text` - The slot strings in bundle order.
    /// * `index` - Bundle index, reported in errors.
    ///
    /// # Returns
    ///
    /// A `ParseError` for malformed text or an instruction sitting in a slot
    /// of the wrong unit.
    pub fn parse<S: AsRef<str>>(text: &[S], index: usize) -> Result<Self> {
        if text.len() != BUNDLE_SLOTS {
            return Err(Error::parse(
                index,
                format!("bundle has {} slots, expected {}", text.len(), BUNDLE_SLOTS),
            ));
        }
        let mut bundle = Bundle::empty();
        for (slot, s) in Slot::ALL.into_iter().zip(text) {
            let inst = parse_instruction(s.as_ref(), index)?;
            match inst.unit() {
                None => {}
                Some(unit) if unit == slot.unit() => bundle.slots[slot.index()] = Some(inst),
                Some(_) => {
                    return Err(Error::parse(
                        index,
                        format!("'{}' cannot issue in slot {}", inst, slot),
                    ))
                }
            }
        }
        Ok(bundle)
    }
}
