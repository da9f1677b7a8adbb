//! Opcode Table.
//!
//! Static description of every opcode: its mnemonic, its result latency in
//! cycles, and the class of functional unit that executes it. Schedulers use
//! the latency for dependency constraints and the unit for resource checks;
//! the bundle encoder uses the unit to pick a slot.

use std::fmt;

/// Opcodes understood by the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Integer addition of two registers.
    Add,
    /// Integer addition of a register and an immediate.
    Addi,
    /// Integer subtraction of two registers.
    Sub,
    /// Unsigned multiplication on the three-stage multiplier.
    Mulu,
    /// Load of a 64-bit word.
    Ld,
    /// Store of a 64-bit word.
    St,
    /// Register, immediate, special-register, or predicate move.
    Mov,
    /// Counted loop branch (non-overlapped loops).
    Loop,
    /// Counted loop branch with register rotation (software-pipelined loops).
    LoopPip,
    /// Empty slot.
    Nop,
}

/// Functional-unit class of an opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitClass {
    /// Integer arithmetic.
    Alu,
    /// Three-stage multiply pipeline.
    Mult,
    /// Load/store unit.
    Mem,
    /// Loop branch unit.
    Branch,
    /// Moves; issued on the ALU slots.
    Move,
    /// Occupies no unit.
    None,
}

/// Issue resource of the machine. Moves share the ALU resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Unit {
    /// Two general ALU slots per bundle.
    Alu,
    /// One multiply-issue slot per bundle.
    Mult,
    /// One memory slot per bundle.
    Mem,
    /// One branch slot per bundle.
    Branch,
}

impl Unit {
    /// All issue resources in bundle slot order.
    pub const ALL: [Unit; 4] = [Unit::Alu, Unit::Mult, Unit::Mem, Unit::Branch];

    /// Number of instructions of this resource one bundle can hold.
    pub const fn capacity(self) -> usize {
        match self {
            Unit::Alu => 2,
            Unit::Mult | Unit::Mem | Unit::Branch => 1,
        }
    }

    /// Dense index used by reservation tables.
    pub const fn index(self) -> usize {
        match self {
            Unit::Alu => 0,
            Unit::Mult => 1,
            Unit::Mem => 2,
            Unit::Branch => 3,
        }
    }
}

impl UnitClass {
    /// Issue resource consumed by this class, if any.
    pub const fn unit(self) -> Option<Unit> {
        match self {
            UnitClass::Alu | UnitClass::Move => Some(Unit::Alu),
            UnitClass::Mult => Some(Unit::Mult),
            UnitClass::Mem => Some(Unit::Mem),
            UnitClass::Branch => Some(Unit::Branch),
            UnitClass::None => None,
        }
    }
}

/// Static properties of one opcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeInfo {
    /// Assembly mnemonic.
    pub mnemonic: &'static str,
    /// Cycles until the result can be consumed.
    pub latency: usize,
    /// Functional-unit class.
    pub class: UnitClass,
}

impl Opcode {
    /// Every opcode, in table order.
    pub const ALL: [Opcode; 10] = [
        Opcode::Add,
        Opcode::Addi,
        Opcode::Sub,
        Opcode::Mulu,
        Opcode::Ld,
        Opcode::St,
        Opcode::Mov,
        Opcode::Loop,
        Opcode::LoopPip,
        Opcode::Nop,
    ];

    /// Returns the table entry for this opcode.
    pub const fn info(self) -> OpcodeInfo {
        let (mnemonic, latency, class) = match self {
            Opcode::Add => ("add", 1, UnitClass::Alu),
            Opcode::Addi => ("addi", 1, UnitClass::Alu),
            Opcode::Sub => ("sub", 1, UnitClass::Alu),
            Opcode::Mulu => ("mulu", 3, UnitClass::Mult),
            Opcode::Ld => ("ld", 1, UnitClass::Mem),
            Opcode::St => ("st", 1, UnitClass::Mem),
            Opcode::Mov => ("mov", 1, UnitClass::Move),
            Opcode::Loop => ("loop", 1, UnitClass::Branch),
            Opcode::LoopPip => ("loop.pip", 1, UnitClass::Branch),
            Opcode::Nop => ("nop", 0, UnitClass::None),
        };
        OpcodeInfo {
            mnemonic,
            latency,
            class,
        }
    }

    /// Looks up an opcode by its mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Opcode::ALL
            .into_iter()
            .find(|op| op.info().mnemonic == mnemonic)
    }

    /// Result latency in cycles.
    pub const fn latency(self) -> usize {
        self.info().latency
    }

    /// Issue resource used by this opcode.
    pub const fn unit(self) -> Option<Unit> {
        self.info().class.unit()
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().mnemonic)
    }
}
