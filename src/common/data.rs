//! Memory Access Types.
//!
//! Classification of the accesses performed by the memory unit. The
//! simulator records the access kind of every executed `ld`/`st` in the
//! trace so that the memory slot of a bundle can be rendered without
//! re-decoding the instruction.

/// Type of memory access operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Data read access (`ld`).
    ///
    /// The loaded word is written to the destination register at the end
    /// of the cycle.
    Read,

    /// Data write access (`st`).
    ///
    /// The stored word becomes visible in data memory at the end of the cycle.
    Write,
}

impl AccessType {
    /// Returns the mnemonic of the instruction performing this access.
    pub fn mnemonic(self) -> &'static str {
        match self {
            AccessType::Read => "ld",
            AccessType::Write => "st",
        }
    }
}
