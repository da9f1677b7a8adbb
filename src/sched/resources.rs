//! Reservation Tables.
//!
//! Tracks how many instructions of each issue resource are placed in each
//! cycle. A linear table grows with the schedule; a modulo table has `II`
//! rows and maps cycle `t` to row `t mod II`, which is how the modulo
//! scheduler checks steady-state resource use.

use crate::isa::Unit;

const UNITS: usize = Unit::ALL.len();

/// Per-cycle resource usage.
#[derive(Clone, Debug)]
pub struct ReservationTable {
    modulo: Option<usize>,
    rows: Vec<[usize; UNITS]>,
}

impl ReservationTable {
    /// A table with one row per cycle.
    pub fn linear() -> Self {
        Self {
            modulo: None,
            rows: Vec::new(),
        }
    }

    /// A table with `ii` rows, indexed by `cycle mod ii`.
    pub fn modulo(ii: usize) -> Self {
        Self {
            modulo: Some(ii),
            rows: vec![[0; UNITS]; ii],
        }
    }

    fn row(&self, cycle: usize) -> usize {
        match self.modulo {
            Some(ii) => cycle % ii,
            None => cycle,
        }
    }

    /// Number of `unit` instructions placed in the row of `cycle`.
    pub fn used(&self, cycle: usize, unit: Unit) -> usize {
        self.rows
            .get(self.row(cycle))
            .map_or(0, |r| r[unit.index()])
    }

    /// Whether one more `unit` instruction fits in the row of `cycle`.
    pub fn is_free(&self, cycle: usize, unit: Unit) -> bool {
        self.used(cycle, unit) < unit.capacity()
    }

    /// Records a `unit` instruction in the row of `cycle`.
    ///
    /// # Returns
    ///
    /// `false` (and no change) when the row is already full.
    pub fn reserve(&mut self, cycle: usize, unit: Unit) -> bool {
        if !self.is_free(cycle, unit) {
            return false;
        }
        let row = self.row(cycle);
        if row >= self.rows.len() {
            self.rows.resize(row + 1, [0; UNITS]);
        }
        self.rows[row][unit.index()] += 1;
        true
    }

    /// Places a `unit` instruction at the first free cycle at or after
    /// `earliest` and returns that cycle.
    ///
    /// Only meaningful for linear tables, which always have room further on.
    pub fn place_asap(&mut self, earliest: usize, unit: Unit) -> usize {
        let mut cycle = earliest;
        while !self.reserve(cycle, unit) {
            cycle += 1;
        }
        cycle
    }

    /// Places a `unit` instruction in the first cycle of `earliest..=latest`
    /// that has room.
    pub fn place_within(&mut self, earliest: usize, latest: usize, unit: Unit) -> Option<usize> {
        (earliest..=latest).find(|&cycle| self.reserve(cycle, unit))
    }
}
