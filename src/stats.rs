//! Simulation statistics collection and reporting.
//!
//! Tracks cycle and bundle counts, per-unit activity (executed versus
//! predicated off), multiply retirements, and loop iterations split into
//! the counting and the draining phase of a pipelined loop.

use std::time::Instant;

use crate::isa::Unit;

const UNITS: usize = Unit::ALL.len();

/// Simulation statistics structure tracking all performance metrics.
pub struct SimStats {
    start_time: Instant,
    pub cycles: u64,
    pub bundles_issued: u64,

    /// Operations whose guard was true, per unit.
    pub ops_executed: [u64; UNITS],
    /// Operations whose guard was false, per unit.
    pub ops_squashed: [u64; UNITS],

    pub mults_retired: u64,
    pub loop_iterations: u64,
    pub drain_iterations: u64,
}

impl Default for SimStats {
    /// Returns the default value.
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            bundles_issued: 0,
            ops_executed: [0; UNITS],
            ops_squashed: [0; UNITS],
            mults_retired: 0,
            loop_iterations: 0,
            drain_iterations: 0,
        }
    }
}

impl SimStats {
    /// Counts one slot of `unit` given the guard value it reported
    /// (`None` for an idle slot).
    pub fn count_unit(&mut self, unit: Unit, predicate: Option<bool>) {
        match predicate {
            Some(true) => self.ops_executed[unit.index()] += 1,
            Some(false) => self.ops_squashed[unit.index()] += 1,
            None => {}
        }
    }

    /// Total operations whose guard was true.
    pub fn total_executed(&self) -> u64 {
        self.ops_executed.iter().sum()
    }

    /// Prints a formatted summary of all simulation statistics.
    pub fn print(&self) {
        let seconds = self.start_time.elapsed().as_secs_f64();
        let cyc = self.cycles.max(1);
        let executed = self.total_executed();

        println!("\n==========================================================");
        println!("VLIW SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_bundles              {}", self.bundles_issued);
        println!("sim_ops                  {}", executed);
        println!("sim_ops_per_cycle        {:.4}", executed as f64 / cyc as f64);
        println!("----------------------------------------------------------");
        println!("UNIT ACTIVITY");
        for unit in Unit::ALL {
            let name = match unit {
                Unit::Alu => "alu",
                Unit::Mult => "mult",
                Unit::Mem => "mem",
                Unit::Branch => "branch",
            };
            println!(
                "  {:<6} executed: {:<10} | squashed: {:<10} | busy: {:.2}%",
                name,
                self.ops_executed[unit.index()],
                self.ops_squashed[unit.index()],
                (self.ops_executed[unit.index()] as f64
                    / (cyc * unit.capacity() as u64) as f64)
                    * 100.0
            );
        }
        println!("  mult.retired           {}", self.mults_retired);
        println!("----------------------------------------------------------");
        println!("LOOP CONTROL");
        println!("  loop.iterations        {}", self.loop_iterations);
        println!("  loop.drain             {}", self.drain_iterations);
        println!("==========================================================");
    }
}
