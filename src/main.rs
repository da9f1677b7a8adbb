//! VLIW Scheduler and Simulator CLI.
//!
//! The main executable of the tool chain. It handles command-line argument
//! parsing, configuration, and dispatch to one of four commands:
//!
//! 1. **schedule**: Schedules a program both ways and writes the `loop` and
//!    `loop.pip` schedules.
//! 2. **simulate**: Runs a schedule and writes the per-cycle trace.
//! 3. **compare**: Checks result schedules against reference schedules.
//! 4. **verify**: Schedules a program, runs both schedules and checks that
//!    they end in equivalent states.
//!
//! Outputs are rendered fully in memory before any file is written, and the
//! two schedules are staged and renamed into place together, so a run that
//! fails while writing leaves no partial output behind.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::info;

use vliw_pipeliner::common::Result;
use vliw_pipeliner::config::Config;
use vliw_pipeliner::core::trace;
use vliw_pipeliner::sched::schedule_program;
use vliw_pipeliner::sim::{self, compare, loader};

/// Command-line arguments for the VLIW tool chain.
#[derive(Parser, Debug)]
#[command(author, version, about = "VLIW Loop Scheduler and Cycle-Accurate Simulator")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Produce `loop` and `loop.pip` schedules for a program.
    Schedule {
        /// Program: JSON array of instruction strings.
        program: String,
        /// Output for the `loop` schedule.
        simple_out: String,
        /// Output for the `loop.pip` schedule.
        pip_out: String,
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Simulate a schedule and write its trace.
    Simulate {
        /// Schedule file or bare array of bundles.
        schedule: String,
        /// Output for the JSON trace.
        trace_out: String,
        #[arg(short, long)]
        config: Option<String>,
        /// Print the statistics summary after the run.
        #[arg(long)]
        stats: bool,
    },
    /// Compare schedules against references.
    Compare {
        #[arg(long = "loop")]
        simple: String,
        #[arg(long)]
        pip: String,
        #[arg(long = "ref-loop")]
        ref_simple: String,
        #[arg(long)]
        ref_pip: String,
    },
    /// Schedule and run a program both ways and compare the final states.
    Verify {
        program: String,
        #[arg(short, long)]
        config: Option<String>,
    },
}

impl Command {
    fn config_path(&self) -> Option<&str> {
        match self {
            Command::Schedule { config, .. }
            | Command::Simulate { config, .. }
            | Command::Verify { config, .. } => config.as_deref(),
            Command::Compare { .. } => None,
        }
    }
}

fn init_logging(config: &Config) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.general.log_level.as_str()),
    )
    .format_timestamp(None)
    .init();
}

/// Runs one command. `Ok(false)` means the command ran but found a
/// difference.
fn execute(command: Command, config: &Config) -> Result<bool> {
    match command {
        Command::Schedule {
            program,
            simple_out,
            pip_out,
            ..
        } => {
            let program = loader::read_program(&program)?;
            let (simple, pipelined) = schedule_program(&program, &config.scheduler)?;
            let simple_json = simple.to_json()?;
            let pip_json = pipelined.to_json()?;
            loader::write_outputs(&[
                (simple_out.as_str(), simple_json.as_str()),
                (pip_out.as_str(), pip_json.as_str()),
            ])?;
            info!("[Scheduler] Wrote {} and {}", simple_out, pip_out);
            Ok(true)
        }
        Command::Simulate {
            schedule,
            trace_out,
            stats,
            ..
        } => {
            let bundles = loader::read_schedule(&schedule)?;
            let result = sim::run(&bundles, &config.simulator)?;
            let json = trace::to_json(&result.trace)?;
            loader::write_output(&trace_out, &json)?;
            info!("[Sim] Wrote {} trace records to {}", result.trace.len(), trace_out);
            if stats {
                result.stats.print();
            }
            Ok(true)
        }
        Command::Compare {
            simple,
            pip,
            ref_simple,
            ref_pip,
        } => {
            let mut passed = true;
            for (label, actual, expected) in [("loop", simple, ref_simple), ("loop.pip", pip, ref_pip)] {
                let actual = loader::schedule_rows(&loader::read_text(&actual)?)?;
                let expected = loader::schedule_rows(&loader::read_text(&expected)?)?;
                let mismatches = compare::compare_schedules(&actual, &expected);
                if mismatches.is_empty() {
                    println!("{} schedule: PASSED", label);
                } else {
                    passed = false;
                    println!("{} schedule: FAILED", label);
                    for m in &mismatches {
                        println!("  {}", m);
                    }
                }
            }
            Ok(passed)
        }
        Command::Verify { program, .. } => {
            let program = loader::read_program(&program)?;
            let (simple, pipelined) = schedule_program(&program, &config.scheduler)?;
            let simple_run = sim::run(&simple.bundles()?, &config.simulator)?;
            let pip_run = sim::run(&pipelined.bundles()?, &config.simulator)?;
            println!(
                "loop: {} cycles, loop.pip: {} cycles",
                simple_run.stats.cycles, pip_run.stats.cycles
            );
            let agree = compare::final_states_agree(&simple_run.final_state, &pip_run.final_state);
            println!("final states: {}", if agree { "AGREE" } else { "DIFFER" });
            Ok(agree)
        }
    }
}

/// Main entry point.
///
/// Loads the configuration named by the command (or the defaults), sets up
/// logging, runs the command, and reports any error on stderr with exit
/// code 1.
fn main() -> ExitCode {
    let args = Args::parse();

    let config = match loader::load_config(args.command.config_path()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("[!] {}: {}", e.kind(), e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    match execute(args.command, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("[!] {}: {}", e.kind(), e);
            ExitCode::FAILURE
        }
    }
}
