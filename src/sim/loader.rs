//! Program, Schedule and Configuration Loading.
//!
//! This module reads the JSON inputs of the tool chain (programs and
//! schedules), the optional TOML configuration, and writes the rendered
//! outputs. Every I/O failure carries the path it happened on.

use std::fs;

use log::info;
use serde::Deserialize;

use crate::common::{Error, Result};
use crate::config::Config;
use crate::isa::Bundle;
use crate::program::Program;
use crate::sched::ScheduleFile;

/// Accepted schedule inputs: a full schedule file or a bare bundle array.
#[derive(Deserialize)]
#[serde(untagged)]
enum ScheduleInput {
    File(ScheduleFile),
    Bare(Vec<Vec<String>>),
}

/// Reads a file into a string.
pub fn read_text(path: &str) -> Result<String> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_string(),
        source,
    })
}

/// Reads and validates a program (JSON array of assembly strings).
pub fn read_program(path: &str) -> Result<Program> {
    let program = Program::from_json(&read_text(path)?)?;
    info!(
        "[Loader] Loaded {} instructions from {}",
        program.len(),
        path
    );
    Ok(program)
}

/// Extracts the bundle rows (five slot strings each) from schedule JSON.
pub fn schedule_rows(text: &str) -> Result<Vec<Vec<String>>> {
    Ok(match serde_json::from_str::<ScheduleInput>(text)? {
        ScheduleInput::File(file) => file.bundles.into_iter().map(Vec::from).collect(),
        ScheduleInput::Bare(rows) => rows,
    })
}

/// Parses schedule JSON into bundles.
pub fn parse_schedule(text: &str) -> Result<Vec<Bundle>> {
    schedule_rows(text)?
        .iter()
        .enumerate()
        .map(|(idx, row)| Bundle::parse(row, idx))
        .collect()
}

/// Reads a schedule file and decodes its bundles.
pub fn read_schedule(path: &str) -> Result<Vec<Bundle>> {
    let bundles = parse_schedule(&read_text(path)?)?;
    info!("[Loader] Loaded {} bundles from {}", bundles.len(), path);
    Ok(bundles)
}

/// Writes `contents` to `path`, replacing any existing file.
pub fn write_output(path: &str, contents: &str) -> Result<()> {
    write_outputs(&[(path, contents)])
}

/// Writes several outputs as one unit.
///
/// Every file is first staged as `<path>.tmp` next to its target. Targets
/// are only replaced once all staged files are written, so a failure while
/// writing leaves neither a new output nor a stale temporary behind.
pub fn write_outputs(outputs: &[(&str, &str)]) -> Result<()> {
    let staged: Vec<String> = outputs.iter().map(|(path, _)| format!("{}.tmp", path)).collect();
    for (k, (_, contents)) in outputs.iter().enumerate() {
        if let Err(source) = fs::write(&staged[k], contents) {
            discard(&staged[..=k]);
            return Err(Error::Io {
                path: staged[k].clone(),
                source,
            });
        }
    }
    for (k, (path, _)) in outputs.iter().enumerate() {
        if let Err(source) = fs::rename(&staged[k], path) {
            discard(&staged[k..]);
            return Err(Error::Io {
                path: path.to_string(),
                source,
            });
        }
    }
    Ok(())
}

fn discard(staged: &[String]) {
    for path in staged {
        // Missing files are expected when the write itself failed.
        let _ = fs::remove_file(path);
    }
}

/// Loads the configuration file, or the defaults when no path is given.
pub fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => Config::from_toml(&read_text(path)?),
        None => Ok(Config::default()),
    }
}
