// Copyright (c) 2020-present, UMD Database Group.
//
// This program is free software: you can use, redistribute, and/or modify
// it under the terms of the GNU Affero General Public License, version 3
// or later ("AGPL"), as published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! This module writes an export run to the local file system.
//!
//! Every state and every execution gets its own JSON file next to the file
//! holding the whole collection:
//!
//! - `state_machines.json`
//! - `<machine>_<state>.json` with the raw state definition
//! - `<machine>_execution_<execution arn>.json` with the execution record
//!
//! Characters that are not safe in file names are replaced by underscores.
//! Placeholder executions are never written.

use crate::configs::STATE_MACHINES_FILE;
use crate::error::Result;
use crate::model::{Execution, State, StateMachine};
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Characters replaced by [`sanitize_file_name`].
const UNSAFE_FILE_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replaces every character that is not safe in a file name with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| if UNSAFE_FILE_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Counts of the files written by a [`FileSink`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Files written successfully.
    pub written: usize,
    /// Files that could not be serialized or written.
    pub failed:  usize,
}

impl SinkReport {
    fn record(&mut self, outcome: Result<()>, what: &str) {
        match outcome {
            Ok(()) => self.written += 1,
            Err(e) => {
                warn!("Failed to save {}: {}", what, e);
                self.failed += 1;
            }
        }
    }
}

/// Writes state machines, states and executions as JSON files into one
/// directory.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    /// Creates the output directory, including missing parents.
    pub fn create<P: AsRef<Path>>(dir: P) -> Result<Self> {
        fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// The output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The path of the file holding a state definition.
    pub fn state_path(&self, machine: &str, state: &str) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.json",
            sanitize_file_name(machine),
            sanitize_file_name(state)
        ))
    }

    /// The path of the file holding an execution record.
    pub fn execution_path(&self, machine: &str, execution_arn: &str) -> PathBuf {
        self.dir.join(format!(
            "{}_execution_{}.json",
            sanitize_file_name(machine),
            sanitize_file_name(execution_arn)
        ))
    }

    /// The path of the file holding the whole collection.
    pub fn state_machines_path(&self) -> PathBuf {
        self.dir.join(STATE_MACHINES_FILE)
    }

    /// Writes the raw definition of a state.
    pub fn write_state(&self, machine: &str, state: &State) -> Result<()> {
        write_json(&self.state_path(machine, &state.name), &state.raw_definition)
    }

    /// Writes an execution record. Placeholder executions are skipped and
    /// reported as not written.
    pub fn write_execution(&self, machine: &str, execution: &Execution) -> Result<bool> {
        if execution.is_sentinel() {
            return Ok(false);
        }
        write_json(
            &self.execution_path(machine, &execution.execution_arn),
            execution,
        )?;
        Ok(true)
    }

    /// Writes the whole collection.
    pub fn write_state_machines(&self, state_machines: &[StateMachine]) -> Result<()> {
        write_json(&self.state_machines_path(), &state_machines)
    }

    /// Reads back a collection written by [`FileSink::write_state_machines`].
    pub fn read_state_machines(&self) -> Result<Vec<StateMachine>> {
        let data = fs::read(self.state_machines_path())?;
        Ok(serde_json::from_slice(&data)?)
    }

    /// Writes every state and execution of every state machine, then the
    /// collection itself. Individual failures are logged and counted; they
    /// never stop the run.
    pub fn persist(&self, state_machines: &[StateMachine]) -> SinkReport {
        let mut report = SinkReport::default();
        for sm in state_machines {
            for state in &sm.states {
                report.record(
                    self.write_state(&sm.name, state),
                    &format!("state definition for {}/{}", sm.name, state.name),
                );
            }
            for execution in &sm.executions {
                match self.write_execution(&sm.name, execution) {
                    Ok(true) => report.written += 1,
                    Ok(false) => {}
                    Err(e) => report.record(
                        Err(e),
                        &format!("execution {}", execution.execution_arn),
                    ),
                }
            }
        }
        report.record(
            self.write_state_machines(state_machines),
            "state machines",
        );
        info!(
            "Wrote {} files to {} ({} failed)",
            report.written,
            self.dir.display(),
            report.failed
        );
        report
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let data = serde_json::to_vec_pretty(value)?;
    fs::write(path, data)?;
    Ok(())
}
