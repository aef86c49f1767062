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

//! The records produced by an export run.
//!
//! Every record is written to disk as pretty printed JSON. Field names follow
//! the PascalCase layout of the Step Functions console exports so that
//! snapshots taken by earlier tooling remain readable.

use crate::configs::SENTINEL_EXECUTION_ARN;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Status of an execution that has started but not finished yet.
pub const STATUS_RUNNING: &str = "RUNNING";

/// Status of the placeholder execution of an express workflow whose
/// executions cannot be read from CloudWatch Logs.
pub const STATUS_LOGGING_NOT_SUPPORTED: &str =
    "Not supported (check CloudWatch Logs configuration)";

/// The execution model of a state machine.
///
/// The type decides where the execution history lives: Step Functions itself
/// records the history of standard workflows, express workflows only leave a
/// trace in their CloudWatch Logs log group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkflowType {
    /// `STANDARD` workflows.
    Standard,
    /// `EXPRESS` workflows.
    Express,
    /// Any type this tool does not know about, kept verbatim.
    Unknown(String),
}

impl From<&str> for WorkflowType {
    fn from(s: &str) -> Self {
        match s {
            "STANDARD" => WorkflowType::Standard,
            "EXPRESS" => WorkflowType::Express,
            other => WorkflowType::Unknown(other.to_string()),
        }
    }
}

impl From<String> for WorkflowType {
    fn from(s: String) -> Self {
        WorkflowType::from(s.as_str())
    }
}

impl From<WorkflowType> for String {
    fn from(t: WorkflowType) -> Self {
        t.to_string()
    }
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowType::Standard => write!(f, "STANDARD"),
            WorkflowType::Express => write!(f, "EXPRESS"),
            WorkflowType::Unknown(s) => write!(f, "{}", s),
        }
    }
}

/// A state machine together with its states and executions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StateMachine {
    /// The name of the state machine.
    pub name:          String,
    /// The Amazon Resource Name (ARN) of the state machine.
    #[serde(rename = "ARN")]
    pub arn:           String,
    /// The ARN of the IAM role used by the state machine.
    #[serde(rename = "RoleARN")]
    pub role_arn:      String,
    /// The Amazon States Language definition, as returned by the service.
    pub definition:    String,
    /// The top-level states of the definition.
    pub states:        Vec<State>,
    /// The executions found for this state machine.
    pub executions:    Vec<Execution>,
    /// When the state machine was created.
    pub creation_date: DateTime<Utc>,
    /// The execution model of the state machine.
    #[serde(rename = "Type")]
    pub workflow_type: WorkflowType,
}

/// A single state of an Amazon States Language definition.
///
/// `raw_definition` is the state object exactly as it appears in the
/// definition; the other fields are projections of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct State {
    /// The key of the state in the "States" object.
    pub name:           String,
    /// The "Type" field of the state.
    #[serde(rename = "Type")]
    pub state_type:     String,
    /// The "Next" field of the state, if it names a successor.
    pub next:           Option<String>,
    /// The "End" field of the state.
    pub end:            bool,
    /// The "Parameters" object of the state.
    pub parameters:     Option<Map<String, Value>>,
    /// The whole state object.
    pub raw_definition: Map<String, Value>,
}

/// One run of a state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Execution {
    /// The ARN of the execution, or "N/A" for a placeholder record.
    pub execution_arn: String,
    /// RUNNING, SUCCEEDED, FAILED, TIMED_OUT, ABORTED, or a descriptive text
    /// for placeholder records.
    pub status:        String,
    /// When the execution started.
    pub start_time:    Option<DateTime<Utc>>,
    /// When the execution stopped.
    pub end_time:      Option<DateTime<Utc>>,
    /// The human-readable elapsed time between start and stop.
    pub duration:      Option<String>,
}

impl Execution {
    /// Creates a placeholder execution carrying only an explanatory status.
    pub fn sentinel(status: impl Into<String>) -> Self {
        Self {
            execution_arn: SENTINEL_EXECUTION_ARN.to_string(),
            status:        status.into(),
            start_time:    None,
            end_time:      None,
            duration:      None,
        }
    }

    /// Creates an execution that is known to have started at `start`.
    pub fn started(execution_arn: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            execution_arn: execution_arn.into(),
            status:        STATUS_RUNNING.to_string(),
            start_time:    Some(start),
            end_time:      None,
            duration:      None,
        }
    }

    /// Marks the execution as stopped at `end` with the given final status.
    pub fn stop(&mut self, status: impl Into<String>, end: DateTime<Utc>) {
        self.status = status.into();
        self.end_time = Some(end);
        self.duration = self.start_time.and_then(|start| format_elapsed(start, end));
    }

    /// Returns true if this is a placeholder record.
    pub fn is_sentinel(&self) -> bool {
        self.execution_arn == SENTINEL_EXECUTION_ARN
    }

    /// Returns the elapsed time between start and stop, if both are known.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.signed_duration_since(start)),
            _ => None,
        }
    }
}

/// Formats the time between `start` and `end` in a human-readable way, e.g.
/// `1m 30s`. Returns `None` if `end` precedes `start`.
pub fn format_elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<String> {
    end.signed_duration_since(start)
        .to_std()
        .ok()
        .map(|d| humantime::format_duration(d).to_string())
}
