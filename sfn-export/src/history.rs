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

//! Execution history of state machines.
//!
//! Standard workflows report every execution through the Step Functions API,
//! so each execution maps directly to an [`Execution`]. Express workflows
//! only leave lifecycle events in CloudWatch Logs; their executions are
//! rebuilt by [`correlate`], which pairs the `ExecutionStarted` event of an
//! execution with the first event that finishes it.

use crate::aws::stepfunctions::ExecutionDescription;
use crate::error::{ExportError, Result};
use crate::model::{format_elapsed, Execution};
use chrono::{DateTime, TimeZone, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Event type that opens an express execution.
pub const EXECUTION_STARTED: &str = "ExecutionStarted";

/// Prefix shared by all execution lifecycle event types.
const EXECUTION_EVENT_PREFIX: &str = "Execution";

/// Converts the fractional epoch seconds used by the Step Functions API.
pub fn epoch_seconds(secs: f64) -> Result<DateTime<Utc>> {
    epoch_millis((secs * 1000.0).round() as i64)
}

/// Converts epoch milliseconds, as found in CloudWatch Logs events.
pub fn epoch_millis(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| ExportError::Internal(format!("timestamp {} is out of range", millis)))
}

/// Builds the execution record of a standard workflow execution.
///
/// Executions that have not stopped yet keep the status reported by the
/// service (e.g. RUNNING) and have neither an end time nor a duration.
pub fn standard_execution(desc: &ExecutionDescription) -> Execution {
    Execution {
        execution_arn: desc.execution_arn.clone(),
        status:        desc.status.clone(),
        start_time:    Some(desc.start_date),
        end_time:      desc.stop_date,
        duration:      desc
            .stop_date
            .and_then(|stop| format_elapsed(desc.start_date, stop)),
    }
}

/// A lifecycle event of an express workflow execution, as logged to
/// CloudWatch Logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// e.g. ExecutionStarted, ExecutionSucceeded.
    pub event_type:    String,
    /// The execution the event belongs to.
    pub execution_arn: String,
    /// Epoch milliseconds.
    pub timestamp:     i64,
    /// Optional status reported alongside the event.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status:        Option<String>,
}

impl LogEvent {
    /// Decodes a log message.
    pub fn from_message(message: &str) -> Result<Self> {
        Ok(serde_json::from_str(message)?)
    }
}

/// Turns the type of a closing lifecycle event into an execution status:
/// `ExecutionSucceeded` becomes `SUCCEEDED`, `ExecutionTimedOut` becomes
/// `TIMED_OUT`.
pub fn status_from_event_type(event_type: &str) -> String {
    let suffix = event_type
        .strip_prefix(EXECUTION_EVENT_PREFIX)
        .unwrap_or(event_type);
    let mut status = String::with_capacity(suffix.len() + 2);
    for (i, c) in suffix.char_indices() {
        if i > 0 && c.is_uppercase() {
            status.push('_');
        }
        status.extend(c.to_uppercase());
    }
    status
}

/// Rebuilds express workflow executions from their lifecycle events.
///
/// An `ExecutionStarted` event for an execution not seen before opens a
/// RUNNING record. The next `Execution*` event of any other type for an open
/// record closes it with the matching status, end time and duration. Events
/// for executions that were never opened, and events arriving after an
/// execution was closed, are dropped.
///
/// Records are returned in the order their executions started. An event
/// whose timestamp cannot be represented is logged and skipped.
pub fn correlate<I>(events: I) -> Vec<Execution>
where
    I: IntoIterator<Item = LogEvent>,
{
    let mut executions: Vec<Execution> = vec![];
    let mut open: HashMap<String, usize> = HashMap::new();
    let mut closed: HashSet<String> = HashSet::new();

    for event in events {
        if event.event_type == EXECUTION_STARTED {
            if open.contains_key(&event.execution_arn) || closed.contains(&event.execution_arn) {
                continue;
            }
            let at = match epoch_millis(event.timestamp) {
                Ok(at) => at,
                Err(e) => {
                    warn!("Skipping {} of {}: {}", event.event_type, event.execution_arn, e);
                    continue;
                }
            };
            open.insert(event.execution_arn.clone(), executions.len());
            executions.push(Execution::started(event.execution_arn, at));
        } else if event.event_type.starts_with(EXECUTION_EVENT_PREFIX) {
            let index = match open.get(&event.execution_arn) {
                Some(&index) => index,
                None => continue,
            };
            let at = match epoch_millis(event.timestamp) {
                Ok(at) => at,
                Err(e) => {
                    warn!("Skipping {} of {}: {}", event.event_type, event.execution_arn, e);
                    continue;
                }
            };
            executions[index].stop(status_from_event_type(&event.event_type), at);
            open.remove(&event.execution_arn);
            closed.insert(event.execution_arn);
        }
    }

    executions
}
