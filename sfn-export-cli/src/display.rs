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

//! Console tables of an export run.

use chrono::{DateTime, SecondsFormat, Utc};
use lazy_static::lazy_static;
use log::warn;
use prettytable::{cell, format, row, Table};
use sfn_export::prelude::*;

lazy_static! {
    static ref TBLFMT: format::TableFormat = format::FormatBuilder::new()
        .separators(
            &[format::LinePosition::Title, format::LinePosition::Bottom],
            format::LineSeparator::new('-', '+', '+', '+')
        )
        .padding(1, 1)
        .build();
}

/// Shortens `text` to at most `width` characters, ending it with `...` when
/// something was cut.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn timestamp(t: &Option<DateTime<Utc>>) -> String {
    t.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.set_format(*TBLFMT);
    table
}

/// One row per state machine.
pub fn state_machines_table(state_machines: &[StateMachine]) -> Table {
    let mut table = new_table();
    table.set_titles(row!["Name", "ARN", "Type", "Role ARN", "Creation Date"]);
    for sm in state_machines {
        table.add_row(row![
            sm.name,
            sm.arn,
            sm.workflow_type,
            sm.role_arn,
            sm.creation_date.to_rfc3339_opts(SecondsFormat::Secs, true)
        ]);
    }
    table
}

/// One row per state, with the definition cut to `width` characters.
pub fn states_table(sm: &StateMachine, width: usize) -> Table {
    let mut table = new_table();
    table.set_titles(row!["State Name", "Type", "Next", "End", "Definition"]);
    for state in &sm.states {
        let definition = match serde_json::to_string_pretty(&state.raw_definition) {
            Ok(definition) => definition,
            Err(e) => {
                warn!(
                    "Failed to marshal state definition for {}: {}",
                    state.name, e
                );
                continue;
            }
        };
        table.add_row(row![
            state.name,
            state.state_type,
            state.next.as_deref().unwrap_or_default(),
            state.end,
            truncate(&definition, width)
        ]);
    }
    table
}

/// One row per execution, placeholders included.
pub fn executions_table(sm: &StateMachine) -> Table {
    let mut table = new_table();
    table.set_titles(row![
        "Execution ARN",
        "Status",
        "Start Time",
        "End Time",
        "Duration"
    ]);
    for exec in &sm.executions {
        table.add_row(row![
            exec.execution_arn,
            exec.status,
            timestamp(&exec.start_time),
            timestamp(&exec.end_time),
            exec.duration.as_deref().unwrap_or("N/A")
        ]);
    }
    table
}

/// Prints the summary table of all state machines.
pub fn print_state_machines(state_machines: &[StateMachine]) {
    println!("State Machines:");
    state_machines_table(state_machines).printstd();
    println!();
}

/// Prints the state and execution tables of one state machine.
pub fn print_state_machine(sm: &StateMachine) {
    println!("States for {}:", sm.name);
    states_table(sm, *SFN_DEFINITION_WIDTH).printstd();
    println!();

    println!("Executions for {}:", sm.name);
    executions_table(sm).printstd();
    println!();
}
