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

//! Amazon States Language definitions.
//!
//! A State Machine is represented by a JSON Object. The operation of a state
//! machine is specified by states, which are represented by JSON objects,
//! fields in the top-level "States" object. This module flattens that object
//! into one [`State`] per field.
//!
//! The parser is deliberately lenient: only malformed JSON is an error. A
//! field that is missing or has an unexpected type is read as its zero value,
//! since the service has already validated the definition it returns.

use crate::error::{ExportError, Result};
use crate::model::State;
use log::warn;
use serde_json::{Map, Value};

/// The top-level fields of a definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    /// A State Machine MUST have a string field named "StartAt", whose value
    /// MUST exactly match one of names of the "States" fields.
    pub start_at: Option<String>,
    /// A State Machine MAY have a string field named "Comment", provided for
    /// human-readable description of the machine.
    pub comment:  Option<String>,
    /// The states of the machine.
    pub states:   Vec<State>,
}

impl Definition {
    /// Parses an Amazon States Language document.
    pub fn parse(definition: &str) -> Result<Self> {
        let document: Value = serde_json::from_str(definition)
            .map_err(|e| ExportError::Definition(e.to_string()))?;

        let states = match document.get("States").and_then(Value::as_object) {
            Some(states) => states
                .iter()
                .filter_map(|(name, raw)| match raw.as_object() {
                    Some(raw) => Some(parse_state(name, raw)),
                    None => {
                        warn!("Skipping state {}: its definition is not an object", name);
                        None
                    }
                })
                .collect(),
            None => vec![],
        };

        Ok(Definition {
            start_at: string_field(&document, "StartAt"),
            comment: string_field(&document, "Comment"),
            states,
        })
    }

    /// Returns the state named by "StartAt".
    pub fn start_state(&self) -> Option<&State> {
        let start_at = self.start_at.as_ref()?;
        self.states.iter().find(|s| &s.name == start_at)
    }
}

/// Parses the "States" object of an Amazon States Language document into one
/// entry per state.
pub fn parse_definition(definition: &str) -> Result<Vec<State>> {
    Definition::parse(definition).map(|d| d.states)
}

fn parse_state(name: &str, raw: &Map<String, Value>) -> State {
    State {
        name:           name.to_string(),
        state_type:     raw
            .get("Type")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        next:           raw.get("Next").and_then(Value::as_str).map(str::to_string),
        end:            raw.get("End").and_then(Value::as_bool).unwrap_or(false),
        parameters:     raw.get("Parameters").and_then(Value::as_object).cloned(),
        raw_definition: raw.clone(),
    }
}

fn string_field(document: &Value, field: &str) -> Option<String> {
    document
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
}
