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

#![warn(missing_docs, clippy::needless_borrow)]
// Clippy lints, some should be disabled incrementally
#![allow(clippy::upper_case_acronyms, clippy::new_without_default)]

//! Exports AWS Step Functions state machines, their Amazon States Language
//! definitions and their execution history as JSON snapshots.
//!
//! Standard workflows report executions through the Step Functions API;
//! express workflows are reconstructed from the lifecycle events they log to
//! CloudWatch Logs. Both end up as the same [`model::Execution`] record.

pub mod aws;
pub mod config;
pub mod configs;
pub mod datasink;
pub mod definition;
pub mod error;
pub mod fetcher;
pub mod history;
pub mod model;
pub mod prelude;
#[cfg(test)]
pub mod test_util;
