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

//! This module provides various default configurations for the exporter.

pub use crate::config::SFN_EXPORT_CONF;
use lazy_static::lazy_static;

lazy_static! {
    /// Default AWS region.
    pub static ref SFN_EXPORT_REGION: String = SFN_EXPORT_CONF["aws"]["region"].to_string();

    /// Maximum number of executions per ListExecutions page.
    pub static ref SFN_EXECUTIONS_PAGE_SIZE: i64 = SFN_EXPORT_CONF["stepfunctions"]["executions_page_size"].parse::<i64>().unwrap();

    /// Lookback window of the express workflow log query, in humantime format.
    pub static ref SFN_LOGS_LOOKBACK: String = SFN_EXPORT_CONF["cloudwatch"]["lookback"].to_string();
    /// Maximum number of log events returned by a single log query.
    pub static ref SFN_LOGS_FILTER_LIMIT: i64 = SFN_EXPORT_CONF["cloudwatch"]["filter_limit"].parse::<i64>().unwrap();

    /// Default output directory.
    pub static ref SFN_OUTPUT_DIR: String = SFN_EXPORT_CONF["output"]["directory"].to_string();
    /// Width of the definition column in the console state tables.
    pub static ref SFN_DEFINITION_WIDTH: usize = SFN_EXPORT_CONF["output"]["definition_width"].parse::<usize>().unwrap();
}

/// Execution ARN of a placeholder record used when no execution data can be
/// obtained.
pub const SENTINEL_EXECUTION_ARN: &str = "N/A";

/// Name of the file holding the whole state machine collection.
pub const STATE_MACHINES_FILE: &str = "state_machines.json";
