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

//! Thin wrappers around the AWS services the exporter reads from.

pub mod cloudwatch;
pub mod stepfunctions;

pub use cloudwatch::{LogQuery, LogService, RusotoLogService};
pub use stepfunctions::{
    ExecutionDescription, Page, RusotoWorkflowService, StateMachineDescription, WorkflowService,
};
