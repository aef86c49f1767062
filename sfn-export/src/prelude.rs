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

//! A "prelude" for users of the sfn-export crate.
//!
//! Like the standard library's prelude, this module simplifies importing of
//! common items. Unlike the standard prelude, the contents of this module must
//! be imported manually:
//!
//! ```
//! use sfn_export::prelude::*;
//! ```

pub use crate::aws::{LogService, RusotoLogService, RusotoWorkflowService, WorkflowService};
pub use crate::configs::*;
pub use crate::datasink::{sanitize_file_name, FileSink, SinkReport};
pub use crate::definition::{parse_definition, Definition};
pub use crate::error::{ExportError, Result};
pub use crate::fetcher::{FetchOptions, Fetcher};
pub use crate::model::{Execution, State, StateMachine, WorkflowType};
