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

//! Exporter error types

use std::error;
use std::fmt::{Display, Formatter};
use std::io;
use std::result;

/// Result type for operations that could result in an [ExportError]
pub type Result<T> = result::Result<T, ExportError>;

/// Exporter error
#[derive(Debug)]
pub enum ExportError {
    /// Error returned when accessing the AWS services fails.
    AWS(String),
    /// Error associated to I/O operations and associated traits.
    IoError(io::Error),
    /// Error returned when serde_json failed to serialize or deserialize data.
    SerdeJson(serde_json::Error),
    /// Error returned when a state machine definition is not valid JSON.
    Definition(String),
    /// Error returned when an express workflow has no usable CloudWatch Logs
    /// destination.
    Logging(String),
    /// Error returned when a configuration value cannot be interpreted.
    /// Examples include unknown regions and malformed durations.
    Config(String),
    /// Error returned as a consequence of an error in the exporter.
    /// This error should not happen in normal usage.
    Internal(String),
}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        ExportError::IoError(e)
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(e: serde_json::Error) -> Self {
        ExportError::SerdeJson(e)
    }
}

impl From<&str> for ExportError {
    fn from(e: &str) -> Self {
        ExportError::Internal(e.to_string())
    }
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            ExportError::AWS(ref desc) => write!(f, "AWS error: {}", desc),
            ExportError::IoError(ref desc) => write!(f, "IO error: {}", desc),
            ExportError::SerdeJson(ref desc) => write!(f, "serde_json error: {}", desc),
            ExportError::Definition(ref desc) => {
                write!(f, "Invalid state machine definition: {}", desc)
            }
            ExportError::Logging(ref desc) => write!(f, "Logging configuration error: {}", desc),
            ExportError::Config(ref desc) => write!(f, "Configuration error: {}", desc),
            ExportError::Internal(ref desc) => write!(f, "Internal error: {}", desc),
        }
    }
}

impl error::Error for ExportError {}
