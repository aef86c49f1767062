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

use std::io::Write;
use std::path::PathBuf;
use structopt::StructOpt;

/// Command line options of the exporter.
#[derive(Default, Clone, Debug, StructOpt)]
#[structopt(
    name = "sfn-export",
    about = "Saves AWS Step Functions state machines, state definitions and executions as JSON"
)]
pub struct ExportOpt {
    /// AWS region [default: us-west-2]
    #[structopt(short = "r", long = "region")]
    pub region: Option<String>,

    /// Directory to save state and execution definitions
    /// [default: stepfunctions_state_definitions]
    #[structopt(short = "o", long = "output-dir", parse(from_os_str))]
    pub output_dir: Option<PathBuf>,

    /// Log level [default: info]
    #[structopt(
        short = "L",
        long = "log-level",
        possible_values = &["error", "warn", "info", "debug", "trace", "off"]
    )]
    pub log_level: Option<String>,

    /// Log ultra-verbose (trace level) information
    #[structopt(long = "trace")]
    pub trace: bool,

    /// Suppress log output
    #[structopt(long = "silent")]
    pub silent: bool,
}

/// Picks the log level from the command line flags. `--trace` wins over
/// `--silent`, which wins over `--log-level`.
pub fn log_level(opt: &ExportOpt) -> log::LevelFilter {
    if opt.trace {
        log::LevelFilter::Trace
    } else if opt.silent {
        log::LevelFilter::Off
    } else {
        match opt.log_level.as_deref() {
            Some("error") => log::LevelFilter::Error,
            Some("warn") => log::LevelFilter::Warn,
            Some("debug") => log::LevelFilter::Debug,
            Some("trace") => log::LevelFilter::Trace,
            Some("off") => log::LevelFilter::Off,
            _ => log::LevelFilter::Info,
        }
    }
}

/// Builds the logger for the chosen level. AWS client crates only log
/// warnings and errors; timestamps are shown at trace level.
pub fn get_logging(opt: &ExportOpt) -> env_logger::Builder {
    let mut builder = env_logger::Builder::new();

    let level = log_level(opt);
    builder.filter(None, level);
    // rusoto and hyper are chatty below warn.
    builder.filter_module("rusoto_core", log::LevelFilter::Warn);
    builder.filter_module("hyper", log::LevelFilter::Warn);

    if level == log::LevelFilter::Trace {
        builder.format_timestamp_secs();
    } else {
        builder.format(|f, record| {
            writeln!(
                f,
                "[{}] {}",
                record.level().to_string().to_lowercase(),
                record.args()
            )
        });
    }

    builder
}
