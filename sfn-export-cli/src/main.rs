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

//! Saves the state machines of an AWS region, their state definitions and
//! their executions as JSON files, and prints them as tables.

mod args;
mod display;

use anyhow::{Context, Result};
use args::{get_logging, ExportOpt};
use log::info;
use rusoto_core::Region;
use sfn_export::prelude::*;
use std::path::PathBuf;
use std::str::FromStr;
use structopt::StructOpt;

#[tokio::main]
pub async fn main() -> Result<()> {
    let opt = ExportOpt::from_args();
    get_logging(&opt).init();

    let region_name = opt
        .region
        .clone()
        .unwrap_or_else(|| SFN_EXPORT_REGION.to_string());
    let region = Region::from_str(&region_name)
        .with_context(|| format!("Invalid AWS region: {}", region_name))?;
    let output_dir = opt
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(SFN_OUTPUT_DIR.as_str()));

    info!("Exporting state machines of {}", region_name);
    let fetcher = Fetcher::new(region).context("Failed to create fetcher")?;
    let state_machines = fetcher
        .list_state_machines()
        .await
        .context("Failed to list state machines")?;

    let sink = FileSink::create(&output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            output_dir.display()
        )
    })?;

    display::print_state_machines(&state_machines);
    state_machines.iter().for_each(display::print_state_machine);
    let report = sink.persist(&state_machines);

    println!(
        "State and execution definitions saved to {} ({} files written, {} failed)",
        output_dir.display(),
        report.written,
        report.failed
    );
    println!("Done.");
    println!(
        "Note: For Express Workflows, ensure CloudWatch Logs are configured to fetch execution \
         details as execution details are fetched from CloudWatch Logs."
    );
    println!("Note: For Standard Workflows, execution details are fetched directly from Step Functions.");

    Ok(())
}
