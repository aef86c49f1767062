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

//! Collects state machines, their states and their executions.
//!
//! The fetcher walks every state machine of a region one at a time. A state
//! machine that cannot be described is skipped; the executions of an express
//! workflow that cannot be read from CloudWatch Logs are replaced by a single
//! placeholder record. Only a failure to list the state machines themselves
//! is returned to the caller.

use crate::aws::cloudwatch::{execution_events_query, log_group_name};
use crate::aws::{
    LogService, RusotoLogService, RusotoWorkflowService, StateMachineDescription, WorkflowService,
};
use crate::configs::*;
use crate::definition::parse_definition;
use crate::error::{ExportError, Result};
use crate::history::{correlate, standard_execution, LogEvent};
use crate::model::{Execution, StateMachine, WorkflowType, STATUS_LOGGING_NOT_SUPPORTED};
use humantime::parse_duration;
use log::{debug, info, warn};
use rusoto_core::Region;
use std::sync::Arc;
use std::time::Duration;

/// Tunables of a fetch run.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Page size of the execution listing of standard workflows.
    pub executions_page_size: i64,
    /// How far back express workflow events are searched.
    pub logs_lookback:        Duration,
    /// Maximum number of express workflow events read per state machine.
    pub logs_limit:           i64,
}

impl FetchOptions {
    /// Reads the options from the built-in configuration.
    pub fn from_config() -> Result<Self> {
        Ok(Self {
            executions_page_size: *SFN_EXECUTIONS_PAGE_SIZE,
            logs_lookback:        parse_duration(&SFN_LOGS_LOOKBACK).map_err(|e| {
                ExportError::Config(format!("invalid lookback {}: {}", *SFN_LOGS_LOOKBACK, e))
            })?,
            logs_limit:           *SFN_LOGS_FILTER_LIMIT,
        })
    }
}

/// Reads state machines and their execution history.
pub struct Fetcher {
    workflows: Arc<dyn WorkflowService>,
    logs:      Arc<dyn LogService>,
    options:   FetchOptions,
}

impl Fetcher {
    /// Creates a fetcher talking to AWS in the given region, configured from
    /// the built-in settings.
    pub fn new(region: Region) -> Result<Self> {
        Ok(Self::with_services(
            Arc::new(RusotoWorkflowService::new(region.clone())),
            Arc::new(RusotoLogService::new(region)),
            FetchOptions::from_config()?,
        ))
    }

    /// Creates a fetcher on top of the given services.
    pub fn with_services(
        workflows: Arc<dyn WorkflowService>,
        logs: Arc<dyn LogService>,
        options: FetchOptions,
    ) -> Self {
        Self {
            workflows,
            logs,
            options,
        }
    }

    /// Lists all state machines together with their states and executions.
    ///
    /// State machines whose details cannot be fetched are logged and left
    /// out of the result.
    pub async fn list_state_machines(&self) -> Result<Vec<StateMachine>> {
        let mut state_machines = vec![];
        let mut next_token: Option<String> = None;
        loop {
            let page = self.workflows.list_state_machines(next_token).await?;
            for arn in page.items {
                match self.state_machine_details(&arn).await {
                    Ok(sm) => state_machines.push(sm),
                    Err(e) => warn!("Failed to get details for {}: {}", arn, e),
                }
            }
            if page.next_token.is_none() {
                break;
            }
            next_token = page.next_token;
        }
        info!("Found {} state machines", state_machines.len());
        Ok(state_machines)
    }

    /// Describes a state machine, parses its definition and fetches its
    /// executions according to its workflow type.
    pub async fn state_machine_details(&self, arn: &str) -> Result<StateMachine> {
        let desc = self.workflows.describe_state_machine(arn).await?;
        debug!("State machine {} type: {}", desc.name, desc.workflow_type);

        let states = parse_definition(&desc.definition)?;

        let executions = match &desc.workflow_type {
            WorkflowType::Standard => self.standard_executions(arn).await?,
            WorkflowType::Express => {
                debug!(
                    "Fetching executions from CloudWatch Logs for express workflow {}",
                    desc.name
                );
                match self.express_executions(&desc).await {
                    Ok(executions) => executions,
                    Err(e) => {
                        warn!(
                            "Failed to fetch express workflow executions for {}: {}",
                            desc.name, e
                        );
                        vec![Execution::sentinel(STATUS_LOGGING_NOT_SUPPORTED)]
                    }
                }
            }
            WorkflowType::Unknown(t) => {
                warn!("Unknown state machine type {} for {}", t, desc.name);
                vec![Execution::sentinel(format!(
                    "Unknown state machine type: {}",
                    t
                ))]
            }
        };

        Ok(StateMachine {
            name: desc.name,
            arn: desc.arn,
            role_arn: desc.role_arn,
            definition: desc.definition,
            states,
            executions,
            creation_date: desc.creation_date,
            workflow_type: desc.workflow_type,
        })
    }

    /// Fetches every execution of a standard workflow.
    ///
    /// An execution that cannot be described is logged and skipped.
    pub async fn standard_executions(&self, state_machine_arn: &str) -> Result<Vec<Execution>> {
        let mut executions = vec![];
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .workflows
                .list_executions(
                    state_machine_arn,
                    self.options.executions_page_size,
                    next_token,
                )
                .await?;
            for execution_arn in page.items {
                match self.workflows.describe_execution(&execution_arn).await {
                    Ok(desc) => executions.push(standard_execution(&desc)),
                    Err(e) => warn!("Failed to describe execution {}: {}", execution_arn, e),
                }
            }
            if page.next_token.is_none() {
                break;
            }
            next_token = page.next_token;
        }
        Ok(executions)
    }

    /// Rebuilds the executions of an express workflow from the lifecycle
    /// events in its CloudWatch Logs log group.
    ///
    /// Fails if the state machine does not log to CloudWatch Logs.
    pub async fn express_executions(&self, desc: &StateMachineDescription) -> Result<Vec<Execution>> {
        let log_group_arn = desc.log_group_arns.first().ok_or_else(|| {
            ExportError::Logging(format!(
                "logging not enabled for express workflow {}",
                desc.name
            ))
        })?;
        let group = log_group_name(log_group_arn)?;
        debug!("Querying CloudWatch Log Group {} for {}", group, desc.name);

        let query =
            execution_events_query(&group, self.options.logs_lookback, self.options.logs_limit)?;
        let messages = self.logs.filter_log_events(&query).await?;

        let events = messages
            .iter()
            .filter_map(|message| match LogEvent::from_message(message) {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Failed to parse log event for {}: {}", desc.name, e);
                    None
                }
            })
            .collect::<Vec<_>>();

        let executions = correlate(events);
        if executions.is_empty() {
            debug!("No execution events found in CloudWatch Logs for {}", desc.name);
        } else {
            debug!(
                "Found {} executions in CloudWatch Logs for {}",
                executions.len(),
                desc.name
            );
        }
        Ok(executions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aws::ExecutionDescription;
    use crate::datasink::FileSink;
    use crate::history::epoch_millis;
    use crate::model::STATUS_RUNNING;
    use crate::test_util::*;
    use std::fs;

    const LOG_GROUP_ARN: &str =
        "arn:aws:logs:us-west-2:1:log-group:/aws/vendedlogs/states/express:*";

    fn fetcher(workflows: MockWorkflowService, logs: MockLogService) -> Fetcher {
        Fetcher::with_services(Arc::new(workflows), Arc::new(logs), test_options())
    }

    fn execution(arn: &str, start: i64, stop: Option<i64>, status: &str) -> ExecutionDescription {
        ExecutionDescription {
            execution_arn: arn.to_string(),
            status:        status.to_string(),
            start_date:    epoch_millis(start).unwrap(),
            stop_date:     stop.map(|t| epoch_millis(t).unwrap()),
        }
    }

    #[tokio::test]
    async fn standard_workflow_executions() -> Result<()> {
        let mut workflows = MockWorkflowService::default();
        let desc = description("orders", WorkflowType::Standard);
        let arn = desc.arn.clone();
        workflows.add_state_machine(desc);
        workflows.add_execution(&arn, execution("run-1", 1_000, Some(3_000), "SUCCEEDED"));
        workflows.add_execution(&arn, execution("run-2", 5_000, None, "RUNNING"));
        workflows.add_execution(&arn, execution("run-3", 6_000, Some(6_500), "FAILED"));
        // Listed but cannot be described.
        workflows
            .executions
            .get_mut(&arn)
            .unwrap()
            .push("run-gone".to_string());

        let workflows = Arc::new(workflows);
        let fetcher = Fetcher::with_services(
            workflows.clone(),
            Arc::new(MockLogService::default()),
            test_options(),
        );
        let sm = fetcher.state_machine_details(&arn).await?;

        assert_eq!(sm.name, "orders");
        assert_eq!(sm.workflow_type, WorkflowType::Standard);
        assert_eq!(sm.states.len(), 2);
        assert_eq!(sm.executions.len(), 3);
        assert_eq!(*workflows.requested_page_sizes.lock().unwrap(), vec![2, 2]);

        let finished = &sm.executions[0];
        assert_eq!(finished.status, "SUCCEEDED");
        assert_eq!(finished.elapsed(), Some(chrono::Duration::seconds(2)));
        assert_eq!(finished.duration.as_deref(), Some("2s"));

        let running = &sm.executions[1];
        assert_eq!(running.status, STATUS_RUNNING);
        assert_eq!(running.end_time, None);
        assert_eq!(running.duration, None);
        Ok(())
    }

    #[tokio::test]
    async fn express_workflow_without_logging_degrades() -> Result<()> {
        let mut workflows = MockWorkflowService::default();
        workflows.add_state_machine(description("express", WorkflowType::Express));
        let logs = Arc::new(MockLogService::default());
        let fetcher =
            Fetcher::with_services(Arc::new(workflows), logs.clone(), test_options());

        let machines = fetcher.list_state_machines().await?;
        assert_eq!(machines.len(), 1);
        assert_eq!(
            machines[0].executions,
            vec![Execution::sentinel(STATUS_LOGGING_NOT_SUPPORTED)]
        );
        assert!(logs.queries.lock().unwrap().is_empty());

        let tmp = tempfile::tempdir()?;
        let sink = FileSink::create(tmp.path())?;
        let report = sink.persist(&machines);
        // Two states and the collection, no execution file.
        assert_eq!(report.written, 3);
        let names = fs::read_dir(sink.dir())?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().to_string()))
            .collect::<std::io::Result<Vec<_>>>()?;
        assert!(!names.iter().any(|n| n.contains("_execution_")));
        Ok(())
    }

    #[tokio::test]
    async fn express_workflow_executions_from_logs() -> Result<()> {
        let mut workflows = MockWorkflowService::default();
        let mut desc = description("express", WorkflowType::Express);
        desc.log_group_arns = vec![LOG_GROUP_ARN.to_string()];
        let arn = desc.arn.clone();
        workflows.add_state_machine(desc);

        let mut logs = MockLogService::default();
        logs.messages.insert(
            "/aws/vendedlogs/states/express".to_string(),
            vec![
                r#"{"eventType":"ExecutionStarted","executionArn":"e-1","timestamp":1000}"#,
                r#"{"eventType":"ExecutionSucceeded","executionArn":"e-2","timestamp":1500}"#,
                "not json",
                r#"{"eventType":"ExecutionStarted","executionArn":"e-2","timestamp":2000}"#,
                r#"{"eventType":"ExecutionSucceeded","executionArn":"e-1","timestamp":4000}"#,
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
        );
        let logs = Arc::new(logs);
        let fetcher = Fetcher::with_services(Arc::new(workflows), logs.clone(), test_options());

        let sm = fetcher.state_machine_details(&arn).await?;
        assert_eq!(sm.executions.len(), 2);
        assert_eq!(sm.executions[0].execution_arn, "e-1");
        assert_eq!(sm.executions[0].status, "SUCCEEDED");
        assert_eq!(sm.executions[0].duration.as_deref(), Some("3s"));
        assert_eq!(sm.executions[1].execution_arn, "e-2");
        assert_eq!(sm.executions[1].status, STATUS_RUNNING);

        let queries = logs.queries.lock().unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].log_group_name, "/aws/vendedlogs/states/express");
        assert_eq!(queries[0].limit, 50);
        Ok(())
    }

    #[tokio::test]
    async fn express_workflow_with_failing_query_degrades() -> Result<()> {
        let mut workflows = MockWorkflowService::default();
        let mut desc = description("express", WorkflowType::Express);
        desc.log_group_arns = vec![LOG_GROUP_ARN.to_string()];
        let arn = desc.arn.clone();
        workflows.add_state_machine(desc);

        let sm = fetcher(workflows, MockLogService::default())
            .state_machine_details(&arn)
            .await?;
        assert_eq!(
            sm.executions,
            vec![Execution::sentinel(STATUS_LOGGING_NOT_SUPPORTED)]
        );
        Ok(())
    }

    #[tokio::test]
    async fn unknown_workflow_type_gets_placeholder() -> Result<()> {
        let mut workflows = MockWorkflowService::default();
        let desc = description("odd", WorkflowType::Unknown("BATCH".to_string()));
        let arn = desc.arn.clone();
        workflows.add_state_machine(desc);

        let sm = fetcher(workflows, MockLogService::default())
            .state_machine_details(&arn)
            .await?;
        assert_eq!(sm.executions.len(), 1);
        assert!(sm.executions[0].is_sentinel());
        assert_eq!(sm.executions[0].status, "Unknown state machine type: BATCH");
        Ok(())
    }

    #[tokio::test]
    async fn failed_details_skip_the_state_machine() -> Result<()> {
        let mut workflows = MockWorkflowService::default();
        workflows.add_state_machine(description("first", WorkflowType::Standard));
        let mut broken = description("broken", WorkflowType::Standard);
        broken.definition = "{not json".to_string();
        workflows.add_state_machine(broken);
        workflows.state_machine_pages.push(vec![
            "arn:aws:states:us-west-2:1:stateMachine:deleted".to_string(),
        ]);
        workflows.add_state_machine(description("last", WorkflowType::Standard));

        let machines = fetcher(workflows, MockLogService::default())
            .list_state_machines()
            .await?;
        let names = machines.iter().map(|m| m.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["first", "last"]);
        Ok(())
    }

    #[tokio::test]
    async fn failed_execution_listing_skips_the_state_machine() -> Result<()> {
        let mut workflows = MockWorkflowService::default();
        for name in ["before", "locked", "after"] {
            let desc = description(name, WorkflowType::Standard);
            let arn = desc.arn.clone();
            workflows.add_state_machine(desc);
            workflows.add_execution(
                &arn,
                execution(&format!("{}-run", name), 1_000, Some(2_000), "SUCCEEDED"),
            );
        }
        workflows
            .failing_executions
            .insert(description("locked", WorkflowType::Standard).arn);

        let machines = fetcher(workflows, MockLogService::default())
            .list_state_machines()
            .await?;
        let names = machines.iter().map(|m| m.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["before", "after"]);
        assert!(machines.iter().all(|m| m.executions.len() == 1));
        Ok(())
    }

    #[tokio::test]
    async fn listing_failure_aborts() {
        let workflows = MockWorkflowService {
            fail_listing: true,
            ..Default::default()
        };
        let result = fetcher(workflows, MockLogService::default())
            .list_state_machines()
            .await;
        assert!(matches!(result, Err(ExportError::AWS(_))));
    }

    #[tokio::test]
    async fn empty_region_writes_empty_collection() -> Result<()> {
        let machines = fetcher(MockWorkflowService::default(), MockLogService::default())
            .list_state_machines()
            .await?;
        assert!(machines.is_empty());

        let tmp = tempfile::tempdir()?;
        let sink = FileSink::create(tmp.path().join("snapshot"))?;
        let report = sink.persist(&machines);
        assert_eq!(report.written, 1);
        assert_eq!(report.failed, 0);

        let entries = fs::read_dir(sink.dir())?.count();
        assert_eq!(entries, 1);
        let collection: serde_json::Value =
            serde_json::from_slice(&fs::read(sink.state_machines_path())?)?;
        assert_eq!(collection, serde_json::json!([]));
        Ok(())
    }

    #[test]
    fn options_from_config() -> Result<()> {
        let options = FetchOptions::from_config()?;
        assert_eq!(options.executions_page_size, 50);
        assert_eq!(options.logs_lookback, Duration::from_secs(24 * 60 * 60));
        assert_eq!(options.logs_limit, 50);
        Ok(())
    }
}
