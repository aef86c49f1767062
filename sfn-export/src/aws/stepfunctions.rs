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

//! This crate contains all wrapped functions of the AWS Step Functions
//! service.

use crate::error::{ExportError, Result};
use crate::history::epoch_seconds;
use crate::model::WorkflowType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use rusoto_core::Region;
use rusoto_stepfunctions::{
    DescribeExecutionInput, DescribeStateMachineInput, DescribeStateMachineOutput,
    ListExecutionsInput, ListStateMachinesInput, StepFunctions, StepFunctionsClient,
};

/// One page of a paginated listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page<T> {
    /// The items of this page.
    pub items:      Vec<T>,
    /// The token to use when requesting the next page, if there is one.
    pub next_token: Option<String>,
}

/// The details of a state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct StateMachineDescription {
    /// The name of the state machine.
    pub name:           String,
    /// The ARN of the state machine.
    pub arn:            String,
    /// The ARN of the IAM role of the state machine.
    pub role_arn:       String,
    /// The Amazon States Language definition.
    pub definition:     String,
    /// When the state machine was created.
    pub creation_date:  DateTime<Utc>,
    /// STANDARD, EXPRESS or whatever the service reported.
    pub workflow_type:  WorkflowType,
    /// The CloudWatch Logs log group ARNs of the logging destinations, in the
    /// order they are configured.
    pub log_group_arns: Vec<String>,
}

/// The details of a single execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionDescription {
    /// The ARN of the execution.
    pub execution_arn: String,
    /// RUNNING, SUCCEEDED, FAILED, TIMED_OUT or ABORTED.
    pub status:        String,
    /// When the execution started.
    pub start_date:    DateTime<Utc>,
    /// When the execution stopped, if it did.
    pub stop_date:     Option<DateTime<Utc>>,
}

/// The Step Functions calls the exporter depends on.
#[async_trait]
pub trait WorkflowService: Send + Sync {
    /// Lists one page of state machine ARNs.
    async fn list_state_machines(&self, next_token: Option<String>) -> Result<Page<String>>;
    /// Describes a state machine.
    async fn describe_state_machine(&self, arn: &str) -> Result<StateMachineDescription>;
    /// Lists one page of execution ARNs of a state machine, at most
    /// `max_results` per page.
    async fn list_executions(
        &self,
        state_machine_arn: &str,
        max_results: i64,
        next_token: Option<String>,
    ) -> Result<Page<String>>;
    /// Describes an execution.
    async fn describe_execution(&self, execution_arn: &str) -> Result<ExecutionDescription>;
}

/// [`WorkflowService`] backed by the rusoto Step Functions client.
pub struct RusotoWorkflowService {
    client: StepFunctionsClient,
}

impl RusotoWorkflowService {
    /// Creates a service talking to Step Functions in the given region.
    pub fn new(region: Region) -> Self {
        Self {
            client: StepFunctionsClient::new(region),
        }
    }
}

#[async_trait]
impl WorkflowService for RusotoWorkflowService {
    async fn list_state_machines(&self, next_token: Option<String>) -> Result<Page<String>> {
        let response = self
            .client
            .list_state_machines(ListStateMachinesInput {
                next_token,
                ..Default::default()
            })
            .await
            .map_err(|e| ExportError::AWS(format!("Error listing state machines: {}", e)))?;

        Ok(Page {
            items:      response
                .state_machines
                .into_iter()
                .map(|sm| sm.state_machine_arn)
                .collect(),
            next_token: response.next_token,
        })
    }

    async fn describe_state_machine(&self, arn: &str) -> Result<StateMachineDescription> {
        debug!("Describing state machine {}", arn);
        let response = self
            .client
            .describe_state_machine(DescribeStateMachineInput {
                state_machine_arn: arn.to_owned(),
            })
            .await
            .map_err(|e| {
                ExportError::AWS(format!("Error describing state machine {}: {}", arn, e))
            })?;
        to_description(response)
    }

    async fn list_executions(
        &self,
        state_machine_arn: &str,
        max_results: i64,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        let response = self
            .client
            .list_executions(ListExecutionsInput {
                state_machine_arn: state_machine_arn.to_owned(),
                max_results: Some(max_results),
                next_token,
                ..Default::default()
            })
            .await
            .map_err(|e| {
                ExportError::AWS(format!(
                    "Error listing executions of {}: {}",
                    state_machine_arn, e
                ))
            })?;

        Ok(Page {
            items:      response
                .executions
                .into_iter()
                .map(|exec| exec.execution_arn)
                .collect(),
            next_token: response.next_token,
        })
    }

    async fn describe_execution(&self, execution_arn: &str) -> Result<ExecutionDescription> {
        let response = self
            .client
            .describe_execution(DescribeExecutionInput {
                execution_arn: execution_arn.to_owned(),
            })
            .await
            .map_err(|e| {
                ExportError::AWS(format!(
                    "Error describing execution {}: {}",
                    execution_arn, e
                ))
            })?;

        Ok(ExecutionDescription {
            execution_arn: response.execution_arn,
            status:        response.status,
            start_date:    epoch_seconds(response.start_date)?,
            stop_date:     response.stop_date.map(epoch_seconds).transpose()?,
        })
    }
}

fn to_description(response: DescribeStateMachineOutput) -> Result<StateMachineDescription> {
    let log_group_arns = response
        .logging_configuration
        .and_then(|config| config.destinations)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|dest| dest.cloud_watch_logs_log_group)
        .filter_map(|group| group.log_group_arn)
        .collect();

    Ok(StateMachineDescription {
        name: response.name,
        arn: response.state_machine_arn,
        role_arn: response.role_arn,
        definition: response.definition,
        creation_date: epoch_seconds(response.creation_date)?,
        workflow_type: WorkflowType::from(response.type_),
        log_group_arns,
    })
}
