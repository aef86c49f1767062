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

//! In-memory AWS services for unit tests.

use crate::aws::{
    ExecutionDescription, LogQuery, LogService, Page, StateMachineDescription, WorkflowService,
};
use crate::error::{ExportError, Result};
use crate::fetcher::FetchOptions;
use crate::history::epoch_millis;
use crate::model::WorkflowType;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Options with small pages so that pagination is exercised.
pub fn test_options() -> FetchOptions {
    FetchOptions {
        executions_page_size: 2,
        logs_lookback:        Duration::from_secs(24 * 60 * 60),
        logs_limit:           50,
    }
}

/// A state machine description with a two-state definition.
pub fn description(name: &str, workflow_type: WorkflowType) -> StateMachineDescription {
    StateMachineDescription {
        name:           name.to_string(),
        arn:            format!("arn:aws:states:us-west-2:1:stateMachine:{}", name),
        role_arn:       format!("arn:aws:iam::1:role/{}", name),
        definition:     r#"{"StartAt":"Hello","States":{"Hello":{"Type":"Pass","Next":"World"},"World":{"Type":"Succeed"}}}"#.to_string(),
        creation_date:  epoch_millis(1_600_000_000_000).unwrap(),
        workflow_type,
        log_group_arns: vec![],
    }
}

/// Step Functions served from memory. ARNs missing from the maps fail like
/// a service error would.
#[derive(Default)]
pub struct MockWorkflowService {
    /// Pages returned by `list_state_machines`, in order.
    pub state_machine_pages: Vec<Vec<String>>,
    /// Fails `list_state_machines` when set.
    pub fail_listing:        bool,
    /// Descriptions by state machine ARN.
    pub state_machines:      HashMap<String, StateMachineDescription>,
    /// Execution ARNs by state machine ARN.
    pub executions:          HashMap<String, Vec<String>>,
    /// State machine ARNs whose execution listing fails.
    pub failing_executions:  HashSet<String>,
    /// Execution descriptions by execution ARN.
    pub execution_details:   HashMap<String, ExecutionDescription>,
    /// Page sizes requested from `list_executions`.
    pub requested_page_sizes: Mutex<Vec<i64>>,
}

impl MockWorkflowService {
    /// Registers a state machine on a single listing page.
    pub fn add_state_machine(&mut self, desc: StateMachineDescription) {
        match self.state_machine_pages.last_mut() {
            Some(page) => page.push(desc.arn.clone()),
            None => self.state_machine_pages.push(vec![desc.arn.clone()]),
        }
        self.state_machines.insert(desc.arn.clone(), desc);
    }

    /// Registers an execution of a state machine.
    pub fn add_execution(&mut self, state_machine_arn: &str, desc: ExecutionDescription) {
        self.executions
            .entry(state_machine_arn.to_string())
            .or_default()
            .push(desc.execution_arn.clone());
        self.execution_details
            .insert(desc.execution_arn.clone(), desc);
    }
}

fn page_index(next_token: &Option<String>) -> Result<usize> {
    match next_token {
        None => Ok(0),
        Some(t) => t
            .parse::<usize>()
            .map_err(|_| ExportError::AWS(format!("invalid token {}", t))),
    }
}

#[async_trait]
impl WorkflowService for MockWorkflowService {
    async fn list_state_machines(&self, next_token: Option<String>) -> Result<Page<String>> {
        if self.fail_listing {
            return Err(ExportError::AWS("AccessDeniedException".to_string()));
        }
        let index = page_index(&next_token)?;
        Ok(Page {
            items:      self
                .state_machine_pages
                .get(index)
                .cloned()
                .unwrap_or_default(),
            next_token: if index + 1 < self.state_machine_pages.len() {
                Some((index + 1).to_string())
            } else {
                None
            },
        })
    }

    async fn describe_state_machine(&self, arn: &str) -> Result<StateMachineDescription> {
        self.state_machines
            .get(arn)
            .cloned()
            .ok_or_else(|| ExportError::AWS(format!("StateMachineDoesNotExist: {}", arn)))
    }

    async fn list_executions(
        &self,
        state_machine_arn: &str,
        max_results: i64,
        next_token: Option<String>,
    ) -> Result<Page<String>> {
        self.requested_page_sizes.lock().unwrap().push(max_results);
        if self.failing_executions.contains(state_machine_arn) {
            return Err(ExportError::AWS(format!(
                "AccessDeniedException: {}",
                state_machine_arn
            )));
        }
        let all = self
            .executions
            .get(state_machine_arn)
            .cloned()
            .unwrap_or_default();
        let start = page_index(&next_token)?;
        let end = (start + max_results as usize).min(all.len());
        Ok(Page {
            items:      all[start.min(end)..end].to_vec(),
            next_token: if end < all.len() {
                Some(end.to_string())
            } else {
                None
            },
        })
    }

    async fn describe_execution(&self, execution_arn: &str) -> Result<ExecutionDescription> {
        self.execution_details
            .get(execution_arn)
            .cloned()
            .ok_or_else(|| ExportError::AWS(format!("ExecutionDoesNotExist: {}", execution_arn)))
    }
}

/// CloudWatch Logs served from memory.
#[derive(Default)]
pub struct MockLogService {
    /// Messages by log group name.
    pub messages: HashMap<String, Vec<String>>,
    /// Queries received so far.
    pub queries:  Mutex<Vec<LogQuery>>,
}

#[async_trait]
impl LogService for MockLogService {
    async fn filter_log_events(&self, query: &LogQuery) -> Result<Vec<String>> {
        self.queries.lock().unwrap().push(query.clone());
        self.messages
            .get(&query.log_group_name)
            .cloned()
            .ok_or_else(|| {
                ExportError::AWS(format!(
                    "ResourceNotFoundException: {}",
                    query.log_group_name
                ))
            })
    }
}
