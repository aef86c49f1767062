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

//! This crate contains all wrapped functions of the AWS CloudWatch services.

use crate::error::{ExportError, Result};
use async_trait::async_trait;
use chrono::Duration as Delta;
use chrono::{DateTime, Utc};
use log::info;
use rusoto_core::Region;
use rusoto_logs::{CloudWatchLogs, CloudWatchLogsClient, FilterLogEventsRequest};
use std::time::Duration;

/// Matches the lifecycle events of express workflow executions.
pub const EXECUTION_EVENTS_PATTERN: &str = concat!(
    r#"{ $.eventType = "ExecutionStarted" || $.eventType = "ExecutionSucceeded" || "#,
    r#"$.eventType = "ExecutionFailed" || $.eventType = "ExecutionTimedOut" || "#,
    r#"$.eventType = "ExecutionAborted" }"#
);

/// A filter query against one log group.
#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    /// The name of the log group.
    pub log_group_name: String,
    /// The CloudWatch Logs filter pattern.
    pub filter_pattern: String,
    /// Only events at or after this epoch millisecond are returned.
    pub start_time:     i64,
    /// The maximum number of events to return.
    pub limit:          i64,
}

/// The CloudWatch Logs calls the exporter depends on.
#[async_trait]
pub trait LogService: Send + Sync {
    /// Returns the messages of the log events matching the query.
    async fn filter_log_events(&self, query: &LogQuery) -> Result<Vec<String>>;
}

/// [`LogService`] backed by the rusoto CloudWatch Logs client.
pub struct RusotoLogService {
    client: CloudWatchLogsClient,
}

impl RusotoLogService {
    /// Creates a service talking to CloudWatch Logs in the given region.
    pub fn new(region: Region) -> Self {
        Self {
            client: CloudWatchLogsClient::new(region),
        }
    }
}

#[async_trait]
impl LogService for RusotoLogService {
    async fn filter_log_events(&self, query: &LogQuery) -> Result<Vec<String>> {
        let req = FilterLogEventsRequest {
            log_group_name: query.log_group_name.clone(),
            filter_pattern: Some(query.filter_pattern.clone()),
            start_time: Some(query.start_time),
            limit: Some(query.limit),
            ..Default::default()
        };
        info!("Sending log request {:?}", &req);

        let response = self
            .client
            .filter_log_events(req)
            .await
            .map_err(|e| ExportError::AWS(format!("Error fetching logs: {}", e)))?;

        Ok(response
            .events
            .unwrap_or_default()
            .into_iter()
            .filter_map(|event| event.message)
            .collect())
    }
}

/// Extracts the log group name from a log group ARN such as
/// `arn:aws:logs:us-west-2:123456789012:log-group:/aws/states/orders:*`.
pub fn log_group_name(log_group_arn: &str) -> Result<String> {
    log_group_arn
        .split_once(":log-group:")
        .and_then(|(_, rest)| rest.split(':').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ExportError::Logging(format!(
                "{} is not a CloudWatch Logs log group ARN",
                log_group_arn
            ))
        })
}

/// Calculates the start time of the log request.
/// The start time is `from` minus the given duration.
///
/// # Arguments
/// * `from` - The end of the search window.
/// * `delta` - The length of the search window.
///
/// # Returns
/// The start time in epoch milliseconds.
pub fn calculate_start_time(from: DateTime<Utc>, delta: Duration) -> Result<i64> {
    let chrono_delta = Delta::from_std(delta).map_err(|e| ExportError::Config(e.to_string()))?;
    from.checked_sub_signed(chrono_delta)
        .map(|start| start.timestamp_millis())
        .ok_or_else(|| ExportError::Config(format!("lookback {:?} is too large", delta)))
}

/// Creates the query for the execution lifecycle events of the given log
/// group.
///
/// # Arguments
/// * `group` - The name of the log group.
/// * `lookback` - How far back from now events are searched.
/// * `limit` - The maximum number of events to return.
pub fn execution_events_query(group: &str, lookback: Duration, limit: i64) -> Result<LogQuery> {
    Ok(LogQuery {
        log_group_name: group.to_string(),
        filter_pattern: EXECUTION_EVENTS_PATTERN.to_string(),
        start_time:     calculate_start_time(Utc::now(), lookback)?,
        limit,
    })
}
