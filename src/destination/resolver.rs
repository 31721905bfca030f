//! Ensures a destination's group and stream exist.

use crate::api::{operations, LogsApi, Verify};
use crate::error::LogsError;
use crate::resilience::RetryPolicy;
use crate::types::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Resolves the current sequence token of a destination, creating the
/// group and stream when they do not exist yet.
///
/// The whole describe/create sequence runs under the retry policy: a
/// failure at any step restarts it from the group lookup.
#[derive(Clone)]
pub struct DestinationResolver {
    api: Arc<dyn LogsApi>,
    retry: RetryPolicy,
}

impl DestinationResolver {
    /// Create a resolver.
    pub fn new(api: Arc<dyn LogsApi>, retry: RetryPolicy) -> Self {
        Self { api, retry }
    }

    /// Current token of the destination, or `None` for a new or never
    /// written stream.
    pub async fn init(&self, destination: &DestinationKey) -> Result<Option<String>, LogsError> {
        debug!(destination = %destination, "Resolving log destination");
        self.retry
            .execute("ResolveDestination", || self.resolve_once(destination))
            .await
    }

    async fn resolve_once(&self, destination: &DestinationKey) -> Result<Option<String>, LogsError> {
        self.ensure_group(destination.group()).await?;

        match self.find_stream(destination).await? {
            Some(stream) => Ok(stream.upload_sequence_token),
            None => {
                let created = self
                    .api
                    .create_log_stream(CreateLogStreamRequest::new(
                        destination.group(),
                        destination.stream(),
                    ))
                    .await;
                match created {
                    Ok(response) => {
                        response.verify_named(operations::CREATE_LOG_STREAM)?;
                        info!(destination = %destination, "Created log stream");
                        Ok(None)
                    }
                    // Another process won the race; pick up its token.
                    Err(e) if already_exists(&e) => Ok(self
                        .find_stream(destination)
                        .await?
                        .and_then(|stream| stream.upload_sequence_token)),
                    Err(e) => Err(e),
                }
            }
        }
    }

    async fn ensure_group(&self, group: &str) -> Result<(), LogsError> {
        let mut request = DescribeLogGroupsRequest::with_prefix(group);
        loop {
            let response = self
                .api
                .describe_log_groups(request.clone())
                .await?
                .verify_named(operations::DESCRIBE_LOG_GROUPS)?;

            if response.log_groups.iter().any(|g| g.log_group_name == group) {
                return Ok(());
            }
            match response.next_token {
                Some(next) => request.next_token = Some(next),
                None => break,
            }
        }

        match self.api.create_log_group(CreateLogGroupRequest::new(group)).await {
            Ok(response) => {
                response.verify_named(operations::CREATE_LOG_GROUP)?;
                info!(group, "Created log group");
                Ok(())
            }
            Err(e) if already_exists(&e) => {
                debug!(group, "Log group created concurrently");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn find_stream(&self, destination: &DestinationKey) -> Result<Option<LogStream>, LogsError> {
        let mut request = DescribeLogStreamsRequest::with_prefix(destination.group(), destination.stream());
        loop {
            let response = self
                .api
                .describe_log_streams(request.clone())
                .await?
                .verify_named(operations::DESCRIBE_LOG_STREAMS)?;

            if let Some(stream) = response
                .log_streams
                .into_iter()
                .find(|s| s.log_stream_name == destination.stream())
            {
                return Ok(Some(stream));
            }
            match response.next_token {
                Some(next) => request.next_token = Some(next),
                None => return Ok(None),
            }
        }
    }
}

fn already_exists(error: &LogsError) -> bool {
    error.error_code() == Some("ResourceAlreadyExistsException")
}

impl std::fmt::Debug for DestinationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DestinationResolver")
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}
