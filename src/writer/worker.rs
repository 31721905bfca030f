//! The task that drains a writer's queue.

use crate::api::{operations, LogsApi, Verify};
use crate::destination::{DestinationResolver, TokenCache};
use crate::error::LogsError;
use crate::resilience::RetryPolicy;
use crate::types::{DestinationKey, InputLogEvent, PutLogEventsRequest};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

const RESOURCE_NOT_FOUND: &str = "ResourceNotFoundException";

/// Events for one destination, already in chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Partition {
    pub(crate) destination: DestinationKey,
    pub(crate) events: Vec<InputLogEvent>,
}

pub(crate) struct Job {
    pub(crate) partitions: Vec<Partition>,
    pub(crate) done: oneshot::Sender<Result<(), LogsError>>,
}

pub(crate) enum Command {
    Write(Job),
    Flush(oneshot::Sender<()>),
}

pub(crate) struct Worker {
    api: Arc<dyn LogsApi>,
    cache: TokenCache,
    resolver: DestinationResolver,
    retry: RetryPolicy,
}

impl Worker {
    pub(crate) fn new(api: Arc<dyn LogsApi>, cache: TokenCache, retry: RetryPolicy) -> Self {
        Self {
            resolver: DestinationResolver::new(api.clone(), retry.clone()),
            api,
            cache,
            retry,
        }
    }

    pub(crate) async fn run(self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Write(job) => self.process(job).await,
                Command::Flush(ack) => {
                    let _ = ack.send(());
                }
            }
        }
        debug!("CloudWatch Logs writer stopped");
    }

    async fn process(&self, job: Job) {
        let Job {
            partitions,
            mut done,
        } = job;

        if done.is_closed() {
            debug!(partitions = partitions.len(), "Skipping cancelled write");
            return;
        }

        let outcome = tokio::select! {
            outcome = self.write_partitions(partitions) => outcome,
            _ = done.closed() => {
                debug!("Write cancelled while in flight");
                return;
            }
        };
        let _ = done.send(outcome);
    }

    async fn write_partitions(&self, partitions: Vec<Partition>) -> Result<(), LogsError> {
        let mut first_error = None;

        for partition in partitions {
            let destination = partition.destination.clone();
            if let Err(error) = self.append(partition).await {
                warn!(
                    destination = %destination,
                    error = %error,
                    "Failed to ship log events"
                );
                first_error.get_or_insert(error);
            }
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn append(&self, partition: Partition) -> Result<(), LogsError> {
        let Partition {
            destination,
            events,
        } = partition;

        let mut lease = self.cache.lease(&destination).await;
        let token = lease
            .get_or_initialize(|| self.resolver.init(&destination))
            .await?;

        let count = events.len();
        let request = PutLogEventsRequest {
            log_group_name: destination.group().to_string(),
            log_stream_name: destination.stream().to_string(),
            log_events: events,
            sequence_token: token,
        };

        lease.begin_append();
        let result = self
            .retry
            .execute(operations::PUT_LOG_EVENTS, || async {
                self.api
                    .put_log_events(request.clone())
                    .await?
                    .verify_named(operations::PUT_LOG_EVENTS)
            })
            .await;

        match result {
            Ok(response) => {
                if let Some(rejected) = &response.rejected_log_events_info {
                    warn!(
                        destination = %destination,
                        rejected = ?rejected,
                        "CloudWatch Logs rejected some events"
                    );
                }
                debug!(destination = %destination, events = count, "Shipped log events");
                lease.set(response.next_sequence_token);
                Ok(())
            }
            Err(error) if error.is_stale_token() => {
                warn!(
                    destination = %destination,
                    error = %error,
                    "Sequence token out of date, evicting"
                );
                lease.invalidate();
                Err(error)
            }
            Err(error) if error.error_code() == Some(RESOURCE_NOT_FOUND) => {
                debug!(
                    destination = %destination,
                    "Destination no longer exists, evicting"
                );
                lease.invalidate();
                Err(error)
            }
            Err(error) => {
                lease.abandon_append();
                Err(error)
            }
        }
    }
}
