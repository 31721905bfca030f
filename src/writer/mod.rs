//! Ordered, retrying log shipping.
//!
//! A [`LogsWriter`] owns one background task fed by an unbounded queue.
//! Every [`LogsWriter::write`] call is queued in call order and handled
//! one at a time, so appends from a single writer reach each destination
//! in the order they were submitted. Writers sharing a [`TokenCache`]
//! never have two appends in flight for the same destination.

mod worker;

use crate::destination::TokenCache;
use crate::error::LogsError;
use crate::api::LogsApi;
use crate::resilience::{ExponentialInterval, RetryPolicy, SharedIntervalProvider, DEFAULT_RETRIES};
use crate::types::{DestinationKey, LogDatum};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use worker::{Command, Job, Partition, Worker};

/// Retry behavior of a [`LogsWriter`].
#[derive(Clone)]
pub struct WriterSettings {
    /// Retries after the initial attempt, for resolution and appends alike.
    pub retries: u32,
    /// Delay before each retry.
    pub interval_provider: SharedIntervalProvider,
}

impl WriterSettings {
    /// Create settings.
    pub fn new(retries: u32, interval_provider: SharedIntervalProvider) -> Self {
        Self {
            retries,
            interval_provider,
        }
    }

    /// Retry policy for these settings.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retries, self.interval_provider.clone())
    }
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES, Arc::new(ExponentialInterval::default()))
    }
}

impl std::fmt::Debug for WriterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriterSettings")
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}

/// Ships batches of [`LogDatum`] to CloudWatch Logs.
///
/// Must be created inside a tokio runtime.
pub struct LogsWriter {
    commands: Mutex<Option<mpsc::UnboundedSender<Command>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    cache: TokenCache,
    settings: WriterSettings,
}

impl LogsWriter {
    /// Create a writer and start its background task.
    pub fn new(api: Arc<dyn LogsApi>, settings: WriterSettings, cache: TokenCache) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = Worker::new(api, cache.clone(), settings.retry_policy());
        let handle = tokio::spawn(worker.run(receiver));

        Self {
            commands: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            cache,
            settings,
        }
    }

    /// Token cache this writer shares.
    pub fn cache(&self) -> &TokenCache {
        &self.cache
    }

    /// Retry settings.
    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    /// Queue a batch for shipping.
    ///
    /// The batch is split by destination and each part is sorted by
    /// timestamp. The returned future resolves once every part has been
    /// appended, or with the first failure. Dropping it before the batch
    /// is sent skips the batch; dropping it mid-flight abandons the
    /// remaining appends, keeping any already committed.
    pub fn write<I>(&self, batch: I) -> WriteCompletion
    where
        I: IntoIterator<Item = LogDatum>,
    {
        let partitions = partition(batch);
        if partitions.is_empty() {
            return WriteCompletion::ready(Ok(()));
        }

        let (done, receiver) = oneshot::channel();
        let job = Job { partitions, done };
        let sent = match self.commands.lock().as_ref() {
            Some(commands) => commands.send(Command::Write(job)).is_ok(),
            None => false,
        };

        if sent {
            WriteCompletion::pending(receiver)
        } else {
            WriteCompletion::ready(Err(LogsError::WriterClosed))
        }
    }

    /// Wait until every batch queued before this call has been handled.
    pub async fn flush(&self) {
        let (ack, receiver) = oneshot::channel();
        let queued = match self.commands.lock().as_ref() {
            Some(commands) => commands.send(Command::Flush(ack)).is_ok(),
            None => false,
        };
        if queued {
            let _ = receiver.await;
        }
    }

    /// Stop accepting batches, ship what is queued and stop the task.
    pub async fn close(&self) {
        self.commands.lock().take();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "CloudWatch Logs writer task failed");
            }
            debug!("CloudWatch Logs writer closed");
        }
    }

    /// Whether [`LogsWriter::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.commands.lock().is_none()
    }
}

impl std::fmt::Debug for LogsWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogsWriter")
            .field("settings", &self.settings)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Group a batch by destination, keeping first-seen destination order,
/// and sort each group by timestamp. Equal timestamps keep input order.
fn partition<I>(batch: I) -> Vec<Partition>
where
    I: IntoIterator<Item = LogDatum>,
{
    let mut index: HashMap<DestinationKey, usize> = HashMap::new();
    let mut grouped: Vec<(DestinationKey, Vec<LogDatum>)> = Vec::new();

    for datum in batch {
        let key = datum.destination();
        match index.get(&key) {
            Some(&i) => grouped[i].1.push(datum),
            None => {
                index.insert(key.clone(), grouped.len());
                grouped.push((key, vec![datum]));
            }
        }
    }

    grouped
        .into_iter()
        .map(|(destination, mut data)| {
            data.sort_by_key(LogDatum::effective_timestamp);
            Partition {
                destination,
                events: data.iter().map(LogDatum::to_input_event).collect(),
            }
        })
        .collect()
}

/// Completion of one [`LogsWriter::write`] call.
#[must_use = "a write is skipped if its completion is dropped before it starts"]
pub struct WriteCompletion {
    state: CompletionState,
}

enum CompletionState {
    Ready(Option<Result<(), LogsError>>),
    Pending(oneshot::Receiver<Result<(), LogsError>>),
}

impl WriteCompletion {
    fn ready(result: Result<(), LogsError>) -> Self {
        Self {
            state: CompletionState::Ready(Some(result)),
        }
    }

    fn pending(receiver: oneshot::Receiver<Result<(), LogsError>>) -> Self {
        Self {
            state: CompletionState::Pending(receiver),
        }
    }
}

impl Future for WriteCompletion {
    type Output = Result<(), LogsError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            CompletionState::Ready(result) => {
                Poll::Ready(result.take().unwrap_or(Err(LogsError::WriterClosed)))
            }
            CompletionState::Pending(receiver) => Pin::new(receiver)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(LogsError::WriterClosed))),
        }
    }
}

impl std::fmt::Debug for WriteCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            CompletionState::Ready(_) => "ready",
            CompletionState::Pending(_) => "pending",
        };
        f.debug_struct("WriteCompletion").field("state", &state).finish()
    }
}
