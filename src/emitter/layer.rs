//! `tracing` integration.
//!
//! ```no_run
//! # async fn run(emitter: aws_cloudwatch_logs::LogEmitter) {
//! use aws_cloudwatch_logs::emitter::layer::CloudWatchLayer;
//! use tracing_subscriber::prelude::*;
//!
//! let (layer, guard) = CloudWatchLayer::new(emitter);
//! tracing_subscriber::registry().with(layer).init();
//!
//! tracing::info!(order_id = 7, "order placed");
//! guard.shutdown().await;
//! # }
//! ```

use super::{LogEmitter, LogRecord};
use chrono::Utc;
use std::fmt::{self, Write as _};
use tokio::sync::{mpsc, oneshot};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Largest number of records shipped in one write.
const MAX_BATCH: usize = 1_000;

/// Targets never forwarded; shipping their events would log again.
const IGNORED_TARGETS: &[&str] = &["aws_cloudwatch_logs", "reqwest", "hyper", "h2", "rustls"];

enum Message {
    Record(LogRecord),
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Forwards `tracing` events to a [`LogEmitter`].
///
/// Events are queued without blocking the caller and shipped by a
/// background task in batches.
pub struct CloudWatchLayer {
    sender: mpsc::UnboundedSender<Message>,
    ignored_targets: Vec<String>,
}

impl CloudWatchLayer {
    /// Create the layer and the guard controlling its forwarding task.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(emitter: LogEmitter) -> (Self, LayerGuard) {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(forward(emitter, receiver));

        let layer = Self {
            sender: sender.clone(),
            ignored_targets: IGNORED_TARGETS.iter().map(|t| t.to_string()).collect(),
        };
        (layer, LayerGuard { sender })
    }

    /// Also drop events whose target starts with `prefix`.
    pub fn with_ignored_target(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_targets.push(prefix.into());
        self
    }

    fn is_ignored(&self, target: &str) -> bool {
        self.ignored_targets
            .iter()
            .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

impl<S: Subscriber> Layer<S> for CloudWatchLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if self.is_ignored(metadata.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let record = LogRecord::new(visitor.finish())
            .with_timestamp(Utc::now())
            .with_level(*metadata.level())
            .with_target(metadata.target());
        let _ = self.sender.send(Message::Record(record));
    }
}

impl fmt::Debug for CloudWatchLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudWatchLayer")
            .field("ignored_targets", &self.ignored_targets)
            .finish()
    }
}

/// Controls the forwarding task of a [`CloudWatchLayer`].
#[derive(Debug, Clone)]
pub struct LayerGuard {
    sender: mpsc::UnboundedSender<Message>,
}

impl LayerGuard {
    /// Wait until every event recorded so far has been shipped.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(Message::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Ship outstanding events and stop forwarding.
    ///
    /// Events recorded afterwards are discarded.
    pub async fn shutdown(self) {
        let (ack, done) = oneshot::channel();
        if self.sender.send(Message::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn forward(emitter: LogEmitter, mut receiver: mpsc::UnboundedReceiver<Message>) {
    let mut batch = Vec::new();

    while let Some(message) = receiver.recv().await {
        let mut control = None;
        match message {
            Message::Record(record) => batch.push(record),
            other => control = Some(other),
        }

        while control.is_none() && batch.len() < MAX_BATCH {
            match receiver.try_recv() {
                Ok(Message::Record(record)) => batch.push(record),
                Ok(other) => control = Some(other),
                Err(_) => break,
            }
        }

        if !batch.is_empty() {
            // the worker logs each failed destination
            let _ = emitter.emit_batch(&batch).await;
            batch.clear();
        }

        match control {
            Some(Message::Flush(ack)) => {
                let _ = ack.send(());
            }
            Some(Message::Shutdown(ack)) => {
                let _ = ack.send(());
                return;
            }
            _ => {}
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: String,
}

impl MessageVisitor {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.fields.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.fields,
            (false, false) => format!("{} {}", self.message, self.fields),
        }
    }

    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        if !self.fields.is_empty() {
            self.fields.push(' ');
        }
        let _ = write!(self.fields, "{}={}", name, value);
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::TokenCache;
    use crate::mocks::MockLogsApi;
    use crate::resilience::no_delay;
    use crate::writer::{LogsWriter, WriterSettings};
    use std::sync::Arc;
    use tracing_subscriber::prelude::*;

    #[tokio::test]
    async fn test_forwards_events_with_fields() {
        let api = Arc::new(MockLogsApi::new());
        let writer = LogsWriter::new(api.clone(), WriterSettings::new(0, no_delay()), TokenCache::new());
        let emitter = LogEmitter::new(Arc::new(writer))
            .with_log_group("g")
            .with_log_stream("s");
        let (layer, guard) = CloudWatchLayer::new(emitter);

        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "shop", order_id = 7, "order placed");
            tracing::warn!(target: "aws_cloudwatch_logs::writer", "must not loop");
        });
        guard.shutdown().await;

        let events: Vec<String> = api
            .put_requests()
            .into_iter()
            .flat_map(|request| request.log_events)
            .map(|event| event.message)
            .collect();
        assert_eq!(events, vec!["order placed order_id=7".to_string()]);
    }

    #[test]
    fn test_visitor_without_message() {
        let visitor = MessageVisitor {
            message: String::new(),
            fields: "a=1".to_string(),
        };
        assert_eq!(visitor.finish(), "a=1");
    }
}
