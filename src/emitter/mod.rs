//! Adapter between a logging framework and a [`LogsWriter`].
//!
//! A framework hands over [`LogRecord`]s; the [`LogEmitter`] renders them
//! with its [`Layout`], picks each record's group and stream, and writes
//! them. [`layer::CloudWatchLayer`] plugs an emitter into `tracing`.

pub mod layer;
mod layout;

pub use layout::{Layout, PipeLayout, PlainLayout};

use crate::config::{LogsConfig, UNSPECIFIED};
use crate::types::LogDatum;
use crate::writer::{LogsWriter, WriteCompletion};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::Level;

/// A record as handed over by a logging framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Message text, before layout.
    pub message: String,
    /// When the event happened.
    pub timestamp: Option<DateTime<Utc>>,
    /// Severity.
    pub level: Option<Level>,
    /// Logger name or module path.
    pub target: Option<String>,
}

impl LogRecord {
    /// Create a record with only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timestamp: None,
            level: None,
            target: None,
        }
    }

    /// Set the event time.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the severity.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Set the logger name.
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// Derives a group or stream name from the rendered message.
pub type NameFactory = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Turns framework records into writes.
#[derive(Clone)]
pub struct LogEmitter {
    writer: Arc<LogsWriter>,
    layout: Arc<dyn Layout>,
    log_group: String,
    log_stream: String,
    group_factory: Option<NameFactory>,
    stream_factory: Option<NameFactory>,
}

impl LogEmitter {
    /// Emitter writing to the `unspecified` group and stream.
    pub fn new(writer: Arc<LogsWriter>) -> Self {
        Self {
            writer,
            layout: Arc::new(PlainLayout),
            log_group: UNSPECIFIED.to_string(),
            log_stream: UNSPECIFIED.to_string(),
            group_factory: None,
            stream_factory: None,
        }
    }

    /// Emitter using the configuration's default group and stream.
    pub fn from_config(writer: Arc<LogsWriter>, config: &LogsConfig) -> Self {
        Self::new(writer)
            .with_log_group(config.default_log_group.as_str())
            .with_log_stream(config.default_log_stream.as_str())
    }

    /// Set the layout.
    pub fn with_layout<L: Layout + 'static>(mut self, layout: L) -> Self {
        self.layout = Arc::new(layout);
        self
    }

    /// Set the default group.
    pub fn with_log_group(mut self, group: impl Into<String>) -> Self {
        self.log_group = group.into();
        self
    }

    /// Set the default stream.
    pub fn with_log_stream(mut self, stream: impl Into<String>) -> Self {
        self.log_stream = stream.into();
        self
    }

    /// Pick each record's group from its rendered message.
    pub fn with_group_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.group_factory = Some(Arc::new(factory));
        self
    }

    /// Pick each record's stream from its rendered message.
    pub fn with_stream_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.stream_factory = Some(Arc::new(factory));
        self
    }

    /// Writer records are handed to.
    pub fn writer(&self) -> &Arc<LogsWriter> {
        &self.writer
    }

    /// Render a record and route it.
    ///
    /// A factory returning a blank name falls back to the default.
    pub fn create_datum(&self, record: &LogRecord) -> LogDatum {
        let message = self.layout.render(record);
        let group = pick_name(self.group_factory.as_ref(), &message, &self.log_group);
        let stream = pick_name(self.stream_factory.as_ref(), &message, &self.log_stream);

        let datum = LogDatum::new(message, group, stream);
        match record.timestamp {
            Some(timestamp) => datum.with_timestamp(timestamp),
            None => datum,
        }
    }

    /// Write one record.
    pub fn emit(&self, record: &LogRecord) -> WriteCompletion {
        self.writer.write(std::iter::once(self.create_datum(record)))
    }

    /// Write several records as one batch.
    pub fn emit_batch(&self, records: &[LogRecord]) -> WriteCompletion {
        self.writer
            .write(records.iter().map(|record| self.create_datum(record)))
    }
}

fn pick_name(factory: Option<&NameFactory>, message: &str, default: &str) -> String {
    factory
        .map(|f| f(message))
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl std::fmt::Debug for LogEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEmitter")
            .field("log_group", &self.log_group)
            .field("log_stream", &self.log_stream)
            .field("group_factory", &self.group_factory.is_some())
            .field("stream_factory", &self.stream_factory.is_some())
            .finish_non_exhaustive()
    }
}
