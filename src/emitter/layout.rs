//! Rendering framework records to message text.

use super::LogRecord;

/// Renders a record to the message text shipped to CloudWatch Logs.
///
/// Any `Fn(&LogRecord) -> String + Send + Sync` is a layout.
pub trait Layout: Send + Sync {
    /// Render a record.
    fn render(&self, record: &LogRecord) -> String;
}

impl<F> Layout for F
where
    F: Fn(&LogRecord) -> String + Send + Sync,
{
    fn render(&self, record: &LogRecord) -> String {
        self(record)
    }
}

/// Ships the message as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainLayout;

impl Layout for PlainLayout {
    fn render(&self, record: &LogRecord) -> String {
        record.message.clone()
    }
}

/// `LEVEL|target|message`, leaving out whatever the record lacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PipeLayout;

impl Layout for PipeLayout {
    fn render(&self, record: &LogRecord) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(level) = &record.level {
            parts.push(level.to_string());
        }
        if let Some(target) = &record.target {
            parts.push(target.clone());
        }
        parts.push(record.message.clone());
        parts.join("|")
    }
}
