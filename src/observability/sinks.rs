//! Log sink implementations.
//!
//! - `TracingSink`: default; forwards rendered lines as `tracing` events
//! - `WriterSink`: one rendered line per event into any `io::Write`
//! - `JsonSink`: one JSON object per event into any `io::Write`
//! - `MemorySink`: keeps records in memory for inspection

use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value as Json};

use crate::observability::logging::{render, render_with, Attr, Level, LogSink, Value};

/// Lock a mutex, recovering the guard if a writer panicked while holding it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Default sink: renders the wire line and emits it through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    pub fn new() -> Self {
        Self
    }
}

impl LogSink for TracingSink {
    fn info(&self, msg: &str, attrs: &[Attr]) {
        tracing::info!("{}", render(msg, None, attrs));
    }

    fn error(&self, err: &(dyn Error + 'static), msg: &str, attrs: &[Attr]) {
        tracing::error!("{}", render(msg, Some(err), attrs));
    }
}

/// Writes one rendered line per event.
pub struct WriterSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    /// Consume the sink and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_line(&self, line: String) {
        let mut out = lock(&self.out);
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

impl WriterSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> LogSink for WriterSink<W> {
    fn info(&self, msg: &str, attrs: &[Attr]) {
        self.write_line(render(msg, None, attrs));
    }

    fn error(&self, err: &(dyn Error + 'static), msg: &str, attrs: &[Attr]) {
        self.write_line(render(msg, Some(err), attrs));
    }
}

/// Writes one JSON object per event, keys in insertion order.
///
/// ```text
/// {"level":"INFO","msg":"Server started.","address":"0.0.0.0:8080"}
/// ```
pub struct JsonSink<W> {
    out: Mutex<W>,
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_event(&self, level: Level, msg: &str, err: Option<&(dyn Error + 'static)>, attrs: &[Attr]) {
        let mut object = Map::new();
        object.insert("level".into(), Json::from(level.as_str()));
        object.insert("msg".into(), Json::from(msg));
        if let Some(err) = err {
            object.insert("error".into(), Json::from(err.to_string()));
        }
        for attr in attrs {
            let value = match &attr.value {
                Value::Str(s) => Json::from(s.as_ref()),
                Value::Int(n) => Json::from(*n),
                Value::Uint(n) => Json::from(*n),
            };
            object.insert(attr.key.to_string(), value);
        }

        let mut out = lock(&self.out);
        if serde_json::to_writer(&mut *out, &object).is_ok() {
            let _ = out.write_all(b"\n");
        }
        let _ = out.flush();
    }
}

impl<W: Write + Send> LogSink for JsonSink<W> {
    fn info(&self, msg: &str, attrs: &[Attr]) {
        self.write_event(Level::Info, msg, None, attrs);
    }

    fn error(&self, err: &(dyn Error + 'static), msg: &str, attrs: &[Attr]) {
        self.write_event(Level::Error, msg, Some(err), attrs);
    }
}

/// A log event captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub level: Level,
    pub message: String,
    pub error: Option<String>,
    pub attrs: Vec<Attr>,
}

impl Record {
    /// The record in wire format.
    pub fn line(&self) -> String {
        render_with(&self.message, self.error.as_deref(), &self.attrs)
    }

    /// Value of the first attribute named `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.iter().find(|a| a.key == key).map(|a| &a.value)
    }
}

/// Keeps every event in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<Record>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    pub fn records(&self) -> Vec<Record> {
        lock(&self.records).clone()
    }

    /// Messages of all records so far, in order.
    pub fn messages(&self) -> Vec<String> {
        lock(&self.records).iter().map(|r| r.message.clone()).collect()
    }

    /// All records in wire format.
    pub fn lines(&self) -> Vec<String> {
        lock(&self.records).iter().map(Record::line).collect()
    }

    fn push(&self, record: Record) {
        lock(&self.records).push(record);
    }
}

impl LogSink for MemorySink {
    fn info(&self, msg: &str, attrs: &[Attr]) {
        self.push(Record {
            level: Level::Info,
            message: msg.to_string(),
            error: None,
            attrs: attrs.to_vec(),
        });
    }

    fn error(&self, err: &(dyn Error + 'static), msg: &str, attrs: &[Attr]) {
        self.push(Record {
            level: Level::Error,
            message: msg.to_string(),
            error: Some(err.to_string()),
            attrs: attrs.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::logging::{attr, render};

    fn io_error(text: &str) -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::Other, text.to_string())
    }

    #[test]
    fn test_writer_sink_info() {
        let sink = WriterSink::new(Vec::new());
        sink.info("message", &[attr("key", "value")]);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "message=message; key=value\n");
    }

    #[test]
    fn test_writer_sink_error() {
        let sink = WriterSink::new(Vec::new());
        sink.error(&io_error("error"), "message", &[attr("key", "value")]);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "message=message; error=error; key=value\n");
    }

    #[test]
    fn test_json_sink_preserves_attribute_order() {
        let sink = JsonSink::new(Vec::new());
        sink.info("Request received.", &[attr("status", 200u16), attr("path", "/"), attr("method", "GET")]);
        sink.error(&io_error("boom"), "Failed to start server.", &[]);
        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            r#"{"level":"INFO","msg":"Request received.","status":200,"path":"/","method":"GET"}"#
        );
        assert_eq!(
            lines[1],
            r#"{"level":"ERROR","msg":"Failed to start server.","error":"boom"}"#
        );
    }

    #[test]
    fn test_memory_sink_lines_match_render() {
        let sink = MemorySink::new();
        let attrs = [attr("reason", "interrupt")];
        sink.info("Server stopped.", &attrs);
        sink.error(&io_error("bind"), "Failed to start server.", &[]);

        assert_eq!(sink.messages(), vec!["Server stopped.", "Failed to start server."]);
        assert_eq!(sink.lines()[0], render("Server stopped.", None, &attrs));
        assert_eq!(sink.lines()[1], "message=Failed to start server.; error=bind");

        let records = sink.records();
        assert_eq!(records[0].level, Level::Info);
        assert_eq!(records[1].level, Level::Error);
        assert_eq!(records[0].get("reason"), Some(&Value::from("interrupt")));
    }

    #[test]
    fn test_memory_sink_clones_share_buffer() {
        let sink = MemorySink::new();
        let clone = sink.clone();
        clone.info("one", &[]);
        assert_eq!(sink.messages(), vec!["one"]);
    }

    #[test]
    fn test_writer_sink_survives_poisoned_lock() {
        let sink = Arc::new(WriterSink::new(Vec::new()));
        let poisoner = sink.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.out.lock().unwrap();
            panic!("poison");
        })
        .join();

        sink.info("still logging", &[]);
        let sink = Arc::try_unwrap(sink).ok().unwrap();
        assert_eq!(String::from_utf8(sink.into_inner()).unwrap(), "message=still logging\n");
    }
}
