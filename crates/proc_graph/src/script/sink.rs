//! Output sinks for script `print` calls.
//!
//! The interpreter owns one sink, passed in at construction. Nothing is
//! written to process-wide streams.
use std::sync::{Arc, Mutex};

use tracing::info;

/// Receives script output one line at a time.
pub trait OutputSink: Send {
    fn write_line(&mut self, text: &str);
}

/// Discards all output.
impl OutputSink for () {
    #[inline]
    fn write_line(&mut self, _text: &str) {}
}

/// Forwards output to `tracing` at info level. This is the default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutputSink for TracingSink {
    fn write_line(&mut self, text: &str) {
        info!(target: "proc_graph::script", "{}", text);
    }
}

/// Forwards output to a user-provided closure.
pub struct FnOutputSink<F>
where
    F: FnMut(&str) + Send,
{
    f: F,
}

impl<F> FnOutputSink<F>
where
    F: FnMut(&str) + Send,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> OutputSink for FnOutputSink<F>
where
    F: FnMut(&str) + Send,
{
    #[inline]
    fn write_line(&mut self, text: &str) {
        (self.f)(text);
    }
}

/// Collects output lines. Clones share the same buffer, so a handle can be
/// kept after the sink is moved into an interpreter.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.lines.lock().map(|l| l.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputSink for BufferSink {
    fn write_line(&mut self, text: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(text.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffer_sink_clones_share_storage() {
        let handle = BufferSink::new();
        let mut sink = handle.clone();
        sink.write_line("a");
        sink.write_line("b");
        assert_eq!(handle.lines(), vec!["a".to_string(), "b".to_string()]);
        handle.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn fn_sink_invokes_callback() {
        let mut count = 0;
        {
            let mut sink = FnOutputSink::new(|_line: &str| count += 1);
            sink.write_line("x");
            sink.write_line("y");
        }
        assert_eq!(count, 2);
    }
}
