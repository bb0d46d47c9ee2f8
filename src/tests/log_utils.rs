#[cfg(test)]
use serde_json::value::Value;
use slog_extlog::slog_test;

/// A logger that captures log messages for testing.
pub struct CapturingLogger {
    pub(crate) logger: slog::Logger,
    buffer: iobuffer::IoBuffer,
}

impl CapturingLogger {
    /// Create a new `CapturingLogger`.
    pub fn new() -> Self {
        let buffer = iobuffer::IoBuffer::new();
        let logger = slog_test::new_test_logger(buffer.clone());
        Self { logger, buffer }
    }

    /// Get the logs that have been captured.
    pub fn logs(&mut self) -> Vec<Value> {
        slog_test::read_json_values(&mut self.buffer)
    }

    /// Get log messages at or above info level.
    ///
    /// Used to filter out debug logs which are too detailed for most tests.
    pub fn visible_logs(&mut self) -> Vec<Value> {
        let logs = self.logs();
        logs.iter()
            .filter(|log| log["level"].as_str().unwrap().ne("DEBG"))
            .map(|log| log.clone())
            .collect()
    }
}
