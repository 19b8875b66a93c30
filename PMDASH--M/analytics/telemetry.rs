use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Result;
use serde_json::Value;
use shared_logging::{JsonLogger, LogLevel, LogRecord};

/// Builder configuring telemetry for the metrics engine.
pub struct AnalyticsTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
}

impl AnalyticsTelemetryBuilder {
    /// Creates a builder scoped to a module label.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            min_level: LogLevel::Debug,
        }
    }

    /// Sets the JSON log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Drops records below `level`.
    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Finalizes the builder, opening the log file if one was configured.
    pub fn build(self) -> Result<AnalyticsTelemetry> {
        let logger = match self.log_path {
            Some(path) => Some(JsonLogger::new(path)?.with_min_level(self.min_level)),
            None => None,
        };
        Ok(AnalyticsTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                logger,
            }),
        })
    }
}

/// Cloneable telemetry handle. Without a log path every call is a no-op.
#[derive(Clone)]
pub struct AnalyticsTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for AnalyticsTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalyticsTelemetry")
            .field("module", &self.inner.module)
            .field("log_path", &self.log_path())
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLogger>,
}

impl AnalyticsTelemetry {
    /// Returns a builder for this telemetry helper.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> AnalyticsTelemetryBuilder {
        AnalyticsTelemetryBuilder::new(module)
    }

    /// Module label stamped on every record.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.inner.module
    }

    /// Backing log file, if any.
    #[must_use]
    pub fn log_path(&self) -> Option<&Path> {
        self.inner.logger.as_ref().map(JsonLogger::path)
    }

    /// Logs a structured record; object metadata is merged into the record.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            let record = LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
            logger.log(&record)?;
        }
        Ok(())
    }

    /// Reads back everything written so far.
    pub fn records(&self) -> Result<Vec<LogRecord>> {
        match &self.inner.logger {
            Some(logger) => logger.records(),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_records() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("analytics.log");
        let telemetry = AnalyticsTelemetry::builder("analytics")
            .log_path(&log_path)
            .build()
            .unwrap();
        telemetry
            .log(
                LogLevel::Info,
                "analytics.test",
                json!({ "project_id": "PROJ-001" }),
            )
            .unwrap();
        let records = telemetry.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].module, "analytics");
        assert_eq!(telemetry.log_path(), Some(log_path.as_path()));
    }

    #[test]
    fn disabled_telemetry_is_noop() {
        let telemetry = AnalyticsTelemetry::builder("analytics").build().unwrap();
        telemetry
            .log(LogLevel::Error, "analytics.test", json!({}))
            .unwrap();
        assert!(telemetry.records().unwrap().is_empty());
        assert!(telemetry.log_path().is_none());
    }

    #[test]
    fn min_level_is_applied() {
        let dir = tempdir().unwrap();
        let telemetry = AnalyticsTelemetry::builder("analytics")
            .log_path(dir.path().join("a.log"))
            .min_level(LogLevel::Warn)
            .build()
            .unwrap();
        telemetry.log(LogLevel::Info, "quiet", json!({})).unwrap();
        telemetry.log(LogLevel::Warn, "loud", json!({})).unwrap();
        let records = telemetry.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "loud");
    }
}
