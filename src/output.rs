//! Status messages during a publish and the CLI result writer.

use serde::Serialize;
use std::sync::Mutex;

/// Receives human-readable progress from the publisher
///
/// `say` marks a step headline, `message` the detail lines under it. Nothing
/// the sink does affects the outcome of a publish.
pub trait StatusSink {
    fn say(&self, msg: &str);
    fn message(&self, msg: &str);
}

/// Forwards status messages to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn say(&self, msg: &str) {
        tracing::info!("{}", msg);
    }

    fn message(&self, msg: &str) {
        tracing::debug!("{}", msg);
    }
}

/// Records status messages in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything received so far, in order
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl StatusSink for RecordingSink {
    fn say(&self, msg: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(msg.to_string());
    }

    fn message(&self, msg: &str) {
        self.say(msg);
    }
}

impl<S: StatusSink + ?Sized> StatusSink for &S {
    fn say(&self, msg: &str) {
        (**self).say(msg)
    }

    fn message(&self, msg: &str) {
        (**self).message(msg)
    }
}

/// Output mode for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Structured operation result for JSON output
#[derive(Debug, Serialize)]
pub struct OperationResult {
    pub operation: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Structured output writer that supports both human-readable and JSON output
#[derive(Debug, Clone)]
pub struct OutputWriter {
    pub mode: OutputMode,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            mode: if json { OutputMode::Json } else { OutputMode::Human },
        }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    /// Print an operation result
    pub fn operation_result(&self, result: &OperationResult) {
        match self.mode {
            OutputMode::Json => {
                if let Ok(json) = serde_json::to_string(result) {
                    println!("{}", json);
                }
            }
            OutputMode::Human => {
                if result.success {
                    if let (Some(src), Some(manifest)) = (&result.source, &result.manifest) {
                        println!("Published {} \u{2192} {}", src, manifest);
                    }
                } else if let Some(err) = &result.error {
                    eprintln!("Error: {}", sanitize_error(err));
                }
            }
        }
    }

    /// Print an error message
    pub fn error(&self, msg: &str, category: Option<&str>) {
        self.operation_result(&OperationResult {
            operation: "publish".to_string(),
            success: false,
            source: None,
            manifest: None,
            error: Some(sanitize_error(msg)),
            category: category.map(str::to_string),
        });
    }
}

/// Sanitize error messages by collapsing whitespace
pub fn sanitize_error(msg: &str) -> String {
    msg.split_whitespace().collect::<Vec<&str>>().join(" ")
}
