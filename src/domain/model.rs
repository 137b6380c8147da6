use crate::utils::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One line of input: operands and operators separated by single spaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(String);

impl Expression {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered expressions sent to every client invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBatch {
    expressions: Vec<Expression>,
}

impl InputBatch {
    pub fn new(expressions: Vec<Expression>) -> Self {
        Self { expressions }
    }

    pub fn expressions(&self) -> &[Expression] {
        &self.expressions
    }

    pub fn len(&self) -> usize {
        self.expressions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty()
    }

    /// Newline-separated text, one expression per line, with a trailing newline.
    pub fn to_stdin(&self) -> String {
        let mut stdin = String::new();
        for expr in &self.expressions {
            stdin.push_str(expr.as_str());
            stdin.push('\n');
        }
        stdin
    }
}

/// Captured stdout of one successful client invocation, kept as raw bytes.
#[derive(Debug, Clone)]
pub struct ClientOutput {
    pub invocation: usize,
    pub stdout: Vec<u8>,
    pub elapsed: Duration,
}

impl ClientOutput {
    /// stdout for display; invalid UTF-8 is replaced.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }
}

/// How to launch the client: `<path> --host <HOST> --port <PORT>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCommand {
    pub path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl ClientCommand {
    pub const DEFAULT_PATH: &'static str = "math-client";
    pub const DEFAULT_HOST: &'static str = "localhost";
    pub const DEFAULT_PORT: u16 = 18000;

    pub fn args(&self) -> Vec<String> {
        vec![
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
        ]
    }

    pub fn command_line(&self) -> String {
        format!("{} {}", self.path.display(), self.args().join(" "))
    }
}

impl Default for ClientCommand {
    fn default() -> Self {
        Self {
            path: PathBuf::from(Self::DEFAULT_PATH),
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
        }
    }
}

/// Two invocations whose outputs differ.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputDivergence {
    pub reference: usize,
    pub other: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsistencyReport {
    /// Invocations whose output differs from invocation #0, in order.
    pub diverging: Vec<usize>,
    pub first_divergence: Option<OutputDivergence>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.diverging.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueMismatch {
    pub index: usize,
    pub expression: Expression,
    pub expected: f64,
    pub actual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CorrectnessReport {
    Matched { values: usize },
    LengthMismatch { expected: usize, actual: usize },
    ValueMismatches { mismatches: Vec<ValueMismatch> },
}

impl CorrectnessReport {
    pub fn is_correct(&self) -> bool {
        matches!(self, CorrectnessReport::Matched { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InvocationSummary {
    pub invocation: usize,
    pub elapsed_ms: u128,
    pub stdout_bytes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct StressReport {
    pub started_at: DateTime<Utc>,
    pub seed: u64,
    pub processes: usize,
    pub expressions: usize,
    pub command: String,
    /// Wall-clock time of the whole client pool.
    pub elapsed_ms: u128,
    pub invocations: Vec<InvocationSummary>,
    pub consistency: ConsistencyReport,
    pub correctness: CorrectnessReport,
    pub passed: bool,
}

impl StressReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_batch_to_stdin_has_trailing_newline() {
        let batch = InputBatch::new(vec![Expression::new("2 + 2"), Expression::new("3 * -1")]);
        assert_eq!(batch.to_stdin(), "2 + 2\n3 * -1\n");
        assert_eq!(batch.len(), 2);
    }

    #[test]
    fn test_client_command_line() {
        let command = ClientCommand {
            path: PathBuf::from("/usr/bin/math-client"),
            host: "10.0.0.1".to_string(),
            port: 9000,
        };
        assert_eq!(command.args(), vec!["--host", "10.0.0.1", "--port", "9000"]);
        assert_eq!(
            command.command_line(),
            "/usr/bin/math-client --host 10.0.0.1 --port 9000"
        );
    }

    #[test]
    fn test_client_command_defaults() {
        let command = ClientCommand::default();
        assert_eq!(command.command_line(), "math-client --host localhost --port 18000");
    }

    #[test]
    fn test_correctness_report_serializes_with_outcome_tag() {
        let report = CorrectnessReport::LengthMismatch {
            expected: 3,
            actual: 2,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcome"], "length_mismatch");
        assert_eq!(json["expected"], 3);
    }

    #[test]
    fn test_client_output_text_replaces_invalid_utf8() {
        let output = ClientOutput {
            invocation: 0,
            stdout: b"4\n\xff\n".to_vec(),
            elapsed: Duration::ZERO,
        };
        assert_eq!(output.text(), "4\n\u{fffd}\n");
    }

    #[test]
    fn test_stress_report_to_json() {
        let report = StressReport {
            started_at: Utc::now(),
            seed: 42,
            processes: 1,
            expressions: 1,
            command: "math-client --host localhost --port 18000".to_string(),
            elapsed_ms: 5,
            invocations: vec![InvocationSummary {
                invocation: 0,
                elapsed_ms: 3,
                stdout_bytes: 2,
            }],
            consistency: ConsistencyReport::default(),
            correctness: CorrectnessReport::Matched { values: 1 },
            passed: true,
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["seed"], 42);
        assert_eq!(json["correctness"]["outcome"], "matched");
        assert_eq!(json["invocations"][0]["stdout_bytes"], 2);
    }
}
