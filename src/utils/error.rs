use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid request: {message}")]
    InvalidRequestError { message: String },

    #[error("Couldn't evaluate expression '{expression}': {reason}")]
    EvaluationError { expression: String, reason: String },

    #[error("Failed to spawn client #{invocation} ({command}): {source}")]
    ClientSpawnError {
        invocation: usize,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Client #{invocation} exited with {status}")]
    ClientExitError {
        invocation: usize,
        status: String,
        stderr: String,
    },

    #[error("Failed to feed input to client #{invocation}: {source}")]
    ClientInputError {
        invocation: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("Client #{invocation} output line {line_number} is not a number: '{line}'")]
    InvalidOutputError {
        invocation: usize,
        line_number: usize,
        line: String,
    },

    #[error("Expected {expected} client results, got {actual}")]
    ResultCountError { expected: usize, actual: usize },

    #[error("Worker task failed: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Oracle,
    Client,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Medium,
    High,
    Critical,
}

impl HarnessError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HarnessError::TomlError(_)
            | HarnessError::ConfigError { .. }
            | HarnessError::InvalidConfigValueError { .. }
            | HarnessError::InvalidRequestError { .. } => ErrorCategory::Configuration,
            HarnessError::EvaluationError { .. } => ErrorCategory::Oracle,
            HarnessError::ClientExitError { .. }
            | HarnessError::ClientInputError { .. }
            | HarnessError::InvalidOutputError { .. }
            | HarnessError::ResultCountError { .. } => ErrorCategory::Client,
            HarnessError::IoError(_)
            | HarnessError::SerializationError(_)
            | HarnessError::ClientSpawnError { .. }
            | HarnessError::JoinError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Oracle | ErrorCategory::Client => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 對應到程序結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            HarnessError::TomlError(_) => "Check the config file for TOML syntax errors",
            HarnessError::ConfigError { .. } | HarnessError::InvalidConfigValueError { .. } => {
                "Fix the offending setting on the command line or in the config file"
            }
            HarnessError::InvalidRequestError { .. } => "Request at least one item",
            HarnessError::EvaluationError { .. } => {
                "Re-run with a different --seed; the generated input is not evaluable"
            }
            HarnessError::ClientSpawnError { .. } => {
                "Make sure --client points to an existing executable"
            }
            HarnessError::ClientExitError { .. } => {
                "Make sure the server is running and reachable at --host/--port"
            }
            HarnessError::ClientInputError { .. } => {
                "Check that the client reads its whole input from stdin"
            }
            HarnessError::InvalidOutputError { .. } | HarnessError::ResultCountError { .. } => {
                "Inspect the client's output; it must print one number per input line"
            }
            HarnessError::IoError(_)
            | HarnessError::SerializationError(_)
            | HarnessError::JoinError(_) => "Re-run with --verbose for more details",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            HarnessError::ClientExitError {
                invocation,
                status,
                stderr,
            } => {
                let stderr = stderr.trim();
                if stderr.is_empty() {
                    format!("Client #{} failed ({})", invocation, status)
                } else {
                    format!("Client #{} failed ({}): {}", invocation, status, stderr)
                }
            }
            HarnessError::EvaluationError { reason, .. } => {
                format!("The oracle couldn't evaluate a generated expression: {}", reason)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_exit_with_usage_code() {
        let err = HarnessError::InvalidConfigValueError {
            field: "run.processes".to_string(),
            value: "0".to_string(),
            reason: "Value must be at least 1".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("run.processes"));
    }

    #[test]
    fn test_client_exit_error_message_includes_stderr() {
        let err = HarnessError::ClientExitError {
            invocation: 3,
            status: "exit status: 1".to_string(),
            stderr: "An error occured: connection refused\n".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert_eq!(err.exit_code(), 1);
        assert_eq!(
            err.user_friendly_message(),
            "Client #3 failed (exit status: 1): An error occured: connection refused"
        );
    }

    #[test]
    fn test_spawn_error_is_critical() {
        let err = HarnessError::ClientSpawnError {
            invocation: 0,
            command: "missing --host localhost --port 18000".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(err.category(), ErrorCategory::System);
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_report_serialization_failure_is_a_system_error() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = HarnessError::from(source);
        assert!(matches!(err, HarnessError::SerializationError(_)));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
    }
}
