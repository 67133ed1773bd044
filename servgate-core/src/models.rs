use crate::error::GatewayError;
use crate::unit::ServiceIdentifier;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Run-state operation requested for a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceAction {
    Status,
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub const ALL: [ServiceAction; 4] = [
        ServiceAction::Status,
        ServiceAction::Start,
        ServiceAction::Stop,
        ServiceAction::Restart,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceAction::Status => "status",
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
        }
    }

    /// Whether the action changes run state (as opposed to only querying it).
    pub fn is_mutating(self) -> bool {
        !matches!(self, ServiceAction::Status)
    }

    /// Past tense used in success messages.
    pub fn past_tense(self) -> &'static str {
        match self {
            ServiceAction::Status => "queried",
            ServiceAction::Start => "started",
            ServiceAction::Stop => "stopped",
            ServiceAction::Restart => "restarted",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceAction {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| GatewayError::UnsupportedAction(s.to_string()))
    }
}

/// Result of the allow/deny evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessVerdict {
    Allowed,
    Denied,
}

/// What came back from one service-manager invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
    /// Absent when the process never reported one (launch failure, timeout, signal).
    pub exit_code: Option<i32>,
    /// Set when the command could not run to completion.
    pub failure: Option<GatewayError>,
}

impl CommandOutcome {
    /// Outcome of a process that ran and exited.
    pub fn exited(exit_code: Option<i32>, stdout: String, stderr: String) -> Self {
        Self {
            succeeded: exit_code == Some(0),
            stdout,
            stderr,
            exit_code,
            failure: None,
        }
    }

    /// Outcome of an invocation that never produced an exit status.
    pub fn failed(err: GatewayError) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: err.to_string(),
            exit_code: None,
            failure: Some(err),
        }
    }

    /// Text explaining a failure: stderr, then stdout, then the failure itself.
    pub fn error_text(&self) -> String {
        if !self.stderr.trim().is_empty() {
            return self.stderr.clone();
        }
        if !self.stdout.trim().is_empty() {
            return self.stdout.clone();
        }
        match (&self.failure, self.exit_code) {
            (Some(err), _) => err.to_string(),
            (None, Some(code)) => format!("command exited with status {code}"),
            (None, None) => "command terminated by signal".to_string(),
        }
    }

    /// Machine-readable reason for an unsuccessful outcome.
    pub fn error_code(&self) -> &'static str {
        match &self.failure {
            Some(err) => err.code(),
            None => "ExecutionFailure",
        }
    }
}

/// Everything the gateway knows after executing a permitted request.
#[derive(Debug, Clone)]
pub struct ActionReport {
    /// Name exactly as the caller sent it.
    pub service: String,
    pub unit: ServiceIdentifier,
    pub action: ServiceAction,
    pub outcome: CommandOutcome,
}

impl ActionReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.succeeded
    }
}
