//! Service-manager invocation through a privileged helper (`sudo -n systemctl ...`).

mod runner;

pub use runner::{CommandRunner, Invocation, SystemRunner};

use crate::models::{CommandOutcome, ServiceAction};
use crate::unit::ServiceIdentifier;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Default privileged helper, looked up by absolute path first.
pub const DEFAULT_HELPER: &str = "/usr/bin/sudo";
/// Default service manager program run by the helper.
pub const DEFAULT_MANAGER: &str = "systemctl";
/// Default wall-clock limit for one invocation.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ExecSettings {
    /// Absolute path of the helper; its file name is used when the path is missing.
    pub helper: PathBuf,
    pub manager: String,
    pub timeout: Duration,
}

impl Default for ExecSettings {
    fn default() -> Self {
        Self {
            helper: PathBuf::from(DEFAULT_HELPER),
            manager: DEFAULT_MANAGER.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ExecSettings {
    /// Helper program to launch: the configured path if it exists, else the bare name.
    pub fn resolve_helper(&self) -> String {
        if self.helper.exists() || !self.helper.is_absolute() {
            return self.helper.to_string_lossy().into_owned();
        }
        self.helper
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.helper.to_string_lossy().into_owned())
    }
}

/// Builds the argument vector for an action and hands it to a [`CommandRunner`].
#[derive(Clone)]
pub struct CommandExecutor {
    settings: ExecSettings,
    runner: Arc<dyn CommandRunner>,
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandExecutor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl CommandExecutor {
    pub fn new(settings: ExecSettings) -> Self {
        Self::with_runner(settings, Arc::new(SystemRunner))
    }

    pub fn with_runner(settings: ExecSettings, runner: Arc<dyn CommandRunner>) -> Self {
        Self { settings, runner }
    }

    pub fn settings(&self) -> &ExecSettings {
        &self.settings
    }

    /// `<helper> -n <manager> <action> [flags] -- <unit>`.
    ///
    /// The unit always follows `--`, so a name starting with `-` stays an operand.
    pub fn invocation(&self, action: ServiceAction, unit: &ServiceIdentifier) -> Invocation {
        let mut args = vec![
            "-n".to_string(),
            self.settings.manager.clone(),
            action.as_str().to_string(),
        ];
        if action == ServiceAction::Status {
            args.extend(["--no-pager".to_string(), "--lines=0".to_string()]);
        }
        args.extend(["--".to_string(), unit.as_str().to_string()]);
        Invocation {
            program: self.settings.resolve_helper(),
            args,
        }
    }

    /// Runs `action` against `unit`. Unknown actions fail without launching anything.
    #[instrument(skip(self))]
    pub async fn execute(&self, action: &str, unit: &ServiceIdentifier) -> CommandOutcome {
        let action = match action.parse::<ServiceAction>() {
            Ok(a) => a,
            Err(err) => return CommandOutcome::failed(err),
        };
        let invocation = self.invocation(action, unit);
        debug!(command = %invocation, "running service manager");
        self.runner.run(&invocation, self.settings.timeout).await
    }
}
