//! Per-request pipeline: authenticate, validate, normalize, authorize, execute.

use crate::error::{GatewayError, Result};
use crate::exec::CommandExecutor;
use crate::models::{AccessVerdict, ActionReport, ServiceAction};
use crate::policy::AccessPolicy;
use crate::unit::{normalize, validate, SuffixMode};
use subtle::ConstantTimeEq;
use tracing::{info, instrument, warn};

/// Settings fixed at startup.
#[derive(Clone, Default)]
pub struct GatewaySettings {
    /// Shared secret every request must present.
    pub token: String,
    pub suffix_mode: SuffixMode,
}

impl std::fmt::Debug for GatewaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewaySettings")
            .field("token", &"<redacted>")
            .field("suffix_mode", &self.suffix_mode)
            .finish()
    }
}

/// One inbound control request.
#[derive(Clone, Copy)]
pub struct GatewayRequest<'a> {
    pub action: ServiceAction,
    /// Service name exactly as received.
    pub service: &'a str,
    pub token: Option<&'a str>,
}

impl std::fmt::Debug for GatewayRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayRequest")
            .field("action", &self.action)
            .field("service", &self.service)
            .field("token", &self.token.map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Gateway {
    settings: GatewaySettings,
    policy: AccessPolicy,
    executor: CommandExecutor,
}

impl Gateway {
    pub fn new(settings: GatewaySettings, policy: AccessPolicy, executor: CommandExecutor) -> Self {
        Self {
            settings,
            policy,
            executor,
        }
    }

    pub fn suffix_mode(&self) -> SuffixMode {
        self.settings.suffix_mode
    }

    /// Byte-equal comparison in constant time. An empty secret admits nobody.
    pub fn authenticate(&self, supplied: Option<&str>) -> bool {
        let expected = self.settings.token.as_bytes();
        match supplied {
            Some(token) if !expected.is_empty() => token.as_bytes().ct_eq(expected).into(),
            _ => false,
        }
    }

    /// Runs the full pipeline, stopping at the first failing step.
    #[instrument(skip_all, fields(action = %request.action))]
    pub async fn handle(&self, request: GatewayRequest<'_>) -> Result<ActionReport> {
        if !self.authenticate(request.token) {
            warn!("rejected request with invalid or missing token");
            return Err(GatewayError::Unauthorized);
        }

        let mode = self.settings.suffix_mode;
        if !validate(request.service, mode) {
            warn!(service = ?request.service, "rejected malformed service name");
            return Err(GatewayError::InvalidInput);
        }
        let unit = normalize(request.service, mode).ok_or(GatewayError::InvalidInput)?;

        if self.policy.is_allowed(&unit) == AccessVerdict::Denied {
            warn!(unit = %unit, "service blocked by policy");
            return Err(GatewayError::PolicyDenied);
        }

        let outcome = self
            .executor
            .execute(request.action.as_str(), &unit)
            .await;
        info!(
            unit = %unit,
            succeeded = outcome.succeeded,
            exit_code = ?outcome.exit_code,
            "service command finished"
        );

        Ok(ActionReport {
            service: request.service.to_string(),
            unit,
            action: request.action,
            outcome,
        })
    }
}
