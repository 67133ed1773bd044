use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_with::skip_serializing_none;
use servgate_core::{ActionReport, GatewayRequest, ServiceAction};
use tracing::instrument;

use crate::app::extract::AccessToken;
use crate::app::{ApiError, AppState};

/// Body returned once the gateway has run the service manager.
#[skip_serializing_none]
#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub service: String,
    pub action: Option<ServiceAction>,
    pub status: &'static str,
    pub message: Option<String>,
    pub output: Option<String>,
    pub code: Option<&'static str>,
    pub error: Option<String>,
}

impl ServiceResponse {
    /// `status` is always answered with 200; other actions return 500 when the command failed.
    pub fn from_report(report: ActionReport) -> (StatusCode, Self) {
        let ActionReport {
            service,
            action,
            outcome,
            ..
        } = report;

        let (http_status, body) = match (action, outcome.succeeded) {
            (ServiceAction::Status, true) => (
                StatusCode::OK,
                Self {
                    service,
                    action: None,
                    status: "running",
                    message: None,
                    output: Some(outcome.stdout),
                    code: None,
                    error: None,
                },
            ),
            (ServiceAction::Status, false) => (
                StatusCode::OK,
                Self {
                    error: Some(outcome.error_text()),
                    code: Some(outcome.error_code()),
                    service,
                    action: None,
                    status: "error",
                    message: None,
                    output: None,
                },
            ),
            (action, true) => (
                StatusCode::OK,
                Self {
                    message: Some(format!(
                        "Service {service} {} successfully",
                        action.past_tense()
                    )),
                    service,
                    action: Some(action),
                    status: "success",
                    output: None,
                    code: None,
                    error: None,
                },
            ),
            (action, false) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Self {
                    error: Some(outcome.error_text()),
                    code: Some(outcome.error_code()),
                    service,
                    action: Some(action),
                    status: "error",
                    message: None,
                    output: None,
                },
            ),
        };
        (http_status, body)
    }
}

async fn run_action(
    state: AppState,
    action: ServiceAction,
    token: AccessToken,
    name: Result<Path<String>, PathRejection>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    // 路径解码失败也要先过 token 校验，按空名称交给 gateway
    let service = name.map(|Path(n)| n).unwrap_or_default();
    let request = GatewayRequest {
        action,
        service: &service,
        token: token.as_deref(),
    };
    let report = state
        .gateway
        .handle(request)
        .await
        .map_err(|e| ApiError::from(e).with_service(service.clone()))?;
    let (status, body) = ServiceResponse::from_report(report);
    Ok((status, Json(body)))
}

#[instrument(skip_all)]
pub async fn service_status(
    State(state): State<AppState>,
    token: AccessToken,
    name: Result<Path<String>, PathRejection>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    run_action(state, ServiceAction::Status, token, name).await
}

#[instrument(skip_all)]
pub async fn start_service(
    State(state): State<AppState>,
    token: AccessToken,
    name: Result<Path<String>, PathRejection>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    run_action(state, ServiceAction::Start, token, name).await
}

#[instrument(skip_all)]
pub async fn stop_service(
    State(state): State<AppState>,
    token: AccessToken,
    name: Result<Path<String>, PathRejection>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    run_action(state, ServiceAction::Stop, token, name).await
}

#[instrument(skip_all)]
pub async fn restart_service(
    State(state): State<AppState>,
    token: AccessToken,
    name: Result<Path<String>, PathRejection>,
) -> Result<(StatusCode, Json<ServiceResponse>), ApiError> {
    run_action(state, ServiceAction::Restart, token, name).await
}
