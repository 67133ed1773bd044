use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use servgate_core::GatewayError;

#[derive(Debug)]
pub struct ApiError {
    code: &'static str,
    message: String,
    status: StatusCode,
    service: Option<String>,
}

impl ApiError {
    pub fn new(code: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            code,
            status,
            message: message.into(),
            service: None,
        }
    }

    /// Echo the caller's service name back in the body.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn not_found() -> Self {
        Self::new("NotFound", StatusCode::NOT_FOUND, "resource not found")
    }

    pub fn internal() -> Self {
        Self::new(
            "InternalError",
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error",
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        let status = match &err {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::InvalidInput => StatusCode::BAD_REQUEST,
            GatewayError::PolicyDenied => StatusCode::FORBIDDEN,
            GatewayError::ExecutionTimeout(_)
            | GatewayError::ExecutionFailure(_)
            | GatewayError::UnsupportedAction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError::new(err.code(), status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = Map::new();
        if let Some(service) = self.service {
            body.insert("service".into(), Value::String(service));
        }
        body.insert("code".into(), json!(self.code));
        body.insert("error".into(), Value::String(self.message));
        (self.status, Json(Value::Object(body))).into_response()
    }
}
