use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use cardcraft_core::{CoreError, GenerationError, UsageStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    AiGenerationFailed,
    LimitExceeded,
    InternalError,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::AiGenerationFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::LimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Every failure leaves the API as `{"error":{"code","message","details"?}}`;
/// `code` is stable for programmatic handling, `message` is for humans.
#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    /// Sanitized 500; whatever caused it is already in the logs.
    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError, "An unexpected error occurred")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut error = json!({ "code": self.code, "message": self.message });
        if let Some(details) = self.details {
            error["details"] = details;
        }
        (self.code.status(), Json(json!({ "error": error }))).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            // Absent and foreign-owned rows share one shape; existence is
            // never leaked.
            CoreError::NotFound(what) => ApiError::new(
                ErrorCode::NotFound,
                format!("{what} not found or access denied"),
            ),
            CoreError::Invalid { field, reason } => ApiError::with_details(
                ErrorCode::ValidationError,
                "Invalid request data",
                json!({ "field": field, "reason": reason }),
            ),
            CoreError::Storage(_) => ApiError::internal(),
        }
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        tracing::error!(error = %err, "flashcard generation failed");
        let message = match &err {
            GenerationError::TimedOut(_) => "AI generation timed out",
            _ => "Failed to generate flashcards",
        };
        ApiError::with_details(
            ErrorCode::AiGenerationFailed,
            message,
            json!({ "reason": err.reason() }),
        )
    }
}

pub fn limit_exceeded(usage: UsageStatus, resets_at: DateTime<Utc>) -> ApiError {
    ApiError::with_details(
        ErrorCode::LimitExceeded,
        "Daily AI generation limit exceeded",
        json!({
            "daily_limit": usage.daily_limit,
            "used_today": usage.used_today,
            "resets_at": resets_at.to_rfc3339(),
        }),
    )
}

/// `axum::Json` whose rejection speaks the error envelope.
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::with_details(
                ErrorCode::ValidationError,
                "Invalid JSON in request body",
                json!({ "reason": rejection.body_text() }),
            )),
        }
    }
}
