use crate::utils::notification::error::ErrorKind;
use crate::utils::notification::{AttemptOutcome, DispatchAttempt, DispatchResult};
use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;
use validator::ValidationErrors;

pub enum Success {
    Dispatched {
        result: DispatchResult,
        detail: serde_json::Value,
    },
}

impl IntoResponse for Success {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::Dispatched { result, detail } => (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "messageId": result.message_id,
                    "provider": result.provider,
                    "channel": result.channel.map(|c| c.as_str()),
                    "sentAt": result.sent_at,
                    "phoneNumber": result.phone_number,
                    "billLink": result.bill_link,
                    "detail": detail,
                })),
            )
                .into_response(),
        }
    }
}

pub enum Error {
    FailedToValidate(ValidationErrors),
    DispatchFailed {
        result: DispatchResult,
        detail: serde_json::Value,
    },
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        match self {
            Self::FailedToValidate(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": ErrorKind::ValidationError.message(),
                    "errorCode": ErrorKind::ValidationError.code(),
                    "errors": errors,
                })),
            )
                .into_response(),
            Self::DispatchFailed { result, detail } => {
                let (kind, message, underlying) = match &result.error {
                    Some(error) => (error.kind, error.message.clone(), error.underlying.clone()),
                    None => (
                        ErrorKind::Unknown,
                        ErrorKind::Unknown.message().to_string(),
                        vec![],
                    ),
                };
                let status = StatusCode::from_u16(kind.http_status())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let attempted_at = result
                    .attempts
                    .last()
                    .map(|attempt| attempt.started_at)
                    .unwrap_or_else(Utc::now);

                (
                    status,
                    Json(json!({
                        "success": false,
                        "error": message,
                        "errorCode": kind.code(),
                        "underlying": underlying.iter().map(|k| k.code()).collect::<Vec<_>>(),
                        "provider": result.provider,
                        "channel": result.channel.map(|c| c.as_str()),
                        "attemptedAt": attempted_at,
                        "attempts": result.attempts.iter().map(attempt_summary).collect::<Vec<_>>(),
                        "detail": detail,
                    })),
                )
                    .into_response()
            }
        }
    }
}

pub type Response = Result<Success, Error>;

fn attempt_summary(attempt: &DispatchAttempt) -> serde_json::Value {
    match &attempt.outcome {
        AttemptOutcome::Success {
            message_id,
            provider_status,
        } => json!({
            "provider": attempt.provider,
            "channel": attempt.channel.as_str(),
            "outcome": "success",
            "messageId": message_id,
            "providerStatus": provider_status,
            "startedAt": attempt.started_at,
            "durationMs": attempt.duration_ms,
        }),
        AttemptOutcome::Failure { kind, raw_message } => json!({
            "provider": attempt.provider,
            "channel": attempt.channel.as_str(),
            "outcome": "failure",
            "errorCode": kind.code(),
            "providerMessage": raw_message,
            "startedAt": attempt.started_at,
            "durationMs": attempt.duration_ms,
        }),
    }
}
