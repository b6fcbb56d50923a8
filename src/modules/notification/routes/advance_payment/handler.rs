use super::{service::service, types::request};
use crate::types::Context;
use axum::{
    extract::{Json, State},
    http::HeaderMap,
    response::IntoResponse,
};
use std::sync::Arc;

pub async fn handler(
    State(ctx): State<Arc<Context>>,
    headers: HeaderMap,
    Json(payload): Json<request::Payload>,
) -> impl IntoResponse {
    service(ctx, headers, payload).await
}
