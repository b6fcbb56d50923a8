use super::types::request;
use crate::modules::notification::routes::response;
use crate::types::Context;
use crate::utils::invoice_link::ForwardedOrigin;
use crate::utils::notification::{Dispatcher, NotificationKind, NotificationRequest};
use axum::http::HeaderMap;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

pub async fn service(
    ctx: Arc<Context>,
    headers: HeaderMap,
    payload: request::Payload,
) -> response::Response {
    payload
        .validate()
        .map_err(response::Error::FailedToValidate)?;

    let detail = json!({
        "orderNumber": payload.order_number,
        "advanceAmount": payload.advance_amount,
    });

    let result = Dispatcher::from_context(&ctx)
        .dispatch(NotificationRequest {
            kind: NotificationKind::AdvancePayment,
            phone_number: payload.phone_number,
            customer_name: payload.customer_name,
            order_number: payload.order_number,
            bill_token: payload.bill_token,
            total_amount: None,
            final_amount: None,
            origin: ctx.app.public_url.clone(),
            forwarded: ForwardedOrigin::from_headers(&headers),
        })
        .await;

    match result.success {
        true => Ok(response::Success::Dispatched { result, detail }),
        false => Err(response::Error::DispatchFailed { result, detail }),
    }
}
