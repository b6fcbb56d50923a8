mod advance_payment;
mod invoice;
mod payment_completion;
pub mod response;

use crate::types::Context;
use axum::routing::Router;
use std::sync::Arc;

pub fn get_router() -> Router<Arc<Context>> {
    Router::new()
        .merge(invoice::get_router())
        .merge(advance_payment::get_router())
        .merge(payment_completion::get_router())
}
