// libs/payment-cell/src/router.rs
use std::sync::Arc;

use axum::{middleware, routing::post, Router};

use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::PaymentCellState;

pub fn payment_routes(state: Arc<PaymentCellState>) -> Router {
    // The gateway calls the webhook directly; it carries no bearer token.
    let public_routes = Router::new()
        .route("/webhook", post(handlers::payment_webhook));

    let protected_routes = Router::new()
        .route("/create-preference", post(handlers::create_preference))
        .layer(middleware::from_fn_with_state(state.config.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
