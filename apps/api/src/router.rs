use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use appointment_cell::AppointmentCellState;
use payment_cell::router::payment_routes;
use payment_cell::PaymentCellState;

pub fn create_router(
    appointment_state: Arc<AppointmentCellState>,
    payment_state: Arc<PaymentCellState>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "MedCita API is running!" }))
        .nest("/appointments", appointment_routes(appointment_state))
        .nest("/payments", payment_routes(payment_state))
}
