// libs/payment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreatePreferenceBody, PaymentError, PreferenceResponse, WebhookNotification};
use crate::PaymentCellState;

fn payment_error_response(err: PaymentError) -> AppError {
    match err {
        PaymentError::AppointmentNotFound => AppError::NotFound(err.to_string()),
        PaymentError::NotPayable(_) => AppError::BadRequest(err.to_string()),
        PaymentError::DuplicateReference(_) => AppError::Conflict(err.to_string()),
        PaymentError::Gateway(msg) => {
            error!("Error creating checkout preference: {}", msg);
            AppError::BadRequest("Could not create payment preference".to_string())
        }
        PaymentError::Unauthorized => AppError::Auth(err.to_string()),
        PaymentError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn create_preference(
    State(state): State<Arc<PaymentCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreatePreferenceBody>,
) -> Result<(StatusCode, Json<PreferenceResponse>), AppError> {
    let token = auth.token();

    if !user.is_patient() {
        return Err(AppError::Auth("Only patients can pay for appointments".to_string()));
    }
    let patient_id = Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user id in token".to_string()))?;

    let response = state
        .payments
        .create_preference(request.appointment_id, patient_id, Some(token))
        .await
        .map_err(payment_error_response)?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Gateway webhook. The provider retries on anything but a 2xx, so this
/// endpoint acknowledges every delivery, including ones it cannot process.
#[axum::debug_handler]
pub async fn payment_webhook(
    State(state): State<Arc<PaymentCellState>>,
    body: String,
) -> Json<Value> {
    match serde_json::from_str::<WebhookNotification>(&body) {
        Ok(notification) if notification.kind == "payment" => {
            if let Err(e) = state
                .payments
                .handle_gateway_notification(&notification.data.id)
                .await
            {
                error!("Error processing payment webhook: {}", e);
            }
        }
        Ok(notification) => {
            debug!("Ignoring webhook notification of type {}", notification.kind);
        }
        Err(e) => {
            warn!("Malformed webhook payload: {}", e);
        }
    }

    Json(json!({ "received": true }))
}
