// libs/payment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use appointment_cell::models::AppointmentStatus;

/// Flat consultation fee, in Chilean pesos.
pub const APPOINTMENT_PRICE_CLP: i64 = 5000;

// ==============================================================================
// PAYMENT MODELS
// ==============================================================================

/// Satellite record written when a checkout preference is created. It is
/// never mutated afterwards; settlement truth lives on the appointment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub amount: i64,
    pub gateway_reference_id: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Succeeded,
    Failed,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePreferenceBody {
    pub appointment_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceResponse {
    pub preference_id: String,
    pub checkout_url: String,
}

/// The gateway's webhook envelope: `{"type": "payment", "data": {"id": ...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookNotification {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub id: String,
}

// ==============================================================================
// GATEWAY MODELS
// ==============================================================================

#[derive(Debug, Clone)]
pub struct GatewayPreference {
    pub id: String,
    pub checkout_url: String,
}

#[derive(Debug, Clone)]
pub struct GatewayPaymentDetails {
    pub status: GatewayPaymentStatus,
    pub appointment_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayPaymentStatus {
    Approved,
    Rejected,
    Other(String),
}

impl GatewayPaymentStatus {
    pub fn from_gateway(raw: &str) -> Self {
        match raw {
            "approved" => GatewayPaymentStatus::Approved,
            "rejected" | "cancelled" => GatewayPaymentStatus::Rejected,
            other => GatewayPaymentStatus::Other(other.to_string()),
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    #[error("Appointment not found or you are not the owner")]
    AppointmentNotFound,

    #[error("This appointment cannot be paid for (current status: {0})")]
    NotPayable(AppointmentStatus),

    #[error("A payment already exists for gateway reference {0}")]
    DuplicateReference(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Unauthorized access to payment")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(String),
}
