// libs/payment-cell/src/services/mercado_pago.rs
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use appointment_cell::models::Appointment;
use shared_config::AppConfig;

use crate::models::{
    GatewayPaymentDetails, GatewayPaymentStatus, GatewayPreference, PaymentError,
};

/// The external settlement side of the payment flow: issue a payable
/// checkout preference, and later report what happened to it.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_preference(
        &self,
        appointment: &Appointment,
        amount: i64,
    ) -> Result<GatewayPreference, PaymentError>;

    async fn payment_details(
        &self,
        gateway_payment_id: &str,
    ) -> Result<GatewayPaymentDetails, PaymentError>;
}

#[derive(Debug, Deserialize)]
struct PreferenceApiResponse {
    id: String,
    init_point: String,
}

#[derive(Debug, Deserialize)]
struct PaymentApiResponse {
    status: String,
    #[serde(default)]
    metadata: PaymentApiMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct PaymentApiMetadata {
    appointment_id: Option<String>,
}

/// Mercado Pago REST client.
/// Based on: https://www.mercadopago.com/developers/en/reference
pub struct MercadoPagoClient {
    client: Client,
    base_url: String,
    access_token: String,
    notification_host: String,
}

impl MercadoPagoClient {
    pub fn new(config: &AppConfig) -> Self {
        if !config.is_payments_configured() {
            warn!("Payment gateway access token not set - checkout requests will fail");
        }

        Self {
            client: Client::new(),
            base_url: config.mercadopago_base_url.clone(),
            access_token: config.mercadopago_access_token.clone(),
            notification_host: config.notification_host.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoClient {
    /// Create a checkout preference for an appointment.
    /// POST /checkout/preferences
    async fn create_preference(
        &self,
        appointment: &Appointment,
        amount: i64,
    ) -> Result<GatewayPreference, PaymentError> {
        info!("Creating checkout preference for appointment {}", appointment.id);

        let url = format!("{}/checkout/preferences", self.base_url);

        // metadata.appointment_id is what the webhook handler later uses to
        // find the appointment being settled.
        let request_body = json!({
            "items": [
                {
                    "id": appointment.id,
                    "title": "Medical appointment",
                    "quantity": 1,
                    "unit_price": amount,
                    "currency_id": "CLP",
                }
            ],
            "metadata": {
                "appointment_id": appointment.id,
            },
            "back_urls": {
                "success": format!("{}/payment-success", self.notification_host),
                "failure": format!("{}/payment-failure", self.notification_host),
                "pending": format!("{}/payment-pending", self.notification_host),
            },
            "auto_return": "approved",
            "notification_url": format!("{}/payments/webhook", self.notification_host),
        });

        debug!("Sending preference creation request to: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .json(&request_body)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !status.is_success() {
            error!("Preference creation failed: {} - {}", status, response_text);
            return Err(PaymentError::Gateway(format!("HTTP {}: {}", status, response_text)));
        }

        let preference: PreferenceApiResponse = serde_json::from_str(&response_text)
            .map_err(|e| PaymentError::Gateway(format!("Failed to parse preference response: {}", e)))?;

        info!("Created checkout preference {}", preference.id);
        Ok(GatewayPreference {
            id: preference.id,
            checkout_url: preference.init_point,
        })
    }

    /// Fetch the settlement details for a gateway payment id.
    /// GET /v1/payments/{id}
    async fn payment_details(
        &self,
        gateway_payment_id: &str,
    ) -> Result<GatewayPaymentDetails, PaymentError> {
        let url = format!("{}/v1/payments/{}", self.base_url, gateway_payment_id);
        debug!("Fetching payment details from: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.access_token))
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !status.is_success() {
            error!("Payment lookup failed: {} - {}", status, response_text);
            return Err(PaymentError::Gateway(format!("HTTP {}: {}", status, response_text)));
        }

        let payment: PaymentApiResponse = serde_json::from_str(&response_text)
            .map_err(|e| PaymentError::Gateway(format!("Failed to parse payment response: {}", e)))?;

        let appointment_id = payment
            .metadata
            .appointment_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok());

        Ok(GatewayPaymentDetails {
            status: GatewayPaymentStatus::from_gateway(&payment.status),
            appointment_id,
        })
    }
}
