// libs/payment-cell/src/store.rs
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use std::sync::Arc;
use tracing::debug;

use shared_database::{StoreError, SupabaseClient};

use crate::models::Payment;

/// Persistence boundary for payment records. `gateway_reference_id` is
/// unique; inserting a duplicate surfaces as `StoreError::Conflict`.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: &Payment, auth: Option<&str>) -> Result<Payment, StoreError>;
}

pub struct SupabasePaymentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabasePaymentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl PaymentStore for SupabasePaymentStore {
    async fn insert(&self, payment: &Payment, auth: Option<&str>) -> Result<Payment, StoreError> {
        debug!("Inserting payment {} for appointment {}", payment.id, payment.appointment_id);

        let body = serde_json::to_value(payment)
            .map_err(|e| StoreError::Api(format!("Failed to serialize payment: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let rows: Vec<Payment> = self
            .supabase
            .request_with_headers(Method::POST, "/rest/v1/payments", auth, Some(body), Some(headers))
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Api("Insert returned no rows".to_string()))
    }
}
