// libs/payment-cell/src/services/payments.rs
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use appointment_cell::models::AppointmentStatus;
use appointment_cell::services::lifecycle::AppointmentLifecycleService;
use appointment_cell::store::AppointmentStore;
use shared_database::StoreError;

use crate::models::{
    GatewayPaymentStatus, Payment, PaymentError, PaymentStatus, PreferenceResponse,
    APPOINTMENT_PRICE_CLP,
};
use crate::services::mercado_pago::PaymentGateway;
use crate::store::PaymentStore;

fn store_err(err: StoreError) -> PaymentError {
    match err {
        StoreError::Auth(_) => PaymentError::Unauthorized,
        StoreError::Conflict(msg) | StoreError::Api(msg) => PaymentError::Database(msg),
    }
}

pub struct PaymentService {
    appointments: Arc<dyn AppointmentStore>,
    payments: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
    lifecycle: AppointmentLifecycleService,
}

impl PaymentService {
    pub fn new(
        appointments: Arc<dyn AppointmentStore>,
        payments: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            appointments,
            payments,
            gateway,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Creates a checkout preference for an unpaid appointment owned by the
    /// calling patient and records the satellite payment row.
    pub async fn create_preference(
        &self,
        appointment_id: Uuid,
        patient_id: Uuid,
        auth: Option<&str>,
    ) -> Result<PreferenceResponse, PaymentError> {
        let appointment = self
            .appointments
            .find_for_patient(appointment_id, patient_id, auth)
            .await
            .map_err(store_err)?
            .ok_or(PaymentError::AppointmentNotFound)?;

        if appointment.status != AppointmentStatus::PendingPayment {
            return Err(PaymentError::NotPayable(appointment.status));
        }

        let preference = self
            .gateway
            .create_preference(&appointment, APPOINTMENT_PRICE_CLP)
            .await?;

        let payment = Payment {
            id: Uuid::new_v4(),
            appointment_id,
            amount: APPOINTMENT_PRICE_CLP,
            gateway_reference_id: preference.id.clone(),
            status: PaymentStatus::Failed,
            created_at: Utc::now(),
        };

        self.payments.insert(&payment, auth).await.map_err(|e| match e {
            StoreError::Conflict(_) => PaymentError::DuplicateReference(preference.id.clone()),
            other => store_err(other),
        })?;

        info!(
            "Checkout preference {} created for appointment {}",
            preference.id, appointment_id
        );

        Ok(PreferenceResponse {
            preference_id: preference.id,
            checkout_url: preference.checkout_url,
        })
    }

    /// Settles an appointment from a gateway notification. Approved payments
    /// advance pending_payment to paid, rejections to payment_failed; every
    /// other outcome is a logged no-op. Re-deliveries are idempotent.
    pub async fn handle_gateway_notification(
        &self,
        gateway_payment_id: &str,
    ) -> Result<(), PaymentError> {
        debug!("Processing gateway notification for payment {}", gateway_payment_id);

        let details = self.gateway.payment_details(gateway_payment_id).await?;

        let Some(appointment_id) = details.appointment_id else {
            warn!("Gateway payment {} carries no appointment metadata", gateway_payment_id);
            return Ok(());
        };

        let target = match details.status {
            GatewayPaymentStatus::Approved => AppointmentStatus::Paid,
            GatewayPaymentStatus::Rejected => AppointmentStatus::PaymentFailed,
            GatewayPaymentStatus::Other(raw) => {
                debug!("Ignoring gateway status {} for payment {}", raw, gateway_payment_id);
                return Ok(());
            }
        };

        self.settle(appointment_id, target).await
    }

    async fn settle(
        &self,
        appointment_id: Uuid,
        target: AppointmentStatus,
    ) -> Result<(), PaymentError> {
        let Some(appointment) = self
            .appointments
            .find_by_id(appointment_id, None)
            .await
            .map_err(store_err)?
        else {
            warn!("Gateway notification for unknown appointment {}", appointment_id);
            return Ok(());
        };

        if appointment.status == target {
            debug!("Appointment {} already {}, nothing to do", appointment_id, target);
            return Ok(());
        }

        if self
            .lifecycle
            .validate_status_transition(&appointment.status, &target)
            .is_err()
        {
            warn!(
                "Ignoring gateway notification for appointment {} in status {}",
                appointment_id, appointment.status
            );
            return Ok(());
        }

        match self
            .appointments
            .update_status_if(appointment_id, AppointmentStatus::PendingPayment, target, None)
            .await
            .map_err(store_err)?
        {
            Some(_) => info!("Appointment {} marked {}", appointment_id, target),
            None => debug!("Appointment {} was settled concurrently", appointment_id),
        }

        Ok(())
    }
}
