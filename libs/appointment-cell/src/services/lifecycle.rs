// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// The single place where legal status transitions are encoded. Statuses
/// only ever advance: pending_payment settles to paid or payment_failed,
/// and only a paid appointment can be confirmed.
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_status_transition(
        &self,
        current_status: &AppointmentStatus,
        new_status: &AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.valid_transitions(current_status).contains(new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppointmentError::InvalidStatusTransition(*current_status));
        }

        Ok(())
    }

    pub fn valid_transitions(&self, current_status: &AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::PendingPayment => vec![
                AppointmentStatus::Paid,
                AppointmentStatus::PaymentFailed,
            ],
            AppointmentStatus::Paid => vec![AppointmentStatus::Confirmed],
            // Terminal states - no transitions allowed
            AppointmentStatus::Confirmed => vec![],
            AppointmentStatus::PaymentFailed => vec![],
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
