// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Every consultation occupies one fixed-length slot.
pub const APPOINTMENT_DURATION_MINUTES: i64 = 30;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Half-open interval overlap against `[start, end)`.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end_time && self.start_time < end
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    PendingPayment,
    Paid,
    PaymentFailed,
    Confirmed,
}

impl AppointmentStatus {
    /// Whether an appointment in this status still occupies its slot.
    /// Rejected payments release the time for rebooking.
    pub fn holds_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::PaymentFailed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::PendingPayment => write!(f, "pending_payment"),
            AppointmentStatus::Paid => write!(f, "paid"),
            AppointmentStatus::PaymentFailed => write!(f, "payment_failed"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
        }
    }
}

// ==============================================================================
// READ MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

/// A doctor's schedule entry, joined with the patient who booked it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithPatient {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient: UserSummary,
}

/// A patient's agenda entry, joined with the attending doctor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentWithDoctor {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: UserSummary,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestAppointmentBody {
    pub doctor_id: Uuid,
    pub start_time: DateTime<Utc>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("The specified doctor was not found")]
    DoctorNotFound,

    #[error("Appointments are only allowed between 7:00-12:00 and 14:00-18:00 UTC")]
    OutsideClinicHours,

    #[error("This time slot is already booked")]
    SlotTaken,

    #[error("Appointment not found or it does not belong to this doctor")]
    NotFound,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Unauthorized access to appointment")]
    Unauthorized,

    #[error("Database error: {0}")]
    Database(String),
}
