// libs/appointment-cell/src/services/scheduling.rs
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::StoreError;

use crate::models::{
    Appointment, AppointmentError, AppointmentStatus, AppointmentWithDoctor,
    AppointmentWithPatient, RequestAppointmentBody, APPOINTMENT_DURATION_MINUTES,
};
use crate::services::lifecycle::AppointmentLifecycleService;
use crate::store::{AppointmentStore, UserDirectory};

/// The clinic attends two UTC blocks per day: 7:00-12:00 and 14:00-18:00.
fn within_clinic_hours(start_time: DateTime<Utc>) -> bool {
    let hour = start_time.hour();
    (7..12).contains(&hour) || (14..18).contains(&hour)
}

pub struct SchedulingService {
    appointments: Arc<dyn AppointmentStore>,
    directory: Arc<dyn UserDirectory>,
    lifecycle: AppointmentLifecycleService,
}

impl SchedulingService {
    pub fn new(appointments: Arc<dyn AppointmentStore>, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            appointments,
            directory,
            lifecycle: AppointmentLifecycleService::new(),
        }
    }

    /// Books a new slot for `patient_id` with the requested doctor. The new
    /// appointment starts life unpaid; the slot is held from this moment.
    pub async fn request_appointment(
        &self,
        patient_id: Uuid,
        request: RequestAppointmentBody,
        auth: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment for patient {} with doctor {}", patient_id, request.doctor_id);

        let doctor = self
            .directory
            .find_doctor(request.doctor_id, auth)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        if !within_clinic_hours(request.start_time) {
            return Err(AppointmentError::OutsideClinicHours);
        }

        let start_time = request.start_time;
        let end_time = start_time + ChronoDuration::minutes(APPOINTMENT_DURATION_MINUTES);

        // Symmetric overlap check: any held appointment whose interval
        // intersects [start_time, end_time) blocks the booking, in either
        // direction. The candidate window is one slot wide on each side.
        let window_start = start_time - ChronoDuration::minutes(APPOINTMENT_DURATION_MINUTES);
        let existing = self
            .appointments
            .doctor_appointments_between(doctor.id, window_start, end_time, auth)
            .await?;

        if existing
            .iter()
            .any(|a| a.status.holds_slot() && a.overlaps(start_time, end_time))
        {
            warn!("Appointment conflict detected for doctor {} at {}", doctor.id, start_time);
            return Err(AppointmentError::SlotTaken);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: doctor.id,
            start_time,
            end_time,
            status: AppointmentStatus::PendingPayment,
            created_at: now,
            updated_at: now,
        };

        // The storage unique index on (doctor_id, start_time) decides
        // between two racing writers; the loser surfaces as a conflict.
        let stored = self.appointments.insert(&appointment, auth).await.map_err(|e| match e {
            StoreError::Conflict(_) => AppointmentError::SlotTaken,
            other => other.into(),
        })?;

        info!("Appointment {} booked with doctor {}", stored.id, stored.doctor_id);
        Ok(stored)
    }

    /// The doctor's schedule for the current UTC day, ascending, each entry
    /// carrying the patient's identity.
    pub async fn doctor_today_appointments(
        &self,
        doctor_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Vec<AppointmentWithPatient>, AppointmentError> {
        let today = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
        let tomorrow = today + ChronoDuration::days(1);

        debug!("Fetching today's appointments for doctor {}", doctor_id);
        let schedule = self
            .appointments
            .doctor_day_schedule(doctor_id, today, tomorrow, auth)
            .await?;
        Ok(schedule)
    }

    /// The patient's complete history, newest first, each entry carrying the
    /// doctor's identity.
    pub async fn patient_agenda(
        &self,
        patient_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Vec<AppointmentWithDoctor>, AppointmentError> {
        debug!("Fetching agenda for patient {}", patient_id);
        let agenda = self.appointments.patient_agenda(patient_id, auth).await?;
        Ok(agenda)
    }

    /// Marks a paid appointment as confirmed by its doctor. The lookup is
    /// scoped to the requesting doctor and the write is a compare-and-set,
    /// so a webhook landing in between cannot be overwritten blindly.
    pub async fn confirm_appointment(
        &self,
        appointment_id: Uuid,
        doctor_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self
            .appointments
            .find_for_doctor(appointment_id, doctor_id, auth)
            .await?
            .ok_or(AppointmentError::NotFound)?;

        self.lifecycle
            .validate_status_transition(&appointment.status, &AppointmentStatus::Confirmed)?;

        match self
            .appointments
            .update_status_if(
                appointment_id,
                AppointmentStatus::Paid,
                AppointmentStatus::Confirmed,
                auth,
            )
            .await?
        {
            Some(updated) => {
                info!("Appointment {} confirmed by doctor {}", appointment_id, doctor_id);
                Ok(updated)
            }
            None => {
                // Lost a race against another status writer; report what the
                // row actually carries now.
                let current = self
                    .appointments
                    .find_for_doctor(appointment_id, doctor_id, auth)
                    .await?
                    .ok_or(AppointmentError::NotFound)?;
                Err(AppointmentError::InvalidStatusTransition(current.status))
            }
        }
    }
}
