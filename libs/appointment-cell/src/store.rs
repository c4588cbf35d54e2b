// libs/appointment-cell/src/store.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use shared_database::{StoreError, SupabaseClient};

use crate::models::{
    Appointment, AppointmentStatus, AppointmentWithDoctor, AppointmentWithPatient, UserSummary,
};

impl From<StoreError> for crate::models::AppointmentError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => crate::models::AppointmentError::SlotTaken,
            StoreError::Auth(_) => crate::models::AppointmentError::Unauthorized,
            StoreError::Api(msg) => crate::models::AppointmentError::Database(msg),
        }
    }
}

/// Persistence boundary for appointments. Implementations are handed to the
/// services at construction time; nothing reaches for storage ambiently.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn insert(
        &self,
        appointment: &Appointment,
        auth: Option<&str>,
    ) -> Result<Appointment, StoreError>;

    async fn find_by_id(
        &self,
        id: Uuid,
        auth: Option<&str>,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Lookup scoped to the attending doctor; a foreign appointment is
    /// indistinguishable from an absent one.
    async fn find_for_doctor(
        &self,
        id: Uuid,
        doctor_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Option<Appointment>, StoreError>;

    /// Lookup scoped to the owning patient.
    async fn find_for_patient(
        &self,
        id: Uuid,
        patient_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Option<Appointment>, StoreError>;

    async fn doctor_appointments_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        auth: Option<&str>,
    ) -> Result<Vec<Appointment>, StoreError>;

    /// The doctor's schedule in `[from, to)` joined with patient identity,
    /// ascending by start time.
    async fn doctor_day_schedule(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        auth: Option<&str>,
    ) -> Result<Vec<AppointmentWithPatient>, StoreError>;

    /// The patient's full history joined with doctor identity, descending
    /// by start time.
    async fn patient_agenda(
        &self,
        patient_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Vec<AppointmentWithDoctor>, StoreError>;

    /// Compare-and-set status update: the write only applies while the row
    /// still carries `expected`. `None` means another writer got there first.
    async fn update_status_if(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
        auth: Option<&str>,
    ) -> Result<Option<Appointment>, StoreError>;
}

/// Identity lookups against the user directory. The scheduler only ever
/// needs "doctor by id", role-filtered.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_doctor(
        &self,
        doctor_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Option<UserSummary>, StoreError>;
}

// ==============================================================================
// POSTGREST-BACKED IMPLEMENTATIONS
// ==============================================================================

fn representation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

fn encode_ts(ts: DateTime<Utc>) -> String {
    urlencoding::encode(&ts.to_rfc3339()).into_owned()
}

pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert(
        &self,
        appointment: &Appointment,
        auth: Option<&str>,
    ) -> Result<Appointment, StoreError> {
        debug!("Inserting appointment {} for doctor {}", appointment.id, appointment.doctor_id);

        let body = serde_json::to_value(appointment)
            .map_err(|e| StoreError::Api(format!("Failed to serialize appointment: {}", e)))?;

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                auth,
                Some(body),
                Some(representation_headers()),
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::Api("Insert returned no rows".to_string()))
    }

    async fn find_by_id(
        &self,
        id: Uuid,
        auth: Option<&str>,
    ) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", id);
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, auth, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_for_doctor(
        &self,
        id: Uuid,
        doctor_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&doctor_id=eq.{}", id, doctor_id);
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, auth, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn find_for_patient(
        &self,
        id: Uuid,
        patient_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Option<Appointment>, StoreError> {
        let path = format!("/rest/v1/appointments?id=eq.{}&patient_id=eq.{}", id, patient_id);
        let rows: Vec<Appointment> = self.supabase.request(Method::GET, &path, auth, None).await?;
        Ok(rows.into_iter().next())
    }

    async fn doctor_appointments_between(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        auth: Option<&str>,
    ) -> Result<Vec<Appointment>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&start_time=gte.{}&start_time=lt.{}",
            doctor_id,
            encode_ts(from),
            encode_ts(to),
        );
        self.supabase.request(Method::GET, &path, auth, None).await
    }

    async fn doctor_day_schedule(
        &self,
        doctor_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        auth: Option<&str>,
    ) -> Result<Vec<AppointmentWithPatient>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&start_time=gte.{}&start_time=lt.{}\
             &select=*,patient:users!appointments_patient_id_fkey(id,full_name,email)\
             &order=start_time.asc",
            doctor_id,
            encode_ts(from),
            encode_ts(to),
        );
        self.supabase.request(Method::GET, &path, auth, None).await
    }

    async fn patient_agenda(
        &self,
        patient_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Vec<AppointmentWithDoctor>, StoreError> {
        let path = format!(
            "/rest/v1/appointments?patient_id=eq.{}\
             &select=*,doctor:users!appointments_doctor_id_fkey(id,full_name,email)\
             &order=start_time.desc",
            patient_id,
        );
        self.supabase.request(Method::GET, &path, auth, None).await
    }

    async fn update_status_if(
        &self,
        id: Uuid,
        expected: AppointmentStatus,
        next: AppointmentStatus,
        auth: Option<&str>,
    ) -> Result<Option<Appointment>, StoreError> {
        debug!("Updating appointment {} status {} -> {}", id, expected, next);

        let path = format!("/rest/v1/appointments?id=eq.{}&status=eq.{}", id, expected);
        let body = json!({
            "status": next,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                auth,
                Some(body),
                Some(representation_headers()),
            )
            .await?;

        Ok(rows.into_iter().next())
    }
}

pub struct SupabaseUserDirectory {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseUserDirectory {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }
}

#[async_trait]
impl UserDirectory for SupabaseUserDirectory {
    async fn find_doctor(
        &self,
        doctor_id: Uuid,
        auth: Option<&str>,
    ) -> Result<Option<UserSummary>, StoreError> {
        let path = format!(
            "/rest/v1/users?id=eq.{}&role=eq.doctor&select=id,full_name,email",
            doctor_id,
        );
        let rows: Vec<UserSummary> = self.supabase.request(Method::GET, &path, auth, None).await?;
        Ok(rows.into_iter().next())
    }
}
