// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentError, AppointmentWithDoctor, AppointmentWithPatient,
    RequestAppointmentBody,
};
use crate::AppointmentCellState;

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id)
        .map_err(|_| AppError::Auth("Invalid user id in token".to_string()))
}

fn appointment_error_response(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::DoctorNotFound | AppointmentError::OutsideClinicHours => {
            AppError::BadRequest(err.to_string())
        }
        AppointmentError::SlotTaken => AppError::Conflict(err.to_string()),
        AppointmentError::NotFound => AppError::NotFound(err.to_string()),
        AppointmentError::InvalidStatusTransition(_) => AppError::BadRequest(err.to_string()),
        AppointmentError::Unauthorized => AppError::Auth(err.to_string()),
        AppointmentError::Database(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn request_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
    Json(request): Json<RequestAppointmentBody>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let token = auth.token();

    if !user.is_patient() {
        return Err(AppError::Auth("Only patients can request appointments".to_string()));
    }
    let patient_id = caller_id(&user)?;

    let appointment = state
        .scheduler
        .request_appointment(patient_id, request, Some(token))
        .await
        .map_err(appointment_error_response)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn doctor_today_appointments(
    State(state): State<Arc<AppointmentCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<AppointmentWithPatient>>, AppError> {
    let token = auth.token();

    if !user.is_doctor() {
        return Err(AppError::Auth("Only doctors can view the daily schedule".to_string()));
    }
    let doctor_id = caller_id(&user)?;

    let schedule = state
        .scheduler
        .doctor_today_appointments(doctor_id, Some(token))
        .await
        .map_err(appointment_error_response)?;

    Ok(Json(schedule))
}

#[axum::debug_handler]
pub async fn patient_agenda(
    State(state): State<Arc<AppointmentCellState>>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<AppointmentWithDoctor>>, AppError> {
    let token = auth.token();

    if !user.is_patient() {
        return Err(AppError::Auth("Only patients can view their agenda".to_string()));
    }
    let patient_id = caller_id(&user)?;

    let agenda = state
        .scheduler
        .patient_agenda(patient_id, Some(token))
        .await
        .map_err(appointment_error_response)?;

    Ok(Json(agenda))
}

#[axum::debug_handler]
pub async fn confirm_appointment(
    State(state): State<Arc<AppointmentCellState>>,
    Path(appointment_id): Path<Uuid>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    Extension(user): Extension<User>,
) -> Result<Json<Appointment>, AppError> {
    let token = auth.token();

    if !user.is_doctor() {
        return Err(AppError::Auth("Only doctors can confirm appointments".to_string()));
    }
    let doctor_id = caller_id(&user)?;

    let appointment = state
        .scheduler
        .confirm_appointment(appointment_id, doctor_id, Some(token))
        .await
        .map_err(|e| match e {
            AppointmentError::InvalidStatusTransition(current) => AppError::BadRequest(format!(
                "Cannot confirm an appointment that has not been paid (current status: {})",
                current
            )),
            other => appointment_error_response(other),
        })?;

    Ok(Json(appointment))
}
