use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::appointment_routes;
use appointment_cell::services::scheduling::SchedulingService;
use appointment_cell::store::{
    AppointmentStore, SupabaseAppointmentStore, SupabaseUserDirectory, UserDirectory,
};
use appointment_cell::AppointmentCellState;
use shared_database::SupabaseClient;
use shared_utils::test_utils::{JwtTestUtils, MockPostgrestResponses, TestConfig, TestUser};

fn create_test_app(mock_server: &MockServer) -> (Router, TestConfig) {
    let test_config = TestConfig {
        supabase_url: mock_server.uri(),
        ..Default::default()
    };
    let config = test_config.to_arc();

    let supabase = Arc::new(SupabaseClient::new(&config));
    let appointments: Arc<dyn AppointmentStore> =
        Arc::new(SupabaseAppointmentStore::new(Arc::clone(&supabase)));
    let directory: Arc<dyn UserDirectory> = Arc::new(SupabaseUserDirectory::new(supabase));

    let state = Arc::new(AppointmentCellState {
        config,
        scheduler: SchedulingService::new(appointments, directory),
    });

    (appointment_routes(state), test_config)
}

async fn mock_doctor_lookup(mock_server: &MockServer, doctor_id: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .and(query_param("role", "eq.doctor"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::doctor_row(doctor_id, "Dr. Test")
        ])))
        .mount(mock_server)
        .await;
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn request_appointment_body(doctor_id: &str, start_time: &str) -> Body {
    Body::from(
        json!({
            "doctorId": doctor_id,
            "startTime": start_time,
        })
        .to_string(),
    )
}

#[tokio::test]
async fn request_appointment_returns_created_pending_appointment() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4().to_string();
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    mock_doctor_lookup(&mock_server, &doctor_id).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let start_time: DateTime<Utc> = "2025-09-22T10:00:00Z".parse().unwrap();
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockPostgrestResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &patient.id,
                &doctor_id,
                start_time,
                "pending_payment",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/request")
        .header("Authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(request_appointment_body(&doctor_id, "2025-09-22T10:00:00Z"))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending_payment");
    assert_eq!(body["doctor_id"], doctor_id);
}

#[tokio::test]
async fn request_outside_clinic_hours_is_rejected() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4().to_string();
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    mock_doctor_lookup(&mock_server, &doctor_id).await;

    let request = Request::builder()
        .method("POST")
        .uri("/request")
        .header("Authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(request_appointment_body(&doctor_id, "2025-09-22T04:00:00Z"))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("7:00-12:00"));
}

#[tokio::test]
async fn request_for_booked_slot_conflicts() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let patient = TestUser::patient("patient@example.com");
    let doctor_id = Uuid::new_v4().to_string();
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    mock_doctor_lookup(&mock_server, &doctor_id).await;

    // An appointment already sits at 10:00; the new 10:15 request overlaps.
    let existing_start: DateTime<Utc> = "2025-09-22T10:00:00Z".parse().unwrap();
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::appointment_row(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &doctor_id,
                existing_start,
                "pending_payment",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/request")
        .header("Authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(request_appointment_body(&doctor_id, "2025-09-22T10:15:00Z"))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("already booked"));
}

#[tokio::test]
async fn request_with_unknown_doctor_is_rejected() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let patient = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("POST")
        .uri("/request")
        .header("Authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(request_appointment_body(&Uuid::new_v4().to_string(), "2025-09-22T10:00:00Z"))
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("doctor"));
}

#[tokio::test]
async fn request_requires_patient_role() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, None);

    let request = Request::builder()
        .method("POST")
        .uri("/request")
        .header("Authorization", format!("Bearer {}", token))
        .header("content-type", "application/json")
        .body(request_appointment_body(&Uuid::new_v4().to_string(), "2025-09-22T10:00:00Z"))
        .unwrap();

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn request_without_token_is_unauthorized() {
    let mock_server = MockServer::start().await;
    let (app, _) = create_test_app(&mock_server);

    let request = Request::builder()
        .method("POST")
        .uri("/request")
        .header("content-type", "application/json")
        .body(request_appointment_body(&Uuid::new_v4().to_string(), "2025-09-22T10:00:00Z"))
        .unwrap();

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doctor_today_returns_schedule_with_patients() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, None);

    let today = Utc::now().date_naive().and_hms_opt(0, 0, 0).unwrap().and_utc();
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::appointment_with_patient_row(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &doctor.id,
                today + Duration::hours(9),
                "paid",
            ),
            MockPostgrestResponses::appointment_with_patient_row(
                &Uuid::new_v4().to_string(),
                &Uuid::new_v4().to_string(),
                &doctor.id,
                today + Duration::hours(15),
                "confirmed",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/doctor/today")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["patient"]["full_name"], "Test Patient");
    assert!(entries[0]["start_time"].as_str().unwrap() < entries[1]["start_time"].as_str().unwrap());
}

#[tokio::test]
async fn patient_agenda_returns_history_with_doctors() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let patient = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("patient_id", format!("eq.{}", patient.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::appointment_with_doctor_row(
                &Uuid::new_v4().to_string(),
                &patient.id,
                &Uuid::new_v4().to_string(),
                "2025-09-22T10:00:00Z".parse().unwrap(),
                "confirmed",
            ),
            MockPostgrestResponses::appointment_with_doctor_row(
                &Uuid::new_v4().to_string(),
                &patient.id,
                &Uuid::new_v4().to_string(),
                "2025-09-20T10:00:00Z".parse().unwrap(),
                "payment_failed",
            ),
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("GET")
        .uri("/patient/my-agenda")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["doctor"]["full_name"], "Dr. Test");
    assert!(entries[0]["start_time"].as_str().unwrap() > entries[1]["start_time"].as_str().unwrap());
}

#[tokio::test]
async fn confirm_paid_appointment_succeeds() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, None);
    let appointment_id = Uuid::new_v4().to_string();
    let patient_id = Uuid::new_v4().to_string();
    let start_time: DateTime<Utc> = "2025-09-22T10:00:00Z".parse().unwrap();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("id", format!("eq.{}", appointment_id)))
        .and(query_param("doctor_id", format!("eq.{}", doctor.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::appointment_row(
                &appointment_id,
                &patient_id,
                &doctor.id,
                start_time,
                "paid",
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "eq.paid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::appointment_row(
                &appointment_id,
                &patient_id,
                &doctor.id,
                start_time,
                "confirmed",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/{}/confirm", appointment_id))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "confirmed");
}

#[tokio::test]
async fn confirm_unpaid_appointment_is_rejected() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, None);
    let appointment_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockPostgrestResponses::appointment_row(
                &appointment_id,
                &Uuid::new_v4().to_string(),
                &doctor.id,
                "2025-09-22T10:00:00Z".parse().unwrap(),
                "pending_payment",
            )
        ])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/{}/confirm", appointment_id))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("has not been paid"));
}

#[tokio::test]
async fn confirm_unknown_appointment_is_not_found() {
    let mock_server = MockServer::start().await;
    let (app, config) = create_test_app(&mock_server);

    let doctor = TestUser::doctor("doctor@example.com");
    let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, None);

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/{}/confirm", Uuid::new_v4()))
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
