use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub mercadopago_base_url: String,
    pub mercadopago_access_token: String,
    pub notification_host: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            mercadopago_base_url: "http://localhost:54322".to_string(),
            mercadopago_access_token: "test-access-token".to_string(),
            notification_host: "http://localhost:3000".to_string(),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            mercadopago_base_url: self.mercadopago_base_url.clone(),
            mercadopago_access_token: self.mercadopago_access_token.clone(),
            notification_host: self.notification_host.clone(),
        }
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn doctor(email: &str) -> Self {
        Self::new(email, "doctor")
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned PostgREST rows matching the medcita schema, for wiremock-backed
/// integration tests.
pub struct MockPostgrestResponses;

impl MockPostgrestResponses {
    pub fn doctor_row(doctor_id: &str, full_name: &str) -> Value {
        json!({
            "id": doctor_id,
            "full_name": full_name,
            "email": "doctor@example.com",
            "role": "doctor"
        })
    }

    pub fn appointment_row(
        appointment_id: &str,
        patient_id: &str,
        doctor_id: &str,
        start_time: DateTime<Utc>,
        status: &str,
    ) -> Value {
        let end_time = start_time + Duration::minutes(30);
        json!({
            "id": appointment_id,
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "start_time": start_time.to_rfc3339(),
            "end_time": end_time.to_rfc3339(),
            "status": status,
            "created_at": "2025-01-01T00:00:00+00:00",
            "updated_at": "2025-01-01T00:00:00+00:00"
        })
    }

    pub fn appointment_with_patient_row(
        appointment_id: &str,
        patient_id: &str,
        doctor_id: &str,
        start_time: DateTime<Utc>,
        status: &str,
    ) -> Value {
        let mut row = Self::appointment_row(appointment_id, patient_id, doctor_id, start_time, status);
        row["patient"] = json!({
            "id": patient_id,
            "full_name": "Test Patient",
            "email": "patient@example.com"
        });
        row
    }

    pub fn appointment_with_doctor_row(
        appointment_id: &str,
        patient_id: &str,
        doctor_id: &str,
        start_time: DateTime<Utc>,
        status: &str,
    ) -> Value {
        let mut row = Self::appointment_row(appointment_id, patient_id, doctor_id, start_time, status);
        row["doctor"] = json!({
            "id": doctor_id,
            "full_name": "Dr. Test",
            "email": "doctor@example.com"
        });
        row
    }

    pub fn payment_row(appointment_id: &str, gateway_reference_id: &str) -> Value {
        json!({
            "id": Uuid::new_v4(),
            "appointment_id": appointment_id,
            "amount": 5000,
            "gateway_reference_id": gateway_reference_id,
            "status": "failed",
            "created_at": "2025-01-01T00:00:00+00:00"
        })
    }
}
