use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;

use shared_config::{AppConfig, DEFAULT_SLOT_INTERVAL_MINUTES};
use shared_database::AppState;
use shared_models::auth::{Principal, Role};

pub struct TestConfig {
    pub jwt_secret: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub slot_interval_minutes: u16,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
            slot_interval_minutes: DEFAULT_SLOT_INTERVAL_MINUTES,
        }
    }
}

impl TestConfig {
    pub fn with_store_url(url: &str) -> Self {
        Self {
            supabase_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            supabase_jwt_secret: self.jwt_secret.clone(),
            slot_interval_minutes: self.slot_interval_minutes,
            port: 3000,
        }
    }

    pub fn to_state(&self) -> Arc<AppState> {
        Arc::new(AppState::new(self.to_app_config()))
    }
}

pub struct TestPrincipal {
    pub id: String,
    pub email: String,
    pub role: String,
}

impl Default for TestPrincipal {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            role: "patient".to_string(),
        }
    }
}

impl TestPrincipal {
    pub fn with_role(email: &str, role: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            role: role.to_string(),
        }
    }

    pub fn dentist(email: &str) -> Self {
        Self::with_role(email, "dentist")
    }

    pub fn patient(email: &str) -> Self {
        Self::with_role(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::with_role(email, "admin")
    }

    pub fn to_principal(&self) -> Principal {
        Principal {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Role::parse(&self.role).unwrap_or(Role::Patient),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestPrincipal, secret: &str, exp_hours: Option<i64>) -> String {
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

    pub fn create_expired_token(user: &TestPrincipal, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestPrincipal) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned store rows for wiremock-backed tests.
pub struct MockStoreResponses;

impl MockStoreResponses {
    pub fn working_hours_weekdays() -> serde_json::Value {
        json!({
            "monday": {"start": "09:00", "end": "17:00"},
            "tuesday": {"start": "09:00", "end": "17:00"},
            "wednesday": {"start": "09:00", "end": "17:00"},
            "thursday": {"start": "09:00", "end": "17:00"},
            "friday": {"start": "09:00", "end": "17:00"},
            "saturday": {"closed": true},
            "sunday": {"closed": true}
        })
    }

    pub fn dentist_record(id: &str, is_available: bool) -> serde_json::Value {
        json!({
            "id": id,
            "full_name": "Dr. Test Dentist",
            "email": "dentist@example.com",
            "is_available": is_available,
            "working_hours": Self::working_hours_weekdays(),
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_record(
        patient_id: &str,
        dentist_id: &str,
        date: &str,
        time_slot: &str,
        status: &str,
    ) -> serde_json::Value {
        json!({
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "dentist_id": dentist_id,
            "date": date,
            "time_slot": time_slot,
            "status": status,
            "reason": "Routine checkup",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }
}
