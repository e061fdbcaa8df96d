use std::sync::Arc;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::{AppConfig, DEFAULT_BIND_ADDR, DEFAULT_CLINIC_LOCATION};
use shared_models::auth::User;

use crate::jwt::sign_token;

pub struct TestConfig {
    pub jwt_secret: String,
    pub jendo_api_url: String,
    pub allow_fallback: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            jendo_api_url: String::new(),
            allow_fallback: false,
        }
    }
}

impl TestConfig {
    pub fn with_backend(url: &str) -> Self {
        Self {
            jendo_api_url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            jendo_api_url: self.jendo_api_url.clone(),
            jwt_secret: self.jwt_secret.clone(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            allow_fallback: self.allow_fallback,
            clinic_location: DEFAULT_CLINIC_LOCATION.to_string(),
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
        Self::patient("patient@jendo.test")
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

    pub fn patient(email: &str) -> Self {
        Self::new(email, "patient")
    }

    pub fn admin(email: &str) -> Self {
        Self::new(email, "admin")
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            email: Some(self.email.clone()),
            role: Some(self.role.clone()),
            name: None,
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        sign_token(&user.to_user(), secret, Duration::hours(exp_hours.unwrap_or(24)))
            .expect("HMAC can take key of any size")
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

/// Canned payloads shaped like the Jendo backend's responses.
pub struct MockBackendResponses;

impl MockBackendResponses {
    pub fn envelope(data: Value) -> Value {
        json!({
            "success": true,
            "message": "OK",
            "data": data,
            "timestamp": "2024-12-01T10:00:00"
        })
    }

    pub fn page(content: Vec<Value>, page: u32, size: u32) -> Value {
        let total = content.len() as u64;
        let total_pages = if total == 0 { 0 } else { 1 };
        json!({
            "content": content,
            "pageNumber": page,
            "pageSize": size,
            "totalElements": total,
            "totalPages": total_pages,
            "first": page == 0,
            "last": true
        })
    }

    pub fn doctor_dto(id: u64, name: &str, specialty: &str, available_days: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "specialty": specialty,
            "hospital": "National Hospital, Colombo",
            "email": "doctor@jendo.test",
            "phone": "+94 11 234 5678",
            "qualifications": "MBBS, MD Cardiology ,FACC",
            "imageUrl": "https://randomuser.me/api/portraits/women/45.jpg",
            "address": null,
            "isAvailable": true,
            "availableDays": available_days,
            "consultationFees": [
                { "id": 1, "feeType": "IN_PERSON", "amount": 3500.00, "currency": "LKR" },
                { "id": 2, "feeType": "VIDEO", "amount": 3000.00, "currency": "LKR" }
            ]
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "success": false,
            "message": message,
            "data": null
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::validate_token;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::with_backend("http://localhost:8080").to_app_config();

        assert_eq!(config.jendo_api_url, "http://localhost:8080");
        assert!(!config.jwt_secret.is_empty());
        assert!(!config.allow_fallback);
    }

    #[test]
    fn test_token_validates_with_same_secret() {
        let config = TestConfig::default();
        let user = TestUser::admin("admin@jendo.test");
        let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));

        let validated = validate_token(&token, &config.jwt_secret).unwrap();
        assert_eq!(validated.id, user.id);
        assert_eq!(validated.role.as_deref(), Some("admin"));
    }

    #[test]
    fn expired_token_is_rejected() {
        let config = TestConfig::default();
        let token = JwtTestUtils::create_expired_token(&TestUser::default(), &config.jwt_secret);
        assert!(validate_token(&token, &config.jwt_secret).is_err());
    }
}
