use serde::{Deserialize, Serialize};

use super::validate::{require_non_empty, Validate};

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Email is trimmed and lower-cased; the password is sent untouched.
    pub fn new(email: &str, password: &str) -> Self {
        Self {
            email: normalize_email(email),
            password: password.to_string(),
        }
    }
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
}

impl RegisterRequest {
    /// A blank referral code is left out of the request entirely.
    pub fn new(name: &str, email: &str, password: &str, referral_code: &str) -> Self {
        let code = normalize_referral_code(referral_code);
        Self {
            name: name.trim().to_string(),
            email: normalize_email(email),
            password: password.to_string(),
            referral_code: if code.is_empty() { None } else { Some(code) },
        }
    }
}

/// Response of both auth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

impl Validate for AuthResponse {
    fn validate(&self) -> Result<(), String> {
        require_non_empty("token", &self.token)
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn normalize_referral_code(code: &str) -> String {
    code.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_normalizes_email() {
        let req = LoginRequest::new("  A@B.com ", " x ");
        assert_eq!(req.email, "a@b.com");
        assert_eq!(req.password, " x ");
    }

    #[test]
    fn test_register_request_omits_blank_referral_code() {
        let req = RegisterRequest::new(" Ahmed Khan ", "Ahmed@Example.com", "pw", "   ");
        assert_eq!(req.name, "Ahmed Khan");
        assert_eq!(req.email, "ahmed@example.com");
        assert_eq!(req.referral_code, None);

        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("referral_code").is_none());
    }

    #[test]
    fn test_auth_response_requires_token() {
        let ok: AuthResponse = serde_json::from_str(r#"{"token": "t1"}"#).unwrap();
        assert!(ok.validate().is_ok());
        let blank: AuthResponse = serde_json::from_str(r#"{"token": ""}"#).unwrap();
        assert!(blank.validate().is_err());
        assert!(serde_json::from_str::<AuthResponse>("{}").is_err());
    }

    #[test]
    fn test_register_request_uppercases_referral_code() {
        let req = RegisterRequest::new("A", "a@b.com", "pw", " ahmed ");
        assert_eq!(req.referral_code.as_deref(), Some("AHMED"));
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["referral_code"], "AHMED");
    }
}
