use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo::{Role, User};

/// Request body for user registration. `role` arrives as a raw string so the
/// allow-list check can answer with the API's own message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub school: Option<String>,
    #[serde(default)]
    pub class_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendCodeRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyEmailQuery {
    pub token: Option<String>,
}

/// Partial profile update; omitted fields keep their stored values.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub guardian_name: Option<String>,
    pub guardian_phone: Option<String>,
    pub school: Option<String>,
    pub class_level: Option<String>,
    pub subjects: Option<Vec<String>>,
    pub bio: Option<String>,
    pub profile_picture: Option<String>,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub phone: String,
    pub school: String,
    pub subjects: Vec<String>,
    pub bio: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
            phone: user.phone.clone().unwrap_or_default(),
            school: user.school.clone().unwrap_or_default(),
            subjects: user.subjects.clone(),
            bio: user.bio.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub email_sent: bool,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response returned after a successful login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_user_serializes_camel_case() {
        let user = PublicUser {
            id: Uuid::new_v4(),
            full_name: "Alice Example".into(),
            email: "alice@x.com".into(),
            role: Role::Student,
            phone: String::new(),
            school: String::new(),
            subjects: vec!["Mathematics".into()],
            bio: String::new(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"fullName\":\"Alice Example\""));
        assert!(json.contains("\"role\":\"student\""));
        assert!(json.contains("alice@x.com"));
    }

    #[test]
    fn register_request_accepts_camel_case_body() {
        let body = r#"{
            "fullName": "Alice Example",
            "email": "alice@x.com",
            "password": "Str0ngP@ssword!",
            "confirmPassword": "Str0ngP@ssword!",
            "role": "student",
            "classLevel": "SS2"
        }"#;
        let req: RegisterRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.full_name, "Alice Example");
        assert_eq!(req.class_level.as_deref(), Some("SS2"));
        assert!(req.phone.is_none());
    }

    #[test]
    fn register_response_exposes_email_sent_flag() {
        let resp = RegisterResponse {
            message: "ok".into(),
            email_sent: false,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"emailSent\":false"));
    }
}
