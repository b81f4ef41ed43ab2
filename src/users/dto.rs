use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::repo_types::User;
use crate::error::AppError;

/// Width of the `users.email` column.
const MAX_EMAIL_LEN: usize = 320;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Trims names, lowercases the email and rejects malformed input.
    pub fn validate(mut self) -> Result<Self, AppError> {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();

        for (field, value) in [
            ("first_name", &self.first_name),
            ("last_name", &self.last_name),
            ("username", &self.username),
        ] {
            if value.is_empty() {
                return Err(AppError::validation(format!("{field} must not be empty")));
            }
            if value.chars().count() > 255 {
                return Err(AppError::validation(format!(
                    "{field} must be at most 255 characters"
                )));
            }
        }
        if self.email.chars().count() > MAX_EMAIL_LEN {
            return Err(AppError::validation(format!(
                "email must be at most {MAX_EMAIL_LEN} characters"
            )));
        }
        if !is_valid_email(&self.email) {
            return Err(AppError::validation("Invalid email"));
        }
        if self.password.len() < 8 {
            return Err(AppError::validation("Password too short"));
        }
        Ok(self)
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub is_active: bool,
    pub is_superuser: bool,
    pub is_verified: bool,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            username: u.username,
            email: u.email,
            is_active: u.is_active,
            is_superuser: u.is_superuser,
            is_verified: u.is_verified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> RegisterRequest {
        RegisterRequest {
            first_name: " Alice ".into(),
            last_name: "Liddell".into(),
            username: "alice".into(),
            email: " Alice@X.com ".into(),
            password: "secret123".into(),
        }
    }

    #[test]
    fn validate_normalizes_fields() {
        let req = request().validate().unwrap();
        assert_eq!(req.first_name, "Alice");
        assert_eq!(req.email, "alice@x.com");
    }

    #[test]
    fn validate_rejects_bad_input() {
        let mut r = request();
        r.email = "not-an-email".into();
        assert!(matches!(r.validate(), Err(AppError::Validation(_))));

        let mut r = request();
        r.password = "short".into();
        assert!(matches!(r.validate(), Err(AppError::Validation(_))));

        let mut r = request();
        r.username = "   ".into();
        assert!(matches!(r.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn validate_rejects_emails_wider_than_the_column() {
        let mut r = request();
        r.email = format!("{}@x.com", "a".repeat(400));
        match r.validate() {
            Err(AppError::Validation(msg)) => assert!(msg.contains("320")),
            other => panic!("expected a validation error, got {other:?}"),
        }

        let mut r = request();
        r.email = format!("{}@x.com", "a".repeat(314));
        assert_eq!(r.validate().unwrap().email.len(), 320);
    }

    #[test]
    fn public_user_never_serializes_the_hash() {
        let user = User {
            id: 1,
            first_name: "Alice".into(),
            last_name: "Liddell".into(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            hashed_password: "$argon2id$secret-hash".into(),
            is_active: true,
            is_superuser: false,
            is_verified: false,
        };
        let json = serde_json::to_string(&PublicUser::from(user)).unwrap();
        assert!(json.contains("alice@x.com"));
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("argon2"));
    }
}
