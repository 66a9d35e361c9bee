use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::Role;
use crate::services::auth_service::MIN_PASSWORD_LENGTH;
use crate::services::user_service::NewUser;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    pub fn is_complete(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "All fields are required"))]
    pub name: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

impl RegisterForm {
    /// Checks the form and produces the account to create, or the message to flash.
    pub fn into_new_user(self) -> Result<NewUser, String> {
        if self.name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.password.is_empty()
            || self.role.trim().is_empty()
        {
            return Err("All fields are required".to_string());
        }
        let role: Role = self
            .role
            .parse()
            .map_err(|_| "Invalid role selected".to_string())?;
        let trimmed = RegisterForm {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self
        };
        if let Err(errors) = trimmed.validate() {
            return Err(crate::utils::validation::first_message(&errors)
                .unwrap_or_else(|| "Invalid registration details".to_string()));
        }
        Ok(NewUser {
            name: trimmed.name,
            email: trimmed.email,
            password: trimmed.password,
            role,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

impl ResetPasswordForm {
    pub fn check(&self) -> Result<(), String> {
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            ));
        }
        if self.password != self.confirm_password {
            return Err("Passwords do not match".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResetPageView {
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterPageView {
    pub roles: Vec<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, email: &str, password: &str, role: &str) -> RegisterForm {
        RegisterForm {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    #[test]
    fn register_requires_every_field() {
        let err = form("", "a@b.co", "secret1", "bde").into_new_user().unwrap_err();
        assert_eq!(err, "All fields are required");
    }

    #[test]
    fn register_rejects_unknown_role() {
        let err = form("Ann", "a@b.co", "secret1", "owner").into_new_user().unwrap_err();
        assert_eq!(err, "Invalid role selected");
    }

    #[test]
    fn register_rejects_short_password() {
        let err = form("Ann", "a@b.co", "12345", "bde").into_new_user().unwrap_err();
        assert_eq!(err, "Password must be at least 6 characters");
    }

    #[test]
    fn register_accepts_valid_form() {
        let user = form(" Ann ", " ann@example.com ", "secret1", "BDE")
            .into_new_user()
            .unwrap();
        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "ann@example.com");
        assert_eq!(user.role, Role::Bde);
    }

    #[test]
    fn reset_form_checks_length_and_match() {
        let short = ResetPasswordForm {
            password: "abc".into(),
            confirm_password: "abc".into(),
        };
        assert!(short.check().is_err());

        let mismatch = ResetPasswordForm {
            password: "abcdef".into(),
            confirm_password: "abcdeg".into(),
        };
        assert_eq!(mismatch.check().unwrap_err(), "Passwords do not match");

        let ok = ResetPasswordForm {
            password: "abcdef".into(),
            confirm_password: "abcdef".into(),
        };
        assert!(ok.check().is_ok());
    }

    #[test]
    fn login_form_completeness() {
        assert!(!LoginForm::default().is_complete());
        assert!(LoginForm {
            email: "a@b.co".into(),
            password: "x".into()
        }
        .is_complete());
    }
}
