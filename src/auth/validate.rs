use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::json;

use crate::{
    auth::dto::{LoginRequest, RegisterRequest},
    error::AppError,
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Normalised credentials that passed validation.
#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: &'static str,
    message: &'static str,
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if email.is_empty() {
        errors.push(FieldError { field: "email", message: "Email is Required." });
    } else if !is_valid_email(email) {
        errors.push(FieldError { field: "email", message: "Invalid Email Format." });
    }
}

fn finish(errors: Vec<FieldError>, email: String, password: String) -> Result<Credentials, AppError> {
    if errors.is_empty() {
        return Ok(Credentials { email, password });
    }
    Err(AppError::Validation {
        message: "Validation failed".into(),
        details: Some(json!(errors)),
    })
}

pub fn register_credentials(req: RegisterRequest) -> Result<Credentials, AppError> {
    let email = normalize_email(&req.email);
    let password = req.password;
    let mut errors = Vec::new();
    check_email(&email, &mut errors);

    if password.is_empty() {
        errors.push(FieldError { field: "password", message: "Password is Required." });
    } else {
        if password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError {
                field: "password",
                message: "Password Must Be At least 8 characters long",
            });
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            errors.push(FieldError {
                field: "password",
                message: "Password must contain at least one uppercase letter",
            });
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            errors.push(FieldError {
                field: "password",
                message: "Password must contain at least one lowercase letter",
            });
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            errors.push(FieldError {
                field: "password",
                message: "Password must contain at least one number",
            });
        }
        if !password.chars().any(|c| "!@#$%^&*".contains(c)) {
            errors.push(FieldError {
                field: "password",
                message: "Password must contain at least one special character",
            });
        }
    }

    finish(errors, email, password)
}

pub fn login_credentials(req: LoginRequest) -> Result<Credentials, AppError> {
    let email = normalize_email(&req.email);
    let mut errors = Vec::new();
    check_email(&email, &mut errors);
    if req.password.is_empty() {
        errors.push(FieldError { field: "password", message: "Password is Required." });
    }
    finish(errors, email, req.password)
}
