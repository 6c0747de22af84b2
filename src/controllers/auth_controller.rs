use actix_web::{HttpResponse, web};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::errors::{ApiError, validation_error};
use crate::service::handler::AppState;
use crate::service::user_service::NewRegistration;

lazy_static! {
    // Wire-level formats: +91 plus exactly ten subscriber digits, and a
    // permissive local@domain.tld email shape (no full RFC validation).
    static ref PHONE_RE: Regex = Regex::new(r"^\+91\d{10}$").unwrap();
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendOtpRequest {
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: String,
    #[validate(regex(path = *EMAIL_RE, message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(length(min = 1, message = "Phone and OTP are required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "Phone and OTP are required"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(regex(path = *PHONE_RE, message = "Invalid phone number"))]
    pub phone: String,
    #[validate(regex(path = *EMAIL_RE, message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, max = 20, message = "Password must be between 6 and 20 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "All fields are required"))]
    pub otp: String,
    pub referral_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub password: String,
}

pub struct AuthController;

impl AuthController {
    pub async fn send_otp(
        state: web::Data<AppState>,
        request: web::Json<SendOtpRequest>,
    ) -> Result<HttpResponse, ApiError> {
        request.validate().map_err(validation_error)?;

        let code = state.otp.send_otp(&request.phone, &request.email).await?;

        let mut body = json!({
            "success": true,
            "message": "OTP sent successfully to your email",
        });
        if state.expose_otp {
            body["otp"] = json!(code);
        }
        Ok(HttpResponse::Ok().json(body))
    }

    pub async fn verify_otp(
        state: web::Data<AppState>,
        request: web::Json<VerifyOtpRequest>,
    ) -> Result<HttpResponse, ApiError> {
        request.validate().map_err(validation_error)?;

        state.otp.verify_otp(&request.phone, &request.otp).await?;

        Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "OTP verified successfully",
        })))
    }

    pub async fn register(
        state: web::Data<AppState>,
        request: web::Json<RegisterRequest>,
    ) -> Result<HttpResponse, ApiError> {
        request.validate().map_err(validation_error)?;
        let request = request.into_inner();

        let (token, user) = state
            .users
            .register(NewRegistration {
                phone: request.phone,
                email: request.email,
                password: request.password,
                otp: request.otp,
                referral_code: request.referral_code,
            })
            .await?;

        Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "message": "Registration successful",
            "token": token,
            "user": user,
        })))
    }

    pub async fn login(
        state: web::Data<AppState>,
        request: web::Json<LoginRequest>,
    ) -> Result<HttpResponse, ApiError> {
        let phone = request.phone.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let email = request.email.as_deref().map(str::trim).filter(|s| !s.is_empty());
        if (phone.is_none() && email.is_none()) || request.password.is_empty() {
            return Err(ApiError::Validation(
                "Phone/Email and password are required".to_string(),
            ));
        }

        let (token, user) = state.users.login(phone, email, &request.password).await?;

        Ok(HttpResponse::Ok().json(json!({
            "success": true,
            "token": token,
            "user": user,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn send_otp(phone: &str, email: &str) -> SendOtpRequest {
        SendOtpRequest {
            phone: phone.to_string(),
            email: email.to_string(),
        }
    }

    fn register(phone: &str, email: &str, password: &str, otp: &str) -> RegisterRequest {
        RegisterRequest {
            phone: phone.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            otp: otp.to_string(),
            referral_code: None,
        }
    }

    #[test]
    fn phone_must_be_plus91_and_ten_digits() {
        assert!(send_otp("+919876543210", "a@b.com").validate().is_ok());
        assert!(send_otp("+91987654321", "a@b.com").validate().is_err());
        assert!(send_otp("+9198765432100", "a@b.com").validate().is_err());
        assert!(send_otp("9876543210", "a@b.com").validate().is_err());
        assert!(send_otp("+129876543210", "a@b.com").validate().is_err());
    }

    #[test]
    fn email_needs_a_dot_in_the_domain() {
        assert!(send_otp("+919876543210", "a@b.com").validate().is_ok());
        assert!(send_otp("+919876543210", "a@b").validate().is_err());
        assert!(send_otp("+919876543210", "a b@c.com").validate().is_err());
        assert!(send_otp("+919876543210", "no-at-sign.com").validate().is_err());
    }

    #[test]
    fn password_length_is_bounded() {
        assert!(register("+919876543210", "a@b.com", "secret", "123456").validate().is_ok());
        assert!(register("+919876543210", "a@b.com", "12345", "123456").validate().is_err());
        assert!(
            register("+919876543210", "a@b.com", &"x".repeat(20), "123456")
                .validate()
                .is_ok()
        );
        assert!(
            register("+919876543210", "a@b.com", &"x".repeat(21), "123456")
                .validate()
                .is_err()
        );
    }

    #[test]
    fn otp_presence_is_required() {
        assert!(register("+919876543210", "a@b.com", "secret1", "").validate().is_err());
        let request = VerifyOtpRequest {
            phone: "+919876543210".into(),
            otp: String::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn register_accepts_camel_case_referral_code() {
        let request: RegisterRequest = serde_json::from_value(serde_json::json!({
            "phone": "+919876543210",
            "email": "a@b.com",
            "password": "secret1",
            "otp": "123456",
            "referralCode": "A1B2C3D4",
        }))
        .unwrap();
        assert_eq!(request.referral_code.as_deref(), Some("A1B2C3D4"));
        assert!(request.validate().is_ok());
    }
}
