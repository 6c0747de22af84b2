use actix_web::error::InternalError;
use actix_web::{HttpResponse, web};
use color_eyre::Result;
use serde_json::json;
use sqlx::PgPool;

use crate::config::config::Config;
use crate::config::crypto::CryptoService;
use crate::service::email_service::EmailService;
use crate::service::otp_service::OtpService;
use crate::service::token_service::TokenService;
use crate::service::user_service::UserService;

/// Per-process shared state: one pool, stateless services around it.
pub struct AppState {
    pub pool: PgPool,
    pub otp: OtpService,
    pub users: UserService,
    /// Development-only diagnostics: echo the OTP code in the send-otp
    /// response. Never enabled in production.
    pub expose_otp: bool,
}

impl AppState {
    pub fn new(pool: PgPool, config: &Config) -> Result<Self> {
        let crypto = CryptoService;
        let email_service =
            EmailService::new(&config.smtp_host, &config.smtp_user, &config.smtp_pass)?;
        let tokens = TokenService::new(&config.jwt_secret);

        Ok(Self {
            otp: OtpService::new(
                pool.clone(),
                crypto.clone(),
                email_service,
                config.platform_name.clone(),
            ),
            users: UserService::new(pool.clone(), crypto, tokens),
            expose_otp: config.is_development(),
            pool,
        })
    }
}

/// Malformed or incomplete JSON bodies answer in the same
/// `{"error": ...}` shape as every other failure.
pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        InternalError::from_response(
            err,
            HttpResponse::BadRequest().json(json!({ "error": "All fields are required" })),
        )
        .into()
    }));
}
