use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::config::crypto::CryptoService;
use crate::errors::ApiError;
use crate::models::otp::OtpRecord;
use crate::service::email_service::EmailService;

pub const OTP_TTL_MINUTES: i64 = 10;

const OTP_EMAIL_TEMPLATE: &str = "./templates/otp_email.html";

pub struct OtpService {
    pool: PgPool,
    crypto: CryptoService,
    email_service: EmailService,
    platform_name: String,
}

impl OtpService {
    pub fn new(
        pool: PgPool,
        crypto: CryptoService,
        email_service: EmailService,
        platform_name: String,
    ) -> Self {
        Self {
            pool,
            crypto,
            email_service,
            platform_name,
        }
    }

    /// Stores the code, then attempts delivery. The insert is the source
    /// of truth: a failed email is logged and swallowed, the caller still
    /// answers "check your inbox" and support can recover the stored code.
    /// Resends append a new row; history is kept.
    pub async fn send_otp(&self, phone: &str, email: &str) -> Result<String, ApiError> {
        let code = self.crypto.generate_otp_code();
        let expires_at = Utc::now() + Duration::minutes(OTP_TTL_MINUTES);

        sqlx::query(
            "INSERT INTO otp_verification (phone, email, otp_code, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(phone)
        .bind(email)
        .bind(&code)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        let template_data = json!({
            "otp": code,
            "phone": phone,
            "platformName": self.platform_name,
        });

        match self
            .email_service
            .send_email(
                email,
                &format!("{} Registration - OTP Verification", self.platform_name),
                OTP_EMAIL_TEMPLATE,
                &template_data,
            )
            .await
        {
            Ok(()) => info!(%phone, "OTP email sent"),
            Err(err) => {
                warn!(%phone, error = %err, "OTP email delivery failed; stored code remains valid")
            }
        }

        Ok(code)
    }

    /// Newest row matching phone, code, unconsumed, unexpired. Ordering by
    /// creation time means a resend race always resolves to the latest
    /// code. Mismatch and expiry are indistinguishable to the caller.
    pub async fn verify_otp(&self, phone: &str, code: &str) -> Result<(), ApiError> {
        let record: Option<OtpRecord> = sqlx::query_as(
            "SELECT * FROM otp_verification \
             WHERE phone = $1 AND otp_code = $2 AND consumed = FALSE AND expires_at > NOW() \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(phone)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        let record = record.ok_or(ApiError::OtpInvalid)?;

        sqlx::query("UPDATE otp_verification SET consumed = TRUE WHERE id = $1")
            .bind(record.id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Hourly sweep of rows a day past expiry. Matching semantics are
/// untouched — an expired row can never match — this only reclaims space
/// from the append-only log.
pub fn spawn_expiry_sweep(pool: PgPool) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60 * 60));
        loop {
            interval.tick().await;
            match sqlx::query(
                "DELETE FROM otp_verification WHERE expires_at < NOW() - INTERVAL '24 hours'",
            )
            .execute(&pool)
            .await
            {
                Ok(done) if done.rows_affected() > 0 => {
                    info!(rows = done.rows_affected(), "Swept expired OTP rows");
                }
                Ok(_) => {}
                Err(err) => error!(error = %err, "Expired OTP sweep failed"),
            }
        }
    });
}
