use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, instrument, warn};

use crate::config::crypto::CryptoService;
use crate::errors::ApiError;
use crate::models::otp::OtpRecord;
use crate::models::user::{LoginUser, PublicUser, User};
use crate::models::wallet::Wallet;
use crate::service::token_service::{SessionKind, TokenService};
use crate::utils::ids;

/// Bound on the rejection-sampling loops for generated identifiers.
/// Termination is guaranteed here; uniqueness under concurrency is
/// guaranteed by the database constraints, not by these loops.
const MAX_IDENTIFIER_ATTEMPTS: u32 = 16;

const MAX_LOGIN_ATTEMPTS: i32 = 5;

fn referral_bonus() -> Decimal {
    Decimal::new(50_00, 2) // 50.00
}

pub struct NewRegistration {
    pub phone: String,
    pub email: String,
    pub password: String,
    pub otp: String,
    pub referral_code: Option<String>,
}

pub struct UserService {
    pool: PgPool,
    crypto: CryptoService,
    tokens: TokenService,
}

impl UserService {
    pub fn new(pool: PgPool, crypto: CryptoService, tokens: TokenService) -> Self {
        Self { pool, crypto, tokens }
    }

    /// The whole registration is one transaction: OTP re-check, uniqueness
    /// checks, user + wallet insert, OTP consumption, referral bonus. Any
    /// failure rolls all of it back — including the consumed flag, so a
    /// legitimate retry is not locked out by a half-spent code.
    #[instrument(skip(self, registration), fields(phone = %registration.phone))]
    pub async fn register(
        &self,
        registration: NewRegistration,
    ) -> Result<(String, PublicUser), ApiError> {
        let mut tx = self.pool.begin().await?;

        // Newest unexpired row for (phone, code), with or without the
        // consumed flag: a code the optimistic /api/verify-otp pre-check
        // already consumed still registers, a stale one does not.
        let otp: Option<OtpRecord> = sqlx::query_as(
            "SELECT * FROM otp_verification \
             WHERE phone = $1 AND otp_code = $2 AND expires_at > NOW() \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(&registration.phone)
        .bind(&registration.otp)
        .fetch_optional(&mut *tx)
        .await?;
        let otp = otp.ok_or(ApiError::OtpInvalid)?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM users WHERE phone_number = $1 OR email = $2")
                .bind(&registration.phone)
                .bind(&registration.email)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(ApiError::UserExists);
        }

        let password_hash = self.crypto.hash_password(&registration.password)?;

        let user_id = unique_identifier(&mut tx, "user_id", ids::generate_user_id).await?;
        let username = unique_identifier(&mut tx, "username", ids::generate_username).await?;
        let referral_code =
            unique_identifier(&mut tx, "referral_code", ids::generate_referral_code).await?;

        // An unresolvable referral code is ignored, never an error.
        let referred_by_id: Option<i64> = match registration
            .referral_code
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
        {
            Some(code) => {
                sqlx::query_scalar("SELECT id FROM users WHERE referral_code = $1")
                    .bind(code)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => None,
        };

        let full_name = registration
            .email
            .split('@')
            .next()
            .unwrap_or_default()
            .to_string();

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users ( \
                user_id, username, full_name, email, phone_number, password_hash, \
                referral_code, referred_by_id, is_email_verified, is_phone_verified, is_active \
             ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, TRUE, TRUE) \
             RETURNING id",
        )
        .bind(&user_id)
        .bind(&username)
        .bind(&full_name)
        .bind(&registration.email)
        .bind(&registration.phone)
        .bind(&password_hash)
        .bind(&referral_code)
        .bind(referred_by_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_unique_violation)?;

        sqlx::query("INSERT INTO wallets (user_id) VALUES ($1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        // Idempotent when the matched row was already consumed.
        sqlx::query("UPDATE otp_verification SET consumed = TRUE WHERE id = $1")
            .bind(otp.id)
            .execute(&mut *tx)
            .await?;

        if let Some(referrer_id) = referred_by_id {
            let bonus = referral_bonus();
            sqlx::query("UPDATE users SET total_referrals = total_referrals + 1 WHERE id = $1")
                .bind(referrer_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query(
                "UPDATE wallets SET \
                    total_balance = total_balance + $1, \
                    available_for_withdrawal = available_for_withdrawal + $1, \
                    referral_bonus = referral_bonus + $1, \
                    total_bonus_received = total_bonus_received + $1 \
                 WHERE user_id = $2",
            )
            .bind(bonus)
            .bind(referrer_id)
            .execute(&mut *tx)
            .await?;
            info!(referrer_id, %bonus, "Applied referral bonus");
        }

        tx.commit().await?;

        let token = self.tokens.issue(
            id,
            &user_id,
            &registration.phone,
            &registration.email,
            SessionKind::Registration,
        )?;
        info!(id, %user_id, %username, "Registered new user");

        Ok((
            token,
            PublicUser {
                id,
                user_id,
                username,
                phone: registration.phone,
                email: registration.email,
                referral_code,
            },
        ))
    }

    pub async fn login(
        &self,
        phone: Option<&str>,
        email: Option<&str>,
        password: &str,
    ) -> Result<(String, LoginUser), ApiError> {
        let user: Option<User> = if let Some(phone) = phone {
            sqlx::query_as("SELECT * FROM users WHERE phone_number = $1 AND is_active = TRUE")
                .bind(phone)
                .fetch_optional(&self.pool)
                .await?
        } else if let Some(email) = email {
            sqlx::query_as("SELECT * FROM users WHERE email = $1 AND is_active = TRUE")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?
        } else {
            None
        };
        let user = user.ok_or(ApiError::UserNotFound)?;

        if let Some(lock_until) = user.lock_until {
            if lock_until > Utc::now() {
                return Err(ApiError::AccountLocked);
            }
        }

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(ApiError::UserNotFound);
        };
        if !self.crypto.verify_password(password, hash)? {
            let attempts = user.login_attempts + 1;
            if attempts >= MAX_LOGIN_ATTEMPTS {
                sqlx::query(
                    "UPDATE users SET login_attempts = $1, \
                     lock_until = NOW() + INTERVAL '15 minutes' WHERE id = $2",
                )
                .bind(attempts)
                .bind(user.id)
                .execute(&self.pool)
                .await?;
                warn!(id = user.id, "Account locked after repeated failed logins");
            } else {
                sqlx::query("UPDATE users SET login_attempts = $1 WHERE id = $2")
                    .bind(attempts)
                    .bind(user.id)
                    .execute(&self.pool)
                    .await?;
            }
            return Err(ApiError::InvalidPassword);
        }

        sqlx::query(
            "UPDATE users SET login_attempts = 0, lock_until = NULL, last_login_at = NOW() \
             WHERE id = $1",
        )
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        let wallet: Option<Wallet> = sqlx::query_as("SELECT * FROM wallets WHERE user_id = $1")
            .bind(user.id)
            .fetch_optional(&self.pool)
            .await?;

        let token = self.tokens.issue(
            user.id,
            &user.user_id,
            &user.phone_number,
            &user.email,
            SessionKind::Login,
        )?;

        Ok((token, LoginUser::from_parts(user, wallet)))
    }
}

/// Point-in-time check only: two concurrent registrations can both pass it
/// with the same candidate; the losing insert is rejected by the unique
/// constraint and surfaces through `map_unique_violation`.
async fn unique_identifier<F>(
    tx: &mut Transaction<'_, Postgres>,
    column: &str,
    generate: F,
) -> Result<String, ApiError>
where
    F: Fn() -> String,
{
    for _ in 0..MAX_IDENTIFIER_ATTEMPTS {
        let candidate = generate();
        let taken: Option<i64> =
            sqlx::query_scalar(&format!("SELECT id FROM users WHERE {column} = $1"))
                .bind(&candidate)
                .fetch_optional(&mut **tx)
                .await?;
        if taken.is_none() {
            return Ok(candidate);
        }
    }
    Err(ApiError::IdentifierSpaceExhausted(MAX_IDENTIFIER_ATTEMPTS))
}

/// A duplicate phone/email lost a race with a concurrent registration and
/// reads the same as the pre-check conflict. A duplicate generated
/// identifier is not the caller's doing; it stays a generic persistence
/// failure (the OTP is already spent, regenerating would not help).
fn map_unique_violation(err: sqlx::Error) -> ApiError {
    if let sqlx::Error::Database(db_err) = &err {
        if matches!(
            db_err.constraint(),
            Some("users_phone_number_key") | Some("users_email_key")
        ) {
            return ApiError::UserExists;
        }
    }
    ApiError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn referral_bonus_is_fifty() {
        assert_eq!(referral_bonus().to_string(), "50.00");
    }

    #[test]
    fn non_constraint_errors_stay_generic() {
        let mapped = map_unique_violation(sqlx::Error::RowNotFound);
        assert!(matches!(mapped, ApiError::Database(_)));
    }
}
