use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::wallet::Wallet;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, sqlx::Type)]
#[sqlx(type_name = "kyc_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KycStatus {
    NotSubmitted,
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone_number: String,

    #[serde(skip_serializing)] //select false on user sql queries for the password hash
    pub password_hash: Option<String>,

    pub avatar_url: Option<String>,

    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub is_active: bool,

    pub kyc_status: KycStatus,

    pub referral_code: String,
    pub referred_by_id: Option<i64>,
    pub total_referrals: i32,

    pub last_login_at: Option<DateTime<Utc>>,
    pub login_attempts: i32,
    pub lock_until: Option<DateTime<Utc>>,

    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// The projection returned by `/api/register`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    pub phone: String,
    pub email: String,
    pub referral_code: String,
}

/// The richer projection returned by `/api/login`, including the wallet
/// headline figures.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginUser {
    pub id: i64,
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub referral_code: String,
    pub total_balance: Decimal,
    pub available_for_withdrawal: Decimal,
    pub is_email_verified: bool,
    pub is_phone_verified: bool,
    pub kyc_status: KycStatus,
}

impl LoginUser {
    /// A missing wallet row reads as zero balances rather than an error.
    pub fn from_parts(user: User, wallet: Option<Wallet>) -> Self {
        let (total_balance, available_for_withdrawal) = wallet
            .map(|w| (w.total_balance, w.available_for_withdrawal))
            .unwrap_or_default();
        Self {
            id: user.id,
            user_id: user.user_id,
            username: user.username,
            full_name: user.full_name,
            email: user.email,
            phone: user.phone_number,
            referral_code: user.referral_code,
            total_balance,
            available_for_withdrawal,
            is_email_verified: user.is_email_verified,
            is_phone_verified: user.is_phone_verified,
            kyc_status: user.kyc_status,
        }
    }
}
