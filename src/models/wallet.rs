use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

/// One wallet per user, created in the same transaction as its owner.
/// All balances start at zero; the CHECK constraints keep them
/// non-negative.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Wallet {
    pub id: i64,
    pub user_id: i64,

    pub total_balance: Decimal,
    pub available_for_withdrawal: Decimal,
    pub locked_in_orders: Decimal,

    pub total_earnings: Decimal,
    pub total_deposited: Decimal,
    pub total_withdrawn: Decimal,

    pub total_bonus_received: Decimal,
    pub referral_bonus: Decimal,

    pub total_orders: i32,
    pub completed_orders: i32,

    pub last_transaction_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
