use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// One row per issued code, keyed by (phone, email) — the user row does
/// not exist yet. Rows are never updated except to flip `consumed`;
/// resends append, and lookups take the newest match.
#[derive(Debug, Clone, FromRow)]
pub struct OtpRecord {
    pub id: i64,
    pub phone: String,
    pub email: String,
    pub otp_code: String,
    pub consumed: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl OtpRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        !self.consumed && self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(consumed: bool, expires_in: Duration) -> OtpRecord {
        let now = Utc::now();
        OtpRecord {
            id: 1,
            phone: "+919876543210".into(),
            email: "a@b.com".into(),
            otp_code: "123456".into(),
            consumed,
            expires_at: now + expires_in,
            created_at: now,
        }
    }

    #[test]
    fn fresh_record_is_usable() {
        assert!(record(false, Duration::minutes(10)).is_usable(Utc::now()));
    }

    #[test]
    fn consumed_or_expired_record_is_not() {
        assert!(!record(true, Duration::minutes(10)).is_usable(Utc::now()));
        assert!(!record(false, Duration::minutes(-1)).is_usable(Utc::now()));
    }
}
