use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionKind {
    Registration,
    Login,
}

impl SessionKind {
    // Fresh registrations get the shorter session on purpose.
    fn lifetime(self) -> Duration {
        match self {
            SessionKind::Registration => Duration::days(7),
            SessionKind::Login => Duration::days(30),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub sub: i64,
    pub user_id: String,
    pub phone: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

/// Mints HS256 session tokens. Verification belongs to downstream
/// services; `verify` exists for them and for tests.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn issue(
        &self,
        id: i64,
        user_id: &str,
        phone: &str,
        email: &str,
        kind: SessionKind,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: id,
            user_id: user_id.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
            iat: now.timestamp(),
            exp: (now + kind.lifetime()).timestamp(),
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, ApiError> {
        let data = decode::<SessionClaims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret")
    }

    #[test]
    fn claims_round_trip() {
        let tokens = service();
        let token = tokens
            .issue(42, "BP123456781234", "+919876543210", "a@b.com", SessionKind::Login)
            .unwrap();
        let claims = tokens.verify(&token).unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.user_id, "BP123456781234");
        assert_eq!(claims.phone, "+919876543210");
        assert_eq!(claims.email, "a@b.com");
    }

    #[test]
    fn registration_and_login_lifetimes_differ() {
        let tokens = service();
        let registration = tokens
            .issue(1, "BP1", "+911111111111", "a@b.com", SessionKind::Registration)
            .unwrap();
        let login = tokens
            .issue(1, "BP1", "+911111111111", "a@b.com", SessionKind::Login)
            .unwrap();

        let registration = tokens.verify(&registration).unwrap();
        let login = tokens.verify(&login).unwrap();
        assert_eq!(registration.exp - registration.iat, 7 * 24 * 60 * 60);
        assert_eq!(login.exp - login.iat, 30 * 24 * 60 * 60);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = service()
            .issue(1, "BP1", "+911111111111", "a@b.com", SessionKind::Login)
            .unwrap();
        assert!(TokenService::new("other-secret").verify(&token).is_err());
    }
}
