//! JWT issuance and verification (HS256).
//!
//! Grounded on `user_auth/service.rs`'s `Claims`/`encode`/`decode` use of
//! `jsonwebtoken`, extended with the `tenant_id`, `is_superuser` and
//! `is_active` claims spec.md §6 fixes.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::tenant::TenantId;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject: the staff/account id as a string.
    pub sub: String,
    pub tenant_id: String,
    pub is_superuser: bool,
    pub is_active: bool,
    /// Expiration time, UTC timestamp seconds.
    pub exp: usize,
    /// Issued-at, UTC timestamp seconds.
    pub iat: usize,
}

impl Claims {
    pub fn tenant_id(&self) -> Result<TenantId, CoreError> {
        TenantId::parse(&self.tenant_id)
            .map_err(|e| CoreError::Authentication(format!("invalid tenant claim: {e}")))
    }
}

#[derive(Clone)]
pub struct JwtIssuer {
    secret: String,
    expiry: Duration,
}

impl JwtIssuer {
    pub fn new(secret: impl Into<String>, expiry_hours: i64) -> Self {
        Self {
            secret: secret.into(),
            expiry: Duration::hours(expiry_hours),
        }
    }

    pub fn issue(
        &self,
        subject: &str,
        tenant_id: &TenantId,
        is_superuser: bool,
        is_active: bool,
    ) -> Result<String, CoreError> {
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            tenant_id: tenant_id.to_string(),
            is_superuser,
            is_active,
            iat: now.timestamp() as usize,
            exp: (now + self.expiry).timestamp() as usize,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CoreError::Internal(format!("failed to issue token: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, CoreError> {
        let decoding_key = DecodingKey::from_secret(self.secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| CoreError::Authentication(format!("invalid or expired token: {e}")))?;
        if !data.claims.is_active {
            return Err(CoreError::Authentication("account is not active".to_string()));
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant() -> TenantId {
        TenantId::parse("A1234").unwrap()
    }

    #[test]
    fn round_trips_claims() {
        let issuer = JwtIssuer::new("test-secret", 24);
        let token = issuer.issue("staff-1", &tenant(), false, true).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, "staff-1");
        assert_eq!(claims.tenant_id, "A1234");
        assert!(claims.is_active);
    }

    #[test]
    fn rejects_tampered_signature() {
        let issuer = JwtIssuer::new("test-secret", 24);
        let token = issuer.issue("staff-1", &tenant(), false, true).unwrap();
        let other = JwtIssuer::new("different-secret", 24);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn rejects_inactive_account() {
        let issuer = JwtIssuer::new("test-secret", 24);
        let token = issuer.issue("staff-1", &tenant(), false, false).unwrap();
        assert!(issuer.verify(&token).is_err());
    }
}
