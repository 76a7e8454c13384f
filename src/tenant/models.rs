//! Tenant and Store entities (spec.md §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::etag::Etag;

/// `tenantId`: one letter followed by four digits, e.g. `A1234`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct TenantId(String);

impl TenantId {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let mut chars = raw.chars();
        let first = chars.next().ok_or("tenantId cannot be empty")?;
        if !first.is_ascii_alphabetic() {
            return Err("tenantId must start with a letter".to_string());
        }
        let rest: String = chars.collect();
        if rest.len() != 4 || !rest.chars().all(|c| c.is_ascii_digit()) {
            return Err("tenantId must be one letter followed by four digits".to_string());
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub tenant_id: TenantId,
    pub name: String,
    pub tags: Vec<String>,
    pub etag: Etag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "PascalCase")]
pub enum StoreStatus {
    Active,
    Closed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub tenant_id: TenantId,
    pub store_code: String,
    pub name: String,
    pub status: StoreStatus,
    pub business_date: chrono::NaiveDate,
    pub tags: Vec<String>,
    pub etag: Etag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tenant_id_accepts_letter_plus_four_digits() {
        assert!(TenantId::parse("A1234").is_ok());
    }

    #[test]
    fn tenant_id_rejects_wrong_shape() {
        assert!(TenantId::parse("AB123").is_err());
        assert!(TenantId::parse("12345").is_err());
        assert!(TenantId::parse("A123").is_err());
        assert!(TenantId::parse("A12345").is_err());
    }
}
