//! Shared identifier newtypes used across tenant/terminal/cart/stock.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tenant::TenantId;

/// `{tenantId}-{storeCode}-{NNN}` (spec.md §3), globally unique.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct TerminalId(String);

impl TerminalId {
    pub fn new(tenant_id: &TenantId, store_code: &str, terminal_no: u32) -> Self {
        Self(format!("{tenant_id}-{store_code}-{terminal_no:03}"))
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        let parts: Vec<&str> = raw.split('-').collect();
        if parts.len() != 3 {
            return Err("terminalId must be {tenantId}-{storeCode}-{NNN}".to_string());
        }
        TenantId::parse(parts[0])?;
        if parts[2].len() != 3 || !parts[2].chars().all(|c| c.is_ascii_digit()) {
            return Err("terminal number must be zero-padded to 3 digits".to_string());
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tenant_id(&self) -> TenantId {
        // Valid by construction (parse/new both enforce the shape).
        let tenant_part = self.0.split('-').next().unwrap_or_default();
        TenantId::parse(tenant_part).expect("TerminalId always carries a valid tenant prefix")
    }

    pub fn store_code(&self) -> &str {
        self.0.split('-').nth(1).unwrap_or_default()
    }
}

impl fmt::Display for TerminalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_and_parses_round_trip() {
        let tenant = TenantId::parse("A1234").unwrap();
        let id = TerminalId::new(&tenant, "store001", 1);
        assert_eq!(id.as_str(), "A1234-store001-001");
        let parsed = TerminalId::parse(id.as_str()).unwrap();
        assert_eq!(parsed, id);
        assert_eq!(parsed.tenant_id(), tenant);
        assert_eq!(parsed.store_code(), "store001");
    }

    #[test]
    fn rejects_unpadded_terminal_number() {
        assert!(TerminalId::parse("A1234-store001-1").is_err());
    }
}
