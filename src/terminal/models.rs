//! Terminal entity (spec.md §3).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core_ids::TerminalId;
use crate::tenant::{Etag, TenantId};

use super::state::{FunctionMode, TerminalStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terminal {
    pub terminal_id: TerminalId,
    pub tenant_id: TenantId,
    pub store_code: String,
    pub terminal_no: i32,
    pub description: String,
    pub status: TerminalStatus,
    pub function_mode: FunctionMode,
    pub open_counter: i32,
    pub business_counter: i32,
    pub business_date: Option<NaiveDate>,
    pub initial_amount: Option<Decimal>,
    pub physical_amount: Option<Decimal>,
    /// Currently signed-in staff, if any. `signIn`/`signOut` toggle this.
    pub staff_id: Option<String>,
    /// Argon2 hash of the terminal's provisioned API key. Never serialized
    /// back to clients.
    #[serde(skip_serializing)]
    pub api_key_hash: String,
    pub etag: Etag,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Terminal {
    pub fn new(terminal_id: TerminalId, tenant_id: TenantId, store_code: String, terminal_no: i32, api_key_hash: String) -> Self {
        let now = Utc::now();
        Self {
            terminal_id,
            tenant_id,
            store_code,
            terminal_no,
            description: String::new(),
            status: TerminalStatus::Idle,
            function_mode: FunctionMode::MainMenu,
            open_counter: 0,
            business_counter: 0,
            business_date: None,
            initial_amount: None,
            physical_amount: None,
            staff_id: None,
            api_key_hash,
            etag: Etag::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// The subset of a terminal's row needed to authenticate an `X-API-Key`
/// request (identity::middleware::terminal_api_key_middleware). Kept
/// separate from [`Terminal`] so auth lookups never fetch more than they
/// need.
#[derive(Debug, Clone)]
pub struct TerminalAuthRecord {
    pub api_key_hash: String,
    pub signed_in_staff: Option<String>,
}

/// A cash-drawer movement (spec.md §4.1 cashlog payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashLogEntry {
    pub terminal_id: TerminalId,
    pub amount: Decimal,
    pub direction: super::state::CashDirection,
    pub reason: String,
    pub note: Option<String>,
    pub receipt_text: String,
    pub journal_text: String,
    pub operator_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Terminal open/close audit event (spec.md §4.1 OpenCloseLog).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenCloseKind {
    Open,
    Close,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenCloseLogEntry {
    pub terminal_id: TerminalId,
    pub kind: OpenCloseKind,
    pub business_date: NaiveDate,
    pub business_counter: i32,
    pub initial_amount: Option<Decimal>,
    pub physical_amount: Option<Decimal>,
    pub difference_amount: Option<Decimal>,
    pub operator_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}
