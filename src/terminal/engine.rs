//! Terminal Engine (C4): the lifecycle and cash-drawer state machine,
//! exactly per spec.md §4.1.
//!
//! Grounded on `internal_transfer/coordinator.rs`'s orchestration shape
//! (validate, then delegate the actual state change to the persistence
//! layer) and `funding/handlers.rs`'s `thiserror`-driven error propagation.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use std::sync::Arc;

use crate::bus::{Event, EventBus, topics};
use crate::core_ids::TerminalId;
use crate::error::{CoreError, CoreResult};
use crate::tenant::{Etag, TenantId, TenantStore};

use super::formatter::{format_journal, format_receipt};
use super::models::{CashLogEntry, OpenCloseKind, OpenCloseLogEntry, Terminal};
use super::repository::TerminalRepository;
use super::state::{CashDirection, FunctionMode, TerminalStatus};

pub struct TerminalEngine {
    tenants: TenantStore,
    bus: Arc<EventBus>,
}

impl TerminalEngine {
    pub fn new(tenants: TenantStore, bus: Arc<EventBus>) -> Self {
        Self { tenants, bus }
    }

    pub async fn create(
        &self,
        tenant_id: &TenantId,
        store_code: &str,
        terminal_no: i32,
        api_key_hash: String,
    ) -> CoreResult<Terminal> {
        let pool = self.tenants.pool(tenant_id).await?;
        let terminal_id = TerminalId::new(tenant_id, store_code, terminal_no as u32);
        let terminal = Terminal::new(terminal_id, tenant_id.clone(), store_code.to_string(), terminal_no, api_key_hash);
        TerminalRepository::create(&pool, &terminal).await?;
        Ok(terminal)
    }

    pub async fn get(&self, tenant_id: &TenantId, terminal_id: &TerminalId) -> CoreResult<Terminal> {
        let pool = self.tenants.pool(tenant_id).await?;
        TerminalRepository::find_by_id(&pool, terminal_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("terminal {terminal_id} not found")))
    }

    pub async fn list(&self, tenant_id: &TenantId, store_code: &str) -> CoreResult<Vec<Terminal>> {
        let pool = self.tenants.pool(tenant_id).await?;
        TerminalRepository::list_by_store(&pool, tenant_id, store_code).await
    }

    pub async fn delete(&self, tenant_id: &TenantId, terminal_id: &TerminalId) -> CoreResult<()> {
        let pool = self.tenants.pool(tenant_id).await?;
        let terminal = self.get(tenant_id, terminal_id).await?;
        if !terminal.status.can_delete() {
            return Err(CoreError::InvalidState("terminal must be Idle to delete".to_string()));
        }
        if crate::cart::repository::CartRepository::exists_active_for_terminal(&pool, terminal_id).await? {
            return Err(CoreError::InvalidState("terminal has an active cart".to_string()));
        }
        TerminalRepository::delete(&pool, terminal_id).await
    }

    pub async fn sign_in(&self, tenant_id: &TenantId, terminal_id: &TerminalId, staff_id: &str, etag: &Etag) -> CoreResult<Etag> {
        let pool = self.tenants.pool(tenant_id).await?;
        TerminalRepository::sign_in(&pool, terminal_id, staff_id, etag).await
    }

    pub async fn sign_out(&self, tenant_id: &TenantId, terminal_id: &TerminalId, etag: &Etag) -> CoreResult<Etag> {
        let pool = self.tenants.pool(tenant_id).await?;
        TerminalRepository::sign_out(&pool, terminal_id, etag).await
    }

    pub async fn update_function_mode(&self, tenant_id: &TenantId, terminal_id: &TerminalId, mode_raw: &str, etag: &Etag) -> CoreResult<Etag> {
        let mode = FunctionMode::parse(mode_raw).ok_or_else(|| CoreError::Validation(format!("unknown function mode: {mode_raw}")))?;
        let pool = self.tenants.pool(tenant_id).await?;
        TerminalRepository::update_function_mode(&pool, terminal_id, mode, etag).await
    }

    pub async fn update_description(&self, tenant_id: &TenantId, terminal_id: &TerminalId, description: &str, etag: &Etag) -> CoreResult<Etag> {
        let pool = self.tenants.pool(tenant_id).await?;
        TerminalRepository::update_description(&pool, terminal_id, description, etag).await
    }

    /// `Idle -> Opened`, or the `Closed -> Opened` re-open that starts the
    /// next business day (the only exit from `Closed`; spec.md §9 resolved
    /// open question — see DESIGN.md).
    pub async fn open(
        &self,
        tenant_id: &TenantId,
        terminal_id: &TerminalId,
        business_date: NaiveDate,
        initial_amount: Decimal,
        staff_id: Option<&str>,
        etag: &Etag,
    ) -> CoreResult<Etag> {
        let pool = self.tenants.pool(tenant_id).await?;
        let terminal = self.get(tenant_id, terminal_id).await?;
        if terminal.staff_id.is_none() && staff_id.is_none() {
            return Err(CoreError::InvalidState("staff must be signed in to open a terminal".to_string()));
        }

        let mut tx = pool.begin().await?;
        let new_etag = match terminal.status {
            TerminalStatus::Idle => {
                TerminalRepository::open_tx(&mut tx, terminal_id, business_date, initial_amount, etag).await?
            }
            TerminalStatus::Closed => {
                TerminalRepository::reopen_tx(&mut tx, terminal_id, business_date, initial_amount, etag).await?
            }
            TerminalStatus::Opened => {
                return Err(CoreError::InvalidState("terminal is already Opened".to_string()));
            }
        };

        let log = OpenCloseLogEntry {
            terminal_id: terminal_id.clone(),
            kind: OpenCloseKind::Open,
            business_date,
            business_counter: terminal.business_counter,
            initial_amount: Some(initial_amount),
            physical_amount: None,
            difference_amount: None,
            operator_id: staff_id.or(terminal.staff_id.as_deref()).map(str::to_string),
            timestamp: Utc::now(),
        };
        self.enqueue_opencloselog(&mut tx, tenant_id, &log).await?;
        tx.commit().await?;
        Ok(new_etag)
    }

    /// `Opened -> Closed`. Computes the drawer reconciliation
    /// (`physicalAmount - initialAmount` when a physical count is given).
    pub async fn close(
        &self,
        tenant_id: &TenantId,
        terminal_id: &TerminalId,
        physical_amount: Option<Decimal>,
        etag: &Etag,
    ) -> CoreResult<Etag> {
        let pool = self.tenants.pool(tenant_id).await?;
        let terminal = self.get(tenant_id, terminal_id).await?;
        if terminal.status != TerminalStatus::Opened {
            return Err(CoreError::InvalidState("terminal must be Opened to close".to_string()));
        }
        let business_date = terminal
            .business_date
            .ok_or_else(|| CoreError::Internal("opened terminal missing business_date".to_string()))?;

        let mut tx = pool.begin().await?;
        let new_etag = TerminalRepository::close_tx(&mut tx, terminal_id, physical_amount, etag).await?;

        let difference = match (physical_amount, terminal.initial_amount) {
            (Some(physical), Some(initial)) => Some(physical - initial),
            _ => None,
        };
        let log = OpenCloseLogEntry {
            terminal_id: terminal_id.clone(),
            kind: OpenCloseKind::Close,
            business_date,
            business_counter: terminal.business_counter + 1,
            initial_amount: terminal.initial_amount,
            physical_amount,
            difference_amount: difference,
            operator_id: terminal.staff_id.clone(),
            timestamp: Utc::now(),
        };
        self.enqueue_opencloselog(&mut tx, tenant_id, &log).await?;
        tx.commit().await?;
        Ok(new_etag)
    }

    pub async fn cash_in(
        &self,
        tenant_id: &TenantId,
        terminal_id: &TerminalId,
        amount: Decimal,
        reason: &str,
        note: Option<&str>,
        operator_id: Option<&str>,
        etag: &Etag,
    ) -> CoreResult<Etag> {
        self.cash_move(tenant_id, terminal_id, CashDirection::In, amount, reason, note, operator_id, etag)
            .await
    }

    pub async fn cash_out(
        &self,
        tenant_id: &TenantId,
        terminal_id: &TerminalId,
        amount: Decimal,
        reason: &str,
        note: Option<&str>,
        operator_id: Option<&str>,
        etag: &Etag,
    ) -> CoreResult<Etag> {
        self.cash_move(tenant_id, terminal_id, CashDirection::Out, amount, reason, note, operator_id, etag)
            .await
    }

    #[allow(clippy::too_many_arguments)]
    async fn cash_move(
        &self,
        tenant_id: &TenantId,
        terminal_id: &TerminalId,
        direction: CashDirection,
        amount: Decimal,
        reason: &str,
        note: Option<&str>,
        operator_id: Option<&str>,
        etag: &Etag,
    ) -> CoreResult<Etag> {
        if amount <= Decimal::ZERO {
            return Err(CoreError::Validation("cash amount must be greater than 0".to_string()));
        }
        let pool = self.tenants.pool(tenant_id).await?;
        let terminal = self.get(tenant_id, terminal_id).await?;
        if terminal.status != TerminalStatus::Opened {
            return Err(CoreError::InvalidState("cash operations require the terminal to be Opened".to_string()));
        }

        let timestamp = Utc::now();
        let receipt_text = format_receipt(terminal_id, direction, amount, reason, timestamp);
        let journal_text = format_journal(terminal_id, direction, amount, operator_id, timestamp);

        let mut tx = pool.begin().await?;
        let new_etag = TerminalRepository::cash_move_tx(&mut tx, terminal_id, etag).await?;

        let entry = CashLogEntry {
            terminal_id: terminal_id.clone(),
            amount,
            direction,
            reason: reason.to_string(),
            note: note.map(str::to_string),
            receipt_text,
            journal_text,
            operator_id: operator_id.map(str::to_string),
            timestamp,
        };
        let event = Event::new(tenant_id.clone(), topics::CASHLOG, json!(entry));
        crate::bus::outbox::OutboxRepository::enqueue(&mut tx, &event).await?;
        tx.commit().await?;
        Ok(new_etag)
    }

    async fn enqueue_opencloselog(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        tenant_id: &TenantId,
        log: &OpenCloseLogEntry,
    ) -> CoreResult<()> {
        let event = Event::new(tenant_id.clone(), topics::OPENCLOSELOG, json!(log));
        crate::bus::outbox::OutboxRepository::enqueue(tx, &event).await
    }

    /// Exposed so the gateway wiring can start the dispatcher against this
    /// tenant's pool; the engine itself does not own a background task.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }
}
