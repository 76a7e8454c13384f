//! Terminal persistence (spec.md §3 Terminal row), grounded on
//! `account/db.rs`'s `Database` wrapper / query-struct pattern.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::core_ids::TerminalId;
use crate::error::CoreError;
use crate::tenant::{Etag, TenantId};

use super::models::{Terminal, TerminalAuthRecord};
use super::state::{FunctionMode, TerminalStatus};

pub struct TerminalRepository;

impl TerminalRepository {
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS terminals (
                terminal_id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL,
                store_code TEXT NOT NULL,
                terminal_no INT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                function_mode TEXT NOT NULL,
                open_counter INT NOT NULL DEFAULT 0,
                business_counter INT NOT NULL DEFAULT 0,
                business_date DATE,
                initial_amount NUMERIC(18,2),
                physical_amount NUMERIC(18,2),
                staff_id TEXT,
                api_key_hash TEXT NOT NULL,
                etag TEXT NOT NULL,
                last_transaction_no BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                UNIQUE (tenant_id, store_code, terminal_no)
            )
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn create(pool: &PgPool, terminal: &Terminal) -> Result<(), CoreError> {
        sqlx::query(
            r#"
            INSERT INTO terminals (
                terminal_id, tenant_id, store_code, terminal_no, description, status,
                function_mode, open_counter, business_counter, business_date,
                initial_amount, physical_amount, staff_id, api_key_hash, etag,
                created_at, updated_at
            ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,$14,$15,$16,$17)
            "#,
        )
        .bind(terminal.terminal_id.as_str())
        .bind(terminal.tenant_id.as_str())
        .bind(&terminal.store_code)
        .bind(terminal.terminal_no)
        .bind(&terminal.description)
        .bind(terminal.status)
        .bind(terminal.function_mode)
        .bind(terminal.open_counter)
        .bind(terminal.business_counter)
        .bind(terminal.business_date)
        .bind(terminal.initial_amount)
        .bind(terminal.physical_amount)
        .bind(&terminal.staff_id)
        .bind(&terminal.api_key_hash)
        .bind(terminal.etag.as_str())
        .bind(terminal.created_at)
        .bind(terminal.updated_at)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_id(pool: &PgPool, terminal_id: &TerminalId) -> Result<Option<Terminal>, CoreError> {
        let row = sqlx::query(
            r#"
            SELECT terminal_id, tenant_id, store_code, terminal_no, description, status,
                   function_mode, open_counter, business_counter, business_date,
                   initial_amount, physical_amount, staff_id, api_key_hash, etag,
                   created_at, updated_at
            FROM terminals WHERE terminal_id = $1
            "#,
        )
        .bind(terminal_id.as_str())
        .fetch_optional(pool)
        .await?;

        row.map(Self::from_row).transpose()
    }

    pub async fn find_auth_record(pool: &PgPool, terminal_id: &TerminalId) -> Result<Option<TerminalAuthRecord>, CoreError> {
        let row = sqlx::query("SELECT api_key_hash, staff_id FROM terminals WHERE terminal_id = $1")
            .bind(terminal_id.as_str())
            .fetch_optional(pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        Ok(Some(TerminalAuthRecord {
            api_key_hash: row.try_get("api_key_hash")?,
            signed_in_staff: row.try_get("staff_id")?,
        }))
    }

    pub async fn list_by_store(pool: &PgPool, tenant_id: &TenantId, store_code: &str) -> Result<Vec<Terminal>, CoreError> {
        let rows = sqlx::query(
            r#"
            SELECT terminal_id, tenant_id, store_code, terminal_no, description, status,
                   function_mode, open_counter, business_counter, business_date,
                   initial_amount, physical_amount, staff_id, api_key_hash, etag,
                   created_at, updated_at
            FROM terminals WHERE tenant_id = $1 AND store_code = $2
            ORDER BY terminal_no
            "#,
        )
        .bind(tenant_id.as_str())
        .bind(store_code)
        .fetch_all(pool)
        .await?;
        rows.into_iter().map(Self::from_row).collect()
    }

    pub async fn delete(pool: &PgPool, terminal_id: &TerminalId) -> Result<(), CoreError> {
        let result = sqlx::query("DELETE FROM terminals WHERE terminal_id = $1 AND status IN ('Idle', 'Closed')")
            .bind(terminal_id.as_str())
            .execute(pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::InvalidState(
                "terminal must be Idle or Closed to delete, or does not exist".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn update_description(pool: &PgPool, terminal_id: &TerminalId, description: &str, old_etag: &Etag) -> Result<Etag, CoreError> {
        let new_etag = Etag::new();
        let result = sqlx::query(
            "UPDATE terminals SET etag = $1, updated_at = now(), description = $2 WHERE terminal_id = $3 AND etag = $4",
        )
        .bind(new_etag.as_str())
        .bind(description)
        .bind(terminal_id.as_str())
        .bind(old_etag.as_str())
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("terminal etag mismatch".to_string()));
        }
        Ok(new_etag)
    }

    pub async fn update_function_mode(pool: &PgPool, terminal_id: &TerminalId, mode: FunctionMode, old_etag: &Etag) -> Result<Etag, CoreError> {
        let new_etag = Etag::new();
        let result = sqlx::query(
            "UPDATE terminals SET etag = $1, updated_at = now(), function_mode = $2 WHERE terminal_id = $3 AND etag = $4",
        )
        .bind(new_etag.as_str())
        .bind(mode)
        .bind(terminal_id.as_str())
        .bind(old_etag.as_str())
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("terminal etag mismatch".to_string()));
        }
        Ok(new_etag)
    }

    pub async fn sign_in(pool: &PgPool, terminal_id: &TerminalId, staff_id: &str, old_etag: &Etag) -> Result<Etag, CoreError> {
        let new_etag = Etag::new();
        let result = sqlx::query(
            "UPDATE terminals SET etag = $1, updated_at = now(), staff_id = $2 WHERE terminal_id = $3 AND etag = $4 AND staff_id IS NULL",
        )
        .bind(new_etag.as_str())
        .bind(staff_id)
        .bind(terminal_id.as_str())
        .bind(old_etag.as_str())
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("terminal etag mismatch or already signed in".to_string()));
        }
        Ok(new_etag)
    }

    pub async fn sign_out(pool: &PgPool, terminal_id: &TerminalId, old_etag: &Etag) -> Result<Etag, CoreError> {
        let new_etag = Etag::new();
        let result = sqlx::query(
            "UPDATE terminals SET etag = $1, updated_at = now(), staff_id = NULL WHERE terminal_id = $2 AND etag = $3",
        )
        .bind(new_etag.as_str())
        .bind(terminal_id.as_str())
        .bind(old_etag.as_str())
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("terminal etag mismatch".to_string()));
        }
        Ok(new_etag)
    }

    /// Transition `Idle -> Opened`. Caller (the engine) has already
    /// validated staff sign-in and state; this commits alongside the
    /// outbox row in the same transaction.
    pub async fn open_tx(
        tx: &mut Transaction<'_, Postgres>,
        terminal_id: &TerminalId,
        business_date: NaiveDate,
        initial_amount: Decimal,
        old_etag: &Etag,
    ) -> Result<Etag, CoreError> {
        let new_etag = Etag::new();
        let result = sqlx::query(
            r#"
            UPDATE terminals SET
                etag = $1, updated_at = now(), status = 'Opened', function_mode = 'MainMenu',
                open_counter = open_counter + 1, business_date = $2, initial_amount = $3,
                physical_amount = NULL
            WHERE terminal_id = $4 AND etag = $5 AND status = 'Idle'
            "#,
        )
        .bind(new_etag.as_str())
        .bind(business_date)
        .bind(initial_amount)
        .bind(terminal_id.as_str())
        .bind(old_etag.as_str())
        .execute(&mut **tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("terminal etag mismatch or not Idle".to_string()));
        }
        Ok(new_etag)
    }

    /// Transition `Opened -> Closed`.
    pub async fn close_tx(
        tx: &mut Transaction<'_, Postgres>,
        terminal_id: &TerminalId,
        physical_amount: Option<Decimal>,
        old_etag: &Etag,
    ) -> Result<Etag, CoreError> {
        let new_etag = Etag::new();
        let result = sqlx::query(
            r#"
            UPDATE terminals SET
                etag = $1, updated_at = now(), status = 'Closed', physical_amount = $2,
                business_counter = business_counter + 1
            WHERE terminal_id = $3 AND etag = $4 AND status = 'Opened'
            "#,
        )
        .bind(new_etag.as_str())
        .bind(physical_amount)
        .bind(terminal_id.as_str())
        .bind(old_etag.as_str())
        .execute(&mut **tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("terminal etag mismatch or not Opened".to_string()));
        }
        Ok(new_etag)
    }

    /// The `Closed -> Opened` transition that also resets for the next
    /// business day — the only way out of `Closed` (resolved Open Question,
    /// see DESIGN.md).
    pub async fn reopen_tx(
        tx: &mut Transaction<'_, Postgres>,
        terminal_id: &TerminalId,
        business_date: NaiveDate,
        initial_amount: Decimal,
        old_etag: &Etag,
    ) -> Result<Etag, CoreError> {
        let new_etag = Etag::new();
        let result = sqlx::query(
            r#"
            UPDATE terminals SET
                etag = $1, updated_at = now(), status = 'Opened', function_mode = 'MainMenu',
                open_counter = open_counter + 1, business_date = $2, initial_amount = $3,
                physical_amount = NULL
            WHERE terminal_id = $4 AND etag = $5 AND status = 'Closed'
            "#,
        )
        .bind(new_etag.as_str())
        .bind(business_date)
        .bind(initial_amount)
        .bind(terminal_id.as_str())
        .bind(old_etag.as_str())
        .execute(&mut **tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("terminal etag mismatch or not Closed".to_string()));
        }
        Ok(new_etag)
    }

    pub async fn cash_move_tx(
        tx: &mut Transaction<'_, Postgres>,
        terminal_id: &TerminalId,
        old_etag: &Etag,
    ) -> Result<Etag, CoreError> {
        // Cash in/out does not change Terminal row state besides the etag
        // bump (the movement itself lives only in the cashlog event); this
        // still goes through CAS so a concurrent open/close cannot race with
        // it silently.
        let new_etag = Etag::new();
        let result = sqlx::query(
            "UPDATE terminals SET etag = $1, updated_at = now() WHERE terminal_id = $2 AND etag = $3 AND status = 'Opened'",
        )
        .bind(new_etag.as_str())
        .bind(terminal_id.as_str())
        .bind(old_etag.as_str())
        .execute(&mut **tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(CoreError::Conflict("terminal etag mismatch or not Opened".to_string()));
        }
        Ok(new_etag)
    }

    /// Claims the next `transactionNo` for a Tranlog (spec.md §3: "monotonic
    /// per terminal, gapless") and returns the business context it's stamped
    /// with. Must run in the same transaction as the cart completion write
    /// so a rolled-back completion never burns a number.
    pub async fn claim_transaction_no_tx(
        tx: &mut Transaction<'_, Postgres>,
        terminal_id: &TerminalId,
    ) -> Result<(i64, i32, Option<NaiveDate>, Option<String>), CoreError> {
        let row = sqlx::query(
            "UPDATE terminals SET last_transaction_no = last_transaction_no + 1 WHERE terminal_id = $1 \
             RETURNING last_transaction_no, business_counter, business_date, staff_id",
        )
        .bind(terminal_id.as_str())
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("terminal {terminal_id} not found")))?;
        Ok((
            row.try_get("last_transaction_no")?,
            row.try_get("business_counter")?,
            row.try_get("business_date")?,
            row.try_get("staff_id")?,
        ))
    }

    fn from_row(row: sqlx::postgres::PgRow) -> Result<Terminal, CoreError> {
        let terminal_id_raw: String = row.try_get("terminal_id")?;
        let tenant_id_raw: String = row.try_get("tenant_id")?;
        Ok(Terminal {
            terminal_id: TerminalId::parse(&terminal_id_raw).map_err(CoreError::Internal)?,
            tenant_id: TenantId::parse(&tenant_id_raw).map_err(CoreError::Internal)?,
            store_code: row.try_get("store_code")?,
            terminal_no: row.try_get("terminal_no")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            function_mode: row.try_get("function_mode")?,
            open_counter: row.try_get("open_counter")?,
            business_counter: row.try_get("business_counter")?,
            business_date: row.try_get("business_date")?,
            initial_amount: row.try_get("initial_amount")?,
            physical_amount: row.try_get("physical_amount")?,
            staff_id: row.try_get("staff_id")?,
            api_key_hash: row.try_get("api_key_hash")?,
            etag: row.try_get::<String, _>("etag")?.into(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}
