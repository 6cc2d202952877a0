// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! SQLite-backed `FinanceRepository`, used by the CLI and as the local
//! stand-in for the hosted store.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params, params_from_iter};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::mapping::{
    FinancialProjectPatchRow, FinancialProjectRow, FinancialSummaryRow, ProfilePatchRow,
    ProfileRow, RecurringPaymentPatchRow, RecurringPaymentRow, SummaryPatchRow,
    TransactionPatchRow, TransactionRow, to_columns,
};
use crate::models::{
    FinancialProject, FinancialProjectDraft, FinancialProjectPatch, FinancialSummary, Profile,
    ProfilePatch, RecurringPayment, RecurringPaymentDraft, RecurringPaymentPatch, SummaryPatch,
    Transaction, TransactionDraft, TransactionPatch,
};
use crate::repository::{EntityKind, FinanceRepository};

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("com.alphavelocity", "Fynn", "fynn"));

pub fn db_path() -> anyhow::Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("fynn.sqlite"))
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
    CREATE TABLE IF NOT EXISTS profiles(
        id TEXT PRIMARY KEY,
        name TEXT,
        email TEXT,
        avatar TEXT
    );

    CREATE TABLE IF NOT EXISTS financial_summaries(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL UNIQUE,
        current_balance TEXT NOT NULL DEFAULT '0',
        health_status TEXT NOT NULL DEFAULT 'good'
            CHECK(health_status IN ('good','warning','danger')),
        monthly_income TEXT NOT NULL DEFAULT '0',
        monthly_expenses TEXT NOT NULL DEFAULT '0',
        recurring_payments TEXT NOT NULL DEFAULT '0',
        updated_at TEXT
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        amount TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category TEXT NOT NULL,
        is_recurring INTEGER NOT NULL DEFAULT 0,
        transaction_type TEXT
            CHECK(transaction_type IS NULL OR transaction_type IN ('obligatoire','loisir','epargne')),
        created_at TEXT,
        updated_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, date);

    CREATE TABLE IF NOT EXISTS recurring_payments(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        amount TEXT NOT NULL,
        date INTEGER NOT NULL CHECK(date BETWEEN 1 AND 31),
        category TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT,
        updated_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_recurring_user ON recurring_payments(user_id);

    CREATE TABLE IF NOT EXISTS financial_projects(
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        target_amount TEXT NOT NULL,
        current_amount TEXT NOT NULL DEFAULT '0',
        target_date TEXT NOT NULL,
        category TEXT NOT NULL,
        created_at TEXT,
        updated_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_projects_user ON financial_projects(user_id);
    "#,
    )
}

const PROFILE_COLUMNS: &str = "id, name, email, avatar";
const SUMMARY_COLUMNS: &str = "id, user_id, current_balance, health_status, monthly_income, monthly_expenses, recurring_payments";
const TRANSACTION_COLUMNS: &str = "id, user_id, amount, date, description, category, is_recurring, transaction_type, created_at, updated_at";
const RECURRING_COLUMNS: &str =
    "id, user_id, name, amount, date, category, is_active, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, user_id, name, target_amount, current_amount, target_date, category, created_at, updated_at";

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        match &e {
            rusqlite::Error::SqliteFailure(err, _) => match err.code {
                ErrorCode::ConstraintViolation => match err.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        StoreError::Conflict(e.to_string())
                    }
                    _ => StoreError::invalid("record", e.to_string()),
                },
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure => StoreError::StoreUnavailable(e.to_string()),
                _ => StoreError::Unknown(e.to_string()),
            },
            _ => StoreError::Unknown(e.to_string()),
        }
    }
}

pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let conn =
            Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
        init_schema(&conn).context("Failed to initialise schema")?;
        info!(path = %path.display(), "database opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Open in-memory DB")?;
        init_schema(&conn).context("Failed to initialise schema")?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        SqliteRepository {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StoreError::StoreUnavailable("database connection poisoned".into()))
    }

    /// Creates the profile row and an empty summary for a new user.
    pub fn provision_user(&self, user_id: &str, name: &str, email: &str) -> Result<Profile> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO profiles(id, name, email) VALUES (?1, ?2, ?3)",
            params![user_id, name, email],
        )?;
        tx.execute(
            "INSERT INTO financial_summaries(id, user_id) VALUES (?1, ?2)",
            params![Uuid::new_v4().to_string(), user_id],
        )?;
        tx.commit()?;
        info!(user_id, "user provisioned");
        Ok(Profile::from(ProfileRow {
            id: user_id.to_string(),
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            avatar: None,
        }))
    }
}

fn sql_value(v: &Value) -> SqlValue {
    match v {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn insert_row(conn: &Connection, kind: EntityKind, cols: &Map<String, Value>) -> Result<()> {
    let names: Vec<&str> = cols.keys().map(String::as_str).collect();
    let slots: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "INSERT INTO {}({}) VALUES ({})",
        kind.table(),
        names.join(", "),
        slots.join(", ")
    );
    conn.execute(&sql, params_from_iter(cols.values().map(sql_value)))?;
    Ok(())
}

/// Applies the given columns to the rows matching `filter`; returns the
/// number of rows touched.
fn update_rows(
    conn: &Connection,
    kind: EntityKind,
    mut cols: Map<String, Value>,
    filter: &[(&str, &str)],
    stamp: bool,
) -> Result<usize> {
    if stamp {
        cols.insert("updated_at".into(), Value::String(Utc::now().to_rfc3339()));
    }
    if cols.is_empty() {
        return Ok(0);
    }
    let mut values: Vec<SqlValue> = cols.values().map(sql_value).collect();
    let sets: Vec<String> = cols
        .keys()
        .enumerate()
        .map(|(i, name)| format!("{name} = ?{}", i + 1))
        .collect();
    let wheres: Vec<String> = filter
        .iter()
        .enumerate()
        .map(|(i, (name, _))| format!("{name} = ?{}", values.len() + i + 1))
        .collect();
    values.extend(filter.iter().map(|(_, v)| SqlValue::Text((*v).to_string())));
    let sql = format!(
        "UPDATE {} SET {} WHERE {}",
        kind.table(),
        sets.join(", "),
        wheres.join(" AND ")
    );
    Ok(conn.execute(&sql, params_from_iter(values))?)
}

fn parsed<T>(row: &Row<'_>, col: &str) -> rusqlite::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: Option<String> = row.get(col)?;
    let idx = row.as_ref().column_index(col)?;
    raw.map(|s| {
        s.parse::<T>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn required<T>(row: &Row<'_>, col: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match parsed(row, col)? {
        Some(v) => Ok(v),
        None => Err(rusqlite::Error::FromSqlConversionFailure(
            row.as_ref().column_index(col)?,
            Type::Null,
            format!("{col} is null").into(),
        )),
    }
}

fn read_profile(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        avatar: row.get("avatar")?,
    })
}

fn read_summary(row: &Row<'_>) -> rusqlite::Result<FinancialSummaryRow> {
    Ok(FinancialSummaryRow {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        current_balance: parsed(row, "current_balance")?,
        health_status: row.get("health_status")?,
        monthly_income: parsed(row, "monthly_income")?,
        monthly_expenses: parsed(row, "monthly_expenses")?,
        recurring_payments: parsed(row, "recurring_payments")?,
    })
}

fn read_transaction(row: &Row<'_>) -> rusqlite::Result<TransactionRow> {
    Ok(TransactionRow {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        amount: parsed(row, "amount")?,
        date: required::<DateTime<Utc>>(row, "date")?,
        description: row.get("description")?,
        category: row.get("category")?,
        is_recurring: row.get("is_recurring")?,
        transaction_type: row.get("transaction_type")?,
        created_at: parsed(row, "created_at")?,
        updated_at: parsed(row, "updated_at")?,
    })
}

fn read_recurring(row: &Row<'_>) -> rusqlite::Result<RecurringPaymentRow> {
    Ok(RecurringPaymentRow {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        amount: parsed(row, "amount")?,
        date: row.get("date")?,
        category: row.get("category")?,
        is_active: row.get("is_active")?,
        created_at: parsed(row, "created_at")?,
        updated_at: parsed(row, "updated_at")?,
    })
}

fn read_project(row: &Row<'_>) -> rusqlite::Result<FinancialProjectRow> {
    Ok(FinancialProjectRow {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        name: row.get("name")?,
        target_amount: parsed(row, "target_amount")?,
        current_amount: parsed(row, "current_amount")?,
        target_date: required(row, "target_date")?,
        category: row.get("category")?,
        created_at: parsed(row, "created_at")?,
        updated_at: parsed(row, "updated_at")?,
    })
}

fn query_all<R, T>(
    conn: &Connection,
    sql: &str,
    user_id: &str,
    read: fn(&Row<'_>) -> rusqlite::Result<R>,
) -> Result<Vec<T>>
where
    T: From<R>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params![user_id], read)?;
    let mut out = Vec::new();
    for r in rows {
        out.push(T::from(r?));
    }
    Ok(out)
}

fn fetch_owned<R, T>(
    conn: &Connection,
    kind: EntityKind,
    columns: &str,
    user_id: &str,
    id: &str,
    read: fn(&Row<'_>) -> rusqlite::Result<R>,
) -> Result<T>
where
    T: From<R>,
{
    let sql = format!(
        "SELECT {columns} FROM {} WHERE id = ?1 AND user_id = ?2",
        kind.table()
    );
    conn.query_row(&sql, params![id, user_id], read)
        .optional()?
        .map(T::from)
        .ok_or_else(|| StoreError::not_found(kind, id))
}

fn fetch_profile(conn: &Connection, user_id: &str) -> Result<Option<Profile>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![user_id], read_profile)
        .optional()?
        .map(Profile::from))
}

fn fetch_summary(conn: &Connection, user_id: &str) -> Result<Option<FinancialSummary>> {
    let sql = format!("SELECT {SUMMARY_COLUMNS} FROM financial_summaries WHERE user_id = ?1");
    Ok(conn
        .query_row(&sql, params![user_id], read_summary)
        .optional()?
        .map(FinancialSummary::from))
}

/// Updates a record owned by `user_id` and reads it back.
fn update_owned<R, T>(
    conn: &Connection,
    kind: EntityKind,
    columns: &str,
    user_id: &str,
    id: &str,
    cols: Map<String, Value>,
    read: fn(&Row<'_>) -> rusqlite::Result<R>,
) -> Result<T>
where
    T: From<R>,
{
    let touched = update_rows(
        conn,
        kind,
        cols,
        &[("id", id), ("user_id", user_id)],
        true,
    )?;
    if touched == 0 {
        return Err(StoreError::not_found(kind, id));
    }
    debug!(table = kind.table(), id, "row updated");
    fetch_owned(conn, kind, columns, user_id, id, read)
}

fn remove_owned(conn: &Connection, kind: EntityKind, user_id: &str, id: &str) -> Result<()> {
    let sql = format!("DELETE FROM {} WHERE id = ?1 AND user_id = ?2", kind.table());
    let removed = conn.execute(&sql, params![id, user_id])?;
    debug!(table = kind.table(), id, removed, "row removed");
    Ok(())
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[async_trait]
impl FinanceRepository for SqliteRepository {
    async fn load_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        fetch_profile(&*self.conn()?, user_id)
    }

    async fn load_summary(&self, user_id: &str) -> Result<Option<FinancialSummary>> {
        fetch_summary(&*self.conn()?, user_id)
    }

    async fn load_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE user_id = ?1 ORDER BY date DESC"
        );
        query_all(&*self.conn()?, &sql, user_id, read_transaction)
    }

    async fn load_recurring_payments(&self, user_id: &str) -> Result<Vec<RecurringPayment>> {
        let sql = format!(
            "SELECT {RECURRING_COLUMNS} FROM recurring_payments WHERE user_id = ?1 ORDER BY date ASC"
        );
        query_all(&*self.conn()?, &sql, user_id, read_recurring)
    }

    async fn load_projects(&self, user_id: &str) -> Result<Vec<FinancialProject>> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM financial_projects WHERE user_id = ?1 ORDER BY rowid"
        );
        query_all(&*self.conn()?, &sql, user_id, read_project)
    }

    async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<Profile> {
        let conn = self.conn()?;
        let cols = to_columns(&ProfilePatchRow::from(&patch))?;
        if !cols.is_empty() {
            update_rows(&conn, EntityKind::Profile, cols, &[("id", user_id)], false)?;
        }
        fetch_profile(&conn, user_id)?.ok_or_else(|| StoreError::not_found(EntityKind::Profile, user_id))
    }

    async fn update_summary(
        &self,
        user_id: &str,
        patch: SummaryPatch,
    ) -> Result<FinancialSummary> {
        let conn = self.conn()?;
        if fetch_summary(&conn, user_id)?.is_none() {
            let mut seed = FinancialSummary::empty(user_id);
            seed.id = new_id();
            insert_row(
                &conn,
                EntityKind::Summary,
                &to_columns(&FinancialSummaryRow::from(&seed))?,
            )?;
            debug!(user_id, "summary row created");
        }
        let cols = to_columns(&SummaryPatchRow::from(&patch))?;
        update_rows(
            &conn,
            EntityKind::Summary,
            cols,
            &[("user_id", user_id)],
            true,
        )?;
        fetch_summary(&conn, user_id)?
            .ok_or_else(|| StoreError::not_found(EntityKind::Summary, user_id))
    }

    async fn insert_transaction(
        &self,
        user_id: &str,
        draft: TransactionDraft,
    ) -> Result<Transaction> {
        let record = draft.into_record(new_id(), user_id, Some(Utc::now()));
        insert_row(
            &*self.conn()?,
            EntityKind::Transaction,
            &to_columns(&TransactionRow::from(&record))?,
        )?;
        Ok(record)
    }

    async fn update_transaction(
        &self,
        user_id: &str,
        id: &str,
        patch: TransactionPatch,
    ) -> Result<Transaction> {
        let cols = to_columns(&TransactionPatchRow::from(&patch))?;
        let conn = self.conn()?;
        let saved: Transaction = update_owned(
            &conn,
            EntityKind::Transaction,
            TRANSACTION_COLUMNS,
            user_id,
            id,
            cols,
            read_transaction,
        )?;
        // Income carries no budget type.
        if saved.amount > Decimal::ZERO && saved.transaction_type.is_some() {
            conn.execute(
                "UPDATE transactions SET transaction_type = NULL WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )?;
            debug!(id, "budget type cleared on income");
            return Ok(Transaction {
                transaction_type: None,
                ..saved
            });
        }
        Ok(saved)
    }

    async fn remove_transaction(&self, user_id: &str, id: &str) -> Result<()> {
        remove_owned(&*self.conn()?, EntityKind::Transaction, user_id, id)
    }

    async fn insert_recurring_payment(
        &self,
        user_id: &str,
        draft: RecurringPaymentDraft,
    ) -> Result<RecurringPayment> {
        let record = draft.into_record(new_id(), user_id, Some(Utc::now()));
        insert_row(
            &*self.conn()?,
            EntityKind::RecurringPayment,
            &to_columns(&RecurringPaymentRow::from(&record))?,
        )?;
        Ok(record)
    }

    async fn update_recurring_payment(
        &self,
        user_id: &str,
        id: &str,
        patch: RecurringPaymentPatch,
    ) -> Result<RecurringPayment> {
        let cols = to_columns(&RecurringPaymentPatchRow::from(&patch))?;
        update_owned(
            &*self.conn()?,
            EntityKind::RecurringPayment,
            RECURRING_COLUMNS,
            user_id,
            id,
            cols,
            read_recurring,
        )
    }

    async fn remove_recurring_payment(&self, user_id: &str, id: &str) -> Result<()> {
        remove_owned(&*self.conn()?, EntityKind::RecurringPayment, user_id, id)
    }

    async fn insert_project(
        &self,
        user_id: &str,
        draft: FinancialProjectDraft,
    ) -> Result<FinancialProject> {
        let record = draft.into_record(new_id(), user_id, Some(Utc::now()));
        insert_row(
            &*self.conn()?,
            EntityKind::Project,
            &to_columns(&FinancialProjectRow::from(&record))?,
        )?;
        Ok(record)
    }

    async fn update_project(
        &self,
        user_id: &str,
        id: &str,
        patch: FinancialProjectPatch,
    ) -> Result<FinancialProject> {
        let cols = to_columns(&FinancialProjectPatchRow::from(&patch))?;
        update_owned(
            &*self.conn()?,
            EntityKind::Project,
            PROJECT_COLUMNS,
            user_id,
            id,
            cols,
            read_project,
        )
    }

    async fn remove_project(&self, user_id: &str, id: &str) -> Result<()> {
        remove_owned(&*self.conn()?, EntityKind::Project, user_id, id)
    }
}
