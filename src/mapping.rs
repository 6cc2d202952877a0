// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Rows as the remote store names and types them, and the conversions to
//! and from the in-memory records.
//!
//! Column names are the serde field names of the row types, so the same
//! structs drive both reading and writing. Conversions from rows are total:
//! missing or null columns fall back to the defaults below, and unknown enum
//! labels fall back to `other` / `good` / no type.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, StoreError};
use crate::models::{
    Category, DEFAULT_PROFILE_NAME, FinancialProject, FinancialProjectPatch, FinancialSummary,
    HealthStatus, Profile, ProfilePatch, RecurringPayment, RecurringPaymentPatch, SummaryPatch,
    Transaction, TransactionPatch, TransactionType,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummaryRow {
    pub id: String,
    pub user_id: String,
    pub current_balance: Option<Decimal>,
    pub health_status: Option<String>,
    pub monthly_income: Option<Decimal>,
    pub monthly_expenses: Option<Decimal>,
    pub recurring_payments: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub id: String,
    pub user_id: String,
    pub amount: Option<Decimal>,
    pub date: DateTime<Utc>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub is_recurring: Option<bool>,
    pub transaction_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringPaymentRow {
    pub id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub date: i64,
    pub category: Option<String>,
    pub is_active: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialProjectRow {
    pub id: String,
    pub user_id: String,
    pub name: Option<String>,
    pub target_amount: Option<Decimal>,
    pub current_amount: Option<Decimal>,
    pub target_date: NaiveDate,
    pub category: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

fn category_or_other(raw: Option<&str>) -> Category {
    raw.and_then(|s| s.parse().ok()).unwrap_or(Category::Other)
}

impl From<&Profile> for ProfileRow {
    fn from(p: &Profile) -> Self {
        ProfileRow {
            id: p.id.clone(),
            name: Some(p.name.clone()),
            email: Some(p.email.clone()),
            avatar: p.avatar.clone(),
        }
    }
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            name: row
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_PROFILE_NAME.to_string()),
            email: row.email.unwrap_or_default(),
            avatar: row.avatar.filter(|a| !a.is_empty()),
        }
    }
}

impl From<&FinancialSummary> for FinancialSummaryRow {
    fn from(s: &FinancialSummary) -> Self {
        FinancialSummaryRow {
            id: s.id.clone(),
            user_id: s.user_id.clone(),
            current_balance: Some(s.current_balance),
            health_status: Some(s.health_status.as_str().to_string()),
            monthly_income: Some(s.monthly_income),
            monthly_expenses: Some(s.monthly_expenses),
            recurring_payments: Some(s.recurring_payments_total),
        }
    }
}

impl From<FinancialSummaryRow> for FinancialSummary {
    fn from(row: FinancialSummaryRow) -> Self {
        FinancialSummary {
            id: row.id,
            user_id: row.user_id,
            current_balance: row.current_balance.unwrap_or_default(),
            health_status: row
                .health_status
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            monthly_income: row.monthly_income.unwrap_or_default(),
            monthly_expenses: row.monthly_expenses.unwrap_or_default(),
            recurring_payments_total: row.recurring_payments.unwrap_or_default(),
        }
    }
}

impl From<&Transaction> for TransactionRow {
    fn from(t: &Transaction) -> Self {
        TransactionRow {
            id: t.id.clone(),
            user_id: t.user_id.clone(),
            amount: Some(t.amount),
            date: t.date,
            description: Some(t.description.clone()),
            category: Some(t.category.as_str().to_string()),
            is_recurring: Some(t.is_recurring),
            transaction_type: t.transaction_type.map(|k| k.as_str().to_string()),
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: row.id,
            user_id: row.user_id,
            amount: row.amount.unwrap_or_default(),
            date: row.date,
            description: row.description.unwrap_or_default(),
            category: category_or_other(row.category.as_deref()),
            is_recurring: row.is_recurring.unwrap_or(false),
            transaction_type: row
                .transaction_type
                .and_then(|s| s.parse::<TransactionType>().ok()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&RecurringPayment> for RecurringPaymentRow {
    fn from(p: &RecurringPayment) -> Self {
        RecurringPaymentRow {
            id: p.id.clone(),
            user_id: p.user_id.clone(),
            name: Some(p.name.clone()),
            amount: Some(p.amount),
            date: i64::from(p.date),
            category: Some(p.category.as_str().to_string()),
            is_active: Some(p.is_active),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<RecurringPaymentRow> for RecurringPayment {
    fn from(row: RecurringPaymentRow) -> Self {
        RecurringPayment {
            id: row.id,
            user_id: row.user_id,
            name: row.name.unwrap_or_default(),
            amount: row.amount.unwrap_or_default(),
            date: u8::try_from(row.date.clamp(1, 31)).unwrap_or(1),
            category: category_or_other(row.category.as_deref()),
            is_active: row.is_active.unwrap_or(true),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<&FinancialProject> for FinancialProjectRow {
    fn from(p: &FinancialProject) -> Self {
        FinancialProjectRow {
            id: p.id.clone(),
            user_id: p.user_id.clone(),
            name: Some(p.name.clone()),
            target_amount: Some(p.target_amount),
            current_amount: Some(p.current_amount),
            target_date: p.target_date,
            category: Some(p.category.as_str().to_string()),
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<FinancialProjectRow> for FinancialProject {
    fn from(row: FinancialProjectRow) -> Self {
        FinancialProject {
            id: row.id,
            user_id: row.user_id,
            name: row.name.unwrap_or_default(),
            target_amount: row.target_amount.unwrap_or_default(),
            current_amount: row.current_amount.unwrap_or_default(),
            target_date: row.target_date,
            category: category_or_other(row.category.as_deref()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

// Partial rows: only the columns a patch touches are serialized.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfilePatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Option<String>>,
}

impl From<&ProfilePatch> for ProfilePatchRow {
    fn from(p: &ProfilePatch) -> Self {
        ProfilePatchRow {
            name: p.name.clone(),
            avatar: p.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SummaryPatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_balance: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_income: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_expenses: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_payments: Option<Decimal>,
}

impl From<&SummaryPatch> for SummaryPatchRow {
    fn from(p: &SummaryPatch) -> Self {
        SummaryPatchRow {
            current_balance: p.current_balance,
            health_status: p.health_status.map(|h| h.as_str().to_string()),
            monthly_income: p.monthly_income,
            monthly_expenses: p.monthly_expenses,
            recurring_payments: p.recurring_payments_total,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionPatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_recurring: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<Option<String>>,
}

impl From<&TransactionPatch> for TransactionPatchRow {
    fn from(p: &TransactionPatch) -> Self {
        TransactionPatchRow {
            amount: p.amount,
            date: p.date,
            description: p.description.clone(),
            category: p.category.map(|c| c.as_str().to_string()),
            is_recurring: p.is_recurring,
            transaction_type: p
                .clone()
                .normalized()
                .transaction_type
                .map(|k| k.map(|k| k.as_str().to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecurringPaymentPatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl From<&RecurringPaymentPatch> for RecurringPaymentPatchRow {
    fn from(p: &RecurringPaymentPatch) -> Self {
        RecurringPaymentPatchRow {
            name: p.name.clone(),
            amount: p.amount,
            date: p.date.map(i64::from),
            category: p.category.map(|c| c.as_str().to_string()),
            is_active: p.is_active,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FinancialProjectPatchRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl From<&FinancialProjectPatch> for FinancialProjectPatchRow {
    fn from(p: &FinancialProjectPatch) -> Self {
        FinancialProjectPatchRow {
            name: p.name.clone(),
            target_amount: p.target_amount,
            current_amount: p.current_amount,
            target_date: p.target_date,
            category: p.category.map(|c| c.as_str().to_string()),
        }
    }
}

/// Serializes a row (or partial row) into column name -> value pairs.
pub fn to_columns<T: Serialize>(row: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(row) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::Unknown(format!(
            "expected a row object, got {other}"
        ))),
        Err(e) => Err(StoreError::Unknown(format!("could not encode row: {e}"))),
    }
}
