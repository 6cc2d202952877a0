// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

pub const DEFAULT_PROFILE_NAME: &str = "User";

/// Largest magnitude accepted for any money field, in whole units.
pub const AMOUNT_LIMIT: i64 = 1_000_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Housing,
    Transportation,
    Food,
    Utilities,
    Insurance,
    Healthcare,
    Savings,
    Debt,
    Entertainment,
    Personal,
    Education,
    Income,
    Other,
}

impl Category {
    pub const ALL: [Category; 13] = [
        Category::Housing,
        Category::Transportation,
        Category::Food,
        Category::Utilities,
        Category::Insurance,
        Category::Healthcare,
        Category::Savings,
        Category::Debt,
        Category::Entertainment,
        Category::Personal,
        Category::Education,
        Category::Income,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Housing => "housing",
            Category::Transportation => "transportation",
            Category::Food => "food",
            Category::Utilities => "utilities",
            Category::Insurance => "insurance",
            Category::Healthcare => "healthcare",
            Category::Savings => "savings",
            Category::Debt => "debt",
            Category::Entertainment => "entertainment",
            Category::Personal => "personal",
            Category::Education => "education",
            Category::Income => "income",
            Category::Other => "other",
        }
    }

    /// 50/30/20 bucket for expenses in this category. `Income` and `Other`
    /// fall outside the rule.
    pub fn bucket(self) -> Option<BudgetBucket> {
        match self {
            Category::Housing
            | Category::Transportation
            | Category::Food
            | Category::Utilities
            | Category::Insurance
            | Category::Healthcare
            | Category::Debt => Some(BudgetBucket::Essential),
            Category::Entertainment | Category::Personal => Some(BudgetBucket::Discretionary),
            Category::Savings | Category::Education => Some(BudgetBucket::Savings),
            Category::Income | Category::Other => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| StoreError::invalid("category", format!("unknown category '{s}'")))
    }
}

/// Nature of an expense. Stored with the labels the backend uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    #[serde(rename = "obligatoire")]
    Mandatory,
    #[serde(rename = "loisir")]
    Leisure,
    #[serde(rename = "epargne")]
    Saving,
}

impl TransactionType {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Mandatory => "obligatoire",
            TransactionType::Leisure => "loisir",
            TransactionType::Saving => "epargne",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "obligatoire" | "mandatory" => Ok(TransactionType::Mandatory),
            "loisir" | "leisure" => Ok(TransactionType::Leisure),
            "epargne" | "saving" | "savings" => Ok(TransactionType::Saving),
            other => Err(StoreError::invalid(
                "transaction_type",
                format!("unknown transaction type '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    #[default]
    Good,
    Warning,
    Danger,
}

impl HealthStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Good => "good",
            HealthStatus::Warning => "warning",
            HealthStatus::Danger => "danger",
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HealthStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "good" => Ok(HealthStatus::Good),
            "warning" => Ok(HealthStatus::Warning),
            "danger" => Ok(HealthStatus::Danger),
            other => Err(StoreError::invalid(
                "health_status",
                format!("unknown health status '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetBucket {
    Essential,
    Discretionary,
    Savings,
}

impl BudgetBucket {
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetBucket::Essential => "essential",
            BudgetBucket::Discretionary => "discretionary",
            BudgetBucket::Savings => "savings",
        }
    }

    /// Recommended share of spending, in percent.
    pub fn target(self) -> u32 {
        match self {
            BudgetBucket::Essential => 50,
            BudgetBucket::Discretionary => 30,
            BudgetBucket::Savings => 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
}

impl Profile {
    /// Stand-in used until the provisioning endpoint has created a row.
    pub fn placeholder(user_id: &str, email: Option<&str>) -> Self {
        Profile {
            id: user_id.to_string(),
            name: DEFAULT_PROFILE_NAME.to_string(),
            email: email.unwrap_or_default().to_string(),
            avatar: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummary {
    /// Empty while the summary only exists in memory.
    pub id: String,
    pub user_id: String,
    pub current_balance: Decimal,
    pub health_status: HealthStatus,
    pub monthly_income: Decimal,
    pub monthly_expenses: Decimal,
    pub recurring_payments_total: Decimal,
}

impl FinancialSummary {
    pub fn empty(user_id: &str) -> Self {
        FinancialSummary {
            id: String::new(),
            user_id: user_id.to_string(),
            current_balance: Decimal::ZERO,
            health_status: HealthStatus::Good,
            monthly_income: Decimal::ZERO,
            monthly_expenses: Decimal::ZERO,
            recurring_payments_total: Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    /// Positive for income, negative for expenses.
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: Category,
    pub is_recurring: bool,
    pub transaction_type: Option<TransactionType>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPayment {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub amount: Decimal,
    /// Day of month, 1-31.
    pub date: u8,
    pub category: Category,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProject {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub target_amount: Decimal,
    pub current_amount: Decimal,
    pub target_date: NaiveDate,
    pub category: Category,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// Create payloads. Ids, owners and timestamps are assigned on insert.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDraft {
    pub amount: Decimal,
    pub date: DateTime<Utc>,
    pub description: String,
    pub category: Category,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub transaction_type: Option<TransactionType>,
}

impl TransactionDraft {
    pub fn validate(&self) -> Result<()> {
        check_nonzero_amount(self.amount)?;
        check_within_limit("amount", self.amount)
    }

    /// Income carries no expense type.
    pub fn normalized(mut self) -> Self {
        if self.amount > Decimal::ZERO {
            self.transaction_type = None;
        }
        self
    }

    pub fn into_record(
        self,
        id: String,
        user_id: &str,
        stamped: Option<DateTime<Utc>>,
    ) -> Transaction {
        Transaction {
            id,
            user_id: user_id.to_string(),
            amount: self.amount,
            date: self.date,
            description: self.description,
            category: self.category,
            is_recurring: self.is_recurring,
            transaction_type: self.transaction_type,
            created_at: stamped,
            updated_at: stamped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPaymentDraft {
    pub name: String,
    pub amount: Decimal,
    pub date: u8,
    pub category: Category,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl RecurringPaymentDraft {
    pub fn validate(&self) -> Result<()> {
        check_positive("amount", self.amount)?;
        check_within_limit("amount", self.amount)?;
        check_day_of_month(self.date)
    }

    pub fn into_record(
        self,
        id: String,
        user_id: &str,
        stamped: Option<DateTime<Utc>>,
    ) -> RecurringPayment {
        RecurringPayment {
            id,
            user_id: user_id.to_string(),
            name: self.name,
            amount: self.amount,
            date: self.date,
            category: self.category,
            is_active: self.is_active,
            created_at: stamped,
            updated_at: stamped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProjectDraft {
    pub name: String,
    pub target_amount: Decimal,
    #[serde(default)]
    pub current_amount: Decimal,
    pub target_date: NaiveDate,
    pub category: Category,
}

impl FinancialProjectDraft {
    pub fn validate(&self) -> Result<()> {
        check_positive("target_amount", self.target_amount)?;
        check_within_limit("target_amount", self.target_amount)?;
        check_not_negative("current_amount", self.current_amount)?;
        check_within_limit("current_amount", self.current_amount)
    }

    pub fn into_record(
        self,
        id: String,
        user_id: &str,
        stamped: Option<DateTime<Utc>>,
    ) -> FinancialProject {
        FinancialProject {
            id,
            user_id: user_id.to_string(),
            name: self.name,
            target_amount: self.target_amount,
            current_amount: self.current_amount,
            target_date: self.target_date,
            category: self.category,
            created_at: stamped,
            updated_at: stamped,
        }
    }
}

// Partial updates. `None` leaves a field untouched; for nullable fields
// `Some(None)` clears it.

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub avatar: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn apply(&self, profile: &mut Profile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(avatar) = &self.avatar {
            profile.avatar = avatar.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPatch {
    pub current_balance: Option<Decimal>,
    pub health_status: Option<HealthStatus>,
    pub monthly_income: Option<Decimal>,
    pub monthly_expenses: Option<Decimal>,
    pub recurring_payments_total: Option<Decimal>,
}

impl SummaryPatch {
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("current_balance", self.current_balance),
            ("monthly_income", self.monthly_income),
            ("monthly_expenses", self.monthly_expenses),
            ("recurring_payments_total", self.recurring_payments_total),
        ];
        for (field, value) in fields {
            if let Some(v) = value {
                check_within_limit(field, v)?;
            }
        }
        Ok(())
    }

    pub fn apply(&self, summary: &mut FinancialSummary) {
        if let Some(v) = self.current_balance {
            summary.current_balance = v;
        }
        if let Some(v) = self.health_status {
            summary.health_status = v;
        }
        if let Some(v) = self.monthly_income {
            summary.monthly_income = v;
        }
        if let Some(v) = self.monthly_expenses {
            summary.monthly_expenses = v;
        }
        if let Some(v) = self.recurring_payments_total {
            summary.recurring_payments_total = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPatch {
    pub amount: Option<Decimal>,
    pub date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub is_recurring: Option<bool>,
    pub transaction_type: Option<Option<TransactionType>>,
}

impl TransactionPatch {
    pub fn validate(&self) -> Result<()> {
        match self.amount {
            Some(amount) => {
                check_nonzero_amount(amount)?;
                check_within_limit("amount", amount)
            }
            None => Ok(()),
        }
    }

    /// A patch turning the record into income also clears its expense type.
    pub fn normalized(mut self) -> Self {
        if self.amount.is_some_and(|a| a > Decimal::ZERO) {
            self.transaction_type = Some(None);
        }
        self
    }

    pub fn apply(&self, tx: &mut Transaction) {
        if let Some(v) = self.amount {
            tx.amount = v;
        }
        if let Some(v) = self.date {
            tx.date = v;
        }
        if let Some(v) = &self.description {
            tx.description = v.clone();
        }
        if let Some(v) = self.category {
            tx.category = v;
        }
        if let Some(v) = self.is_recurring {
            tx.is_recurring = v;
        }
        if let Some(v) = self.transaction_type {
            tx.transaction_type = v;
        }
        if tx.amount > Decimal::ZERO {
            tx.transaction_type = None;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPaymentPatch {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub date: Option<u8>,
    pub category: Option<Category>,
    pub is_active: Option<bool>,
}

impl RecurringPaymentPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.amount {
            check_positive("amount", amount)?;
            check_within_limit("amount", amount)?;
        }
        if let Some(day) = self.date {
            check_day_of_month(day)?;
        }
        Ok(())
    }

    pub fn apply(&self, payment: &mut RecurringPayment) {
        if let Some(v) = &self.name {
            payment.name = v.clone();
        }
        if let Some(v) = self.amount {
            payment.amount = v;
        }
        if let Some(v) = self.date {
            payment.date = v;
        }
        if let Some(v) = self.category {
            payment.category = v;
        }
        if let Some(v) = self.is_active {
            payment.is_active = v;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProjectPatch {
    pub name: Option<String>,
    pub target_amount: Option<Decimal>,
    pub current_amount: Option<Decimal>,
    pub target_date: Option<NaiveDate>,
    pub category: Option<Category>,
}

impl FinancialProjectPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(v) = self.target_amount {
            check_positive("target_amount", v)?;
            check_within_limit("target_amount", v)?;
        }
        if let Some(v) = self.current_amount {
            check_not_negative("current_amount", v)?;
            check_within_limit("current_amount", v)?;
        }
        Ok(())
    }

    pub fn apply(&self, project: &mut FinancialProject) {
        if let Some(v) = &self.name {
            project.name = v.clone();
        }
        if let Some(v) = self.target_amount {
            project.target_amount = v;
        }
        if let Some(v) = self.current_amount {
            project.current_amount = v;
        }
        if let Some(v) = self.target_date {
            project.target_date = v;
        }
        if let Some(v) = self.category {
            project.category = v;
        }
    }
}

fn default_true() -> bool {
    true
}

fn check_nonzero_amount(amount: Decimal) -> Result<()> {
    if amount.is_zero() {
        return Err(StoreError::invalid("amount", "must not be zero"));
    }
    Ok(())
}

fn check_positive(field: &'static str, v: Decimal) -> Result<()> {
    if v <= Decimal::ZERO {
        return Err(StoreError::invalid(field, format!("must be positive, got {v}")));
    }
    Ok(())
}

fn check_not_negative(field: &'static str, v: Decimal) -> Result<()> {
    if v < Decimal::ZERO {
        return Err(StoreError::invalid(field, format!("must not be negative, got {v}")));
    }
    Ok(())
}

fn check_within_limit(field: &'static str, v: Decimal) -> Result<()> {
    if v.abs() > Decimal::from(AMOUNT_LIMIT) {
        return Err(StoreError::invalid(
            field,
            format!("magnitude must not exceed {AMOUNT_LIMIT}, got {v}"),
        ));
    }
    Ok(())
}

fn check_day_of_month(day: u8) -> Result<()> {
    if !(1..=31).contains(&day) {
        return Err(StoreError::invalid(
            "date",
            format!("day of month must be within 1-31, got {day}"),
        ));
    }
    Ok(())
}
