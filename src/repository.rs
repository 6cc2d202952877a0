// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Port to the remote store. The synchronization store is the only caller.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{
    FinancialProject, FinancialProjectDraft, FinancialProjectPatch, FinancialSummary, Profile,
    ProfilePatch, RecurringPayment, RecurringPaymentDraft, RecurringPaymentPatch, SummaryPatch,
    Transaction, TransactionDraft, TransactionPatch,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Profile,
    Summary,
    Transaction,
    RecurringPayment,
    Project,
}

impl EntityKind {
    /// Backing table in the remote store.
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Profile => "profiles",
            EntityKind::Summary => "financial_summaries",
            EntityKind::Transaction => "transactions",
            EntityKind::RecurringPayment => "recurring_payments",
            EntityKind::Project => "financial_projects",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::Profile => "profile",
            EntityKind::Summary => "financial summary",
            EntityKind::Transaction => "transaction",
            EntityKind::RecurringPayment => "recurring payment",
            EntityKind::Project => "project",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// CRUD access to the remote store, scoped by user.
///
/// Loads return an empty list when nothing exists. `update_*` fails with
/// `NotFound` when the id does not belong to `user_id`. `remove_*` is
/// idempotent.
#[async_trait]
pub trait FinanceRepository: Send + Sync {
    async fn load_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    async fn load_summary(&self, user_id: &str) -> Result<Option<FinancialSummary>>;

    /// Ordered by date, newest first.
    async fn load_transactions(&self, user_id: &str) -> Result<Vec<Transaction>>;

    /// Ordered by day of month, ascending.
    async fn load_recurring_payments(&self, user_id: &str) -> Result<Vec<RecurringPayment>>;

    async fn load_projects(&self, user_id: &str) -> Result<Vec<FinancialProject>>;

    async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<Profile>;

    async fn update_summary(&self, user_id: &str, patch: SummaryPatch)
    -> Result<FinancialSummary>;

    async fn insert_transaction(
        &self,
        user_id: &str,
        draft: TransactionDraft,
    ) -> Result<Transaction>;

    async fn update_transaction(
        &self,
        user_id: &str,
        id: &str,
        patch: TransactionPatch,
    ) -> Result<Transaction>;

    async fn remove_transaction(&self, user_id: &str, id: &str) -> Result<()>;

    async fn insert_recurring_payment(
        &self,
        user_id: &str,
        draft: RecurringPaymentDraft,
    ) -> Result<RecurringPayment>;

    async fn update_recurring_payment(
        &self,
        user_id: &str,
        id: &str,
        patch: RecurringPaymentPatch,
    ) -> Result<RecurringPayment>;

    async fn remove_recurring_payment(&self, user_id: &str, id: &str) -> Result<()>;

    async fn insert_project(
        &self,
        user_id: &str,
        draft: FinancialProjectDraft,
    ) -> Result<FinancialProject>;

    async fn update_project(
        &self,
        user_id: &str,
        id: &str,
        patch: FinancialProjectPatch,
    ) -> Result<FinancialProject>;

    async fn remove_project(&self, user_id: &str, id: &str) -> Result<()>;
}
