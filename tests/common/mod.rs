// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::Notify;

use fynn::config::StoreConfig;
use fynn::error::{Result, StoreError};
use fynn::models::{
    Category, FinancialProject, FinancialProjectDraft, FinancialProjectPatch, FinancialSummary,
    Profile, ProfilePatch, RecurringPayment, RecurringPaymentDraft, RecurringPaymentPatch,
    SummaryPatch, Transaction, TransactionDraft, TransactionPatch,
};
use fynn::notify::BufferedNotifier;
use fynn::repository::{EntityKind, FinanceRepository};
use fynn::store::{FinanceStore, Session};

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

pub fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn tx(id: &str, user: &str, amount: &str, date: &str, category: Category) -> Transaction {
    Transaction {
        id: id.into(),
        user_id: user.into(),
        amount: dec(amount),
        date: at(date),
        description: format!("{id} description"),
        category,
        is_recurring: false,
        transaction_type: None,
        created_at: None,
        updated_at: None,
    }
}

pub fn payment(id: &str, user: &str, amount: &str, day_of_month: u8, active: bool) -> RecurringPayment {
    RecurringPayment {
        id: id.into(),
        user_id: user.into(),
        name: format!("{id} payment"),
        amount: dec(amount),
        date: day_of_month,
        category: Category::Utilities,
        is_active: active,
        created_at: None,
        updated_at: None,
    }
}

pub fn project(id: &str, user: &str, target: &str, current: &str) -> FinancialProject {
    FinancialProject {
        id: id.into(),
        user_id: user.into(),
        name: format!("{id} project"),
        target_amount: dec(target),
        current_amount: dec(current),
        target_date: day("2026-12-31"),
        category: Category::Savings,
        created_at: None,
        updated_at: None,
    }
}

pub fn expense_draft(amount: &str, date: &str, category: Category) -> TransactionDraft {
    TransactionDraft {
        amount: dec(amount),
        date: at(date),
        description: "draft".into(),
        category,
        is_recurring: false,
        transaction_type: None,
    }
}

#[derive(Default)]
struct Tables {
    profiles: HashMap<String, Profile>,
    summaries: HashMap<String, FinancialSummary>,
    transactions: Vec<Transaction>,
    recurring: Vec<RecurringPayment>,
    projects: Vec<FinancialProject>,
    next_id: u64,
}

/// In-memory repository with failure injection and call gates.
///
/// Operation keys are the trait method names (`insert_transaction`), optionally
/// suffixed with `:<user_id>` to target one user.
#[derive(Default)]
pub struct FakeRepository {
    tables: Mutex<Tables>,
    failures: Mutex<HashMap<String, StoreError>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_user(&self, user_id: &str, name: &str) {
        let mut t = self.tables.lock().unwrap();
        t.profiles.insert(
            user_id.into(),
            Profile {
                id: user_id.into(),
                name: name.into(),
                email: format!("{user_id}@example.com"),
                avatar: None,
            },
        );
        let mut summary = FinancialSummary::empty(user_id);
        summary.id = format!("summary-{user_id}");
        t.summaries.insert(user_id.into(), summary);
    }

    pub fn seed_transaction(&self, record: Transaction) {
        self.tables.lock().unwrap().transactions.push(record);
    }

    pub fn seed_payment(&self, record: RecurringPayment) {
        self.tables.lock().unwrap().recurring.push(record);
    }

    pub fn seed_project(&self, record: FinancialProject) {
        self.tables.lock().unwrap().projects.push(record);
    }

    pub fn fail(&self, key: &str, err: StoreError) {
        self.failures.lock().unwrap().insert(key.into(), err);
    }

    pub fn recover(&self, key: &str) {
        self.failures.lock().unwrap().remove(key);
    }

    /// Holds calls matching `key` until the returned handle is notified.
    pub fn gate(&self, key: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(key.into(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(':').next() == Some(op))
            .count()
    }

    pub fn stored_summary(&self, user_id: &str) -> Option<FinancialSummary> {
        self.tables.lock().unwrap().summaries.get(user_id).cloned()
    }

    pub fn stored_transactions(&self, user_id: &str) -> Vec<Transaction> {
        self.tables
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    async fn enter(&self, op: &str, user_id: &str) -> Result<()> {
        let scoped = format!("{op}:{user_id}");
        self.calls.lock().unwrap().push(scoped.clone());
        let gate = {
            let gates = self.gates.lock().unwrap();
            gates.get(&scoped).or_else(|| gates.get(op)).cloned()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let failures = self.failures.lock().unwrap();
        match failures.get(&scoped).or_else(|| failures.get(op)) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut t = self.tables.lock().unwrap();
        t.next_id += 1;
        format!("{prefix}-{}", t.next_id)
    }
}

fn stamp() -> Option<DateTime<Utc>> {
    Some(at("2025-06-01T12:00:00Z"))
}

#[async_trait]
impl FinanceRepository for FakeRepository {
    async fn load_profile(&self, user_id: &str) -> Result<Option<Profile>> {
        self.enter("load_profile", user_id).await?;
        Ok(self.tables.lock().unwrap().profiles.get(user_id).cloned())
    }

    async fn load_summary(&self, user_id: &str) -> Result<Option<FinancialSummary>> {
        self.enter("load_summary", user_id).await?;
        Ok(self.tables.lock().unwrap().summaries.get(user_id).cloned())
    }

    async fn load_transactions(&self, user_id: &str) -> Result<Vec<Transaction>> {
        self.enter("load_transactions", user_id).await?;
        Ok(self.stored_transactions(user_id))
    }

    async fn load_recurring_payments(&self, user_id: &str) -> Result<Vec<RecurringPayment>> {
        self.enter("load_recurring_payments", user_id).await?;
        let t = self.tables.lock().unwrap();
        Ok(t.recurring.iter().filter(|p| p.user_id == user_id).cloned().collect())
    }

    async fn load_projects(&self, user_id: &str) -> Result<Vec<FinancialProject>> {
        self.enter("load_projects", user_id).await?;
        let t = self.tables.lock().unwrap();
        Ok(t.projects.iter().filter(|p| p.user_id == user_id).cloned().collect())
    }

    async fn update_profile(&self, user_id: &str, patch: ProfilePatch) -> Result<Profile> {
        self.enter("update_profile", user_id).await?;
        let mut t = self.tables.lock().unwrap();
        let profile = t
            .profiles
            .get_mut(user_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Profile, user_id))?;
        patch.apply(profile);
        Ok(profile.clone())
    }

    async fn update_summary(&self, user_id: &str, patch: SummaryPatch) -> Result<FinancialSummary> {
        self.enter("update_summary", user_id).await?;
        let mut t = self.tables.lock().unwrap();
        let summary = t
            .summaries
            .entry(user_id.to_string())
            .or_insert_with(|| FinancialSummary::empty(user_id));
        patch.apply(summary);
        Ok(summary.clone())
    }

    async fn insert_transaction(&self, user_id: &str, draft: TransactionDraft) -> Result<Transaction> {
        self.enter("insert_transaction", user_id).await?;
        let record = draft.into_record(self.next_id("tx"), user_id, stamp());
        self.tables.lock().unwrap().transactions.push(record.clone());
        Ok(record)
    }

    async fn update_transaction(
        &self,
        user_id: &str,
        id: &str,
        patch: TransactionPatch,
    ) -> Result<Transaction> {
        self.enter("update_transaction", user_id).await?;
        let mut t = self.tables.lock().unwrap();
        let record = t
            .transactions
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Transaction, id))?;
        patch.apply(record);
        record.updated_at = stamp();
        Ok(record.clone())
    }

    async fn remove_transaction(&self, user_id: &str, id: &str) -> Result<()> {
        self.enter("remove_transaction", user_id).await?;
        self.tables
            .lock()
            .unwrap()
            .transactions
            .retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(())
    }

    async fn insert_recurring_payment(
        &self,
        user_id: &str,
        draft: RecurringPaymentDraft,
    ) -> Result<RecurringPayment> {
        self.enter("insert_recurring_payment", user_id).await?;
        let record = draft.into_record(self.next_id("rp"), user_id, stamp());
        self.tables.lock().unwrap().recurring.push(record.clone());
        Ok(record)
    }

    async fn update_recurring_payment(
        &self,
        user_id: &str,
        id: &str,
        patch: RecurringPaymentPatch,
    ) -> Result<RecurringPayment> {
        self.enter("update_recurring_payment", user_id).await?;
        let mut t = self.tables.lock().unwrap();
        let record = t
            .recurring
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::RecurringPayment, id))?;
        patch.apply(record);
        Ok(record.clone())
    }

    async fn remove_recurring_payment(&self, user_id: &str, id: &str) -> Result<()> {
        self.enter("remove_recurring_payment", user_id).await?;
        self.tables
            .lock()
            .unwrap()
            .recurring
            .retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(())
    }

    async fn insert_project(
        &self,
        user_id: &str,
        draft: FinancialProjectDraft,
    ) -> Result<FinancialProject> {
        self.enter("insert_project", user_id).await?;
        let record = draft.into_record(self.next_id("pj"), user_id, stamp());
        self.tables.lock().unwrap().projects.push(record.clone());
        Ok(record)
    }

    async fn update_project(
        &self,
        user_id: &str,
        id: &str,
        patch: FinancialProjectPatch,
    ) -> Result<FinancialProject> {
        self.enter("update_project", user_id).await?;
        let mut t = self.tables.lock().unwrap();
        let record = t
            .projects
            .iter_mut()
            .find(|r| r.id == id && r.user_id == user_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Project, id))?;
        patch.apply(record);
        Ok(record.clone())
    }

    async fn remove_project(&self, user_id: &str, id: &str) -> Result<()> {
        self.enter("remove_project", user_id).await?;
        self.tables
            .lock()
            .unwrap()
            .projects
            .retain(|r| !(r.id == id && r.user_id == user_id));
        Ok(())
    }
}

pub struct Harness {
    pub repo: Arc<FakeRepository>,
    pub notifier: Arc<BufferedNotifier>,
    pub store: FinanceStore,
}

pub fn harness_with(repo: Arc<FakeRepository>, config: StoreConfig) -> Harness {
    let notifier = Arc::new(BufferedNotifier::new());
    let store = FinanceStore::new(repo.clone(), notifier.clone(), config);
    Harness {
        repo,
        notifier,
        store,
    }
}

pub fn harness(repo: Arc<FakeRepository>) -> Harness {
    harness_with(repo, StoreConfig::default())
}

pub fn session(user_id: &str) -> Session {
    Session::new(user_id)
}

/// Yields until the fake has seen `n` calls to `op`.
pub async fn wait_for_calls(repo: &FakeRepository, op: &str, n: usize) {
    for _ in 0..1000 {
        if repo.count(op) >= n {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("{op} was not called {n} time(s); calls: {:?}", repo.calls());
}

pub fn short_timeout() -> StoreConfig {
    StoreConfig {
        request_timeout: Duration::from_millis(50),
        ..StoreConfig::default()
    }
}
