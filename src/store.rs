// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! In-memory mirror of one user's financial records.
//!
//! `FinanceStore` loads everything for the active session, applies every
//! mutation to local state before the repository round-trip, reconciles
//! with what the repository returns, and restores the previous record
//! when the call fails. After a change to transactions or recurring
//! payments it recomputes the summary totals and persists them in a
//! detached task whose failure only raises a warning.
//!
//! Local state is guarded by a plain mutex that is never held across an
//! `.await`; the repository call is the only suspension point of a
//! mutation. Each load bumps a generation counter and results tagged with
//! an older generation are dropped. Each mutation also takes a sequence
//! number per record, so a late response never overwrites a newer local
//! edit of the same record. Rollbacks restore the last copy of a record the
//! repository confirmed, not a snapshot taken before the mutation, so a
//! failed edit never survives through the snapshot of a later one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::aggregates::{self, Statistics, Totals};
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::models::{
    FinancialProject, FinancialProjectDraft, FinancialProjectPatch, FinancialSummary, Profile,
    ProfilePatch, RecurringPayment, RecurringPaymentDraft, RecurringPaymentPatch, SummaryPatch,
    Transaction, TransactionDraft, TransactionPatch,
};
use crate::notify::{Notification, Notifier, Operation};
use crate::repository::{EntityKind, FinanceRepository};

const PROVISIONAL_PREFIX: &str = "local-";

/// The authenticated user the store is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: Option<String>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Session {
            user_id: user_id.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub profile: Option<Profile>,
    pub summary: Option<FinancialSummary>,
    /// Newest first.
    pub transactions: Vec<Transaction>,
    /// By day of month.
    pub recurring_payments: Vec<RecurringPayment>,
    pub projects: Vec<FinancialProject>,
    pub status: LoadStatus,
}

impl StoreState {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    fn defaults_for(session: &Session, status: LoadStatus) -> Self {
        StoreState {
            profile: Some(Profile::placeholder(
                &session.user_id,
                session.email.as_deref(),
            )),
            summary: Some(FinancialSummary::empty(&session.user_id)),
            status,
            ..StoreState::default()
        }
    }
}

/// A collection record the store mutates optimistically.
trait Tracked: Clone + Send + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn items(state: &mut StoreState) -> &mut Vec<Self>;

    fn confirmed(confirmed: &mut Confirmed) -> &mut HashMap<String, Self>;

    /// Restores display order after a change.
    fn arrange(_items: &mut [Self]) {}

    /// Where a brand-new record lands.
    fn place(items: &mut Vec<Self>, record: Self) {
        items.push(record);
        Self::arrange(items);
    }
}

impl Tracked for Transaction {
    const KIND: EntityKind = EntityKind::Transaction;

    fn id(&self) -> &str {
        &self.id
    }

    fn items(state: &mut StoreState) -> &mut Vec<Self> {
        &mut state.transactions
    }

    fn confirmed(confirmed: &mut Confirmed) -> &mut HashMap<String, Self> {
        &mut confirmed.transactions
    }

    fn arrange(items: &mut [Self]) {
        items.sort_by(|a, b| b.date.cmp(&a.date));
    }

    fn place(items: &mut Vec<Self>, record: Self) {
        items.insert(0, record);
        Self::arrange(items);
    }
}

impl Tracked for RecurringPayment {
    const KIND: EntityKind = EntityKind::RecurringPayment;

    fn id(&self) -> &str {
        &self.id
    }

    fn items(state: &mut StoreState) -> &mut Vec<Self> {
        &mut state.recurring_payments
    }

    fn confirmed(confirmed: &mut Confirmed) -> &mut HashMap<String, Self> {
        &mut confirmed.recurring_payments
    }

    fn arrange(items: &mut [Self]) {
        items.sort_by_key(|p| p.date);
    }
}

impl Tracked for FinancialProject {
    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> &str {
        &self.id
    }

    fn items(state: &mut StoreState) -> &mut Vec<Self> {
        &mut state.projects
    }

    fn confirmed(confirmed: &mut Confirmed) -> &mut HashMap<String, Self> {
        &mut confirmed.projects
    }
}

fn replace<T: Tracked>(state: &mut StoreState, id: &str, record: T) {
    let items = T::items(state);
    if let Some(slot) = items.iter_mut().find(|r| r.id() == id) {
        *slot = record;
        T::arrange(items);
    }
}

fn by_id<T: Tracked>(items: &[T]) -> HashMap<String, T> {
    items
        .iter()
        .map(|r| (r.id().to_string(), r.clone()))
        .collect()
}

/// Last repository-confirmed copy of every record in local state.
#[derive(Default)]
struct Confirmed {
    profile: Option<Profile>,
    summary: Option<FinancialSummary>,
    transactions: HashMap<String, Transaction>,
    recurring_payments: HashMap<String, RecurringPayment>,
    projects: HashMap<String, FinancialProject>,
}

impl Confirmed {
    fn of(state: &StoreState) -> Self {
        Confirmed {
            profile: state.profile.clone(),
            summary: state.summary.clone(),
            transactions: by_id(&state.transactions),
            recurring_payments: by_id(&state.recurring_payments),
            projects: by_id(&state.projects),
        }
    }
}

/// Mutations of one record that have not settled yet.
#[derive(Default)]
struct Pending {
    newest: u64,
    in_flight: usize,
}

/// Where a settling mutation stands among those of the same record.
#[derive(Debug, Clone, Copy)]
struct Progress {
    /// No later mutation of the record has been issued.
    newest: bool,
    /// No other mutation of the record is still in flight.
    last: bool,
}

impl Progress {
    fn owns_view(self) -> bool {
        self.newest || self.last
    }
}

/// Identifies one in-flight mutation.
struct Ticket {
    operation: Operation,
    generation: u64,
    seq: u64,
    kind: EntityKind,
    id: String,
    user_id: String,
}

#[derive(Default)]
struct Shared {
    state: StoreState,
    confirmed: Confirmed,
    session: Option<Session>,
    generation: u64,
    next_seq: u64,
    pending: HashMap<(EntityKind, String), Pending>,
    recompute_seq: u64,
}

impl Shared {
    fn reset(&mut self, session: Option<Session>, state: StoreState) {
        self.generation += 1;
        self.pending.clear();
        self.confirmed = Confirmed::default();
        self.session = session;
        self.state = state;
    }
}

struct Inner {
    repo: Arc<dyn FinanceRepository>,
    notifier: Arc<dyn Notifier>,
    config: StoreConfig,
    shared: Mutex<Shared>,
    followups: Mutex<JoinSet<()>>,
    /// Highest recompute sequence written to the repository.
    persisted_seq: tokio::sync::Mutex<u64>,
}

/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct FinanceStore {
    inner: Arc<Inner>,
}

async fn with_timeout<T>(limit: Duration, call: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(limit, call).await.unwrap_or_else(|_| {
        Err(StoreError::StoreUnavailable(format!(
            "request timed out after {limit:?}"
        )))
    })
}

fn provisional_id() -> String {
    format!("{PROVISIONAL_PREFIX}{}", Uuid::new_v4())
}

fn affects_totals(kind: EntityKind) -> bool {
    matches!(kind, EntityKind::Transaction | EntityKind::RecurringPayment)
}

/// Records still waiting for their insert have no repository id to target.
fn check_saved(kind: EntityKind, id: &str) -> Result<()> {
    if id.starts_with(PROVISIONAL_PREFIX) {
        return Err(StoreError::Conflict(format!(
            "{} '{id}' is still being saved",
            kind.label()
        )));
    }
    Ok(())
}

fn settle_pending(
    pending: &mut HashMap<(EntityKind, String), Pending>,
    ticket: &Ticket,
) -> Progress {
    let key = (ticket.kind, ticket.id.clone());
    let Some(entry) = pending.get_mut(&key) else {
        return Progress {
            newest: true,
            last: true,
        };
    };
    entry.in_flight = entry.in_flight.saturating_sub(1);
    let progress = Progress {
        newest: entry.newest == ticket.seq,
        last: entry.in_flight == 0,
    };
    if progress.last {
        pending.remove(&key);
    }
    progress
}

impl FinanceStore {
    pub fn new(
        repo: Arc<dyn FinanceRepository>,
        notifier: Arc<dyn Notifier>,
        config: StoreConfig,
    ) -> Self {
        FinanceStore {
            inner: Arc::new(Inner {
                repo,
                notifier,
                config,
                shared: Mutex::new(Shared::default()),
                followups: Mutex::new(JoinSet::new()),
                persisted_seq: tokio::sync::Mutex::new(0),
            }),
        }
    }

    fn shared(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn followups(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.inner
            .followups
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn call<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        with_timeout(self.inner.config.request_timeout, request).await
    }

    // ---- reads ----

    pub fn snapshot(&self) -> StoreState {
        self.shared().state.clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.shared().session.clone()
    }

    pub fn status(&self) -> LoadStatus {
        self.shared().state.status
    }

    pub fn is_loading(&self) -> bool {
        self.shared().state.is_loading()
    }

    pub fn profile(&self) -> Option<Profile> {
        self.shared().state.profile.clone()
    }

    pub fn summary(&self) -> Option<FinancialSummary> {
        self.shared().state.summary.clone()
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.shared().state.transactions.clone()
    }

    pub fn recurring_payments(&self) -> Vec<RecurringPayment> {
        self.shared().state.recurring_payments.clone()
    }

    pub fn projects(&self) -> Vec<FinancialProject> {
        self.shared().state.projects.clone()
    }

    pub fn statistics(&self, today: NaiveDate) -> Statistics {
        let shared = self.shared();
        aggregates::statistics(
            &shared.state.transactions,
            &shared.state.recurring_payments,
            today,
            self.inner.config.top_categories,
        )
    }

    // ---- lifecycle ----

    pub async fn init(&self, session: Session) -> LoadStatus {
        self.load(Some(session)).await
    }

    /// Replaces all state with the records of `session`'s user. `None`
    /// clears everything. A load started later wins over this one.
    pub async fn load(&self, session: Option<Session>) -> LoadStatus {
        let generation = {
            let mut shared = self.shared();
            let status = if session.is_some() {
                LoadStatus::Loading
            } else {
                LoadStatus::Idle
            };
            shared.reset(
                session.clone(),
                StoreState {
                    status,
                    ..StoreState::default()
                },
            );
            shared.generation
        };

        let Some(session) = session else {
            info!(generation, "no active session, state cleared");
            return LoadStatus::Idle;
        };
        let user_id = session.user_id.as_str();
        info!(user_id, generation, "loading financial data");

        let repo = &*self.inner.repo;
        let limit = self.inner.config.request_timeout;
        let loaded = tokio::try_join!(
            with_timeout(limit, repo.load_profile(user_id)),
            with_timeout(limit, repo.load_summary(user_id)),
            with_timeout(limit, repo.load_transactions(user_id)),
            with_timeout(limit, repo.load_recurring_payments(user_id)),
            with_timeout(limit, repo.load_projects(user_id)),
        );

        let mut shared = self.shared();
        if shared.generation != generation {
            debug!(
                user_id,
                generation,
                current = shared.generation,
                "discarding superseded load"
            );
            return shared.state.status;
        }

        match loaded {
            Ok((profile, summary, mut transactions, mut payments, projects)) => {
                Transaction::arrange(&mut transactions);
                RecurringPayment::arrange(&mut payments);
                info!(
                    user_id,
                    transactions = transactions.len(),
                    recurring_payments = payments.len(),
                    projects = projects.len(),
                    "financial data loaded"
                );
                shared.state = StoreState {
                    profile: Some(profile.unwrap_or_else(|| {
                        Profile::placeholder(user_id, session.email.as_deref())
                    })),
                    summary: Some(summary.unwrap_or_else(|| FinancialSummary::empty(user_id))),
                    transactions,
                    recurring_payments: payments,
                    projects,
                    status: LoadStatus::Ready,
                };
                shared.confirmed = Confirmed::of(&shared.state);
                LoadStatus::Ready
            }
            Err(e) => {
                shared.state = StoreState::defaults_for(&session, LoadStatus::Failed);
                shared.confirmed = Confirmed::of(&shared.state);
                drop(shared);
                warn!(user_id, error = %e, "loading financial data failed");
                self.inner
                    .notifier
                    .notify(Notification::failure(Operation::Load, &e));
                LoadStatus::Failed
            }
        }
    }

    /// Drops the session and all state; pending follow-up writes are aborted.
    pub fn teardown(&self) {
        self.shared().reset(None, StoreState::default());
        self.followups().abort_all();
    }

    /// Waits for detached follow-up writes (summary totals) to finish.
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(&mut *self.followups());
            if pending.is_empty() {
                return;
            }
            while let Some(joined) = pending.join_next().await {
                if let Err(e) = joined {
                    if !e.is_cancelled() {
                        warn!(error = %e, "summary persistence task failed");
                    }
                }
            }
        }
    }

    // ---- aggregates ----

    /// Recomputes the summary totals from local collections, updates the
    /// local summary right away and persists the totals in the background.
    /// Returns `None` without an active session.
    pub fn recalculate_aggregates(&self) -> Option<Totals> {
        let (user_id, totals, seq) = {
            let mut guard = self.shared();
            let shared = &mut *guard;
            let user_id = shared.session.as_ref()?.user_id.clone();
            let totals =
                aggregates::totals(&shared.state.transactions, &shared.state.recurring_payments);
            let summaries = [
                shared.state.summary.as_mut(),
                shared.confirmed.summary.as_mut(),
            ];
            for summary in summaries.into_iter().flatten() {
                summary.monthly_income = totals.monthly_income;
                summary.monthly_expenses = totals.monthly_expenses;
                summary.recurring_payments_total = totals.recurring_total;
            }
            shared.recompute_seq += 1;
            (user_id, totals, shared.recompute_seq)
        };
        debug!(
            user_id = %user_id,
            seq,
            income = %totals.monthly_income,
            expenses = %totals.monthly_expenses,
            recurring = %totals.recurring_total,
            "aggregates recalculated"
        );
        self.persist_totals(user_id, totals, seq);
        Some(totals)
    }

    fn persist_totals(&self, user_id: String, totals: Totals, seq: u64) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(user_id = %user_id, "no async runtime, summary totals not persisted");
            return;
        };
        let inner = Arc::clone(&self.inner);
        let task = async move {
            let mut persisted = inner.persisted_seq.lock().await;
            if *persisted > seq {
                debug!(user_id = %user_id, seq, newer = *persisted, "skipping outdated totals");
                return;
            }
            let patch = SummaryPatch {
                monthly_income: Some(totals.monthly_income),
                monthly_expenses: Some(totals.monthly_expenses),
                recurring_payments_total: Some(totals.recurring_total),
                ..SummaryPatch::default()
            };
            let limit = inner.config.request_timeout;
            match with_timeout(limit, inner.repo.update_summary(&user_id, patch)).await {
                Ok(_) => {
                    *persisted = seq;
                    debug!(user_id = %user_id, seq, "summary totals persisted");
                }
                Err(e) => {
                    warn!(user_id = %user_id, seq, error = %e, "persisting summary totals failed");
                    inner
                        .notifier
                        .notify(Notification::warning(Operation::Recompute, &e));
                }
            }
        };
        let mut followups = self.followups();
        while followups.try_join_next().is_some() {}
        followups.spawn_on(task, &handle);
    }

    // ---- profile & summary ----

    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<Profile> {
        let op = Operation::Update(EntityKind::Profile);
        let (ticket, previous) = self.stage(op, EntityKind::Profile, "", |state, _| {
            let profile = state
                .profile
                .as_mut()
                .ok_or_else(|| StoreError::not_found(EntityKind::Profile, ""))?;
            let previous = profile.clone();
            patch.apply(profile);
            Ok(previous)
        })?;
        let outcome = self
            .call(self.inner.repo.update_profile(&ticket.user_id, patch))
            .await;
        self.finish(
            ticket,
            outcome,
            |state, confirmed, saved, progress| {
                confirmed.profile = Some(saved.clone());
                if progress.owns_view() {
                    state.profile = Some(saved.clone());
                }
            },
            |state, confirmed, progress| {
                if progress.owns_view() {
                    state.profile = confirmed.profile.clone().or(Some(previous));
                }
            },
        )
    }

    pub async fn update_summary(&self, patch: SummaryPatch) -> Result<FinancialSummary> {
        let op = Operation::Update(EntityKind::Summary);
        patch.validate().map_err(|e| self.reject(op, e))?;
        let (ticket, previous) = self.stage(op, EntityKind::Summary, "", |state, _| {
            let summary = state
                .summary
                .as_mut()
                .ok_or_else(|| StoreError::not_found(EntityKind::Summary, ""))?;
            let previous = summary.clone();
            patch.apply(summary);
            Ok(previous)
        })?;
        let outcome = self
            .call(self.inner.repo.update_summary(&ticket.user_id, patch))
            .await;
        self.finish(
            ticket,
            outcome,
            |state, confirmed, saved, progress| {
                confirmed.summary = Some(saved.clone());
                if progress.owns_view() {
                    state.summary = Some(saved.clone());
                }
            },
            |state, confirmed, progress| {
                if progress.owns_view() {
                    state.summary = confirmed.summary.clone().or(Some(previous));
                }
            },
        )
    }

    // ---- transactions ----

    pub async fn add_transaction(&self, draft: TransactionDraft) -> Result<Transaction> {
        let op = Operation::Add(EntityKind::Transaction);
        let draft = draft.normalized();
        draft.validate().map_err(|e| self.reject(op, e))?;
        let local = draft.clone();
        let ticket = self.stage_insert(op, |user_id, id| local.into_record(id, user_id, None))?;
        let outcome = self
            .call(self.inner.repo.insert_transaction(&ticket.user_id, draft))
            .await;
        self.finish_insert(ticket, outcome)
    }

    pub async fn update_transaction(
        &self,
        id: &str,
        patch: TransactionPatch,
    ) -> Result<Transaction> {
        let op = Operation::Update(EntityKind::Transaction);
        let patch = patch.normalized();
        patch.validate().map_err(|e| self.reject(op, e))?;
        let (ticket, previous) = self.stage_update::<Transaction>(op, id, |t| patch.apply(t))?;
        let outcome = self
            .call(self.inner.repo.update_transaction(&ticket.user_id, id, patch))
            .await;
        self.finish_update(ticket, previous, outcome)
    }

    pub async fn delete_transaction(&self, id: &str) -> Result<()> {
        let op = Operation::Delete(EntityKind::Transaction);
        let (ticket, removed) = self.stage_remove::<Transaction>(op, id)?;
        let outcome = self
            .call(self.inner.repo.remove_transaction(&ticket.user_id, id))
            .await;
        self.finish_remove(ticket, removed, outcome)
    }

    // ---- recurring payments ----

    pub async fn add_recurring_payment(
        &self,
        draft: RecurringPaymentDraft,
    ) -> Result<RecurringPayment> {
        let op = Operation::Add(EntityKind::RecurringPayment);
        draft.validate().map_err(|e| self.reject(op, e))?;
        let local = draft.clone();
        let ticket = self.stage_insert(op, |user_id, id| local.into_record(id, user_id, None))?;
        let outcome = self
            .call(self.inner.repo.insert_recurring_payment(&ticket.user_id, draft))
            .await;
        self.finish_insert(ticket, outcome)
    }

    pub async fn update_recurring_payment(
        &self,
        id: &str,
        patch: RecurringPaymentPatch,
    ) -> Result<RecurringPayment> {
        let op = Operation::Update(EntityKind::RecurringPayment);
        patch.validate().map_err(|e| self.reject(op, e))?;
        let (ticket, previous) =
            self.stage_update::<RecurringPayment>(op, id, |p| patch.apply(p))?;
        let outcome = self
            .call(
                self.inner
                    .repo
                    .update_recurring_payment(&ticket.user_id, id, patch),
            )
            .await;
        self.finish_update(ticket, previous, outcome)
    }

    pub async fn delete_recurring_payment(&self, id: &str) -> Result<()> {
        let op = Operation::Delete(EntityKind::RecurringPayment);
        let (ticket, removed) = self.stage_remove::<RecurringPayment>(op, id)?;
        let outcome = self
            .call(self.inner.repo.remove_recurring_payment(&ticket.user_id, id))
            .await;
        self.finish_remove(ticket, removed, outcome)
    }

    // ---- projects ----

    pub async fn add_project(&self, draft: FinancialProjectDraft) -> Result<FinancialProject> {
        let op = Operation::Add(EntityKind::Project);
        draft.validate().map_err(|e| self.reject(op, e))?;
        let local = draft.clone();
        let ticket = self.stage_insert(op, |user_id, id| local.into_record(id, user_id, None))?;
        let outcome = self
            .call(self.inner.repo.insert_project(&ticket.user_id, draft))
            .await;
        self.finish_insert(ticket, outcome)
    }

    pub async fn update_project(
        &self,
        id: &str,
        patch: FinancialProjectPatch,
    ) -> Result<FinancialProject> {
        let op = Operation::Update(EntityKind::Project);
        patch.validate().map_err(|e| self.reject(op, e))?;
        let (ticket, previous) =
            self.stage_update::<FinancialProject>(op, id, |p| patch.apply(p))?;
        let outcome = self
            .call(self.inner.repo.update_project(&ticket.user_id, id, patch))
            .await;
        self.finish_update(ticket, previous, outcome)
    }

    pub async fn delete_project(&self, id: &str) -> Result<()> {
        let op = Operation::Delete(EntityKind::Project);
        let (ticket, removed) = self.stage_remove::<FinancialProject>(op, id)?;
        let outcome = self
            .call(self.inner.repo.remove_project(&ticket.user_id, id))
            .await;
        self.finish_remove(ticket, removed, outcome)
    }

    // ---- optimistic machinery ----

    fn reject(&self, op: Operation, err: StoreError) -> StoreError {
        warn!(operation = %op, error = %err, "mutation rejected");
        self.inner
            .notifier
            .notify(Notification::failure(op, &err));
        err
    }

    /// Applies `mutate` to local state under the active session and
    /// registers the mutation as the newest one for `(kind, id)`.
    fn stage<R>(
        &self,
        op: Operation,
        kind: EntityKind,
        id: &str,
        mutate: impl FnOnce(&mut StoreState, &str) -> Result<R>,
    ) -> Result<(Ticket, R)> {
        let staged = {
            let mut guard = self.shared();
            let shared = &mut *guard;
            match shared.session.as_ref().map(|s| s.user_id.clone()) {
                None => Err(StoreError::no_session()),
                Some(user_id) => match mutate(&mut shared.state, &user_id) {
                    Err(e) => Err(e),
                    Ok(undo) => {
                        shared.next_seq += 1;
                        let seq = shared.next_seq;
                        let pending = shared.pending.entry((kind, id.to_string())).or_default();
                        pending.newest = seq;
                        pending.in_flight += 1;
                        let ticket = Ticket {
                            operation: op,
                            generation: shared.generation,
                            seq,
                            kind,
                            id: id.to_string(),
                            user_id,
                        };
                        Ok((ticket, undo))
                    }
                },
            }
        };
        staged.map_err(|e| self.reject(op, e))
    }

    fn stage_insert<T: Tracked>(
        &self,
        op: Operation,
        make: impl FnOnce(&str, String) -> T,
    ) -> Result<Ticket> {
        let id = provisional_id();
        let (ticket, ()) = self.stage(op, T::KIND, &id, |state, user_id| {
            T::place(T::items(state), make(user_id, id.clone()));
            Ok(())
        })?;
        Ok(ticket)
    }

    fn stage_update<T: Tracked>(
        &self,
        op: Operation,
        id: &str,
        apply: impl FnOnce(&mut T),
    ) -> Result<(Ticket, T)> {
        self.stage(op, T::KIND, id, |state, _| {
            check_saved(T::KIND, id)?;
            let items = T::items(state);
            let slot = items
                .iter_mut()
                .find(|r| r.id() == id)
                .ok_or_else(|| StoreError::not_found(T::KIND, id))?;
            let previous = slot.clone();
            apply(slot);
            T::arrange(items);
            Ok(previous)
        })
    }

    fn stage_remove<T: Tracked>(
        &self,
        op: Operation,
        id: &str,
    ) -> Result<(Ticket, Option<(usize, T)>)> {
        self.stage(op, T::KIND, id, |state, _| {
            check_saved(T::KIND, id)?;
            let items = T::items(state);
            Ok(items
                .iter()
                .position(|r| r.id() == id)
                .map(|pos| (pos, items.remove(pos))))
        })
    }

    fn finish_insert<T: Tracked>(&self, ticket: Ticket, outcome: Result<T>) -> Result<T> {
        let local_id = ticket.id.clone();
        self.finish(
            ticket,
            outcome,
            |state, confirmed, saved, _| {
                T::confirmed(confirmed).insert(saved.id().to_string(), saved.clone());
                replace(state, &local_id, saved.clone());
            },
            |state, _, _| T::items(state).retain(|r| r.id() != local_id),
        )
    }

    fn finish_update<T: Tracked>(
        &self,
        ticket: Ticket,
        previous: T,
        outcome: Result<T>,
    ) -> Result<T> {
        let id = ticket.id.clone();
        self.finish(
            ticket,
            outcome,
            |state, confirmed, saved, progress| {
                T::confirmed(confirmed).insert(id.clone(), saved.clone());
                if progress.owns_view() {
                    replace(state, &id, saved.clone());
                }
            },
            |state, confirmed, progress| {
                if progress.owns_view() {
                    let restored = T::confirmed(confirmed).get(&id).cloned();
                    replace(state, &id, restored.unwrap_or(previous));
                }
            },
        )
    }

    fn finish_remove<T: Tracked>(
        &self,
        ticket: Ticket,
        removed: Option<(usize, T)>,
        outcome: Result<()>,
    ) -> Result<()> {
        let id = ticket.id.clone();
        self.finish(
            ticket,
            outcome,
            |_, confirmed, (), _| {
                T::confirmed(confirmed).remove(&id);
            },
            |state, confirmed, progress| {
                let Some((pos, snapshot)) = removed else {
                    return;
                };
                let record = T::confirmed(confirmed).get(&id).cloned().unwrap_or(snapshot);
                let items = T::items(state);
                if progress.owns_view() && !items.iter().any(|r| r.id() == id) {
                    items.insert(pos.min(items.len()), record);
                    T::arrange(items);
                }
            },
        )
    }

    /// Settles a staged mutation: reconciles or reverts local state (unless
    /// the session changed meanwhile), notifies, and recomputes totals
    /// after successful changes to transactions or recurring payments.
    /// Successes refresh the confirmed copy; reverts restore it.
    fn finish<T>(
        &self,
        ticket: Ticket,
        outcome: Result<T>,
        reconcile: impl FnOnce(&mut StoreState, &mut Confirmed, &T, Progress),
        revert: impl FnOnce(&mut StoreState, &mut Confirmed, Progress),
    ) -> Result<T> {
        let current = {
            let mut guard = self.shared();
            let shared = &mut *guard;
            if shared.generation == ticket.generation {
                let progress = settle_pending(&mut shared.pending, &ticket);
                let (state, confirmed) = (&mut shared.state, &mut shared.confirmed);
                match &outcome {
                    Ok(saved) => reconcile(state, confirmed, saved, progress),
                    Err(_) => revert(state, confirmed, progress),
                }
                true
            } else {
                debug!(
                    operation = %ticket.operation,
                    id = %ticket.id,
                    "session changed, discarding mutation result"
                );
                false
            }
        };

        match &outcome {
            Ok(_) => {
                info!(operation = %ticket.operation, user_id = %ticket.user_id, id = %ticket.id, "mutation applied");
                if current && affects_totals(ticket.kind) {
                    self.recalculate_aggregates();
                }
                self.inner
                    .notifier
                    .notify(Notification::success(ticket.operation));
            }
            Err(e) => {
                warn!(operation = %ticket.operation, user_id = %ticket.user_id, id = %ticket.id, error = %e, "mutation failed, local change reverted");
                self.inner
                    .notifier
                    .notify(Notification::failure(ticket.operation, e));
            }
        }
        outcome
    }
}
