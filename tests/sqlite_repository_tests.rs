// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use std::sync::Arc;

use common::{at, day, dec, expense_draft};
use fynn::config::StoreConfig;
use fynn::db::SqliteRepository;
use fynn::error::StoreError;
use fynn::models::{
    Category, FinancialProjectDraft, FinancialProjectPatch, HealthStatus, ProfilePatch,
    RecurringPaymentDraft, SummaryPatch, TransactionPatch, TransactionType,
};
use fynn::notify::BufferedNotifier;
use fynn::repository::{EntityKind, FinanceRepository};
use fynn::store::{FinanceStore, LoadStatus, Session};
use tempfile::tempdir;

fn repo() -> SqliteRepository {
    let repo = SqliteRepository::open_in_memory().unwrap();
    repo.provision_user("u1", "Dana", "dana@example.com").unwrap();
    repo
}

#[tokio::test]
async fn provisioning_creates_profile_and_summary_once() {
    let repo = repo();
    let profile = repo.load_profile("u1").await.unwrap().unwrap();
    assert_eq!(profile.name, "Dana");
    assert_eq!(profile.email, "dana@example.com");

    let summary = repo.load_summary("u1").await.unwrap().unwrap();
    assert_eq!(summary.user_id, "u1");
    assert!(!summary.id.is_empty());
    assert_eq!(summary.health_status, HealthStatus::Good);
    assert!(summary.monthly_income.is_zero());

    let err = repo
        .provision_user("u1", "Dana again", "x@example.com")
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "got {err:?}");

    assert!(repo.load_profile("nobody").await.unwrap().is_none());
    assert!(repo.load_transactions("nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn transactions_are_scoped_sorted_and_updatable() {
    let repo = repo();
    let older = repo
        .insert_transaction("u1", expense_draft("-12.50", "2025-01-05T00:00:00Z", Category::Food))
        .await
        .unwrap();
    let mut draft = expense_draft("-40", "2025-03-01T00:00:00Z", Category::Transportation);
    draft.transaction_type = Some(TransactionType::Mandatory);
    let newer = repo.insert_transaction("u1", draft).await.unwrap();
    repo.insert_transaction("u2", expense_draft("-1", "2025-02-01T00:00:00Z", Category::Other))
        .await
        .unwrap();

    let listed = repo.load_transactions("u1").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, newer.id);
    assert_eq!(listed[0].transaction_type, Some(TransactionType::Mandatory));
    assert_eq!(listed[1].id, older.id);
    assert_eq!(listed[1].amount, dec("-12.50"));
    assert_eq!(listed[1].date, at("2025-01-05T00:00:00Z"));

    let patch = TransactionPatch {
        amount: Some(dec("-15")),
        transaction_type: Some(Some(TransactionType::Leisure)),
        ..TransactionPatch::default()
    };
    let updated = repo.update_transaction("u1", &older.id, patch).await.unwrap();
    assert_eq!(updated.amount, dec("-15"));
    assert_eq!(updated.transaction_type, Some(TransactionType::Leisure));
    assert!(updated.updated_at.is_some());

    let err = repo
        .update_transaction("u2", &older.id, TransactionPatch::default())
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::not_found(EntityKind::Transaction, older.id.clone()));

    repo.remove_transaction("u1", &older.id).await.unwrap();
    repo.remove_transaction("u1", &older.id).await.unwrap();
    assert_eq!(repo.load_transactions("u1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn income_rows_never_keep_a_budget_type() {
    let repo = repo();
    let mut draft = expense_draft("-20", "2025-04-02T00:00:00Z", Category::Entertainment);
    draft.transaction_type = Some(TransactionType::Leisure);
    let expense = repo.insert_transaction("u1", draft).await.unwrap();

    let refund = TransactionPatch {
        amount: Some(dec("50")),
        ..TransactionPatch::default()
    };
    let updated = repo.update_transaction("u1", &expense.id, refund).await.unwrap();
    assert_eq!(updated.amount, dec("50"));
    assert_eq!(updated.transaction_type, None);

    let typed = TransactionPatch {
        transaction_type: Some(Some(TransactionType::Saving)),
        ..TransactionPatch::default()
    };
    let updated = repo.update_transaction("u1", &expense.id, typed).await.unwrap();
    assert_eq!(updated.transaction_type, None);

    let listed = repo.load_transactions("u1").await.unwrap();
    assert_eq!(listed[0].transaction_type, None);
}

#[tokio::test]
async fn constraint_violations_are_classified() {
    let repo = repo();
    let bad = RecurringPaymentDraft {
        name: "Broken".into(),
        amount: dec("5"),
        date: 0,
        category: Category::Utilities,
        is_active: true,
    };
    let err = repo.insert_recurring_payment("u1", bad).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation { .. }), "got {err:?}");
}

#[tokio::test]
async fn recurring_payments_and_projects_round_trip() {
    let repo = repo();
    for (name, d) in [("Phone", 20u8), ("Rent", 1), ("Gym", 12)] {
        let draft = RecurringPaymentDraft {
            name: name.into(),
            amount: dec("10"),
            date: d,
            category: Category::Utilities,
            is_active: name != "Gym",
        };
        repo.insert_recurring_payment("u1", draft).await.unwrap();
    }
    let payments = repo.load_recurring_payments("u1").await.unwrap();
    let days: Vec<u8> = payments.iter().map(|p| p.date).collect();
    assert_eq!(days, vec![1, 12, 20]);
    assert!(!payments[1].is_active);

    let project = repo
        .insert_project(
            "u1",
            FinancialProjectDraft {
                name: "Car".into(),
                target_amount: dec("8000"),
                current_amount: dec("500"),
                target_date: day("2027-01-01"),
                category: Category::Transportation,
            },
        )
        .await
        .unwrap();
    let patch = FinancialProjectPatch {
        current_amount: Some(dec("750")),
        ..FinancialProjectPatch::default()
    };
    let updated = repo.update_project("u1", &project.id, patch).await.unwrap();
    assert_eq!(updated.current_amount, dec("750"));
    assert_eq!(updated.target_date, day("2027-01-01"));
    assert_eq!(repo.load_projects("u1").await.unwrap(), vec![updated]);
}

#[tokio::test]
async fn profile_and_summary_updates_apply_partially() {
    let repo = repo();
    let profile = repo
        .update_profile(
            "u1",
            ProfilePatch {
                avatar: Some(Some("https://cdn.example.com/d.png".into())),
                ..ProfilePatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(profile.name, "Dana");
    assert_eq!(profile.avatar.as_deref(), Some("https://cdn.example.com/d.png"));

    let summary = repo
        .update_summary(
            "u1",
            SummaryPatch {
                current_balance: Some(dec("-20.5")),
                health_status: Some(HealthStatus::Danger),
                ..SummaryPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(summary.current_balance, dec("-20.5"));
    assert_eq!(summary.health_status, HealthStatus::Danger);

    let created = repo
        .update_summary(
            "fresh",
            SummaryPatch {
                monthly_income: Some(dec("99")),
                ..SummaryPatch::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created.user_id, "fresh");
    assert_eq!(created.monthly_income, dec("99"));
}

#[tokio::test]
async fn store_changes_persist_across_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fynn.sqlite");
    {
        let repo = SqliteRepository::open(&path).unwrap();
        repo.provision_user("u1", "Dana", "dana@example.com").unwrap();
    }

    let open_store = || {
        let repo = Arc::new(SqliteRepository::open(&path).unwrap());
        FinanceStore::new(repo, Arc::new(BufferedNotifier::new()), StoreConfig::default())
    };

    let store = open_store();
    assert_eq!(store.init(Session::new("u1")).await, LoadStatus::Ready);
    store
        .add_transaction(expense_draft("2500", "2025-04-01T09:00:00Z", Category::Income))
        .await
        .unwrap();
    store
        .add_transaction(expense_draft("-80", "2025-04-03T09:00:00Z", Category::Food))
        .await
        .unwrap();
    store.settle().await;
    drop(store);

    let reopened = open_store();
    assert_eq!(reopened.init(Session::new("u1")).await, LoadStatus::Ready);
    let txs = reopened.transactions();
    assert_eq!(txs.len(), 2);
    assert_eq!(txs[0].amount, dec("-80"));
    let summary = reopened.summary().unwrap();
    assert_eq!(summary.monthly_income, dec("2500"));
    assert_eq!(summary.monthly_expenses, dec("80"));
}
