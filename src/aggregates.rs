// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived figures computed from raw transactions and recurring payments.
//! Every function is pure; empty inputs yield zeros. Sums saturate at
//! `Decimal::MAX` instead of overflowing.

use chrono::{Datelike, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{BudgetBucket, Category, FinancialProject, RecurringPayment, Transaction};

pub const DEFAULT_TOP_CATEGORIES: usize = 6;
pub const UPCOMING_PAYMENTS_LIMIT: usize = 3;

const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// The three summary fields kept in sync with the raw collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub monthly_income: Decimal,
    pub monthly_expenses: Decimal,
    pub recurring_total: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryAmount {
    pub category: Category,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketShare {
    pub bucket: BudgetBucket,
    pub amount: Decimal,
    pub percentage: u32,
    pub target: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRuleBreakdown {
    pub essential: BucketShare,
    pub discretionary: BucketShare,
    pub savings: BucketShare,
    /// Expenses in categories outside the rule; part of the denominator.
    pub other_amount: Decimal,
    pub total_expenses: Decimal,
}

impl BudgetRuleBreakdown {
    pub fn buckets(&self) -> [&BucketShare; 3] {
        [&self.essential, &self.discretionary, &self.savings]
    }
}

/// Everything the statistics screen shows, computed in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub totals: Totals,
    pub categories: Vec<CategoryAmount>,
    pub budget_rule: BudgetRuleBreakdown,
    pub daily_budget_remaining: Decimal,
    pub monthly_evolution: Vec<MonthFlow>,
    pub upcoming_payments: Vec<RecurringPayment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthFlow {
    pub month: &'static str,
    pub income: Decimal,
    pub expenses: Decimal,
}

pub fn monthly_income(transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.amount > Decimal::ZERO)
        .map(|t| t.amount)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

pub fn monthly_expenses(transactions: &[Transaction]) -> Decimal {
    transactions
        .iter()
        .filter(|t| t.amount < Decimal::ZERO)
        .map(|t| t.amount.abs())
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

pub fn recurring_total(payments: &[RecurringPayment]) -> Decimal {
    payments
        .iter()
        .filter(|p| p.is_active)
        .map(|p| p.amount)
        .fold(Decimal::ZERO, Decimal::saturating_add)
}

pub fn totals(transactions: &[Transaction], payments: &[RecurringPayment]) -> Totals {
    Totals {
        monthly_income: monthly_income(transactions),
        monthly_expenses: monthly_expenses(transactions),
        recurring_total: recurring_total(payments),
    }
}

/// Expense magnitude per category, largest first, at most `limit` entries.
/// Equal amounts keep the order in which their category first appeared.
pub fn category_breakdown(transactions: &[Transaction], limit: usize) -> Vec<CategoryAmount> {
    let mut agg: Vec<CategoryAmount> = Vec::new();
    for t in transactions.iter().filter(|t| t.amount < Decimal::ZERO) {
        match agg.iter_mut().find(|c| c.category == t.category) {
            Some(entry) => entry.amount = entry.amount.saturating_add(t.amount.abs()),
            None => agg.push(CategoryAmount {
                category: t.category,
                amount: t.amount.abs(),
            }),
        }
    }
    // sort_by is stable, so ties stay in first-seen order
    agg.sort_by(|a, b| b.amount.cmp(&a.amount));
    agg.truncate(limit);
    agg
}

pub fn budget_rule_breakdown(transactions: &[Transaction]) -> BudgetRuleBreakdown {
    let mut essential = Decimal::ZERO;
    let mut discretionary = Decimal::ZERO;
    let mut savings = Decimal::ZERO;
    let mut other = Decimal::ZERO;

    for t in transactions.iter().filter(|t| t.amount < Decimal::ZERO) {
        let slot = match t.category.bucket() {
            Some(BudgetBucket::Essential) => &mut essential,
            Some(BudgetBucket::Discretionary) => &mut discretionary,
            Some(BudgetBucket::Savings) => &mut savings,
            None => &mut other,
        };
        *slot = slot.saturating_add(t.amount.abs());
    }

    let total = [essential, discretionary, savings, other]
        .into_iter()
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let share = |bucket: BudgetBucket, amount: Decimal| BucketShare {
        bucket,
        amount,
        percentage: percent_of(amount, total),
        target: bucket.target(),
    };

    BudgetRuleBreakdown {
        essential: share(BudgetBucket::Essential, essential),
        discretionary: share(BudgetBucket::Discretionary, discretionary),
        savings: share(BudgetBucket::Savings, savings),
        other_amount: other,
        total_expenses: total,
    }
}

/// round(part / whole * 100), half away from zero; 0 when `whole` is zero.
pub fn percent_of(part: Decimal, whole: Decimal) -> u32 {
    if whole.is_zero() {
        return 0;
    }
    part.checked_div(whole)
        .unwrap_or(Decimal::MAX)
        .saturating_mul(Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(0)
}

pub fn daily_budget_remaining(income: Decimal, expenses: Decimal, days_in_month: u32) -> Decimal {
    if days_in_month == 0 {
        return Decimal::ZERO;
    }
    income.saturating_sub(expenses) / Decimal::from(days_in_month)
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

/// Income and expenses per calendar month (January first), regardless of
/// the year of each transaction.
pub fn monthly_evolution(transactions: &[Transaction]) -> Vec<MonthFlow> {
    let mut months: Vec<MonthFlow> = MONTH_LABELS
        .iter()
        .map(|&month| MonthFlow {
            month,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
        })
        .collect();
    for t in transactions {
        let slot = &mut months[t.date.month0() as usize];
        if t.amount > Decimal::ZERO {
            slot.income = slot.income.saturating_add(t.amount);
        } else {
            slot.expenses = slot.expenses.saturating_add(t.amount.abs());
        }
    }
    months
}

/// Active payments still due this month, soonest first.
pub fn upcoming_payments(payments: &[RecurringPayment], today: u32) -> Vec<RecurringPayment> {
    let mut due: Vec<RecurringPayment> = payments
        .iter()
        .filter(|p| p.is_active && u32::from(p.date) >= today)
        .cloned()
        .collect();
    due.sort_by_key(|p| p.date);
    due.truncate(UPCOMING_PAYMENTS_LIMIT);
    due
}

/// Percentage saved towards the target; can exceed 100.
pub fn project_progress(project: &FinancialProject) -> Decimal {
    if project.target_amount.is_zero() {
        return Decimal::ZERO;
    }
    project
        .current_amount
        .checked_div(project.target_amount)
        .unwrap_or(Decimal::MAX)
        .saturating_mul(Decimal::ONE_HUNDRED)
}

pub fn statistics(
    transactions: &[Transaction],
    payments: &[RecurringPayment],
    today: NaiveDate,
    top_categories: usize,
) -> Statistics {
    let totals = totals(transactions, payments);
    Statistics {
        totals,
        categories: category_breakdown(transactions, top_categories),
        budget_rule: budget_rule_breakdown(transactions),
        daily_budget_remaining: daily_budget_remaining(
            totals.monthly_income,
            totals.monthly_expenses,
            days_in_month(today.year(), today.month()),
        ),
        monthly_evolution: monthly_evolution(transactions),
        upcoming_payments: upcoming_payments(payments, today.day()),
    }
}
