// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

mod common;

use common::{day, dec, payment, project, tx};
use fynn::aggregates::{
    budget_rule_breakdown, category_breakdown, daily_budget_remaining, days_in_month,
    monthly_evolution, monthly_expenses, monthly_income, percent_of, project_progress,
    recurring_total, statistics, upcoming_payments,
};
use fynn::models::{BudgetBucket, Category};
use rust_decimal::Decimal;

#[test]
fn income_and_expenses_split_by_sign() {
    let txs = vec![
        tx("a", "u", "1200", "2025-03-01T00:00:00Z", Category::Income),
        tx("b", "u", "-45.80", "2025-03-02T00:00:00Z", Category::Food),
        tx("c", "u", "-12.50", "2025-03-03T00:00:00Z", Category::Transportation),
    ];
    assert_eq!(monthly_income(&txs), dec("1200"));
    assert_eq!(monthly_expenses(&txs), dec("58.30"));
}

#[test]
fn huge_amounts_saturate_instead_of_overflowing() {
    let mut windfall = tx("a", "u", "0", "2025-03-01T00:00:00Z", Category::Income);
    windfall.amount = Decimal::MAX;
    let mut blowout = tx("c", "u", "0", "2025-03-03T00:00:00Z", Category::Food);
    blowout.amount = Decimal::MIN;
    let txs = vec![
        windfall,
        tx("b", "u", "1200", "2025-03-02T00:00:00Z", Category::Income),
        blowout,
        tx("d", "u", "-5", "2025-03-04T00:00:00Z", Category::Food),
    ];
    assert_eq!(monthly_income(&txs), Decimal::MAX);
    assert_eq!(monthly_expenses(&txs), Decimal::MAX);
    assert_eq!(category_breakdown(&txs, 6)[0].amount, Decimal::MAX);

    let rule = budget_rule_breakdown(&txs);
    assert_eq!(rule.total_expenses, Decimal::MAX);
    assert_eq!(rule.essential.percentage, 100);

    let stats = statistics(&txs, &[], day("2025-03-10"), 6);
    assert_eq!(stats.daily_budget_remaining, Decimal::ZERO);
    assert_eq!(stats.monthly_evolution[2].income, Decimal::MAX);
    assert_eq!(stats.monthly_evolution[2].expenses, Decimal::MAX);
}

#[test]
fn recurring_total_skips_inactive_payments() {
    let payments = vec![
        payment("netflix", "u", "650", 3, true),
        payment("gym", "u", "30", 9, false),
    ];
    assert_eq!(recurring_total(&payments), dec("650"));
}

#[test]
fn empty_inputs_yield_zeros() {
    assert_eq!(monthly_income(&[]), Decimal::ZERO);
    assert_eq!(monthly_expenses(&[]), Decimal::ZERO);
    assert_eq!(recurring_total(&[]), Decimal::ZERO);
    assert!(category_breakdown(&[], 6).is_empty());

    let rule = budget_rule_breakdown(&[]);
    for bucket in rule.buckets() {
        assert_eq!(bucket.amount, Decimal::ZERO);
        assert_eq!(bucket.percentage, 0);
    }
    assert_eq!(rule.total_expenses, Decimal::ZERO);
    assert_eq!(percent_of(dec("5"), Decimal::ZERO), 0);
    assert_eq!(daily_budget_remaining(dec("100"), dec("10"), 0), Decimal::ZERO);
}

#[test]
fn categories_sorted_by_spend() {
    let txs = vec![
        tx("a", "u", "-45.80", "2025-03-01T00:00:00Z", Category::Food),
        tx("b", "u", "-12.50", "2025-03-02T00:00:00Z", Category::Transportation),
        tx("c", "u", "-29.99", "2025-03-03T00:00:00Z", Category::Entertainment),
        tx("d", "u", "2000", "2025-03-04T00:00:00Z", Category::Income),
    ];
    let order: Vec<Category> = category_breakdown(&txs, 6)
        .into_iter()
        .map(|c| c.category)
        .collect();
    assert_eq!(
        order,
        vec![Category::Food, Category::Entertainment, Category::Transportation]
    );
}

#[test]
fn category_ties_keep_first_seen_order_and_truncate() {
    let txs = vec![
        tx("a", "u", "-10", "2025-03-01T00:00:00Z", Category::Personal),
        tx("b", "u", "-10", "2025-03-02T00:00:00Z", Category::Debt),
        tx("c", "u", "-4", "2025-03-03T00:00:00Z", Category::Food),
        tx("d", "u", "-6", "2025-03-04T00:00:00Z", Category::Food),
        tx("e", "u", "-1", "2025-03-05T00:00:00Z", Category::Other),
    ];
    let top = category_breakdown(&txs, 3);
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].category, Category::Personal);
    assert_eq!(top[1].category, Category::Debt);
    assert_eq!(top[2].category, Category::Food);
    assert_eq!(top[2].amount, dec("10"));
}

#[test]
fn budget_rule_uses_all_expenses_as_denominator() {
    let txs = vec![
        tx("rent", "u", "-500", "2025-03-01T00:00:00Z", Category::Housing),
        tx("cinema", "u", "-200", "2025-03-02T00:00:00Z", Category::Entertainment),
        tx("save", "u", "-200", "2025-03-03T00:00:00Z", Category::Savings),
        tx("misc", "u", "-100", "2025-03-04T00:00:00Z", Category::Other),
        tx("pay", "u", "3000", "2025-03-05T00:00:00Z", Category::Income),
    ];
    let rule = budget_rule_breakdown(&txs);
    assert_eq!(rule.total_expenses, dec("1000"));
    assert_eq!(rule.other_amount, dec("100"));
    assert_eq!(rule.essential.bucket, BudgetBucket::Essential);
    assert_eq!(rule.essential.percentage, 50);
    assert_eq!(rule.discretionary.percentage, 20);
    assert_eq!(rule.savings.percentage, 20);
    assert_eq!(
        rule.buckets().map(|b| b.target),
        [50, 30, 20]
    );
}

#[test]
fn percentages_round_half_away_from_zero() {
    assert_eq!(percent_of(dec("1"), dec("8")), 13);
    assert_eq!(percent_of(dec("1"), dec("3")), 33);
    assert_eq!(percent_of(dec("2"), dec("3")), 67);
}

#[test]
fn daily_budget_divides_what_is_left() {
    assert_eq!(
        daily_budget_remaining(dec("3100"), dec("1550"), 31),
        dec("50")
    );
    assert!(daily_budget_remaining(dec("100"), dec("400"), 30) < Decimal::ZERO);
    assert_eq!(days_in_month(2024, 2), 29);
    assert_eq!(days_in_month(2025, 2), 28);
    assert_eq!(days_in_month(2025, 4), 30);
    assert_eq!(days_in_month(2025, 12), 31);
}

#[test]
fn evolution_buckets_by_calendar_month() {
    let txs = vec![
        tx("a", "u", "1000", "2025-01-15T00:00:00Z", Category::Income),
        tx("b", "u", "-40", "2025-01-20T00:00:00Z", Category::Food),
        tx("c", "u", "-60", "2024-03-02T00:00:00Z", Category::Food),
    ];
    let months = monthly_evolution(&txs);
    assert_eq!(months.len(), 12);
    assert_eq!(months[0].month, "Jan");
    assert_eq!(months[0].income, dec("1000"));
    assert_eq!(months[0].expenses, dec("40"));
    assert_eq!(months[2].expenses, dec("60"));
    assert_eq!(months[11].income, Decimal::ZERO);
}

#[test]
fn upcoming_payments_are_active_due_and_capped() {
    let payments = vec![
        payment("past", "u", "10", 2, true),
        payment("off", "u", "10", 20, false),
        payment("d25", "u", "10", 25, true),
        payment("d10", "u", "10", 10, true),
        payment("d10b", "u", "10", 10, true),
        payment("d31", "u", "10", 31, true),
    ];
    let due: Vec<String> = upcoming_payments(&payments, 10)
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(due, vec!["d10", "d10b", "d25"]);
}

#[test]
fn project_progress_can_exceed_target() {
    assert_eq!(project_progress(&project("p", "u", "1000", "250")), dec("25"));
    assert_eq!(project_progress(&project("p", "u", "100", "150")), dec("150"));
}

#[test]
fn statistics_combine_every_figure() {
    let txs = vec![
        tx("a", "u", "3000", "2025-04-01T00:00:00Z", Category::Income),
        tx("b", "u", "-900", "2025-04-02T00:00:00Z", Category::Housing),
        tx("c", "u", "-300", "2025-04-03T00:00:00Z", Category::Food),
    ];
    let payments = vec![payment("rent", "u", "900", 5, true)];
    let stats = statistics(&txs, &payments, day("2025-04-01"), 1);

    assert_eq!(stats.totals.monthly_income, dec("3000"));
    assert_eq!(stats.totals.monthly_expenses, dec("1200"));
    assert_eq!(stats.totals.recurring_total, dec("900"));
    assert_eq!(stats.categories.len(), 1);
    assert_eq!(stats.categories[0].category, Category::Housing);
    assert_eq!(stats.budget_rule.essential.percentage, 100);
    assert_eq!(stats.daily_budget_remaining, dec("60"));
    assert_eq!(stats.upcoming_payments.len(), 1);
}
