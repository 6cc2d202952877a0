// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregates::{self, Statistics};
use crate::store::FinanceStore;
use crate::utils::{fmt_money, maybe_print_json, optional, parse_date, pretty_table};
use anyhow::Result;
use chrono::Utc;

pub fn handle(store: &FinanceStore, m: &clap::ArgMatches) -> Result<()> {
    let today = optional(m, "today", parse_date)?.unwrap_or_else(|| Utc::now().date_naive());
    let stats = match m.get_one::<usize>("top") {
        Some(top) => {
            let state = store.snapshot();
            aggregates::statistics(&state.transactions, &state.recurring_payments, today, *top)
        }
        None => store.statistics(today),
    };
    if maybe_print_json(m.get_flag("json"), m.get_flag("jsonl"), &stats)? {
        return Ok(());
    }
    print_report(&stats);
    Ok(())
}

fn print_report(stats: &Statistics) {
    let t = &stats.totals;
    println!(
        "{}",
        pretty_table(
            &["Income", "Expenses", "Recurring", "Daily budget left"],
            vec![vec![
                fmt_money(&t.monthly_income),
                fmt_money(&t.monthly_expenses),
                fmt_money(&t.recurring_total),
                fmt_money(&stats.daily_budget_remaining),
            ]],
        )
    );

    let rows: Vec<Vec<String>> = stats
        .categories
        .iter()
        .map(|c| vec![c.category.to_string(), fmt_money(&c.amount)])
        .collect();
    println!("{}", pretty_table(&["Category", "Spent"], rows));

    let mut rows: Vec<Vec<String>> = stats
        .budget_rule
        .buckets()
        .iter()
        .map(|b| {
            vec![
                b.bucket.as_str().to_string(),
                fmt_money(&b.amount),
                format!("{}%", b.percentage),
                format!("{}%", b.target),
            ]
        })
        .collect();
    if !stats.budget_rule.other_amount.is_zero() {
        rows.push(vec![
            "other".to_string(),
            fmt_money(&stats.budget_rule.other_amount),
            String::new(),
            String::new(),
        ]);
    }
    println!(
        "{}",
        pretty_table(&["Bucket", "Amount", "Share", "Target"], rows)
    );

    if !stats.upcoming_payments.is_empty() {
        let rows: Vec<Vec<String>> = stats
            .upcoming_payments
            .iter()
            .map(|p| vec![p.date.to_string(), p.name.clone(), fmt_money(&p.amount)])
            .collect();
        println!("{}", pretty_table(&["Day", "Upcoming", "Amount"], rows));
    }
}
