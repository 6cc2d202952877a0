// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{RecurringPaymentDraft, RecurringPaymentPatch};
use crate::store::FinanceStore;
use crate::utils::{
    fmt_money, maybe_print_json, optional, parse_bool, parse_category, parse_day, parse_decimal,
    pretty_table, required,
};
use anyhow::Result;

pub async fn handle(store: &FinanceStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let draft = RecurringPaymentDraft {
                name: required(sub, "name")?.to_string(),
                amount: parse_decimal(required(sub, "amount")?)?,
                date: parse_day(required(sub, "day")?)?,
                category: parse_category(required(sub, "category")?)?,
                is_active: optional(sub, "active", parse_bool)?.unwrap_or(true),
            };
            let saved = store.add_recurring_payment(draft).await?;
            println!(
                "Recurring payment '{}' of {} on day {} id={}",
                saved.name,
                fmt_money(&saved.amount),
                saved.date,
                saved.id
            );
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => {
            let id = required(sub, "id")?;
            let patch = RecurringPaymentPatch {
                name: optional(sub, "name", |s| Ok(s.to_string()))?,
                amount: optional(sub, "amount", parse_decimal)?,
                date: optional(sub, "day", parse_day)?,
                category: optional(sub, "category", parse_category)?,
                is_active: optional(sub, "active", parse_bool)?,
            };
            let saved = store.update_recurring_payment(id, patch).await?;
            println!("Updated recurring payment {}", saved.id);
        }
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            store.delete_recurring_payment(id).await?;
            println!("Deleted recurring payment {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(store: &FinanceStore, sub: &clap::ArgMatches) -> Result<()> {
    let data = store.recurring_payments();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|p| {
                vec![
                    p.date.to_string(),
                    p.name.clone(),
                    fmt_money(&p.amount),
                    p.category.to_string(),
                    if p.is_active { "yes" } else { "no" }.to_string(),
                    p.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Day", "Name", "Amount", "Category", "Active", "Id"], rows)
        );
    }
    Ok(())
}
