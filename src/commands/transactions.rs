// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{TransactionDraft, TransactionPatch};
use crate::store::FinanceStore;
use crate::utils::{
    fmt_money, maybe_print_json, optional, parse_bool, parse_category, parse_decimal,
    parse_timestamp, parse_transaction_type, pretty_table, required,
};
use anyhow::Result;

pub async fn handle(store: &FinanceStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, sub).await?,
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => edit(store, sub).await?,
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            store.delete_transaction(id).await?;
            println!("Deleted transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

fn text(s: &str) -> Result<String> {
    Ok(s.to_string())
}

async fn add(store: &FinanceStore, sub: &clap::ArgMatches) -> Result<()> {
    let draft = TransactionDraft {
        amount: parse_decimal(required(sub, "amount")?)?,
        date: parse_timestamp(required(sub, "date")?)?,
        description: optional(sub, "description", text)?.unwrap_or_default(),
        category: parse_category(required(sub, "category")?)?,
        is_recurring: optional(sub, "recurring", parse_bool)?.unwrap_or(false),
        transaction_type: optional(sub, "type", parse_transaction_type)?,
    };
    let saved = store.add_transaction(draft).await?;
    println!(
        "Recorded {} on {} ({}) id={}",
        fmt_money(&saved.amount),
        saved.date.date_naive(),
        saved.category,
        saved.id
    );
    Ok(())
}

async fn edit(store: &FinanceStore, sub: &clap::ArgMatches) -> Result<()> {
    let id = required(sub, "id")?;
    let patch = TransactionPatch {
        amount: optional(sub, "amount", parse_decimal)?,
        date: optional(sub, "date", parse_timestamp)?,
        description: optional(sub, "description", text)?,
        category: optional(sub, "category", parse_category)?,
        is_recurring: optional(sub, "recurring", parse_bool)?,
        transaction_type: optional(sub, "type", parse_transaction_type)?.map(Some),
    };
    let saved = store.update_transaction(id, patch).await?;
    println!("Updated transaction {}", saved.id);
    Ok(())
}

fn list(store: &FinanceStore, sub: &clap::ArgMatches) -> Result<()> {
    let mut data = store.transactions();
    if let Some(limit) = sub.get_one::<usize>("limit") {
        data.truncate(*limit);
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.date.date_naive().to_string(),
                    fmt_money(&t.amount),
                    t.category.to_string(),
                    t.transaction_type
                        .map(|k| k.to_string())
                        .unwrap_or_default(),
                    t.description.clone(),
                    t.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Date", "Amount", "Category", "Type", "Description", "Id"],
                rows
            )
        );
    }
    Ok(())
}
