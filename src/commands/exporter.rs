// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use serde_json::json;

use crate::store::FinanceStore;
use crate::utils::required;

pub fn handle(store: &FinanceStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(store, sub),
        _ => Ok(()),
    }
}

fn export_transactions(store: &FinanceStore, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = required(sub, "format")?.to_lowercase();
    let out = required(sub, "out")?;
    let rows = store.transactions();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id",
                "date",
                "amount",
                "category",
                "type",
                "description",
                "recurring",
            ])?;
            for t in &rows {
                wtr.write_record([
                    t.id.clone(),
                    t.date.to_rfc3339(),
                    t.amount.to_string(),
                    t.category.to_string(),
                    t.transaction_type
                        .map(|k| k.to_string())
                        .unwrap_or_default(),
                    t.description.clone(),
                    t.is_recurring.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = rows
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id, "date": t.date, "amount": t.amount, "category": t.category,
                        "type": t.transaction_type, "description": t.description, "recurring": t.is_recurring
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    println!("Exported {} transactions to {}", rows.len(), out);
    Ok(())
}
