// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::SummaryPatch;
use crate::store::FinanceStore;
use crate::utils::{fmt_money, maybe_print_json, optional, parse_decimal, parse_health, pretty_table};
use anyhow::{Result, anyhow};

pub async fn handle(store: &FinanceStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let s = store.summary().ok_or_else(|| anyhow!("No summary loaded"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
                let rows = vec![
                    vec!["Balance".to_string(), fmt_money(&s.current_balance)],
                    vec!["Health".to_string(), s.health_status.to_string()],
                    vec!["Monthly income".to_string(), fmt_money(&s.monthly_income)],
                    vec!["Monthly expenses".to_string(), fmt_money(&s.monthly_expenses)],
                    vec![
                        "Recurring payments".to_string(),
                        fmt_money(&s.recurring_payments_total),
                    ],
                ];
                println!("{}", pretty_table(&["Field", "Value"], rows));
            }
        }
        Some(("set", sub)) => {
            let patch = SummaryPatch {
                current_balance: optional(sub, "balance", parse_decimal)?,
                health_status: optional(sub, "health", parse_health)?,
                ..SummaryPatch::default()
            };
            let saved = store.update_summary(patch).await?;
            println!(
                "Summary updated: balance {} ({})",
                fmt_money(&saved.current_balance),
                saved.health_status
            );
        }
        _ => {}
    }
    Ok(())
}
