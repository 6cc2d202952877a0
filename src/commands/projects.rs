// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregates::project_progress;
use crate::models::{FinancialProjectDraft, FinancialProjectPatch};
use crate::store::FinanceStore;
use crate::utils::{
    fmt_money, maybe_print_json, optional, parse_category, parse_date, parse_decimal,
    pretty_table, required,
};
use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

pub async fn handle(store: &FinanceStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let draft = FinancialProjectDraft {
                name: required(sub, "name")?.to_string(),
                target_amount: parse_decimal(required(sub, "target")?)?,
                current_amount: optional(sub, "current", parse_decimal)?.unwrap_or_default(),
                target_date: parse_date(required(sub, "deadline")?)?,
                category: parse_category(required(sub, "category")?)?,
            };
            let saved = store.add_project(draft).await?;
            println!(
                "Project '{}' targeting {} by {} id={}",
                saved.name,
                fmt_money(&saved.target_amount),
                saved.target_date,
                saved.id
            );
        }
        Some(("list", sub)) => list(store, sub)?,
        Some(("edit", sub)) => {
            let id = required(sub, "id")?;
            let patch = FinancialProjectPatch {
                name: optional(sub, "name", |s| Ok(s.to_string()))?,
                target_amount: optional(sub, "target", parse_decimal)?,
                current_amount: optional(sub, "current", parse_decimal)?,
                target_date: optional(sub, "deadline", parse_date)?,
                category: optional(sub, "category", parse_category)?,
            };
            let saved = store.update_project(id, patch).await?;
            println!("Updated project {}", saved.id);
        }
        Some(("rm", sub)) => {
            let id = required(sub, "id")?;
            store.delete_project(id).await?;
            println!("Deleted project {}", id);
        }
        _ => {}
    }
    Ok(())
}

#[derive(Serialize)]
struct ProjectLine {
    id: String,
    name: String,
    category: String,
    current: Decimal,
    target: Decimal,
    progress: Decimal,
    deadline: String,
}

fn list(store: &FinanceStore, sub: &clap::ArgMatches) -> Result<()> {
    let data: Vec<ProjectLine> = store
        .projects()
        .iter()
        .map(|p| ProjectLine {
            id: p.id.clone(),
            name: p.name.clone(),
            category: p.category.to_string(),
            current: p.current_amount,
            target: p.target_amount,
            progress: project_progress(p).round_dp(1),
            deadline: p.target_date.to_string(),
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|p| {
                vec![
                    p.name.clone(),
                    p.category.clone(),
                    fmt_money(&p.current),
                    fmt_money(&p.target),
                    format!("{}%", p.progress),
                    p.deadline.clone(),
                    p.id.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["Name", "Category", "Saved", "Target", "Progress", "Deadline", "Id"],
                rows
            )
        );
    }
    Ok(())
}
