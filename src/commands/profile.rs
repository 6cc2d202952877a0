// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::db::SqliteRepository;
use crate::models::ProfilePatch;
use crate::store::FinanceStore;
use crate::utils::{maybe_print_json, optional, pretty_table, required};
use anyhow::{Result, anyhow};

/// Creates the profile and summary rows for `user_id`.
pub fn provision(repo: &SqliteRepository, user_id: &str, m: &clap::ArgMatches) -> Result<()> {
    let name = required(m, "name")?;
    let email = required(m, "email")?;
    let profile = repo.provision_user(user_id, name, email)?;
    println!("Initialized user '{}' ({})", profile.name, profile.id);
    Ok(())
}

pub async fn handle(store: &FinanceStore, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", sub)) => {
            let profile = store.profile().ok_or_else(|| anyhow!("No profile loaded"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &profile)? {
                println!(
                    "{}",
                    pretty_table(
                        &["Id", "Name", "Email", "Avatar"],
                        vec![vec![
                            profile.id,
                            profile.name,
                            profile.email,
                            profile.avatar.unwrap_or_default(),
                        ]],
                    )
                );
            }
        }
        Some(("set", sub)) => {
            let avatar = if sub.get_flag("clear-avatar") {
                Some(None)
            } else {
                optional(sub, "avatar", |s| Ok(s.to_string()))?.map(Some)
            };
            let patch = ProfilePatch {
                name: optional(sub, "name", |s| Ok(s.to_string()))?,
                avatar,
            };
            let saved = store.update_profile(patch).await?;
            println!("Profile updated: {}", saved.name);
        }
        _ => {}
    }
    Ok(())
}
