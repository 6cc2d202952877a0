// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use fynn::config::Config;
use fynn::db::SqliteRepository;
use fynn::notify::{BufferedNotifier, Level};
use fynn::store::{FinanceStore, LoadStatus, Session};
use fynn::{cli, commands};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();
    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let matches = cli::build_cli().get_matches();
    let Some((name, sub)) = matches.subcommand() else {
        cli::build_cli().print_help()?;
        println!();
        return Ok(());
    };

    let db_path = config.resolved_db_path()?;
    let repo = Arc::new(SqliteRepository::open(&db_path)?);
    let user_id = matches
        .get_one::<String>("user")
        .map(|u| u.trim().to_string())
        .or_else(|| config.user_id.clone())
        .context("No user selected; pass --user or set FYNN_USER")?;

    if name == "init" {
        commands::profile::provision(&repo, &user_id, sub)?;
        println!("Database at {}", db_path.display());
        return Ok(());
    }

    let notifier = Arc::new(BufferedNotifier::new());
    let store = FinanceStore::new(repo, notifier.clone(), config.store.clone());
    let mut session = Session::new(user_id);
    session.email = config.email.clone();
    let status = store.init(session).await;

    let outcome = if status == LoadStatus::Failed {
        Err(anyhow::anyhow!("Could not load data from {}", db_path.display()))
    } else {
        run(&store, name, sub).await
    };
    store.settle().await;

    for n in notifier.drain() {
        if n.level != Level::Success {
            eprintln!("{}", n);
        }
    }
    outcome
}

async fn run(store: &FinanceStore, name: &str, sub: &clap::ArgMatches) -> Result<()> {
    match name {
        "profile" => commands::profile::handle(store, sub).await?,
        "summary" => commands::summary::handle(store, sub).await?,
        "tx" => commands::transactions::handle(store, sub).await?,
        "recurring" => commands::recurring::handle(store, sub).await?,
        "project" => commands::projects::handle(store, sub).await?,
        "stats" => commands::stats::handle(store, sub)?,
        "export" => commands::exporter::handle(store, sub)?,
        "recalc" => {
            if let Some(totals) = store.recalculate_aggregates() {
                println!(
                    "Income {} / expenses {} / recurring {}",
                    totals.monthly_income, totals.monthly_expenses, totals.recurring_total
                );
            }
        }
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
