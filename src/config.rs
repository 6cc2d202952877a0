// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::aggregates::DEFAULT_TOP_CATEGORIES;

pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Knobs of the synchronization store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Upper bound for a single repository call.
    pub request_timeout: Duration,
    pub top_categories: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            top_categories: DEFAULT_TOP_CATEGORIES,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `None` means the platform data directory.
    pub db_path: Option<PathBuf>,
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub log_filter: String,
    pub store: StoreConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let timeout_secs: u64 = parse_or(&non_empty, "FYNN_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS);
        let top_categories: usize =
            parse_or(&non_empty, "FYNN_TOP_CATEGORIES", DEFAULT_TOP_CATEGORIES);

        Config {
            db_path: non_empty("FYNN_DB").map(PathBuf::from),
            user_id: non_empty("FYNN_USER").map(|s| s.trim().to_string()),
            email: non_empty("FYNN_EMAIL").map(|s| s.trim().to_string()),
            log_filter: non_empty("FYNN_LOG")
                .or_else(|| non_empty("RUST_LOG"))
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            store: StoreConfig {
                request_timeout: Duration::from_secs(timeout_secs),
                top_categories,
            },
        }
    }

    pub fn resolved_db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(p) => Ok(p.clone()),
            None => crate::db::db_path(),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value '{raw}': {e}; using default {default}");
            default
        }),
        None => {
            debug!("{key} not set, using default: {default}");
            default
        }
    }
}
