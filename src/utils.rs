// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;

use crate::models::{Category, HealthStatus, TransactionType};

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

/// Accepts a plain date (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = parse_date(s)?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

pub fn parse_day(s: &str) -> Result<u8> {
    let day: u8 = s
        .parse()
        .with_context(|| format!("Invalid day '{}', expected 1-31", s))?;
    if !(1..=31).contains(&day) {
        return Err(anyhow!("Invalid day '{}', expected 1-31", s));
    }
    Ok(day)
}

pub fn parse_category(s: &str) -> Result<Category> {
    s.parse::<Category>().map_err(|e| anyhow!(e))
}

pub fn parse_transaction_type(s: &str) -> Result<TransactionType> {
    s.parse::<TransactionType>().map_err(|e| anyhow!(e))
}

pub fn parse_health(s: &str) -> Result<HealthStatus> {
    s.parse::<HealthStatus>().map_err(|e| anyhow!(e))
}

pub fn parse_bool(s: &str) -> Result<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(anyhow!("Invalid flag value '{}', expected true|false", s)),
    }
}

/// Fetches a string argument clap guarantees to be present.
pub fn required<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(|s| s.trim())
        .ok_or_else(|| anyhow!("Missing required argument --{}", name))
}

pub fn optional<T>(
    m: &clap::ArgMatches,
    name: &str,
    parse: impl Fn(&str) -> Result<T>,
) -> Result<Option<T>> {
    m.get_one::<String>(name)
        .map(|s| parse(s.trim()))
        .transpose()
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // arrays stream one element per line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
