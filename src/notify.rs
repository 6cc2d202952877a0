// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! User-visible notifications ("toasts") raised by the store.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{error, info, warn};

use crate::repository::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Error,
}

/// Category of the operation a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Load,
    Add(EntityKind),
    Update(EntityKind),
    Delete(EntityKind),
    Recompute,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Load => f.write_str("load data"),
            Operation::Add(kind) => write!(f, "add {kind}"),
            Operation::Update(kind) => write!(f, "update {kind}"),
            Operation::Delete(kind) => write!(f, "delete {kind}"),
            Operation::Recompute => f.write_str("update statistics"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub operation: Operation,
    pub message: String,
}

impl Notification {
    pub fn success(operation: Operation) -> Self {
        let message = match operation {
            Operation::Add(kind) => format!("{} added", capitalize(kind.label())),
            Operation::Update(kind) => format!("{} updated", capitalize(kind.label())),
            Operation::Delete(kind) => format!("{} deleted", capitalize(kind.label())),
            Operation::Load => "Data loaded".to_string(),
            Operation::Recompute => "Statistics updated".to_string(),
        };
        Notification {
            level: Level::Success,
            operation,
            message,
        }
    }

    pub fn failure(operation: Operation, detail: impl fmt::Display) -> Self {
        Notification {
            level: Level::Error,
            operation,
            message: format!("Could not {operation}: {detail}"),
        }
    }

    pub fn warning(operation: Operation, detail: impl fmt::Display) -> Self {
        Notification {
            level: Level::Warning,
            operation,
            message: format!("Could not {operation}: {detail}"),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Forwards notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.level {
            Level::Success => info!(operation = %n.operation, "{}", n.message),
            Level::Warning => warn!(operation = %n.operation, "{}", n.message),
            Level::Error => error!(operation = %n.operation, "{}", n.message),
        }
    }
}

/// Keeps notifications until a front end drains them.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl BufferedNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<Notification> {
        match self.entries.lock() {
            Ok(mut entries) => std::mem::take(&mut *entries),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&self, n: Notification) {
        TracingNotifier.notify(n.clone());
        match self.entries.lock() {
            Ok(mut entries) => entries.push(n),
            Err(poisoned) => poisoned.into_inner().push(n),
        }
    }
}
