// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod aggregates;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod mapping;
pub mod models;
pub mod notify;
pub mod repository;
pub mod store;
pub mod utils;

pub use error::{Result, StoreError};
pub use repository::{EntityKind, FinanceRepository};
pub use store::{FinanceStore, LoadStatus, Session, StoreState};
