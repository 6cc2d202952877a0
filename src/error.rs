// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

use crate::repository::EntityKind;

pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures surfaced by the repository port and the store.
///
/// The type is `Clone` so a single failure can be handed back to the
/// caller and reported to the notifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("not authorized: {0}")]
    NotAuthorized(String),

    #[error("{entity} '{id}' not found")]
    NotFound { entity: EntityKind, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{0}")]
    Unknown(String),
}

impl StoreError {
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn no_session() -> Self {
        StoreError::NotAuthorized("no active session".into())
    }
}
