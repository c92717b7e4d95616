// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! The evaluation path never fails: configuration problems degrade to "no
//! match" and lifecycle misuse is a no-op. Errors only surface from the
//! container registry and from user predicates.

use alloc::string::String;
use core::fmt::Debug;

use thiserror::Error;

/// Errors returned by the container registry of a
/// [`SessionManager`](crate::session::SessionManager).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DndError<K: Debug> {
    /// No container is registered under the key.
    #[error("container {0:?} is not registered")]
    UnknownContainer(K),
    /// A container is already registered under the key.
    #[error("container {0:?} is already registered")]
    AlreadyRegistered(K),
}

/// Failure reported by an `accept_drop` or `animate_drop` predicate.
///
/// The session logs it and treats the predicate as having said "no".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("predicate failed: {reason}")]
pub struct PredicateError {
    reason: String,
}

impl PredicateError {
    /// Create an error with a human-readable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The reason given by the predicate.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}
