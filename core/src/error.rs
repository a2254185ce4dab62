//! Error taxonomy for stall registry operations.

use crate::types::{EventId, StallId, StallTypeId};
use std::fmt;
use thiserror::Error;

/// Result type alias for stall registry operations.
pub type Result<T> = std::result::Result<T, StallError>;

/// Failures returned by the stall registry.
///
/// Everything except [`StallError::Database`] is a business-rule outcome the
/// caller can act on. `Database` covers transaction, lock and connectivity
/// failures; the transaction has been rolled back before it is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StallError {
    // ═══════════════════════════════════════════════════════════
    // Business Errors
    // ═══════════════════════════════════════════════════════════

    /// Malformed or missing input.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A stall type create/update would push the event past its stall count.
    #[error(
        "Stall capacity exceeded: requested {requested} stalls but only {remaining} remain for this event"
    )]
    CapacityExceeded {
        /// Stalls requested by the create/update
        requested: u32,
        /// Stalls still unallocated, excluding the record being updated
        remaining: u32,
    },

    /// Referenced entity does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of entity
        resource: &'static str,
        /// Identifier the caller supplied
        id: String,
    },

    /// Every stall of the requested type is booked.
    #[error("No available stall of type {stall_type_id} for event {event_id}")]
    NoAvailableStall {
        /// Event
        event_id: EventId,
        /// Stall type
        stall_type_id: StallTypeId,
    },

    /// The buyer's interest row is already bound to a different stall.
    #[error("Buyer already checked in at stall {stall_id}")]
    AlreadyCheckedIn {
        /// Stall recorded by the earlier check-in
        stall_id: StallId,
    },

    // ═══════════════════════════════════════════════════════════
    // Infrastructure Errors
    // ═══════════════════════════════════════════════════════════

    /// Database, transaction or lock failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl StallError {
    /// Build a [`StallError::NotFound`].
    #[must_use]
    pub fn not_found(resource: &'static str, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Whether this is a caller-actionable business outcome rather than an
    /// infrastructure failure.
    #[must_use]
    pub const fn is_business(&self) -> bool {
        !matches!(self, Self::Database(_))
    }

    /// Short label used for metrics and structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::NotFound { .. } => "not_found",
            Self::NoAvailableStall { .. } => "sold_out",
            Self::AlreadyCheckedIn { .. } => "already_checked_in",
            Self::Database(_) => "database",
        }
    }
}
