//! Stall pool seeding.
//!
//! Creating a stall type seeds one stall row per declared unit. Numbers are
//! derived as `max(existing stall_number for the event) + 1` inside the same
//! transaction that validated capacity, so numbers are unique per event and
//! never reused across stall types.

use crate::error::{Result, StallError};
use crate::types::{EventId, StallTypeId};
use std::ops::RangeInclusive;

/// A stall row waiting to be inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewStall {
    /// Owning event
    pub event_id: EventId,
    /// Stall type the row belongs to
    pub stall_type_id: StallTypeId,
    /// Human-facing number
    pub stall_number: u32,
}

/// Contiguous block of stall numbers to seed for one stall type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedPlan {
    event_id: EventId,
    stall_type_id: StallTypeId,
    first: u32,
    count: u32,
}

impl SeedPlan {
    /// Plan `quantity` stalls after the event's current highest number.
    ///
    /// `max_existing` is `None` when the event has no stalls yet.
    ///
    /// # Errors
    ///
    /// Returns [`StallError::Validation`] if numbering would leave the
    /// 32-bit range used by the schema.
    pub fn new(
        event_id: EventId,
        stall_type_id: StallTypeId,
        max_existing: Option<u32>,
        quantity: u32,
    ) -> Result<Self> {
        let first = max_existing.unwrap_or(0).checked_add(1);
        let last = first.and_then(|f| f.checked_add(quantity.saturating_sub(1)));

        match (first, last) {
            (Some(first), Some(last)) if i32::try_from(last).is_ok() => Ok(Self {
                event_id,
                stall_type_id,
                first,
                count: quantity,
            }),
            _ => Err(StallError::Validation(format!(
                "Stall numbering for event {event_id} would overflow"
            ))),
        }
    }

    /// Stall numbers covered by the plan (empty when quantity is zero).
    #[must_use]
    pub fn numbers(&self) -> RangeInclusive<u32> {
        if self.count == 0 {
            #[allow(clippy::reversed_empty_ranges)]
            return 1..=0;
        }
        self.first..=self.first + (self.count - 1)
    }

    /// Number of rows the plan inserts.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.count
    }

    /// Whether the plan inserts nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Rows to insert, in ascending number order.
    #[must_use]
    pub fn rows(&self) -> Vec<NewStall> {
        self.numbers()
            .map(|stall_number| NewStall {
                event_id: self.event_id,
                stall_type_id: self.stall_type_id,
                stall_number,
            })
            .collect()
    }
}
