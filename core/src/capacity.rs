//! Event capacity ledger checks.
//!
//! The sum of declared stall-type quantities for an event must never exceed the
//! event's `stall_count`. Stores compute the sum of the *other* types under a
//! lock on the event row and hand it to [`check_capacity`].

use crate::error::{Result, StallError};

/// Stalls not yet allocated to any stall type.
#[must_use]
pub fn remaining(stall_count: u32, allocated: u64) -> u32 {
    let left = u64::from(stall_count).saturating_sub(allocated);
    // left <= stall_count, so it always fits
    u32::try_from(left).unwrap_or(stall_count)
}

/// Check that `requested` more stalls fit next to `allocated_elsewhere`.
///
/// For a create, `allocated_elsewhere` is the sum over every existing type of
/// the event; for an update it excludes the type being updated.
///
/// # Errors
///
/// Returns [`StallError::CapacityExceeded`] carrying the remaining headroom.
pub fn check_capacity(stall_count: u32, allocated_elsewhere: u64, requested: u32) -> Result<()> {
    let remaining = remaining(stall_count, allocated_elsewhere);
    if requested > remaining {
        return Err(StallError::CapacityExceeded {
            requested,
            remaining,
        });
    }
    Ok(())
}

/// Convert a `SUM(...)` result read from the database into a ledger total.
///
/// Negative sums cannot occur for valid rows and are treated as zero.
#[must_use]
pub fn allocated_from_sum(sum: i64) -> u64 {
    u64::try_from(sum).unwrap_or(0)
}
