//! Check-in correlation rules for buyer interest records.

use crate::error::{Result, StallError};
use crate::types::{BuyerStallInterest, StallId};

/// What a check-in should do to a matched interest row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CheckInDecision {
    /// Mark attended and bind the stall.
    Record,
    /// The row already records this exact stall; nothing to write.
    AlreadyRecorded,
}

/// Decide how a check-in at `stall_id` applies to an existing interest row.
///
/// A repeat scan of the same stall is accepted as-is. Once a row is attended
/// at one stall, checking in at a different stall of the same type is refused.
///
/// # Errors
///
/// Returns [`StallError::AlreadyCheckedIn`] when the row is attended at a
/// different stall.
pub fn decide_check_in(interest: &BuyerStallInterest, stall_id: StallId) -> Result<CheckInDecision> {
    match (interest.is_attended, interest.stall_id) {
        (true, Some(recorded)) if recorded == stall_id => Ok(CheckInDecision::AlreadyRecorded),
        (true, Some(recorded)) => Err(StallError::AlreadyCheckedIn { stall_id: recorded }),
        _ => Ok(CheckInDecision::Record),
    }
}
