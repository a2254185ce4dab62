//! Domain types for exhibition stall booking.
//!
//! Identifiers are thin newtypes over the `BIGSERIAL` keys used by the
//! relational schema. Records mirror the rows of `stall_types`, `stalls` and
//! `buyer_stall_interest`; the remaining types are read models returned by the
//! reporting operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StallError};

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            #[doc = concat!("Create a `", stringify!($name), "` from a raw database key")]
            #[must_use]
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Get the raw database key
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

id_newtype!(
    /// Identifier of an exhibition event (owned by the event directory)
    EventId
);
id_newtype!(
    /// Identifier of a stall type within one event
    StallTypeId
);
id_newtype!(
    /// Identifier of one physical stall row
    StallId
);
id_newtype!(
    /// Identifier of a builder (authenticated principal)
    BuilderId
);
id_newtype!(
    /// Identifier of a buyer (authenticated principal)
    BuyerId
);

// ============================================================================
// Value Objects
// ============================================================================

/// Monetary amount in minor currency units (paise).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Creates a `Money` value from minor units
    #[must_use]
    pub const fn from_minor(units: u64) -> Self {
        Self(units)
    }

    /// Returns the amount in minor units
    #[must_use]
    pub const fn minor(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// External Collaborators (read-only here)
// ============================================================================

/// Exhibition event as seen by the stall core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Event identifier
    pub event_id: EventId,
    /// Display title
    pub title: String,
    /// Maximum number of physical stalls the event may ever have
    pub stall_count: u32,
}

/// Builder directory entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Builder {
    /// Builder identifier
    pub builder_id: BuilderId,
    /// Company name shown on booking reports
    pub company_name: String,
}

/// Buyer directory entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Buyer {
    /// Buyer identifier
    pub buyer_id: BuyerId,
    /// Buyer's full name
    pub name: String,
    /// Mobile number, unique across buyers; used for venue check-in
    pub mobile_number: String,
}

// ============================================================================
// Stall Types
// ============================================================================

/// Named, priced category of stalls within one event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallType {
    /// Stall type identifier
    pub stall_type_id: StallTypeId,
    /// Owning event
    pub event_id: EventId,
    /// Display name (not enforced unique)
    pub name: String,
    /// Declared quantity of stalls for this type
    pub no_of_stalls: u32,
    /// Price per stall
    pub stall_price: Money,
    /// When the type was created
    pub created_at: DateTime<Utc>,
}

/// Unvalidated stall type input, as received from a caller.
///
/// Quantity and price are signed so that negative input can be reported as a
/// validation failure instead of a deserialization failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStallType {
    /// Display name
    pub name: String,
    /// Requested number of stalls
    pub quantity: i64,
    /// Price per stall in minor units
    pub price: i64,
}

/// Validated stall type input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StallTypeSpec {
    /// Trimmed, non-empty name
    pub name: String,
    /// Positive quantity
    pub quantity: u32,
    /// Non-negative price
    pub price: Money,
}

impl NewStallType {
    /// Build a new input value.
    #[must_use]
    pub fn new(name: impl Into<String>, quantity: i64, price: i64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
        }
    }

    /// Validate and normalise the input.
    ///
    /// # Errors
    ///
    /// Returns [`StallError::Validation`] when the trimmed name is empty, the
    /// quantity is not a positive 32-bit integer, or the price is negative.
    pub fn validate(&self) -> Result<StallTypeSpec> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(StallError::Validation(
                "Stall type name must not be blank".to_string(),
            ));
        }

        if self.quantity <= 0 {
            return Err(StallError::Validation(format!(
                "Number of stalls must be a positive integer, got {}",
                self.quantity
            )));
        }
        let quantity = i32::try_from(self.quantity)
            .ok()
            .and_then(|q| u32::try_from(q).ok())
            .ok_or_else(|| {
                StallError::Validation(format!("Number of stalls is too large: {}", self.quantity))
            })?;

        let price = u64::try_from(self.price).map_err(|_| {
            StallError::Validation(format!("Stall price must not be negative, got {}", self.price))
        })?;

        Ok(StallTypeSpec {
            name: name.to_string(),
            quantity,
            price: Money::from_minor(price),
        })
    }
}

/// Stall types of one event together with the event's declared capacity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallTypeListing {
    /// Stall types ordered by name
    pub stall_types: Vec<StallType>,
    /// The event's declared `stall_count`
    pub event_stall_count: u32,
}

impl StallTypeListing {
    /// Sum of declared quantities across all listed types.
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.stall_types
            .iter()
            .map(|t| u64::from(t.no_of_stalls))
            .sum()
    }
}

/// Availability figures for one stall type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallTypeAvailability {
    /// The stall type
    pub stall_type: StallType,
    /// Declared quantity (`no_of_stalls`)
    pub total_stalls: u32,
    /// Stalls of this type bound to a builder
    pub booked_count: u32,
    /// `total_stalls - booked_count`, floored at zero
    pub available_count: u32,
}

impl StallTypeAvailability {
    /// Derive availability from the declared quantity and the live booked count.
    #[must_use]
    pub fn new(stall_type: StallType, booked_count: u32) -> Self {
        let total_stalls = stall_type.no_of_stalls;
        Self {
            stall_type,
            total_stalls,
            booked_count,
            available_count: total_stalls.saturating_sub(booked_count),
        }
    }
}

// ============================================================================
// Stall Pool
// ============================================================================

/// One physical, numbered unit of exhibition space.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stall {
    /// Stall identifier
    pub stall_id: StallId,
    /// Owning event
    pub event_id: EventId,
    /// Stall type, fixed at creation
    pub stall_type_id: StallTypeId,
    /// Human-facing number, unique within the event
    pub stall_number: u32,
    /// Builder holding the stall; `None` while free
    pub builder_id: Option<BuilderId>,
    /// When the stall was booked
    pub booked_at: Option<DateTime<Utc>>,
}

impl Stall {
    /// Whether the stall is bound to a builder.
    #[must_use]
    pub const fn is_booked(&self) -> bool {
        self.builder_id.is_some()
    }
}

/// Stall lookup result used by the venue QR scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallDetail {
    /// The stall row
    pub stall: Stall,
    /// Name of the stall type; `None` if the type has been deleted
    pub stall_type_name: Option<String>,
    /// Company name of the booking builder, if booked
    pub company_name: Option<String>,
}

/// A booked stall in a booking report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StallBooking {
    /// Stall identifier
    pub stall_id: StallId,
    /// Owning event
    pub event_id: EventId,
    /// Human-facing number
    pub stall_number: u32,
    /// Stall type
    pub stall_type_id: StallTypeId,
    /// Stall type name; `None` if the type has been deleted
    pub stall_type_name: Option<String>,
    /// Booking builder
    pub builder_id: BuilderId,
    /// Builder's company name
    pub company_name: Option<String>,
    /// When the stall was booked
    pub booked_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Buyer Interest
// ============================================================================

/// A buyer's interest in a stall type at an event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyerStallInterest {
    /// Interested buyer
    pub buyer_id: BuyerId,
    /// Event
    pub event_id: EventId,
    /// Stall type of interest
    pub stall_type_id: StallTypeId,
    /// Concrete stall, bound at check-in
    pub stall_id: Option<StallId>,
    /// Whether the buyer has checked in
    pub is_attended: bool,
}

impl BuyerStallInterest {
    /// Fresh, unattended interest record.
    #[must_use]
    pub const fn new(buyer_id: BuyerId, event_id: EventId, stall_type_id: StallTypeId) -> Self {
        Self {
            buyer_id,
            event_id,
            stall_type_id,
            stall_id: None,
            is_attended: false,
        }
    }
}

/// Interest record as reported to a builder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestRecord {
    /// Interested buyer
    pub buyer_id: BuyerId,
    /// Buyer's name
    pub buyer_name: String,
    /// Buyer's mobile number
    pub mobile_number: String,
    /// Event
    pub event_id: EventId,
    /// Stall type of interest
    pub stall_type_id: StallTypeId,
    /// Stall type name
    pub stall_type_name: String,
    /// Stall checked in at, if any
    pub stall_id: Option<StallId>,
    /// Attendance flag
    pub is_attended: bool,
}
