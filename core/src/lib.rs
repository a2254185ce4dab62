//! # NativeNest Core
//!
//! Domain types and rules for the exhibition stall booking core of the
//! NativeNest marketplace.
//!
//! ## Concepts
//!
//! - **Event**: an exhibition declaring a total `stall_count` (external)
//! - **Stall type**: a named, priced category with a declared quantity
//! - **Stall**: one numbered unit of space, free or bound to exactly one builder
//! - **Interest**: a buyer's intent to visit a stall type, later correlated with
//!   a physical check-in
//!
//! ## Invariants
//!
//! - Σ declared quantities of an event's stall types ≤ the event's `stall_count`
//!   ([`capacity`])
//! - Stall numbers are unique per event and never reused ([`pool`])
//! - A stall's builder goes from `None` to `Some` at most once
//! - One interest row per (buyer, event, stall type) ([`interest`])
//!
//! Storage implementations live in `nativenest-postgres` (production) and
//! `nativenest-testing` (in-memory); both implement [`registry::StallRegistry`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod capacity;
pub mod error;
pub mod interest;
pub mod pool;
pub mod registry;
pub mod types;

pub use error::{Result, StallError};
pub use registry::{Directory, StallRegistry};
pub use types::*;
