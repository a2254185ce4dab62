//! Axum HTTP surface for the NativeNest stall booking core.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           HTTP Shell (Axum)             │  ← JSON, principal headers
//! │  - Role guards (admin/builder/buyer)    │  ← correlation IDs, tracing
//! │  - StallError → AppError mapping        │
//! ├─────────────────────────────────────────┤
//! │        StallRegistry (trait)            │
//! │  - Postgres store (production)          │  ← row locks, transactions
//! │  - In-memory store (tests)              │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use nativenest_web::{AppState, build_router};
//! use nativenest_postgres::PostgresStallStore;
//!
//! let store = PostgresStallStore::connect(&database_url).await?;
//! let app = build_router(AppState::new(store));
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::AppError;
pub use extractors::{CorrelationId, Principal, RequireAdmin, RequireBuilder, RequireBuyer, Role};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};
pub use router::build_router;
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
