//! Application state for Axum handlers.

use std::sync::Arc;

/// Application state shared across all HTTP handlers.
///
/// Generic over the registry so the same router serves the Postgres store in
/// production and the in-memory store in tests. Cloned per request (cheaply,
/// via `Arc`).
pub struct AppState<R> {
    /// Stall registry backing every endpoint
    pub registry: Arc<R>,
}

impl<R> AppState<R> {
    /// Create a new application state.
    #[must_use]
    pub fn new(registry: R) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

// Manual impl: `R` itself need not be `Clone`.
impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}
