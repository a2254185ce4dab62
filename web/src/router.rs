//! Router configuration.

use crate::handlers::{booking, health, interest, stall_types, stalls};
use crate::middleware::correlation_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post, put},
};
use nativenest_core::registry::StallRegistry;
use tower_http::trace::TraceLayer;

/// Build the complete Axum router.
///
/// - `/health`, `/ready`: probes (no authentication)
/// - `/api/...`: stall types, availability, booking, interest, check-in
///
/// Every request passes through the correlation ID layer and tower-http's
/// `TraceLayer`.
pub fn build_router<R: StallRegistry + 'static>(state: AppState<R>) -> Router {
    let api_routes = Router::new()
        // Stall type administration
        .route(
            "/events/:event_id/stall-types",
            post(stall_types::create_stall_type::<R>).get(stall_types::list_stall_types::<R>),
        )
        .route(
            "/events/:event_id/stall-types/:stall_type_id",
            put(stall_types::update_stall_type::<R>).delete(stall_types::delete_stall_type::<R>),
        )
        .route(
            "/events/:event_id/availability",
            get(stall_types::list_availability::<R>),
        )
        // Booking
        .route(
            "/events/:event_id/stall-types/:stall_type_id/book",
            post(booking::book_stall::<R>),
        )
        .route("/events/:event_id/bookings", get(booking::list_bookings::<R>))
        .route("/builder/bookings", get(booking::list_builder_bookings::<R>))
        .route("/builder/interests", get(booking::list_builder_interests::<R>))
        // Buyer interest
        .route(
            "/events/:event_id/stall-types/:stall_type_id/interest",
            post(interest::register_interest::<R>),
        )
        .route(
            "/events/:event_id/stalls/:stall_id/check-in",
            post(interest::check_in::<R>),
        )
        .route("/stalls/:stall_id", get(stalls::get_stall::<R>));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check::<R>))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(correlation_id_layer())
        .with_state(state)
}
