//! Business metrics for stall booking.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `nativenest_stall_types_created_total` - Stall types created
//! - `nativenest_stalls_seeded_total` - Stall rows seeded into event pools
//! - `nativenest_stall_bookings_total{outcome}` - Booking attempts (`booked`, `sold_out`, `not_found`, ...)
//! - `nativenest_interest_registrations_total{outcome}` - Interest registrations (`created`, `duplicate`, ...)
//! - `nativenest_check_ins_total{outcome}` - Venue check-ins (`recorded`, `repeat`, `already_checked_in`, ...)

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{IpAddr, SocketAddr};

/// Register all stall booking metric descriptions.
///
/// Call once at startup, after [`install_exporter`] and before any metrics
/// are recorded. Descriptions sent before a recorder exists are dropped.
pub fn register_stall_metrics() {
    describe_counter!(
        "nativenest_stall_types_created_total",
        "Total number of stall types created"
    );
    describe_counter!(
        "nativenest_stalls_seeded_total",
        "Total number of stalls seeded into event pools"
    );
    describe_counter!(
        "nativenest_stall_bookings_total",
        "Stall booking attempts by outcome"
    );
    describe_counter!(
        "nativenest_interest_registrations_total",
        "Buyer interest registrations by outcome"
    );
    describe_counter!(
        "nativenest_check_ins_total",
        "Venue check-ins by outcome"
    );

    tracing::info!("Stall booking metrics registered");
}

/// Install the Prometheus exporter with its own HTTP listener.
///
/// # Errors
///
/// Returns an error if the host is not an IP address or the exporter
/// cannot be installed.
pub fn install_exporter(host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let ip: IpAddr = host.parse()?;
    let addr = SocketAddr::new(ip, port);

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    Ok(addr)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use metrics::counter;

    #[test]
    fn test_descriptions_reach_the_exporter() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            register_stall_metrics();
            counter!("nativenest_stall_bookings_total", "outcome" => "booked").increment(1);
            counter!("nativenest_check_ins_total", "outcome" => "recorded").increment(1);
        });

        let rendered = handle.render();
        assert!(rendered.contains(
            "# HELP nativenest_stall_bookings_total Stall booking attempts by outcome"
        ));
        assert!(rendered.contains("nativenest_stall_bookings_total{outcome=\"booked\"} 1"));
        assert!(rendered.contains("# HELP nativenest_check_ins_total Venue check-ins by outcome"));
    }

    #[test]
    fn test_rejects_non_ip_host() {
        assert!(install_exporter("metrics.local", 9090).is_err());
    }
}
