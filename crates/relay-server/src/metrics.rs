//! Prometheus recorder and `/metrics` rendering.

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use relay_hub::metrics as names;
use tracing::info;

/// Install the global Prometheus recorder and describe the hub's metrics.
///
/// Call once at startup, before the hub records anything.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_all();
    info!("prometheus metrics recorder installed");
    Ok(handle)
}

/// Render Prometheus text format.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

fn describe_all() {
    describe_counter!(names::SUBSCRIPTIONS_TOTAL, "Subscriptions opened");
    describe_gauge!(names::SUBSCRIPTIONS_ACTIVE, "Subscriptions currently open");
    describe_counter!(names::BROADCAST_ROUNDS_TOTAL, "Broadcast rounds completed");
    describe_counter!(names::DELIVERIES_TOTAL, "Messages delivered to subscribers");
    describe_counter!(
        names::DELIVERY_FAILURES_TOTAL,
        "Failed sends, by reason; each deactivates its subscriber"
    );
    describe_histogram!(
        names::BROADCAST_ROUND_SECONDS,
        Unit::Seconds,
        "Time from round start until every send finished"
    );
    describe_counter!(
        names::COMPACTED_RECORDS_TOTAL,
        "Inactive records removed from the registry"
    );
}
