//! Metric names recorded by the hub.
//!
//! Recording goes through the `metrics` facade; without an installed
//! recorder every call is a no-op.

/// Subscriptions opened (counter).
pub const SUBSCRIPTIONS_TOTAL: &str = "relay_subscriptions_total";
/// Subscriptions currently held open (gauge).
pub const SUBSCRIPTIONS_ACTIVE: &str = "relay_subscriptions_active";
/// Broadcast rounds completed (counter).
pub const BROADCAST_ROUNDS_TOTAL: &str = "relay_broadcast_rounds_total";
/// Successful sends (counter).
pub const DELIVERIES_TOTAL: &str = "relay_deliveries_total";
/// Failed sends (counter, labels: reason).
pub const DELIVERY_FAILURES_TOTAL: &str = "relay_delivery_failures_total";
/// Duration of one full fan-out round (histogram).
pub const BROADCAST_ROUND_SECONDS: &str = "relay_broadcast_round_seconds";
/// Records removed by compaction (counter).
pub const COMPACTED_RECORDS_TOTAL: &str = "relay_compacted_records_total";

/// All metric names, for exporters that pre-describe them.
pub const ALL: [&str; 7] = [
    SUBSCRIPTIONS_TOTAL,
    SUBSCRIPTIONS_ACTIVE,
    BROADCAST_ROUNDS_TOTAL,
    DELIVERIES_TOTAL,
    DELIVERY_FAILURES_TOTAL,
    BROADCAST_ROUND_SECONDS,
    COMPACTED_RECORDS_TOTAL,
];
