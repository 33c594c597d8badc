//! Routing metrics.
//!
//! # Metrics
//! - `router_dispatch_total` (counter): forward dispatches by `outcome`
//!   (`matched`, `head_fallback`, `not_found`)
//! - `router_reverse_total` (counter): reverse lookups by `outcome`
//!   (`resolved`, `no_handler`)
//! - `router_reload_total` (counter): table loads by `outcome`
//!   (`loaded`, `failed`)
//! - `router_routes` (gauge): routes in the live table
//!
//! # Design Decisions
//! - Emitted through the `metrics` facade; exposition is left to the host
//! - Outcome labels are a closed set of static strings

use ::metrics::{counter, gauge};

pub fn record_dispatch(outcome: &'static str) {
    counter!("router_dispatch_total", "outcome" => outcome).increment(1);
}

pub fn record_reverse(outcome: &'static str) {
    counter!("router_reverse_total", "outcome" => outcome).increment(1);
}

pub fn record_reload(outcome: &'static str) {
    counter!("router_reload_total", "outcome" => outcome).increment(1);
}

pub fn set_route_count(count: usize) {
    gauge!("router_routes").set(count as f64);
}
