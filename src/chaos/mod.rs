//! Fault injection on target pods
//!
//! Latency is applied with `tc qdisc ... netem` executed inside the pod, and
//! removed again once the kill session finishes.

mod netem;

pub use netem::{with_latency, FaultInjector, NetemInjector};

#[cfg(test)]
pub use netem::MockFaultInjector;
