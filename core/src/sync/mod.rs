//! Live-state synchronization engine.
//!
//! One [`poller::PollHandle`] per active screen drives a
//! [`store::ViewStateStore`]; the [`coordinator::Coordinator`] owns the
//! start/stop lifecycle across navigation, [`command::CommandDispatcher`]
//! issues job triggers, and [`heartbeat::CloudStatusHeartbeat`] keeps the
//! shared infrastructure status warm for the whole process lifetime.

/// Trigger-and-acknowledge command lifecycle.
pub mod command;
/// Screen catalog, poll plans, and navigation.
pub mod coordinator;
/// Fixed-cadence infrastructure status poller.
pub mod heartbeat;
/// Cancellable fetch-and-apply poll loops.
pub mod poller;
/// Snapshot stores with freshness and generation tagging.
pub mod store;
