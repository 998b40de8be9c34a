//! The polling-and-session-tracking engine.
//!
//! One worker per channel polls telemetry and feeds the session state
//! machine and peak aggregator; the supervisor keeps workers alive and the
//! reconciler keeps the worker set synchronized with the channel registry
//! and closes stale sessions.

pub mod peaks;
pub mod reconciler;
pub mod service;
pub mod supervisor;
pub mod tracker;
pub mod worker;

pub use reconciler::Reconciler;
pub use service::MonitorEngine;
pub use supervisor::Supervisor;
pub use tracker::{TrackerState, Transition};
pub use worker::ChannelWorker;
