//! Service-worker logic for sw-cache.
//!
//! This crate provides the cache router and its strategies, the
//! install/activate lifecycle, control messages, push handling and the
//! periodic retention sweep, all over the `CacheStorage` and `Network`
//! seams.

pub mod fallback;
pub mod fetch;
pub mod lifecycle;
pub mod messages;
pub mod push;
pub mod router;
pub mod sweep;
mod worker;

#[cfg(test)]
mod testing;

pub use fetch::{FetchConfig, HttpNetwork, Network};
pub use lifecycle::{ActivateReport, ClientNotice, InstallReport, Lifecycle, PrecacheOutcome, WorkerState};
pub use messages::{ControlMessage, MessageReply};
pub use push::{Notification, NotificationAction};
pub use router::{Classification, Outcome, RouteResult, Routed, Router, Strategy};
pub use worker::ServiceWorker;
