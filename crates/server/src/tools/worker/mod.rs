//! Tools that deliver service-worker events.

pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod push;

pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{SwActivateParams, SwInstallParams, activate_impl, install_impl};
pub use message::{SwMessageParams, message_impl};
pub use push::{SwNotificationClickParams, SwPushParams, notification_click_impl, push_impl};
