//! Broadcast hub and WebSocket server for Inkcast.
//!
//! The hub owns the shared event log and the set of connected subscribers.
//! Every accepted event mutates the log and rebroadcasts the whole log to
//! every subscriber, the sender included. New subscribers are replayed the
//! current log on join.

pub mod connection;
pub mod hub;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod server;

pub use hub::{subscriber_channel, Hub, SubscriberId, SubscriberRx, SubscriberTx};
pub use server::{router, serve, start_server};
