//! Core types for Inkcast: the event model, the shared event log, config,
//! and errors.

pub mod config;
pub mod error;
pub mod event;
pub mod log;

pub use error::{InkcastError, Result};
pub use event::Event;
pub use log::EventLog;
