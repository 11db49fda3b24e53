//! # Event subscribers for the tickvisor driver.
//!
//! This module provides the [`Subscribe`] trait and the built-in
//! [`LogWriter`] for handling events published through the
//! [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Cycle / TaskHandle / Driver ── publish(Event) ──► Bus
//!                                                      │
//!                                     ┌────────────────┼──────────┐
//!                                     ▼                ▼          ▼
//!                                 LogWriter         Metrics    Custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscribe::Subscribe;
