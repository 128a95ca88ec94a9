//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to runtime events emitted by pool actors, worker
//! runtimes, and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] — event classification and payload metadata
//! - [`Bus`] — thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: pool actors (task/unit/pool events) and `SubscriberSet`
//!   workers (overflow/panic).
//! - **Consumers**: the registry's fan-out listener, plus any receiver
//!   obtained through [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
