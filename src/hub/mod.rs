//! Relay Hub
//!
//! Connection bookkeeping and broadcast fan-out, independent of the
//! transport.
//!
//! ## Architecture
//!
//! - **Registry**: the set of open connections, guarded by one lock
//! - **Broadcaster**: snapshot-then-deliver fan-out with per-recipient results
//! - **Submission**: validation for connectionless HTTP submissions
//!
//! ## Example
//!
//! ```rust
//! use relay::hub::{Broadcaster, ConnectionHandle, Registry};
//! use std::sync::Arc;
//!
//! # #[tokio::main] async fn main() {
//! let registry = Arc::new(Registry::new());
//! let broadcaster = Broadcaster::new(Arc::clone(&registry));
//!
//! let (alice, _alice_rx) = ConnectionHandle::channel(16);
//! let (bob, mut bob_rx) = ConnectionHandle::channel(16);
//! registry.add(alice.clone()).await;
//! registry.add(bob).await;
//!
//! let report = broadcaster.broadcast("hello", Some(&alice.id())).await;
//! assert_eq!(report.delivered, 1);
//! assert_eq!(&*bob_rx.recv().await.unwrap(), "hello");
//! # }
//! ```

mod broadcaster;
mod connection;
mod registry;
mod submission;

pub use broadcaster::{BroadcastReport, BroadcastStats, Broadcaster, StatsSnapshot};
pub use connection::{ConnectionHandle, ConnectionId, ConnectionState, DeliveryError, Payload};
pub use registry::Registry;
pub use submission::{compose_message, SubmitError};
