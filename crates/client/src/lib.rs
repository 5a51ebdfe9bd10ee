//! Account-level core of an OpenStack Swift object-storage client SDK.
//!
//! This crate authenticates against a Keystone v2 identity endpoint, holds
//! the resulting session (token, tenant, roles, service catalog), and
//! executes account-scoped operations — container listing and account
//! metadata — through one generic transaction path whose outcomes are
//! classified into a typed [`ResultEnvelope`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ authenticate ┌─────────────┐
//! │ Account      │◄─────────────│ auth flow    │
//! │  (session)   │              └──────┬──────┘
//! │  ops, reauth │                     │
//! └──────┬───────┘              ┌──────▼──────┐
//!        │ execute              │ Transport    │  trait boundary:
//!        └─────────────────────►│ (reqwest or  │  status/reason/headers/
//!          TransactionRequest   │  test mock)  │  body vs. connection fault
//!                               └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use swiftstore::{Account, AuthenticationInfo, CallCounter, HttpTransport};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = Arc::new(HttpTransport::new()?);
//!     let counter = CallCounter::new();
//!     let info = AuthenticationInfo::new(
//!         Some("acme".to_string()),
//!         "alice",
//!         "secret",
//!         "http://keystone:5000/v2.0/tokens",
//!     );
//!
//!     let result = Account::authenticate(transport, counter.clone(), info, true);
//!     let Some(account) = result.into_payload() else {
//!         return Err("authentication failed".into());
//!     };
//!
//!     let listing = account.containers(false);
//!     if let Some(containers) = listing.payload() {
//!         for container in containers {
//!             println!("{}: {} objects", container.name, container.total_objects);
//!         }
//!     }
//!     println!("transactions sent: {}", counter.value());
//!     Ok(())
//! }
//! ```
//!
//! # Outcome contract
//!
//! No operation returns a bare `Err` or panics across the public boundary:
//! every outcome, including transport faults, arrives as a
//! [`ResultEnvelope`] whose error kind must be inspected before the payload
//! is touched. The payload is present exactly when there is no error, with
//! the one documented exception of the header-only metadata operations.
//!
//! # Concurrency
//!
//! Execution is synchronous and blocking. [`Account`] is `Send + Sync`:
//! session mutation and counter updates are internally synchronized, so
//! sharing one account across threads is safe (see [`account`]).

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod account;
mod auth;
pub mod counter;
pub mod envelope;
pub mod error;
pub mod transaction;
pub mod transport;

pub mod model;

// Re-export the types most callers need directly.
pub use account::{account_metadata, Account};
pub use counter::CallCounter;
pub use envelope::{RawResponse, ResultEnvelope};
pub use error::{ApiError, ErrorKind};
pub use model::{
    AccountStats, AuthenticationInfo, AuthenticationMethod, ContainerInfo, Endpoint, Role,
    Service, Tenant, Token,
};
pub use transaction::TransactionRequest;
pub use transport::{
    HttpTransport, Method, Transport, TransportError, TransportRequest, TransportResponse,
};
