//! # tick-relay
//!
//! A subscription-scheduled market-data relay. It maintains a bounded pool
//! of streaming connections to a broker, aggregates the latest tick per
//! instrument into an in-memory snapshot, and fans that snapshot out over
//! an HTTP pull endpoint and a realtime WebSocket push channel.
//!
//! The [`scheduler`] module is the core of the crate: it partitions the
//! instrument universe into a *priority* class (always subscribed) and a
//! *rotation* class (cycled through the connections' remaining capacity),
//! distributes both across at most [`constants::MAX_CONNECTIONS`] upstream
//! connections, and recovers transparently from connection failure via
//! lazy reconnection in the [`supervisor`] module.
//!
//! ## Quick start
//!
//! ```no_run
//! use tick_relay::config::Config;
//! use tick_relay::{auth, catalog, scheduler, store, supervisor};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> tick_relay::error::Result<()> {
//!     let config = Config::from_env()?;
//!     let session = auth::authenticator_for(&config.auth_method)
//!         .authenticate()
//!         .await?;
//!
//!     let client = tick_relay::client::BrokerClient::new(&session, tick_relay::constants::API_BASE_URL);
//!     let catalog_source = catalog::HttpCatalogSource::new(
//!         client,
//!         "instruments_cache.json",
//!         config.catalog_cache_ttl,
//!     );
//!     let instruments = catalog::CatalogSource::load(&catalog_source).await?;
//!
//!     let store = Arc::new(store::TickStore::new());
//!     let supervisor = Arc::new(supervisor::ConnectionSupervisor::with_retry_policy(
//!         &session,
//!         store.clone(),
//!         config.max_retries,
//!         config.retry_delay,
//!     ));
//!
//!     let _workers = scheduler::run(&instruments, supervisor, &config).await?;
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod client;
pub mod config;
pub mod constants;
pub mod egress;
pub mod error;
pub mod rotation;
pub mod scheduler;
pub mod store;
pub mod supervisor;
pub mod types;
pub mod ws;

/// Re-export the error type and `Result` alias at the crate root for
/// convenience.
pub use error::{RelayError, Result};
