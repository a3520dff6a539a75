//! WebSocket transport for the market feed.
//!
//! - [`codec`] — wire-level subscribe/unsubscribe envelopes and binary tick
//!   packet decoding.
//! - [`connection`] — a single Upstream Connection, reconnected from the
//!   outside by [`crate::supervisor`].

pub mod codec;
pub mod connection;
