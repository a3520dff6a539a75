//! Tunable constants for the subscription scheduler.
//!
//! Every one of these can be overridden via the environment (see
//! [`crate::config`]); the values here are the fallback used when the
//! corresponding environment variable is unset.

/// Base URL for the broker's REST API.
pub const API_BASE_URL: &str = "https://api.broker.example";

/// Base URL for authentication endpoints.
pub const AUTH_BASE_URL: &str = "https://auth.broker.example";

/// WebSocket endpoint for the live market feed.
pub const WS_MARKET_FEED_URL: &str = "wss://feed.broker.example";

/// Instrument catalog endpoint, fetched on cache miss/expiry.
pub const INSTRUMENTS_URL: &str = "https://api.broker.example/instruments";

// ---------------------------------------------------------------------------
// Scheduler tunables
// ---------------------------------------------------------------------------

/// Maximum instruments subscribed per connection (`N`).
pub const SYMBOLS_PER_CONNECTION: usize = 3_000;

/// Maximum number of concurrent upstream connections.
pub const MAX_CONNECTIONS: u8 = 3;

/// Number of positions a rotation queue advances per cycle.
pub const ROTATION_STRIDE: usize = 300;

/// Time between rotation cycles.
pub const CYCLE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(10);

/// Minimum gap between an unsubscribe and a following subscribe on the same
/// connection, to respect broker rate limits.
pub const INTER_COMMAND_GAP: std::time::Duration = std::time::Duration::from_secs(1);

/// Maximum reconnection attempts before the Connection Supervisor gives up.
pub const MAX_RETRIES: u32 = 3;

/// Delay between reconnection attempts.
pub const RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(2);

/// How long a cached instrument catalog remains valid before re-fetching.
pub const CATALOG_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(24 * 60 * 60);

// ---------------------------------------------------------------------------
// Wire-level limits
// ---------------------------------------------------------------------------

/// Broker-imposed limits on the subscribe/unsubscribe wire protocol.
pub mod rate_limits {
    /// WebSocket constraints.
    pub mod websocket {
        /// Maximum instruments per single subscribe/unsubscribe message.
        pub const MAX_INSTRUMENTS_PER_SUBSCRIBE: u32 = 100;
        /// Server ping interval in seconds.
        pub const PING_INTERVAL_SECS: u32 = 10;
        /// Connection timeout if no pong response (in seconds).
        pub const PONG_TIMEOUT_SECS: u32 = 40;
    }

    /// Instrument catalog API constraints.
    pub mod instruments {
        /// Maximum instrument API requests per second.
        pub const PER_SECOND: u32 = 20;
    }
}
