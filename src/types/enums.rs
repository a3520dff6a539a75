//! Shared enum types that map to the broker's wire values.
//!
//! Variant names use `SCREAMING_SNAKE_CASE` to match the JSON/catalog wire
//! format expected by the broker, so we suppress the Rust naming convention
//! lint.
#![allow(non_camel_case_types)]

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// Exchange an instrument trades on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Exchange {
    NSE,
    BSE,
    MCX,
    CDS,
}

// ---------------------------------------------------------------------------
// Segment
// ---------------------------------------------------------------------------

/// Exchange segment used to classify an instrument into the priority or
/// rotation subscription class (see [`crate::scheduler::classify`]).
///
/// Segments outside these four fall into neither class and are dropped at
/// classification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    /// Index value — priority class.
    INDICES,
    /// NSE futures — priority class.
    #[serde(rename = "NFO-FUT")]
    NFO_FUT,
    /// NSE options — rotation class.
    #[serde(rename = "NFO-OPT")]
    NFO_OPT,
    /// NSE cash — rotation class.
    NSE,
    /// Any other segment reported by the catalog. Neither priority nor
    /// rotation; dropped during classification.
    #[serde(other)]
    Other,
}

// ---------------------------------------------------------------------------
// Mode (subscription depth)
// ---------------------------------------------------------------------------

/// Depth/detail level requested for a set of subscribed instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mode {
    /// LTP only.
    Ticker,
    /// LTP + OHLC + volume.
    Quote,
    /// Quote + market depth + open interest. Implies OHLC is present.
    #[default]
    Full,
}

// ---------------------------------------------------------------------------
// Stream request code (wire protocol for the market feed WebSocket)
// ---------------------------------------------------------------------------

/// Request codes sent as the `RequestCode` field of subscribe/unsubscribe
/// envelopes over the market feed WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StreamRequestCode {
    /// Connect to feed.
    Connect = 11,
    /// Disconnect from feed.
    Disconnect = 12,
    /// Subscribe to Ticker-mode packets.
    SubscribeTicker = 15,
    /// Unsubscribe from Ticker-mode packets.
    UnsubscribeTicker = 16,
    /// Subscribe to Quote-mode packets.
    SubscribeQuote = 17,
    /// Unsubscribe from Quote-mode packets.
    UnsubscribeQuote = 18,
    /// Subscribe to Full-mode packets.
    SubscribeFull = 21,
    /// Unsubscribe from Full-mode packets.
    UnsubscribeFull = 22,
}

impl StreamRequestCode {
    /// The subscribe code for a given [`Mode`].
    pub fn subscribe(mode: Mode) -> Self {
        match mode {
            Mode::Ticker => Self::SubscribeTicker,
            Mode::Quote => Self::SubscribeQuote,
            Mode::Full => Self::SubscribeFull,
        }
    }

    /// The unsubscribe code for a given [`Mode`].
    pub fn unsubscribe(mode: Mode) -> Self {
        match mode {
            Mode::Ticker => Self::UnsubscribeTicker,
            Mode::Quote => Self::UnsubscribeQuote,
            Mode::Full => Self::UnsubscribeFull,
        }
    }
}

/// Response codes received in binary market feed packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StreamResponseCode {
    /// Ticker packet (LTP only).
    Ticker = 2,
    /// Quote packet (LTP + OHLC + volume).
    Quote = 4,
    /// Full packet (quote + depth + OI).
    Full = 8,
    /// Server-initiated disconnect.
    Disconnect = 50,
}

impl StreamResponseCode {
    /// Parse a response code from the first byte of a binary packet header.
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            2 => Some(Self::Ticker),
            4 => Some(Self::Quote),
            8 => Some(Self::Full),
            50 => Some(Self::Disconnect),
            _ => None,
        }
    }
}
