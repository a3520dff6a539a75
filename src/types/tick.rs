//! Tick records: what the broker delivers, and what the Tick Store holds.

use serde::{Deserialize, Serialize};

/// A single price update for one instrument, as delivered by the Upstream
/// Connection.
///
/// `close_price` and `change` are broker-reported and may be absent — see
/// [`TickEntry::derive`] for the fallback rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Instrument this tick belongs to.
    pub instrument_id: u32,
    /// Last traded price.
    pub last_price: f64,
    /// Previous close price. Falls back to `last_price` when absent.
    pub close_price: Option<f64>,
    /// Broker-reported change. Falls back to `0.0` when absent.
    pub change: Option<f64>,
}

/// The Tick Store's resting representation of the latest known tick for one
/// instrument.
///
/// `change` and `net_change` are derived once, at write time, from the raw
/// [`Tick`] — see [`TickEntry::derive`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TickEntry {
    /// Instrument this entry belongs to.
    pub instrument_token: u32,
    /// Last traded price.
    pub last_price: f64,
    /// Broker-reported change, rounded to 2 decimal places.
    pub change: f64,
    /// `last_price - close_price`, rounded to 2 decimal places.
    pub net_change: f64,
}

impl TickEntry {
    /// Derive a stored entry from a raw tick, applying the fallback and
    /// rounding rules of the data model: `close` defaults to `last_price`
    /// when absent, `change` defaults to `0.0` when absent, and both
    /// `change` and `net_change` are rounded to 2 decimal places.
    pub fn derive(tick: &Tick) -> Self {
        let close_price = tick.close_price.unwrap_or(tick.last_price);
        let change = tick.change.unwrap_or(0.0);
        Self {
            instrument_token: tick.instrument_id,
            last_price: tick.last_price,
            change: round_2dp(change),
            net_change: round_2dp(tick.last_price - close_price),
        }
    }
}

/// Round to 2 decimal places, matching the broker's own display precision
/// for `change` and `net_change`.
fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_change_and_net_change_with_rounding() {
        let tick = Tick {
            instrument_id: 7,
            last_price: 100.0,
            close_price: Some(95.0),
            change: Some(5.12345),
        };
        let entry = TickEntry::derive(&tick);
        assert_eq!(entry.instrument_token, 7);
        assert_eq!(entry.last_price, 100.0);
        assert_eq!(entry.change, 5.12);
        assert_eq!(entry.net_change, 5.00);
    }

    #[test]
    fn missing_ohlc_and_change_fall_back_to_defaults() {
        let tick = Tick {
            instrument_id: 9,
            last_price: 42.5,
            close_price: None,
            change: None,
        };
        let entry = TickEntry::derive(&tick);
        assert_eq!(entry.change, 0.0);
        assert_eq!(entry.net_change, 0.0);
    }
}
