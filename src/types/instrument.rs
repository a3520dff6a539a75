//! Instrument catalog record.

use serde::{Deserialize, Serialize};

use crate::types::enums::{Exchange, Segment};

/// An immutable reference record for one tradable instrument, as delivered
/// by the instrument catalog.
///
/// Only the fields the scheduler and Upstream Connection need are modeled
/// here; catalog fields irrelevant to scheduling (tick size, lot size,
/// expiry, strike, ...) are out of scope for this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    /// Broker-assigned instrument id, unique across the catalog.
    pub instrument_id: u32,
    /// Trading symbol, e.g. `"RELIANCE"`.
    pub symbol: String,
    /// Exchange the instrument trades on.
    pub exchange: Exchange,
    /// Exchange segment, used to classify the instrument into the priority
    /// or rotation subscription class.
    pub segment: Segment,
}

impl Instrument {
    /// Construct an instrument record.
    pub fn new(
        instrument_id: u32,
        symbol: impl Into<String>,
        exchange: Exchange,
        segment: Segment,
    ) -> Self {
        Self {
            instrument_id,
            symbol: symbol.into(),
            exchange,
            segment,
        }
    }
}
