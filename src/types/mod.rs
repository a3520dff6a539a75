//! Data types shared across the scheduler, Upstream Connection, and egress.
//!
//! - [`enums`] — wire-level enums (exchange, segment, mode, stream codes)
//! - [`instrument`] — catalog record used to classify instruments
//! - [`tick`] — raw and stored tick representations
//!
//! Enums are re-exported at the module root via `pub use enums::*`.

pub mod enums;
pub mod instrument;
pub mod tick;

pub use enums::*;
pub use instrument::Instrument;
pub use tick::{Tick, TickEntry};
