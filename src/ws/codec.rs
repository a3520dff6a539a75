//! Wire protocol for the market feed WebSocket: JSON subscribe/unsubscribe
//! envelopes out, binary tick packets in.

use serde::Serialize;

use crate::error::{RelayError, Result};
use crate::types::enums::{Mode, StreamRequestCode, StreamResponseCode};
use crate::types::tick::Tick;

// ---------------------------------------------------------------------------
// Outbound: subscribe / unsubscribe / disconnect envelopes
// ---------------------------------------------------------------------------

/// One instrument reference as it appears on the wire subscribe envelope.
#[derive(Debug, Clone, Serialize)]
#[allow(non_snake_case)]
pub struct WireInstrument {
    pub ExchangeSegment: String,
    pub SecurityId: String,
}

impl WireInstrument {
    pub fn new(exchange_segment: impl Into<String>, security_id: impl Into<String>) -> Self {
        Self {
            ExchangeSegment: exchange_segment.into(),
            SecurityId: security_id.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
struct SubscribeEnvelope {
    RequestCode: u8,
    InstrumentCount: usize,
    InstrumentList: Vec<WireInstrument>,
}

#[derive(Debug, Serialize)]
#[allow(non_snake_case)]
struct DisconnectEnvelope {
    RequestCode: u8,
}

/// Build the JSON text for a subscribe request in the given mode. Caller is
/// responsible for chunking `instruments` to
/// [`crate::constants::rate_limits::websocket::MAX_INSTRUMENTS_PER_SUBSCRIBE`]
/// per message.
pub fn encode_subscribe(mode: Mode, instruments: &[WireInstrument]) -> Result<String> {
    let req = SubscribeEnvelope {
        RequestCode: StreamRequestCode::subscribe(mode) as u8,
        InstrumentCount: instruments.len(),
        InstrumentList: instruments.to_vec(),
    };
    Ok(serde_json::to_string(&req)?)
}

/// Build the JSON text for an unsubscribe request in the given mode.
pub fn encode_unsubscribe(mode: Mode, instruments: &[WireInstrument]) -> Result<String> {
    let req = SubscribeEnvelope {
        RequestCode: StreamRequestCode::unsubscribe(mode) as u8,
        InstrumentCount: instruments.len(),
        InstrumentList: instruments.to_vec(),
    };
    Ok(serde_json::to_string(&req)?)
}

/// Build the JSON text for a disconnect request.
pub fn encode_disconnect() -> Result<String> {
    let req = DisconnectEnvelope {
        RequestCode: StreamRequestCode::Disconnect as u8,
    };
    Ok(serde_json::to_string(&req)?)
}

// ---------------------------------------------------------------------------
// Inbound: binary packet header + payload
// ---------------------------------------------------------------------------

/// Header parsed from the first 8 bytes of every binary packet.
#[derive(Debug, Clone, Copy)]
pub struct PacketHeader {
    pub response_code: StreamResponseCode,
    pub message_length: u16,
    pub security_id: u32,
}

/// A decoded market feed frame.
#[derive(Debug, Clone, Copy)]
pub enum FeedEvent {
    /// A price update for one instrument.
    Tick(Tick),
    /// Server-initiated disconnect.
    Disconnect { reason_code: i16 },
}

#[inline(always)]
fn read_u8(data: &[u8], offset: &mut usize) -> u8 {
    let v = data[*offset];
    *offset += 1;
    v
}

#[inline(always)]
fn read_i16_le(data: &[u8], offset: &mut usize) -> i16 {
    let v = i16::from_le_bytes([data[*offset], data[*offset + 1]]);
    *offset += 2;
    v
}

#[inline(always)]
fn read_i32_le(data: &[u8], offset: &mut usize) -> i32 {
    let v = i32::from_le_bytes(data[*offset..*offset + 4].try_into().unwrap());
    *offset += 4;
    v
}

#[inline(always)]
fn read_u16_le(data: &[u8], offset: &mut usize) -> u16 {
    let v = u16::from_le_bytes([data[*offset], data[*offset + 1]]);
    *offset += 2;
    v
}

#[inline(always)]
fn read_u32_le(data: &[u8], offset: &mut usize) -> u32 {
    let v = u32::from_le_bytes(data[*offset..*offset + 4].try_into().unwrap());
    *offset += 4;
    v
}

#[inline(always)]
fn read_f32_le(data: &[u8], offset: &mut usize) -> f32 {
    let v = f32::from_le_bytes(data[*offset..*offset + 4].try_into().unwrap());
    *offset += 4;
    v
}

fn parse_header(data: &[u8]) -> Result<PacketHeader> {
    if data.len() < 8 {
        return Err(RelayError::ProtocolError(format!(
            "packet too short for header: {} bytes",
            data.len()
        )));
    }
    let mut off = 0usize;
    let response_code_byte = read_u8(data, &mut off);
    let response_code = StreamResponseCode::from_byte(response_code_byte).ok_or_else(|| {
        RelayError::ProtocolError(format!("unknown stream response code: {response_code_byte}"))
    })?;
    let message_length = read_u16_le(data, &mut off);
    off += 1; // exchange segment byte, not modeled here
    let security_id = read_u32_le(data, &mut off);

    Ok(PacketHeader {
        response_code,
        message_length,
        security_id,
    })
}

/// Decode one binary market feed frame.
pub fn decode_packet(data: &[u8]) -> Result<FeedEvent> {
    let header = parse_header(data)?;
    let payload = &data[8..];

    match header.response_code {
        StreamResponseCode::Ticker => {
            if payload.len() < 8 {
                return Err(RelayError::ProtocolError("ticker payload too short".into()));
            }
            let mut off = 0;
            let ltp = read_f32_le(payload, &mut off);
            Ok(FeedEvent::Tick(Tick {
                instrument_id: header.security_id,
                last_price: ltp as f64,
                close_price: None,
                change: None,
            }))
        }

        StreamResponseCode::Quote => {
            if payload.len() < 42 {
                return Err(RelayError::ProtocolError(format!(
                    "quote payload too short: {} bytes",
                    payload.len()
                )));
            }
            let mut off = 0;
            let ltp = read_f32_le(payload, &mut off);
            let _last_qty = read_i16_le(payload, &mut off);
            let _ltt = read_i32_le(payload, &mut off);
            let _atp = read_f32_le(payload, &mut off);
            let _volume = read_i32_le(payload, &mut off);
            let _total_sell_qty = read_i32_le(payload, &mut off);
            let _total_buy_qty = read_i32_le(payload, &mut off);
            let _open = read_f32_le(payload, &mut off);
            let close = read_f32_le(payload, &mut off);
            Ok(FeedEvent::Tick(Tick {
                instrument_id: header.security_id,
                last_price: ltp as f64,
                close_price: Some(close as f64),
                change: None,
            }))
        }

        // Full carries the same leading fields as Quote, but with 3 extra
        // i32 open-interest fields (oi, oi_day_high, oi_day_low) spliced in
        // ahead of open/close/high/low — see the teacher's `parse_packet`
        // Full arm. Skipping them is required to land on the real close
        // offset (42, not 30).
        StreamResponseCode::Full => {
            if payload.len() < 46 {
                return Err(RelayError::ProtocolError(format!(
                    "full payload too short: {} bytes",
                    payload.len()
                )));
            }
            let mut off = 0;
            let ltp = read_f32_le(payload, &mut off);
            let _last_qty = read_i16_le(payload, &mut off);
            let _ltt = read_i32_le(payload, &mut off);
            let _atp = read_f32_le(payload, &mut off);
            let _volume = read_i32_le(payload, &mut off);
            let _total_sell_qty = read_i32_le(payload, &mut off);
            let _total_buy_qty = read_i32_le(payload, &mut off);
            let _oi = read_i32_le(payload, &mut off);
            let _oi_day_high = read_i32_le(payload, &mut off);
            let _oi_day_low = read_i32_le(payload, &mut off);
            let _open = read_f32_le(payload, &mut off);
            let close = read_f32_le(payload, &mut off);
            Ok(FeedEvent::Tick(Tick {
                instrument_id: header.security_id,
                last_price: ltp as f64,
                close_price: Some(close as f64),
                change: None,
            }))
        }

        StreamResponseCode::Disconnect => {
            if payload.len() < 2 {
                return Err(RelayError::ProtocolError(
                    "disconnect payload too short".into(),
                ));
            }
            let mut off = 0;
            let reason_code = read_i16_le(payload, &mut off);
            Ok(FeedEvent::Disconnect { reason_code })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker_packet(security_id: u32, ltp: f32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(StreamResponseCode::Ticker as u8);
        buf.extend_from_slice(&10u16.to_le_bytes());
        buf.push(1); // exchange segment, unused
        buf.extend_from_slice(&security_id.to_le_bytes());
        buf.extend_from_slice(&ltp.to_le_bytes());
        buf.extend_from_slice(&0i32.to_le_bytes());
        buf
    }

    #[test]
    fn decodes_ticker_packet() {
        let packet = ticker_packet(42, 101.5);
        match decode_packet(&packet).unwrap() {
            FeedEvent::Tick(tick) => {
                assert_eq!(tick.instrument_id, 42);
                assert_eq!(tick.last_price, 101.5_f32 as f64);
                assert_eq!(tick.close_price, None);
            }
            _ => panic!("expected tick"),
        }
    }

    /// Builds a Full-mode payload matching the teacher's `parse_packet`
    /// Full arm layout: the common quote fields, then 3 `i32` OI fields,
    /// then `open`/`close`/... — `close` lands at payload offset 42, not
    /// 30 as it does for Quote.
    fn full_packet(security_id: u32, ltp: f32, open: f32, close: f32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.push(StreamResponseCode::Full as u8);
        buf.extend_from_slice(&46u16.to_le_bytes());
        buf.push(1); // exchange segment, unused
        buf.extend_from_slice(&security_id.to_le_bytes());
        buf.extend_from_slice(&ltp.to_le_bytes());
        buf.extend_from_slice(&0i16.to_le_bytes()); // last_qty
        buf.extend_from_slice(&0i32.to_le_bytes()); // ltt
        buf.extend_from_slice(&0f32.to_le_bytes()); // atp
        buf.extend_from_slice(&0i32.to_le_bytes()); // volume
        buf.extend_from_slice(&0i32.to_le_bytes()); // total_sell_qty
        buf.extend_from_slice(&0i32.to_le_bytes()); // total_buy_qty
        buf.extend_from_slice(&0i32.to_le_bytes()); // oi
        buf.extend_from_slice(&0i32.to_le_bytes()); // oi_day_high
        buf.extend_from_slice(&0i32.to_le_bytes()); // oi_day_low
        buf.extend_from_slice(&open.to_le_bytes());
        buf.extend_from_slice(&close.to_le_bytes());
        buf
    }

    #[test]
    fn decodes_full_packet_past_the_oi_fields_to_the_real_close_offset() {
        let packet = full_packet(99, 250.25, 240.0, 238.5);
        match decode_packet(&packet).unwrap() {
            FeedEvent::Tick(tick) => {
                assert_eq!(tick.instrument_id, 99);
                assert_eq!(tick.last_price, 250.25_f32 as f64);
                assert_eq!(tick.close_price, Some(238.5_f32 as f64));
            }
            _ => panic!("expected tick"),
        }
    }

    #[test]
    fn rejects_full_packet_too_short_to_reach_close() {
        // Long enough to pass the Quote payload's 42-byte minimum, but
        // short of Full's real close offset (46).
        let mut buf = vec![StreamResponseCode::Full as u8];
        buf.extend_from_slice(&40u16.to_le_bytes());
        buf.push(1);
        buf.extend_from_slice(&1u32.to_le_bytes());
        buf.extend_from_slice(&[0u8; 40]);
        assert!(decode_packet(&buf).is_err());
    }

    #[test]
    fn rejects_short_packet() {
        assert!(decode_packet(&[1, 2, 3]).is_err());
    }

    #[test]
    fn rejects_unknown_response_code() {
        let mut buf = vec![200u8];
        buf.extend_from_slice(&0u16.to_le_bytes());
        buf.push(0);
        buf.extend_from_slice(&0u32.to_le_bytes());
        assert!(decode_packet(&buf).is_err());
    }
}
