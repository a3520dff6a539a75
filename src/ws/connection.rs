//! A single Upstream Connection: one WebSocket to the broker's market feed,
//! carrying up to [`crate::constants::SYMBOLS_PER_CONNECTION`] instruments.
//!
//! Reconnection is *not* handled here — that's the Connection Supervisor's
//! job (see [`crate::supervisor`]). This type owns exactly one socket for as
//! long as it's alive and reports its own death through [`ConnectionEvent`].

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::constants::{WS_MARKET_FEED_URL, rate_limits::websocket::MAX_INSTRUMENTS_PER_SUBSCRIBE};
use crate::error::{RelayError, Result};
use crate::types::enums::Mode;
use crate::types::instrument::Instrument;
use crate::ws::codec::{FeedEvent, WireInstrument, decode_packet, encode_disconnect, encode_subscribe, encode_unsubscribe};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Events an Upstream Connection emits over its lifetime.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The socket finished its handshake and is ready for subscribe calls.
    Connected,
    /// A batch of ticks decoded from one or more frames.
    Ticks(Vec<crate::types::tick::Tick>),
    /// The server or transport closed the socket. The connection is dead;
    /// the Connection Supervisor decides whether to reconnect.
    Closed,
    /// A transport or protocol error occurred. Treated the same as `Closed`
    /// by callers, but logged with detail.
    Error(String),
}

fn wire_instrument(instrument: &Instrument) -> WireInstrument {
    WireInstrument::new(
        format!("{:?}", instrument.exchange),
        instrument.instrument_id.to_string(),
    )
}

/// A connected market feed WebSocket for one connection slot.
///
/// Produced by [`UpstreamConnection::connect`]. Events are delivered on the
/// channel returned alongside it; the connection itself is driven by a
/// background task and controlled through `subscribe`/`unsubscribe`/`close`.
pub struct UpstreamConnection {
    write: futures_util::stream::SplitSink<WsStream, Message>,
    reader_task: tokio::task::JoinHandle<()>,
}

impl UpstreamConnection {
    /// Open a WebSocket to the market feed and start reading frames.
    ///
    /// Returns the connection handle plus a receiver of [`ConnectionEvent`]s.
    /// The first event on the channel is always [`ConnectionEvent::Connected`].
    pub async fn connect(
        access_token: &str,
        client_id: &str,
    ) -> Result<(Self, mpsc::Receiver<ConnectionEvent>)> {
        let url = format!(
            "{WS_MARKET_FEED_URL}?version=2&token={access_token}&clientId={client_id}&authType=2"
        );

        let (ws, _resp) = connect_async(&url).await.map_err(|e| {
            RelayError::NetworkError(format!("market feed connect failed: {e}"))
        })?;
        let (write, mut read) = ws.split();

        let (tx, rx) = mpsc::channel(1024);
        let _ = tx.send(ConnectionEvent::Connected).await;

        let reader_tx = tx.clone();
        let reader_task = tokio::spawn(async move {
            loop {
                match read.next().await {
                    Some(Ok(Message::Binary(data))) => match decode_packet(&data) {
                        Ok(FeedEvent::Tick(tick)) => {
                            if reader_tx
                                .send(ConnectionEvent::Ticks(vec![tick]))
                                .await
                                .is_err()
                            {
                                break;
                            }
                        }
                        Ok(FeedEvent::Disconnect { reason_code }) => {
                            tracing::info!(reason_code, "upstream requested disconnect");
                            let _ = reader_tx.send(ConnectionEvent::Closed).await;
                            break;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to decode market feed packet");
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        let _ = reader_tx.send(ConnectionEvent::Closed).await;
                        break;
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        let _ = reader_tx.send(ConnectionEvent::Error(e.to_string())).await;
                        break;
                    }
                }
            }
        });

        tracing::info!("upstream connection established");
        Ok((Self { write, reader_task }, rx))
    }

    /// Subscribe a batch of instruments in the given mode, chunked to the
    /// broker's per-message instrument limit.
    pub async fn subscribe(&mut self, instruments: &[Instrument], mode: Mode) -> Result<()> {
        self.send_in_chunks(instruments, mode, true).await
    }

    /// Unsubscribe a batch of instruments in the given mode.
    pub async fn unsubscribe(&mut self, instruments: &[Instrument], mode: Mode) -> Result<()> {
        self.send_in_chunks(instruments, mode, false).await
    }

    /// Unsubscribe `from_mode` and subscribe the same instruments in
    /// `to_mode`. Used when an instrument's subscription depth changes.
    pub async fn set_mode(
        &mut self,
        instruments: &[Instrument],
        from_mode: Mode,
        to_mode: Mode,
    ) -> Result<()> {
        if from_mode == to_mode {
            return Ok(());
        }
        self.unsubscribe(instruments, from_mode).await?;
        self.subscribe(instruments, to_mode).await
    }

    /// Send the broker's disconnect envelope and close the socket.
    pub async fn close(mut self) -> Result<()> {
        let json = encode_disconnect()?;
        let _ = self.write.send(Message::Text(json.into())).await;
        let _ = self.write.send(Message::Close(None)).await;
        self.reader_task.abort();
        Ok(())
    }

    async fn send_in_chunks(
        &mut self,
        instruments: &[Instrument],
        mode: Mode,
        subscribing: bool,
    ) -> Result<()> {
        for chunk in instruments.chunks(MAX_INSTRUMENTS_PER_SUBSCRIBE as usize) {
            let wire: Vec<WireInstrument> = chunk.iter().map(wire_instrument).collect();
            let json = if subscribing {
                encode_subscribe(mode, &wire)?
            } else {
                encode_unsubscribe(mode, &wire)?
            };
            self.write
                .send(Message::Text(json.into()))
                .await
                .map_err(|e| RelayError::NetworkError(e.to_string()))?;
        }
        tracing::debug!(
            count = instruments.len(),
            mode = ?mode,
            subscribing,
            "sent subscription command"
        );
        Ok(())
    }
}

impl Drop for UpstreamConnection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}
