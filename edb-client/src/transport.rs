//! WebSocket transport
//!
//! Owns the only read and write access to the socket. [`open`] performs the
//! handshake and splits the stream into a [`TransportSender`] and a
//! [`TransportReceiver`]; both halves are owned by the connection event loop.
//!
//! The receiver delivers frames in the order the peer sent them and reports a
//! terminal event ([`TransportEvent::Closed`] or [`TransportEvent::Error`])
//! at most once. After that it only yields `None`.

use crate::endpoint::Endpoint;
use edb_core::TransportError;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Event observed on the inbound half of the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A text frame from the node
    Message(String),
    /// The connection was closed, with the peer's close code if one was sent
    Closed {
        /// WebSocket close code
        code: Option<u16>,
        /// Close reason, possibly empty
        reason: String,
    },
    /// The socket failed
    Error(String),
}

impl TransportEvent {
    /// True for events after which the connection is gone
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransportEvent::Message(_))
    }

    /// The failure broadcast to pending requests, for terminal events
    pub fn into_error(self) -> Option<TransportError> {
        match self {
            TransportEvent::Message(_) => None,
            TransportEvent::Closed { code, reason } => Some(TransportError::Closed { code, reason }),
            TransportEvent::Error(e) => Some(TransportError::Socket(e)),
        }
    }
}

/// Outbound half of an open connection
pub struct TransportSender {
    sink: SplitSink<WsStream, Message>,
    closed: bool,
}

/// Inbound half of an open connection
pub struct TransportReceiver {
    stream: SplitStream<WsStream>,
    terminated: bool,
}

/// Open a connection to `endpoint`, giving up after `connect_timeout`
#[tracing::instrument(skip(endpoint), fields(url = %endpoint))]
pub async fn open(
    endpoint: &Endpoint,
    connect_timeout: Duration,
) -> Result<(TransportSender, TransportReceiver), TransportError> {
    let (ws_stream, _) = tokio::time::timeout(connect_timeout, connect_async(endpoint.url()))
        .await
        .map_err(|_| TransportError::Connect(format!("timed out after {:?}", connect_timeout)))?
        .map_err(|e| TransportError::Connect(e.to_string()))?;

    tracing::debug!("WebSocket handshake complete");

    let (sink, stream) = ws_stream.split();
    Ok((
        TransportSender {
            sink,
            closed: false,
        },
        TransportReceiver {
            stream,
            terminated: false,
        },
    ))
}

impl TransportSender {
    /// Write one text frame
    pub async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Send("connection is closed".to_string()));
        }
        self.sink
            .send(Message::Text(text))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    /// Send a close frame; later sends fail
    pub async fn close(&mut self, code: u16, reason: &str) {
        if self.closed {
            return;
        }
        self.closed = true;

        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: Cow::Owned(reason.to_string()),
        };
        if let Err(e) = self.sink.send(Message::Close(Some(frame))).await {
            tracing::debug!(error = %e, "Close frame not delivered");
        }
    }
}

impl TransportReceiver {
    /// Wait for the next event; `None` once a terminal event was delivered
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        if self.terminated {
            return None;
        }

        loop {
            let event = match self.stream.next().await {
                Some(Ok(Message::Text(text))) => TransportEvent::Message(text),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => TransportEvent::Message(text),
                    Err(_) => {
                        tracing::warn!("Ignoring non UTF-8 binary frame");
                        continue;
                    }
                },
                Some(Ok(Message::Close(frame))) => match frame {
                    Some(frame) => TransportEvent::Closed {
                        code: Some(u16::from(frame.code)),
                        reason: frame.reason.into_owned(),
                    },
                    None => TransportEvent::Closed {
                        code: None,
                        reason: String::new(),
                    },
                },
                // Pings are answered by tungstenite itself
                Some(Ok(_)) => continue,
                Some(Err(tungstenite::Error::ConnectionClosed))
                | Some(Err(tungstenite::Error::AlreadyClosed))
                | None => TransportEvent::Closed {
                    code: None,
                    reason: "stream ended".to_string(),
                },
                Some(Err(e)) => TransportEvent::Error(e.to_string()),
            };

            if event.is_terminal() {
                self.terminated = true;
            }
            return Some(event);
        }
    }
}
