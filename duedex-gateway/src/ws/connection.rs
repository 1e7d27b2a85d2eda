//! One physical WebSocket connection, split into reader and writer halves.
//!
//! A connection is never reused: every reconnect attempt calls [`connect`] again.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use duedex_core::error::NetworkError;
use duedex_telemetry::masking::SensitiveDataMasker;
use tracing::{trace, warn};

use super::config::WebSocketConfig;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What a read produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    /// A complete text message.
    Text(String),
    /// The peer answered a ping.
    Pong,
}

/// Read half of a connection.
pub struct WsReader {
    stream: SplitStream<WsStream>,
}

/// Write half of a connection.
pub struct WsWriter {
    sink: SplitSink<WsStream, Message>,
}

/// Opens a connection to `config.url` within the configured timeout.
pub async fn connect(config: &WebSocketConfig) -> Result<(WsWriter, WsReader), NetworkError> {
    let (stream, _) = timeout(config.connect_timeout(), connect_async(config.url.as_str()))
        .await
        .map_err(|_| NetworkError::Timeout {
            timeout_ms: config.connect_timeout_ms,
        })?
        .map_err(|e| NetworkError::ConnectionFailed {
            reason: e.to_string(),
        })?;

    let (sink, stream) = stream.split();
    Ok((WsWriter { sink }, WsReader { stream }))
}

impl WsReader {
    /// Waits for the next complete text message or pong.
    ///
    /// Fragmented frames are reassembled by the protocol layer, so a returned
    /// text is always a whole message. Server pings are answered by the
    /// protocol layer on the next read or write. A close frame or end of
    /// stream is reported as `ConnectionClosed`.
    pub async fn next(&mut self) -> Result<Incoming, NetworkError> {
        loop {
            let message = match self.stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(e)) => {
                    return Err(NetworkError::WebSocket {
                        reason: e.to_string(),
                    });
                }
                None => {
                    return Err(NetworkError::ConnectionClosed {
                        reason: "stream ended".to_string(),
                    });
                }
            };

            match message {
                Message::Text(text) => {
                    trace!(len = text.len(), "Text message received");
                    return Ok(Incoming::Text(text));
                }
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => return Ok(Incoming::Text(text)),
                    Err(e) => warn!(error = %e, "Dropping non UTF-8 binary message"),
                },
                Message::Ping(_) => trace!("Ping received"),
                Message::Pong(_) => {
                    trace!("Pong received");
                    return Ok(Incoming::Pong);
                }
                Message::Close(frame) => {
                    let reason = frame.map_or_else(
                        || "close frame".to_string(),
                        |f| format!("{} {}", u16::from(f.code), f.reason),
                    );
                    return Err(NetworkError::ConnectionClosed { reason });
                }
                Message::Frame(_) => {}
            }
        }
    }
}

impl WsWriter {
    /// Sends a text message.
    pub async fn send_text(&mut self, text: String) -> Result<(), NetworkError> {
        self.send(Message::Text(text)).await
    }

    /// Serializes `value` and sends it as a text message.
    pub async fn send_json<T: Serialize>(&mut self, value: &T) -> Result<(), NetworkError> {
        let json = serde_json::to_string(value).map_err(|e| NetworkError::SendFailed {
            reason: format!("Failed to serialize: {e}"),
        })?;
        trace!(message = %SensitiveDataMasker::new().mask_string(&json), "Sending message");
        self.send_text(json).await
    }

    /// Sends a ping with an empty payload.
    pub async fn ping(&mut self) -> Result<(), NetworkError> {
        self.send(Message::Ping(Vec::new())).await
    }

    /// Sends a close frame; errors are ignored since the socket is going away.
    pub async fn close(&mut self) {
        let _ = self.sink.close().await;
    }

    async fn send(&mut self, message: Message) -> Result<(), NetworkError> {
        self.sink
            .send(message)
            .await
            .map_err(|e| NetworkError::SendFailed {
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_connect_refused_is_connection_failed() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = WebSocketConfig::new(format!("ws://{addr}"));
        let result = connect(&config).await;
        assert!(matches!(result, Err(NetworkError::ConnectionFailed { .. })));
    }

    #[tokio::test]
    async fn test_connect_timeout() {
        // Accepts TCP but never completes the WebSocket handshake.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut config = WebSocketConfig::new(format!("ws://{addr}"));
        config.connect_timeout_ms = 100;
        let result = connect(&config).await;
        assert_eq!(result.err(), Some(NetworkError::Timeout { timeout_ms: 100 }));
    }

    #[tokio::test]
    async fn test_text_binary_and_close() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            ws.send(Message::Text("hello".to_string())).await.unwrap();
            ws.send(Message::Binary(b"{\"type\":\"auth\"}".to_vec()))
                .await
                .unwrap();
            ws.send(Message::Ping(vec![1, 2])).await.unwrap();
            ws.send(Message::Text("after ping".to_string())).await.unwrap();
            let mut pong_seen = false;
            loop {
                match ws.next().await.unwrap().unwrap() {
                    Message::Pong(payload) => {
                        assert_eq!(payload, vec![1, 2]);
                        pong_seen = true;
                    }
                    Message::Text(text) => {
                        assert_eq!(text, "reply");
                        break;
                    }
                    other => panic!("unexpected message: {other:?}"),
                }
            }
            assert!(pong_seen);
            ws.close(None).await.unwrap();
        });

        let config = WebSocketConfig::new(format!("ws://{addr}"));
        let (mut writer, mut reader) = connect(&config).await.unwrap();

        assert_eq!(reader.next().await.unwrap(), Incoming::Text("hello".to_string()));
        assert_eq!(
            reader.next().await.unwrap(),
            Incoming::Text("{\"type\":\"auth\"}".to_string())
        );
        assert_eq!(reader.next().await.unwrap(), Incoming::Text("after ping".to_string()));
        writer.send_text("reply".to_string()).await.unwrap();
        assert!(matches!(
            reader.next().await,
            Err(NetworkError::ConnectionClosed { .. })
        ));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_ping_answered_with_pong() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(socket).await.unwrap();
            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }
        });

        let config = WebSocketConfig::new(format!("ws://{addr}"));
        let (mut writer, mut reader) = connect(&config).await.unwrap();
        writer.ping().await.unwrap();
        let incoming = tokio::time::timeout(Duration::from_secs(5), reader.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(incoming, Incoming::Pong);

        writer.close().await;
        server.await.unwrap();
    }
}
