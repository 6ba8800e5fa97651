use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_util::sync::CancellationToken;

use crate::types::{EngineEvent, FailureKind, TransportError};
use crate::wire::{parse_server_frame, ClientEvent};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Lazily connected bidirectional event channel to the server.
///
/// Text frames carry JSON event envelopes, binary frames carry microphone
/// audio. A dropped connection is reported once as
/// [`EngineEvent::ChannelDisconnected`] and re-established on the next send.
pub struct EventChannel {
    url: String,
    sink: Arc<dyn EventSink>,
    outgoing: Option<mpsc::UnboundedSender<WsMessage>>,
    shutdown: CancellationToken,
}

impl EventChannel {
    pub fn new(url: impl Into<String>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            url: url.into(),
            sink,
            outgoing: None,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.outgoing.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Connects if needed and returns a sender for raw frames.
    pub async fn sender(&mut self) -> Result<mpsc::UnboundedSender<WsMessage>, TransportError> {
        if let Some(tx) = self.outgoing.as_ref().filter(|tx| !tx.is_closed()) {
            return Ok(tx.clone());
        }

        listen_logging::listen_info!("connecting event channel {}", self.url);
        let (stream, _) = tokio_tungstenite::connect_async(self.url.as_str())
            .await
            .map_err(|err| TransportError::new(FailureKind::ChannelClosed, err.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.shutdown = CancellationToken::new();
        tokio::spawn(run_connection(
            stream,
            rx,
            self.sink.clone(),
            self.shutdown.clone(),
        ));
        self.outgoing = Some(tx.clone());
        Ok(tx)
    }

    pub async fn send(&mut self, event: &ClientEvent) -> Result<(), TransportError> {
        let tx = self.sender().await?;
        listen_logging::listen_debug!("channel -> {}", event.name());
        tx.send(WsMessage::Text(event.to_frame()))
            .map_err(|_| TransportError::new(FailureKind::ChannelClosed, "connection closed"))
    }

    /// Closes the connection without reporting a disconnect, even while
    /// senders handed out by [`EventChannel::sender`] are still alive.
    pub fn close(&mut self) {
        self.shutdown.cancel();
        self.outgoing = None;
    }
}

async fn run_connection<S>(
    stream: tokio_tungstenite::WebSocketStream<S>,
    mut outgoing: mpsc::UnboundedReceiver<WsMessage>,
    sink: Arc<dyn EventSink>,
    shutdown: CancellationToken,
) where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut ws_sink, mut ws_stream) = stream.split();

    let reason = loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = ws_sink.close().await;
                listen_logging::listen_debug!("event channel shut down");
                return;
            }
            frame = ws_stream.next() => match frame {
                Some(Ok(WsMessage::Text(text))) => match parse_server_frame(&text) {
                    Ok(Some(event)) => sink.emit(EngineEvent::Server(event)),
                    Ok(None) => {
                        listen_logging::listen_trace!("ignoring channel frame {text}");
                    }
                    Err(err) => {
                        listen_logging::listen_warn!("unreadable channel frame: {err}");
                    }
                },
                Some(Ok(WsMessage::Close(frame))) => {
                    break frame
                        .map(|frame| frame.reason.to_string())
                        .filter(|reason| !reason.is_empty())
                        .unwrap_or_else(|| "server closed the connection".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => break err.to_string(),
                None => break "connection closed".to_string(),
            },
            message = outgoing.recv() => match message {
                Some(message) => {
                    if let Err(err) = ws_sink.send(message).await {
                        break err.to_string();
                    }
                }
                None => {
                    let _ = ws_sink.close().await;
                    listen_logging::listen_debug!("event channel closed by client");
                    return;
                }
            },
        }
    };

    listen_logging::listen_warn!("event channel disconnected: {reason}");
    sink.emit(EngineEvent::ChannelDisconnected(reason));
}
