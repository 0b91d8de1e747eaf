//! Connection client for the tandem relay

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use url::Url;

use tandem_protocol::{Envelope, EnvelopeCodec};
use tandem_utils::{Result, TandemError};

use super::handler::EnvelopeSender;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Client connection to the tandem relay
pub struct Connection {
    /// Relay address (`tcp://host:port` or bare `host:port`)
    connect_addr: String,
    /// Current state
    state: ConnectionState,
    /// Channel for outgoing envelopes
    tx: mpsc::Sender<Envelope>,
    /// Channel for incoming envelopes
    rx: mpsc::Receiver<Envelope>,
    /// Handle to the connection task
    task_handle: Option<tokio::task::JoinHandle<()>>,
}

impl Connection {
    /// Create a new connection (not yet connected)
    pub fn new(addr: impl Into<String>) -> Self {
        let (tx, _) = mpsc::channel(100);
        let (_, rx) = mpsc::channel(100);

        Self {
            connect_addr: addr.into(),
            state: ConnectionState::Disconnected,
            tx,
            rx,
            task_handle: None,
        }
    }

    /// Get current connection state
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Connect to the relay
    pub async fn connect(&mut self) -> Result<()> {
        if self.state == ConnectionState::Connected {
            return Ok(());
        }

        self.state = ConnectionState::Connecting;

        let addr = match parse_addr(&self.connect_addr) {
            Ok(addr) => addr,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(e);
            }
        };

        let stream = match TcpStream::connect(&addr).await {
            Ok(stream) => stream,
            Err(_) => {
                self.state = ConnectionState::Disconnected;
                return Err(TandemError::RelayNotRunning { addr });
            }
        };

        let framed = Framed::new(stream, EnvelopeCodec::new());

        let (outgoing_tx, outgoing_rx) = mpsc::channel::<Envelope>(100);
        let (incoming_tx, incoming_rx) = mpsc::channel::<Envelope>(100);

        self.tx = outgoing_tx;
        self.rx = incoming_rx;

        let handle = tokio::spawn(Self::connection_task(framed, outgoing_rx, incoming_tx));
        self.task_handle = Some(handle);

        self.state = ConnectionState::Connected;
        Ok(())
    }

    /// Disconnect from the relay
    pub async fn disconnect(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
        self.state = ConnectionState::Disconnected;
    }

    /// Send an envelope to the relay
    pub async fn send(&self, envelope: Envelope) -> Result<()> {
        if self.state != ConnectionState::Connected {
            return Err(TandemError::connection("Not connected"));
        }

        self.tx
            .send(envelope)
            .await
            .map_err(|_| TandemError::ConnectionClosed)?;

        Ok(())
    }

    /// Receive the next inbound envelope (blocking)
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }

    /// Try to receive without blocking
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }

    /// Get a clonable outbound handle for the engine
    pub fn sender(&self) -> EnvelopeSender {
        EnvelopeSender::new(self.tx.clone())
    }

    /// Background task that handles the actual socket I/O
    async fn connection_task(
        mut framed: Framed<TcpStream, EnvelopeCodec>,
        mut outgoing: mpsc::Receiver<Envelope>,
        incoming: mpsc::Sender<Envelope>,
    ) {
        loop {
            tokio::select! {
                // Handle outgoing envelopes
                Some(envelope) = outgoing.recv() => {
                    if let Err(e) = framed.send(envelope).await {
                        tracing::error!("Failed to send envelope: {}", e);
                        break;
                    }
                }

                // Handle incoming envelopes
                result = framed.next() => {
                    match result {
                        Some(Ok(envelope)) => {
                            tracing::debug!(
                                message_type = envelope.type_name(),
                                "Received envelope from relay"
                            );
                            if incoming.send(envelope).await.is_err() {
                                tracing::debug!("Incoming channel closed, receiver dropped");
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::error!("Failed to receive envelope: {}", e);
                            break;
                        }
                        None => {
                            tracing::info!("Relay closed connection");
                            break;
                        }
                    }
                }
            }
        }
    }
}

/// Normalize a relay address into `host:port`.
///
/// Accepts `tcp://host:port` or a bare `host:port`.
fn parse_addr(input: &str) -> Result<String> {
    if input.starts_with("tcp://") {
        let url = Url::parse(input)
            .map_err(|e| TandemError::connection(format!("Invalid relay URL '{}': {}", input, e)))?;

        let host = url
            .host_str()
            .ok_or_else(|| TandemError::connection("Missing host in relay URL"))?;
        let port = url
            .port()
            .ok_or_else(|| TandemError::connection("Missing port in relay URL"))?;

        Ok(format!("{}:{}", host, port))
    } else if input.contains(':') {
        Ok(input.to_string())
    } else {
        Err(TandemError::connection(format!(
            "Invalid relay address '{}': expected tcp://host:port",
            input
        )))
    }
}
