//! WebSocket transport to the monitoring gateway.

use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_tungstenite::{
    connect_async, connect_async_tls_with_config, tungstenite::Message,
    Connector as TlsConnector, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, warn};
use url::Url;

use crate::error::TransportError;
use crate::transport::{Connector, EventSink, TransportEvent, TransportHandle};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// Upper bound on sending the close frame before the socket is dropped.
const CLOSE_GRACE: Duration = Duration::from_millis(500);

/// Accept only ws:// and wss:// gateway URLs.
pub fn validate_url(url: &str) -> Result<Url, TransportError> {
    let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "ws" | "wss" => Ok(parsed),
        other => Err(TransportError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme {other:?}, expected ws or wss"),
        }),
    }
}

// Connect to the gateway and return the WS stream
pub async fn connect(url: &str, tls_ca: Option<&Path>) -> Result<WsStream, TransportError> {
    let parsed = validate_url(url)?;
    let ws = match tls_ca {
        Some(ca) if parsed.scheme() == "wss" => {
            let connector = TlsConnector::Rustls(Arc::new(client_config(ca)?));
            let (ws, _) = connect_async_tls_with_config(url, None, false, Some(connector)).await?;
            ws
        }
        _ => {
            let (ws, _) = connect_async(url).await?;
            ws
        }
    };
    Ok(ws)
}

// Trust exactly the certificates in the given PEM file
fn client_config(ca: &Path) -> Result<rustls::ClientConfig, TransportError> {
    let mut reader = BufReader::new(File::open(ca)?);
    let mut roots = rustls::RootCertStore::empty();
    for cert in rustls_pemfile::certs(&mut reader) {
        roots
            .add(cert?)
            .map_err(|e| TransportError::Tls(e.to_string()))?;
    }
    if roots.is_empty() {
        return Err(TransportError::Tls(format!(
            "no certificates found in {}",
            ca.display()
        )));
    }
    Ok(rustls::ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth())
}

#[derive(Debug, Clone)]
pub struct WsConnector {
    url: String,
    tls_ca: Option<PathBuf>,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, tls_ca: Option<PathBuf>) -> Self {
        Self {
            url: url.into(),
            tls_ca,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Connector for WsConnector {
    type Handle = WsHandle;

    // Must be called from within a tokio runtime.
    fn open(&mut self, sink: EventSink) -> WsHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_transport(
            self.url.clone(),
            self.tls_ca.clone(),
            sink,
            cmd_rx,
        ));
        WsHandle {
            cmd_tx,
            closed: false,
        }
    }
}

#[derive(Debug)]
enum Outbound {
    Text(String),
    Close,
}

/// Owned end of one WebSocket transport. Dropping it closes the socket.
#[derive(Debug)]
pub struct WsHandle {
    cmd_tx: UnboundedSender<Outbound>,
    closed: bool,
}

impl TransportHandle for WsHandle {
    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.cmd_tx
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::Closed)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let _ = self.cmd_tx.send(Outbound::Close);
        }
    }
}

async fn run_transport(
    url: String,
    tls_ca: Option<PathBuf>,
    sink: EventSink,
    mut cmds: UnboundedReceiver<Outbound>,
) {
    // A close (or dropped handle) must abandon a connect that is still in progress.
    let connecting = connect(&url, tls_ca.as_deref());
    tokio::pin!(connecting);
    let ws = loop {
        tokio::select! {
            res = &mut connecting => match res {
                Ok(ws) => break ws,
                Err(e) => {
                    sink.emit(TransportEvent::OpenFailed(e.to_string()));
                    sink.emit(TransportEvent::Closed);
                    return;
                }
            },
            cmd = cmds.recv() => match cmd {
                Some(Outbound::Text(_)) => debug!(tag = sink.tag(), "dropping frame queued before open"),
                Some(Outbound::Close) | None => {
                    debug!(tag = sink.tag(), "abandoning connect");
                    sink.emit(TransportEvent::Closed);
                    return;
                }
            },
        }
    };
    sink.emit(TransportEvent::Opened);

    let (mut tx, mut rx) = ws.split();
    loop {
        tokio::select! {
            cmd = cmds.recv() => match cmd {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = tx.send(Message::Text(text)).await {
                        warn!(tag = sink.tag(), error = %e, "websocket send failed");
                        break;
                    }
                }
                // explicit close, or the handle was dropped
                Some(Outbound::Close) | None => {
                    // the socket is dropped either way once the grace period is over
                    let _ = tokio::time::timeout(CLOSE_GRACE, tx.close()).await;
                    break;
                }
            },
            msg = rx.next() => match msg {
                Some(Ok(Message::Text(text))) => sink.emit(TransportEvent::Frame(text)),
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes) {
                    Ok(text) => sink.emit(TransportEvent::Frame(text)),
                    Err(_) => debug!(tag = sink.tag(), "dropping non-utf8 binary frame"),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(tag = sink.tag(), error = %e, "websocket read failed");
                    break;
                }
            },
        }
    }
    sink.emit(TransportEvent::Closed);
}
