//! Transport seam between the session controller and a concrete duplex connection.

use tokio::sync::mpsc::UnboundedSender;

use crate::error::TransportError;

/// Identity of one transport instance. Allocated by the controller, never reused.
pub type TransportTag = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Frame(String),
    /// The connection could not be established at all.
    OpenFailed(String),
    /// Always the last event a transport emits.
    Closed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedEvent {
    pub tag: TransportTag,
    pub event: TransportEvent,
}

/// Sender handed to a transport; stamps every event with the transport's tag.
#[derive(Debug, Clone)]
pub struct EventSink {
    tag: TransportTag,
    tx: UnboundedSender<TaggedEvent>,
}

impl EventSink {
    pub fn new(tag: TransportTag, tx: UnboundedSender<TaggedEvent>) -> Self {
        Self { tag, tx }
    }

    pub fn tag(&self) -> TransportTag {
        self.tag
    }

    // The receiver lives as long as the controller; a failed send only means it is gone.
    pub fn emit(&self, event: TransportEvent) {
        let _ = self.tx.send(TaggedEvent {
            tag: self.tag,
            event,
        });
    }
}

/// Opens transports. `open` returns immediately; the outcome arrives through the sink.
pub trait Connector {
    type Handle: TransportHandle;

    fn open(&mut self, sink: EventSink) -> Self::Handle;
}

pub trait TransportHandle {
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Ask the transport to shut down. Idempotent.
    fn close(&mut self);
}
