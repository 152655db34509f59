//! Session controller: owns the one live transport, feeds its events through the codec and the
//! state machine, and keeps the latest data for observers.

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::codec::{self, GatewayEvent};
use crate::history::LogBuffer;
use crate::model::{ConnectionRequest, MonitoringSnapshot, MonitoringUpdate, SessionState};
use crate::state::{self, Effect, Input};
use crate::transport::{
    Connector, EventSink, TaggedEvent, TransportEvent, TransportHandle, TransportTag,
};

/// Message surfaced when the transport itself could not be established.
pub const GATEWAY_UNREACHABLE: &str = "unable to reach monitoring gateway";

/// Presentation shape chosen per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PresentationForm {
    #[default]
    Dashboard,
    Log,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LatestData {
    Snapshot(MonitoringSnapshot),
    Log(LogBuffer),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionNotice {
    StateChanged(SessionState),
    Failed(String),
    Updated,
}

struct LiveTransport<H> {
    tag: TransportTag,
    handle: H,
    // a Failed frame ends the attempt; only the final Closed is still accepted
    terminal: bool,
}

/// Decoded input plus whatever payload the effects need.
enum Payload {
    None,
    Failure(String),
    Update(MonitoringUpdate),
}

pub struct SessionController<C: Connector> {
    connector: C,
    form: PresentationForm,
    state: SessionState,
    live: Option<LiveTransport<C::Handle>>,
    next_tag: TransportTag,
    // held only until the handshake is sent
    pending: Option<ConnectionRequest>,
    host: String,
    data: Option<LatestData>,
    last_error: Option<String>,
    events_tx: UnboundedSender<TaggedEvent>,
    events_rx: UnboundedReceiver<TaggedEvent>,
    observers: Vec<UnboundedSender<SessionNotice>>,
}

impl<C: Connector> SessionController<C> {
    pub fn new(connector: C, form: PresentationForm) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            connector,
            form,
            state: SessionState::Idle,
            live: None,
            next_tag: 1,
            pending: None,
            host: String::new(),
            data: None,
            last_error: None,
            events_tx,
            events_rx,
            observers: Vec::new(),
        }
    }

    pub fn current_state(&self) -> SessionState {
        self.state
    }

    pub fn latest_data(&self) -> Option<&LatestData> {
        self.data.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn form(&self) -> PresentationForm {
        self.form
    }

    /// Tag of the transport currently owned, if any.
    pub fn active_tag(&self) -> Option<TransportTag> {
        self.live.as_ref().map(|l| l.tag)
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    pub fn subscribe(&mut self) -> UnboundedReceiver<SessionNotice> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(tx);
        rx
    }

    /// Begin a new session, superseding any prior one. The outcome arrives via notices.
    pub fn start(&mut self, request: ConnectionRequest) {
        info!(host = %request.host, user = %request.username, "starting monitoring session");
        self.host = request.host.clone();
        self.pending = Some(request);
        self.last_error = None;
        self.apply(Input::Start, Payload::None);
    }

    /// Close the active transport and return to Idle. No-op when already idle.
    pub fn stop(&mut self) {
        self.apply(Input::Stop, Payload::None);
    }

    /// Wait for the next transport event and apply it.
    pub async fn pump(&mut self) {
        if let Some(ev) = self.events_rx.recv().await {
            self.handle_event(ev);
        }
    }

    /// Apply every event already queued, without waiting.
    pub fn process_pending(&mut self) {
        while let Ok(ev) = self.events_rx.try_recv() {
            self.handle_event(ev);
        }
    }

    pub fn handle_event(&mut self, ev: TaggedEvent) {
        let Some(live) = self.live.as_ref() else {
            debug!(tag = ev.tag, "dropping event: no active transport");
            return;
        };
        if live.tag != ev.tag {
            debug!(tag = ev.tag, active = live.tag, "dropping event from superseded transport");
            return;
        }
        if live.terminal && ev.event != TransportEvent::Closed {
            debug!(tag = ev.tag, "dropping event after terminal failure");
            return;
        }

        let (input, payload) = match ev.event {
            TransportEvent::Opened => (Input::TransportOpened, Payload::None),
            TransportEvent::OpenFailed(reason) => {
                warn!(tag = ev.tag, %reason, "transport could not be established");
                (
                    Input::TransportOpenFailed,
                    Payload::Failure(GATEWAY_UNREACHABLE.to_string()),
                )
            }
            TransportEvent::Closed => (Input::TransportClosed, Payload::None),
            TransportEvent::Frame(text) => match codec::decode(&text) {
                Ok(GatewayEvent::Connected { host }) => {
                    debug!(?host, "gateway accepted handshake");
                    (Input::Connected, Payload::None)
                }
                Ok(GatewayEvent::Failed { message }) => (Input::Failed, Payload::Failure(message)),
                Ok(GatewayEvent::Update(update)) => (Input::Update, Payload::Update(update)),
                Err(e) => {
                    warn!(tag = ev.tag, error = %e, "dropping malformed frame");
                    return;
                }
            },
        };
        self.apply(input, payload);
    }

    fn apply(&mut self, input: Input, payload: Payload) {
        let Some(transition) = state::next(self.state, input) else {
            debug!(state = %self.state, ?input, "event not accepted in current state");
            return;
        };
        let mut payload = payload;
        for effect in transition.effects {
            self.perform(*effect, &mut payload);
        }
        if transition.to != self.state {
            debug!(from = %self.state, to = %transition.to, "session transition");
            self.state = transition.to;
            self.notify(SessionNotice::StateChanged(transition.to));
        }
        if input == Input::TransportClosed {
            self.live = None;
            self.pending = None;
        }
    }

    fn perform(&mut self, effect: Effect, payload: &mut Payload) {
        match effect {
            Effect::DropTransport => {
                if let Some(mut old) = self.live.take() {
                    debug!(tag = old.tag, "closing superseded transport");
                    old.handle.close();
                }
            }
            Effect::CloseTransport => {
                if let Some(live) = self.live.as_mut() {
                    live.terminal = true;
                    live.handle.close();
                }
            }
            Effect::OpenTransport => {
                let tag = self.next_tag;
                self.next_tag += 1;
                let handle = self
                    .connector
                    .open(EventSink::new(tag, self.events_tx.clone()));
                self.live = Some(LiveTransport {
                    tag,
                    handle,
                    terminal: false,
                });
            }
            Effect::SendHandshake => self.send_handshake(),
            Effect::MarkLive => info!(host = %self.host, "session live"),
            Effect::SurfaceFailure => {
                let message = match std::mem::replace(payload, Payload::None) {
                    Payload::Failure(m) => m,
                    _ => GATEWAY_UNREACHABLE.to_string(),
                };
                warn!(host = %self.host, %message, "monitoring session failed");
                self.last_error = Some(message.clone());
                self.pending = None;
                if let Some(live) = self.live.as_mut() {
                    live.terminal = true;
                }
                self.notify(SessionNotice::Failed(message));
            }
            Effect::ApplyUpdate => {
                if let Payload::Update(update) = std::mem::replace(payload, Payload::None) {
                    self.apply_update(update);
                }
            }
            Effect::ClearData => self.data = None,
        }
    }

    fn send_handshake(&mut self) {
        let Some(request) = self.pending.take() else {
            warn!("transport opened without a pending request");
            return;
        };
        let Some(live) = self.live.as_mut() else {
            return;
        };
        match codec::encode(&request) {
            Ok(frame) => {
                if let Err(e) = live.handle.send_text(frame) {
                    // the transport's own Closed will follow
                    warn!(tag = live.tag, error = %e, "failed to send handshake");
                }
            }
            Err(e) => warn!(error = %e, "failed to encode handshake"),
        }
    }

    fn apply_update(&mut self, update: MonitoringUpdate) {
        match self.form {
            PresentationForm::Dashboard => {
                self.data = Some(LatestData::Snapshot(update.into_snapshot()));
            }
            PresentationForm::Log => {
                let entry = update.to_log_entry(&self.host);
                match self.data.as_mut() {
                    Some(LatestData::Log(buf)) => buf.push(entry),
                    _ => {
                        let mut buf = LogBuffer::default();
                        buf.push(entry);
                        self.data = Some(LatestData::Log(buf));
                    }
                }
            }
        }
        self.notify(SessionNotice::Updated);
    }

    fn notify(&mut self, notice: SessionNotice) {
        self.observers.retain(|tx| tx.send(notice.clone()).is_ok());
    }
}
