//! Session lifecycle: Idle -> Connecting -> Monitoring, with Error and back to Idle as exits.
//! Pure transition table; the controller performs the effects.

use crate::model::SessionState;

/// Inputs already filtered to the currently owned transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Start,
    Stop,
    TransportOpened,
    TransportOpenFailed,
    TransportClosed,
    Connected,
    Failed,
    Update,
}

/// Side effects, in the order the controller must perform them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Close and disown the current transport, if any. Its later events are stale.
    DropTransport,
    /// Close the current transport but keep watching it for its final `Closed`.
    CloseTransport,
    OpenTransport,
    SendHandshake,
    MarkLive,
    SurfaceFailure,
    ApplyUpdate,
    ClearData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub to: SessionState,
    pub effects: &'static [Effect],
}

/// Look up the transition for `input` in `from`. `None` means the event is not accepted
/// in that state and must be dropped without side effects.
pub fn next(from: SessionState, input: Input) -> Option<Transition> {
    use Effect::*;
    use SessionState::*;

    fn t(to: SessionState, effects: &'static [Effect]) -> Option<Transition> {
        Some(Transition { to, effects })
    }
    match (from, input) {
        // supersession: the prior transport goes first, then a fresh attempt
        (_, Input::Start) => t(Connecting, &[DropTransport, ClearData, OpenTransport]),
        (Idle, Input::Stop) => None,
        (_, Input::Stop) => t(Idle, &[DropTransport, ClearData]),

        (Connecting, Input::TransportOpened) => t(Connecting, &[SendHandshake]),
        (Connecting, Input::TransportOpenFailed) => t(Error, &[SurfaceFailure]),
        (Connecting, Input::Connected) => t(Monitoring, &[MarkLive]),
        (Connecting | Monitoring, Input::Failed) => t(Error, &[SurfaceFailure, CloseTransport]),
        (Monitoring, Input::Update) => t(Monitoring, &[ApplyUpdate]),

        (_, Input::TransportClosed) => t(Idle, &[ClearData]),

        _ => None,
    }
}
