//! Transition table of the session lifecycle.
use hostwatch::model::SessionState::{self, *};
use hostwatch::state::{next, Effect, Input};

fn to(from: SessionState, input: Input) -> Option<SessionState> {
    next(from, input).map(|t| t.to)
}

#[test]
fn happy_path() {
    assert_eq!(to(Idle, Input::Start), Some(Connecting));
    assert_eq!(to(Connecting, Input::TransportOpened), Some(Connecting));
    assert_eq!(to(Connecting, Input::Connected), Some(Monitoring));
    assert_eq!(to(Monitoring, Input::Update), Some(Monitoring));
    assert_eq!(to(Monitoring, Input::TransportClosed), Some(Idle));
}

#[test]
fn handshake_is_sent_on_open() {
    let t = next(Connecting, Input::TransportOpened).unwrap();
    assert_eq!(t.effects, &[Effect::SendHandshake]);
}

#[test]
fn start_supersedes_from_every_state() {
    for s in [Idle, Connecting, Monitoring, Error] {
        let t = next(s, Input::Start).unwrap();
        assert_eq!(t.to, Connecting);
        // the old transport must go before the new one is opened
        let drop_at = t.effects.iter().position(|e| *e == Effect::DropTransport);
        let open_at = t.effects.iter().position(|e| *e == Effect::OpenTransport);
        assert!(drop_at.unwrap() < open_at.unwrap(), "{s:?}");
    }
}

#[test]
fn failures_end_in_error_and_close() {
    for s in [Connecting, Monitoring] {
        let t = next(s, Input::Failed).unwrap();
        assert_eq!(t.to, Error);
        assert!(t.effects.contains(&Effect::SurfaceFailure));
        assert!(t.effects.contains(&Effect::CloseTransport));
    }
    assert_eq!(to(Connecting, Input::TransportOpenFailed), Some(Error));
    assert_eq!(to(Error, Input::TransportClosed), Some(Idle));
}

#[test]
fn out_of_order_events_are_not_accepted() {
    assert_eq!(next(Connecting, Input::Update), None);
    assert_eq!(next(Monitoring, Input::Connected), None);
    assert_eq!(next(Idle, Input::Update), None);
    assert_eq!(next(Error, Input::Failed), None);
    assert_eq!(next(Monitoring, Input::TransportOpened), None);
}

#[test]
fn stop_is_noop_when_idle() {
    assert_eq!(next(Idle, Input::Stop), None);
    for s in [Connecting, Monitoring, Error] {
        assert_eq!(to(s, Input::Stop), Some(Idle));
    }
}
