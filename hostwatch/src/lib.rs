//! Client-side monitoring session for a remote Linux host, streamed from a gateway over WebSocket.
//!
//! The [`session::SessionController`] owns one transport at a time, decodes gateway frames with
//! [`codec`], drives the [`state`] machine and keeps the latest [`model`] data for observers.

pub mod codec;
pub mod display;
pub mod error;
pub mod history;
pub mod model;
pub mod profiles;
pub mod session;
pub mod state;
pub mod transport;
pub mod ws;

pub use model::{ConnectionRequest, SessionState};
pub use session::{LatestData, PresentationForm, SessionController, SessionNotice};
