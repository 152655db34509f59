//! Wire codec: handshake frame out, tagged gateway events in.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::model::{ConnectionRequest, MonitoringUpdate};

/// Used when the gateway reports an error without saying why.
pub const UNSPECIFIED_GATEWAY_ERROR: &str = "gateway reported an error";

/// One decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// Handshake accepted; the gateway has started polling.
    Connected { host: Option<String> },
    Failed { message: String },
    Update(MonitoringUpdate),
}

// First frame on the wire: { ip, username, password }
#[derive(Serialize)]
struct Handshake<'a> {
    ip: &'a str,
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
enum WireFrame {
    Connected {
        #[serde(default)]
        ip: Option<String>,
    },
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    Monitoring(MonitoringUpdate),
}

/// Serialize the handshake as a single text frame.
pub fn encode(req: &ConnectionRequest) -> Result<String, CodecError> {
    let frame = Handshake {
        ip: &req.host,
        username: &req.username,
        password: &req.secret,
    };
    Ok(serde_json::to_string(&frame)?)
}

/// Parse one inbound frame. Anything that is not a known `status` variant is rejected.
pub fn decode(text: &str) -> Result<GatewayEvent, CodecError> {
    let frame: WireFrame =
        serde_json::from_str(text).map_err(|e| CodecError::MalformedFrame(e.to_string()))?;
    Ok(match frame {
        WireFrame::Connected { ip } => GatewayEvent::Connected { host: ip },
        WireFrame::Error { message } => GatewayEvent::Failed {
            message: message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNSPECIFIED_GATEWAY_ERROR.to_string()),
        },
        WireFrame::Monitoring(update) => GatewayEvent::Update(update),
    })
}
