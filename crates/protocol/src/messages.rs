use serde::{Deserialize, Serialize};

use crate::types::ChannelStatus;

/// Response of `GET /branches/{id}/whatsapp/status`.
///
/// `qr_code` carries a base64-encoded PNG when a pairing code is
/// outstanding; `connected_number` is the account bound to the branch once
/// the channel is live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatusReport {
    pub status: ChannelStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_number: Option<String>,
}

impl ChannelStatusReport {
    /// The pairing code as a data URI, ready for an `<img src=…>` slot.
    pub fn qr_data_uri(&self) -> Option<String> {
        self.qr_code
            .as_deref()
            .map(|code| format!("{}{code}", crate::constants::QR_IMAGE_MIME_PREFIX))
    }
}

/// Acknowledgement body of the connect / disconnect / clear-session routes.
///
/// The backend only confirms that the command was accepted; the resulting
/// status must be observed via the status route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCommandAck {
    pub message: String,
}
