//! Per-branch channel state record.
//!
//! All transitions go through the `apply_*` functions so the field
//! invariants hold after every update: a pairing payload exists only under
//! `QrPending`, a bound number only under `Connected`.

use lockerhub_protocol::constants::QR_IMAGE_MIME_PREFIX;
use lockerhub_protocol::{ChannelStatus, ChannelStatusReport};

/// Connection state of one branch's channel, as last reported by the
/// backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchChannelState {
    pub status: ChannelStatus,
    /// Base64 pairing code image; present only while `status` is
    /// [`ChannelStatus::QrPending`].
    pub pairing_payload: Option<String>,
    /// Failure message from the backend or from a failed command.
    pub last_error: Option<String>,
    /// Number bound to the channel; present only while `status` is
    /// [`ChannelStatus::Connected`].
    pub connected_number: Option<String>,
    /// Whether a command or status refresh is in flight for this branch.
    /// Advisory: the UI disables controls while set.
    pub busy: bool,
}

impl BranchChannelState {
    /// Replaces every reported field from a backend status report.
    pub(crate) fn apply_report(&mut self, report: &ChannelStatusReport) {
        self.status = report.status;
        self.pairing_payload = match report.status {
            ChannelStatus::QrPending => report.qr_code.clone(),
            _ => None,
        };
        self.connected_number = match report.status {
            ChannelStatus::Connected => report.connected_number.clone(),
            _ => None,
        };
        self.last_error = match report.status {
            ChannelStatus::Error | ChannelStatus::AuthFailure => report.last_error.clone(),
            _ => None,
        };
    }

    /// Settles a failed request: the branch lands in `Error` with the
    /// failure message, and stale pairing/number data is dropped.
    pub(crate) fn apply_failure(&mut self, message: String) {
        self.status = ChannelStatus::Error;
        self.pairing_payload = None;
        self.connected_number = None;
        self.last_error = Some(message);
        self.busy = false;
    }

    /// Settles a successful disconnect or clear-session.
    pub(crate) fn apply_disconnected(&mut self) {
        self.status = ChannelStatus::Disconnected;
        self.pairing_payload = None;
        self.connected_number = None;
        self.last_error = None;
        self.busy = false;
    }

    /// The pairing code as a data URI, ready for an `<img src=…>` slot.
    pub fn qr_data_uri(&self) -> Option<String> {
        self.pairing_payload
            .as_deref()
            .map(|code| format!("{QR_IMAGE_MIME_PREFIX}{code}"))
    }
}
