//! Public types for the channel manager.

use lockerhub_protocol::ChannelStatus;

/// Events emitted by the channel manager for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A branch's channel status changed.
    StatusChanged {
        branch_id: String,
        status: ChannelStatus,
    },
    /// A new pairing code is available and should be shown for scanning.
    PairingReady { branch_id: String, qr_code: String },
    /// An operation failed; the branch state already reflects the failure.
    CommandFailed {
        branch_id: String,
        action: ChannelAction,
        message: String,
    },
}

/// The operation a [`ChannelEvent::CommandFailed`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelAction {
    Connect,
    Disconnect,
    ClearSession,
    Refresh,
}

impl ChannelAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::ClearSession => "clear session",
            Self::Refresh => "status refresh",
        }
    }
}

impl std::fmt::Display for ChannelAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned to the caller instead of being settled into branch state.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// Connect was refused because pairing is already underway for the
    /// branch. Wait for the code to be scanned or clear the session first.
    #[error("pairing already in progress for branch {branch_id}")]
    PairingInProgress { branch_id: String },
}
