use serde::{Deserialize, Serialize};

/// Lifecycle status of a branch's WhatsApp channel, as reported by the
/// backend.
///
/// The gateway worker owns the actual transitions; the dashboard only ever
/// observes these values. Backend builds may report statuses this crate does
/// not know yet, so anything unrecognized deserializes as [`Unknown`]
/// (`ChannelStatus::Unknown`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// No session; the branch has no live channel.
    #[default]
    Disconnected,
    /// The gateway is bringing the channel up.
    Connecting,
    /// A pairing code is outstanding and must be scanned.
    QrPending,
    /// Channel is live and bound to a number.
    Connected,
    /// The backend rejected the stored credentials; the session must be
    /// cleared and paired again.
    AuthFailure,
    /// A request or the gateway itself failed.
    Error,
    /// The gateway worker is starting up.
    Initializing,
    /// The gateway worker is tearing the channel down.
    Destroying,
    /// Any status string this build does not recognize.
    #[serde(other)]
    Unknown,
}

impl ChannelStatus {
    /// Whether polling stops once this status is observed.
    ///
    /// `Connected`, `Disconnected`, `Error` and `AuthFailure` are settled
    /// outcomes; the remaining statuses are transient and are awaited via an
    /// existing poll or the next user action.
    pub fn is_terminal_for_poll(self) -> bool {
        matches!(
            self,
            Self::Connected | Self::Disconnected | Self::Error | Self::AuthFailure
        )
    }

    /// The wire string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::QrPending => "qr_pending",
            Self::Connected => "connected",
            Self::AuthFailure => "auth_failure",
            Self::Error => "error",
            Self::Initializing => "initializing",
            Self::Destroying => "destroying",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_round_trip() {
        for status in [
            ChannelStatus::Disconnected,
            ChannelStatus::Connecting,
            ChannelStatus::QrPending,
            ChannelStatus::Connected,
            ChannelStatus::AuthFailure,
            ChannelStatus::Error,
            ChannelStatus::Initializing,
            ChannelStatus::Destroying,
            ChannelStatus::Unknown,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: ChannelStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn unrecognized_status_maps_to_unknown() {
        let status: ChannelStatus = serde_json::from_str("\"proxy_error\"").unwrap();
        assert_eq!(status, ChannelStatus::Unknown);
    }

    #[test]
    fn default_is_disconnected() {
        assert_eq!(ChannelStatus::default(), ChannelStatus::Disconnected);
    }

    #[test]
    fn terminal_for_poll_partition() {
        assert!(ChannelStatus::Connected.is_terminal_for_poll());
        assert!(ChannelStatus::Disconnected.is_terminal_for_poll());
        assert!(ChannelStatus::Error.is_terminal_for_poll());
        assert!(ChannelStatus::AuthFailure.is_terminal_for_poll());

        assert!(!ChannelStatus::Connecting.is_terminal_for_poll());
        assert!(!ChannelStatus::QrPending.is_terminal_for_poll());
        assert!(!ChannelStatus::Initializing.is_terminal_for_poll());
        assert!(!ChannelStatus::Destroying.is_terminal_for_poll());
        assert!(!ChannelStatus::Unknown.is_terminal_for_poll());
    }
}
