//! Mapping from channel events to user-facing toasts.

use lockerhub_channel::ChannelEvent;
use lockerhub_protocol::ChannelStatus;

use crate::toast::ToastQueue;

/// Pushes the toast a channel event warrants, if any.
///
/// Transient statuses (`connecting`, `initializing`, …) stay silent — the
/// status tag in the branch table already shows them. Returns the toast ID
/// when one was pushed.
pub fn push_event(queue: &mut ToastQueue, event: &ChannelEvent) -> Option<u64> {
    match event {
        ChannelEvent::StatusChanged { branch_id, status } => match status {
            ChannelStatus::Connected => {
                Some(queue.success_with("WhatsApp connected", branch_id.clone()))
            }
            ChannelStatus::Disconnected => {
                Some(queue.info_with("WhatsApp disconnected", branch_id.clone()))
            }
            ChannelStatus::AuthFailure => Some(queue.error_with(
                "WhatsApp authentication failed",
                format!("Clear the session for {branch_id} and pair again"),
            )),
            // Error is announced through the CommandFailed event, with the
            // failure message attached.
            _ => None,
        },
        ChannelEvent::PairingReady { branch_id, .. } => Some(queue.info_with(
            "Pairing code ready",
            format!("Scan the code for {branch_id} from the branch phone"),
        )),
        ChannelEvent::CommandFailed {
            branch_id,
            action,
            message,
        } => Some(queue.error_with(
            format!("WhatsApp {action} failed"),
            format!("{branch_id}: {message}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toast::ToastKind;
    use lockerhub_channel::ChannelAction;

    #[test]
    fn connected_pushes_success() {
        let mut q = ToastQueue::new();
        let id = push_event(
            &mut q,
            &ChannelEvent::StatusChanged {
                branch_id: "loja-centro".into(),
                status: ChannelStatus::Connected,
            },
        )
        .unwrap();

        let toast = q.get(id).unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
        assert_eq!(toast.body.as_deref(), Some("loja-centro"));
    }

    #[test]
    fn transient_statuses_stay_silent() {
        let mut q = ToastQueue::new();
        for status in [
            ChannelStatus::Connecting,
            ChannelStatus::QrPending,
            ChannelStatus::Initializing,
            ChannelStatus::Destroying,
            ChannelStatus::Unknown,
            ChannelStatus::Error,
        ] {
            let pushed = push_event(
                &mut q,
                &ChannelEvent::StatusChanged {
                    branch_id: "loja-centro".into(),
                    status,
                },
            );
            assert!(pushed.is_none(), "{status} should not toast");
        }
        assert!(q.is_empty());
    }

    #[test]
    fn auth_failure_advises_clearing_the_session() {
        let mut q = ToastQueue::new();
        let id = push_event(
            &mut q,
            &ChannelEvent::StatusChanged {
                branch_id: "loja-centro".into(),
                status: ChannelStatus::AuthFailure,
            },
        )
        .unwrap();

        let toast = q.get(id).unwrap();
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.body.as_deref().unwrap().contains("Clear the session"));
    }

    #[test]
    fn pairing_ready_pushes_info() {
        let mut q = ToastQueue::new();
        let id = push_event(
            &mut q,
            &ChannelEvent::PairingReady {
                branch_id: "loja-centro".into(),
                qr_code: "abc123".into(),
            },
        )
        .unwrap();

        assert_eq!(q.get(id).unwrap().kind, ToastKind::Info);
    }

    #[test]
    fn command_failure_carries_action_and_message() {
        let mut q = ToastQueue::new();
        let id = push_event(
            &mut q,
            &ChannelEvent::CommandFailed {
                branch_id: "loja-centro".into(),
                action: ChannelAction::ClearSession,
                message: "backend error 500: boom".into(),
            },
        )
        .unwrap();

        let toast = q.get(id).unwrap();
        assert_eq!(toast.title, "WhatsApp clear session failed");
        assert_eq!(
            toast.body.as_deref(),
            Some("loja-centro: backend error 500: boom")
        );
    }
}
