use std::time::Duration;

/// Poll cadence while a pairing code is outstanding.
///
/// The gateway invalidates pairing codes on its own schedule, so the
/// dashboard re-reads the status route at a fixed interval until the
/// channel settles.
pub const QR_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// MIME prefix turning a raw pairing payload into a displayable data URI.
pub const QR_IMAGE_MIME_PREFIX: &str = "data:image/png;base64,";
