/// Default toast display duration in milliseconds.
const DEFAULT_DURATION_MS: u64 = 4000;

/// Error toast display duration in milliseconds (longer for visibility).
const ERROR_DURATION_MS: u64 = 6000;

/// The visual category of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Warning,
    Info,
}

/// A toast notification for the dashboard UI.
#[derive(Debug, Clone)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub title: String,
    pub body: Option<String>,
    pub duration_ms: u64,
}

/// In-memory toast queue with monotonic ID assignment.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    /// Create an empty toast queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a toast with explicit kind, title, body, and duration.
    /// Returns the assigned toast ID.
    pub fn push(
        &mut self,
        kind: ToastKind,
        title: impl Into<String>,
        body: Option<String>,
        duration_ms: u64,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            kind,
            title: title.into(),
            body,
            duration_ms,
        });
        id
    }

    /// Push a success toast with default duration (4s).
    pub fn success(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastKind::Success, title, None, DEFAULT_DURATION_MS)
    }

    /// Push an error toast with extended duration (6s).
    pub fn error(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, title, None, ERROR_DURATION_MS)
    }

    /// Push a warning toast with default duration (4s).
    pub fn warning(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastKind::Warning, title, None, DEFAULT_DURATION_MS)
    }

    /// Push an info toast with default duration (4s).
    pub fn info(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastKind::Info, title, None, DEFAULT_DURATION_MS)
    }

    /// Push a success toast with body text and default duration (4s).
    pub fn success_with(&mut self, title: impl Into<String>, body: impl Into<String>) -> u64 {
        self.push(
            ToastKind::Success,
            title,
            Some(body.into()),
            DEFAULT_DURATION_MS,
        )
    }

    /// Push an error toast with body text and extended duration (6s).
    pub fn error_with(&mut self, title: impl Into<String>, body: impl Into<String>) -> u64 {
        self.push(ToastKind::Error, title, Some(body.into()), ERROR_DURATION_MS)
    }

    /// Push an info toast with body text and default duration (4s).
    pub fn info_with(&mut self, title: impl Into<String>, body: impl Into<String>) -> u64 {
        self.push(
            ToastKind::Info,
            title,
            Some(body.into()),
            DEFAULT_DURATION_MS,
        )
    }

    /// Dismiss a toast by ID. Returns `true` if found and removed.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let len_before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != len_before
    }

    /// Look up a toast by ID.
    pub fn get(&self, id: u64) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }

    /// Iterate over toasts in insertion order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// Number of toasts currently in the queue.
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Remove all toasts.
    pub fn clear(&mut self) {
        self.toasts.clear();
    }
}
