use tokio::sync::broadcast;
use uuid::Uuid;

/// Transient user-facing notifications. Controllers publish; whoever renders
/// the UI subscribes and shows toasts or overlays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
    Liked,
    SuperLiked,
    Passed,
    Matched { candidate: Uuid },
    DeckExhausted,
    /// Full-screen reaction animation trigger, fired on acceptance,
    /// independent of network completion.
    ReactionBurst { emoji: String },
    StoryPosted,
}

/// Broadcast fan-out for notices. Publishing with no subscribers is fine;
/// notices are fire-and-forget.
#[derive(Clone)]
pub struct Notices {
    tx: broadcast::Sender<Notice>,
}

impl Notices {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn push(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new(64)
    }
}
