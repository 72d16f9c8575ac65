use crate::gate::ActionGate;
use crate::notify::{Notice, Notices};
use anyhow::Result;
use backend_api::contract::{MessageSink, StoryStore};
use backend_api::model::{Story, REACTION_EMOJI};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::warn;
use uuid::Uuid;

/// Cooldown between accepted reactions.
pub const REACTION_WINDOW: Duration = Duration::from_secs(1);
/// Cooldown between accepted replies.
pub const REPLY_WINDOW: Duration = Duration::from_secs(2);

/// Outcome of a playback transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Stay,
    Advanced,
    Exited,
}

struct State {
    stories: Vec<Story>,
    index: usize,
    progress: f64,
    paused: bool,
    exited: bool,
}

/// Drives autoplay through one owner's story sequence: timed advance,
/// pause on hold, retreat, owner delete, and the view/reaction/reply side
/// effects. The viewer identity is passed in explicitly; it is never read
/// from ambient state.
pub struct Player {
    viewer: Uuid,
    store: Arc<dyn StoryStore>,
    messages: Arc<dyn MessageSink>,
    notices: Notices,
    reaction_gate: ActionGate,
    reply_gate: ActionGate,
    state: Mutex<State>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Player {
    /// Open the viewer on a non-empty story sequence. Records the view for
    /// the first story right away unless the viewer owns it.
    pub async fn open(
        viewer: Uuid,
        stories: Vec<Story>,
        store: Arc<dyn StoryStore>,
        messages: Arc<dyn MessageSink>,
        notices: Notices,
    ) -> Result<Arc<Self>> {
        anyhow::ensure!(!stories.is_empty(), "empty_sequence");
        let player = Arc::new(Self {
            viewer,
            store,
            messages,
            notices,
            reaction_gate: ActionGate::new(REACTION_WINDOW),
            reply_gate: ActionGate::new(REPLY_WINDOW),
            state: Mutex::new(State {
                stories,
                index: 0,
                progress: 0.0,
                paused: false,
                exited: false,
            }),
            ticker: Mutex::new(None),
        });
        player.record_current_view().await;
        Ok(player)
    }

    pub fn current(&self) -> Option<Story> {
        let state = self.state.lock();
        state.stories.get(state.index).cloned()
    }

    pub fn index(&self) -> usize {
        self.state.lock().index
    }

    pub fn progress(&self) -> f64 {
        self.state.lock().progress
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }

    pub fn is_exited(&self) -> bool {
        self.state.lock().exited
    }

    /// Advance playback by `elapsed_ms`. Inert while paused or after exit.
    /// Crossing the end of the current story resets progress and advances.
    pub async fn tick(&self, elapsed_ms: u64) -> Step {
        let crossed = {
            let mut state = self.state.lock();
            if state.exited || state.paused {
                return Step::Stay;
            }
            let Some(story) = state.stories.get(state.index) else {
                return Step::Stay;
            };
            let duration_ms = f64::from(story.effective_duration_secs()) * 1000.0;
            state.progress += elapsed_ms as f64 / duration_ms * 100.0;
            if state.progress >= 100.0 {
                state.progress = 0.0;
                true
            } else {
                false
            }
        };
        if crossed {
            self.advance().await
        } else {
            Step::Stay
        }
    }

    /// Move to the next story, recording its view, or exit past the last.
    pub async fn advance(&self) -> Step {
        let step = {
            let mut state = self.state.lock();
            if state.exited {
                Step::Exited
            } else if state.index + 1 < state.stories.len() {
                state.index += 1;
                state.progress = 0.0;
                Step::Advanced
            } else {
                state.exited = true;
                Step::Exited
            }
        };
        if step == Step::Advanced {
            // views are recorded strictly after the advance, one at a time
            self.record_current_view().await;
        }
        step
    }

    /// Step back one story. Never re-records a view; the ledger row from
    /// the first arrival already exists.
    pub fn retreat(&self) {
        let mut state = self.state.lock();
        if state.exited {
            return;
        }
        if state.index > 0 {
            state.index -= 1;
        }
        state.progress = 0.0;
    }

    pub fn pause(&self) {
        self.state.lock().paused = true;
    }

    pub fn resume(&self) {
        self.state.lock().paused = false;
    }

    pub fn toggle_pause(&self) {
        let mut state = self.state.lock();
        state.paused = !state.paused;
    }

    /// Delete the current story. Only the owner may delete; the action is
    /// hidden for everyone else, and rejected here as a backstop. A failed
    /// remote delete leaves playback untouched.
    pub async fn delete_current(&self) -> Result<Step> {
        let target = {
            let state = self.state.lock();
            state
                .stories
                .get(state.index)
                .map(|s| (s.id, s.owner_id))
        };
        let Some((story_id, owner)) = target else {
            return Ok(Step::Exited);
        };
        if owner != self.viewer {
            anyhow::bail!("forbidden");
        }
        if let Err(e) = self.store.delete(self.viewer, story_id).await {
            self.notices
                .push(Notice::Error(format!("delete failed: {e}")));
            return Ok(Step::Stay);
        }
        let step = {
            let mut state = self.state.lock();
            state.stories.retain(|s| s.id != story_id);
            if state.stories.is_empty() {
                state.exited = true;
                Step::Exited
            } else {
                if state.index >= state.stories.len() {
                    state.index = state.stories.len() - 1;
                }
                state.progress = 0.0;
                Step::Advanced
            }
        };
        if step == Step::Exited {
            self.stop_autoplay();
        }
        Ok(step)
    }

    /// Send a reaction from the fixed emoji set. Returns false when the
    /// cooldown swallowed the tap. The burst animation fires on acceptance,
    /// before the network call settles.
    pub async fn react(&self, emoji: &str) -> Result<bool> {
        anyhow::ensure!(REACTION_EMOJI.contains(&emoji), "unsupported_emoji");
        let story_id = {
            let state = self.state.lock();
            state.stories.get(state.index).map(|s| s.id)
        };
        let Some(story_id) = story_id else {
            anyhow::bail!("no_story");
        };
        if !self.reaction_gate.try_fire() {
            return Ok(false);
        }
        self.notices.push(Notice::ReactionBurst {
            emoji: emoji.into(),
        });
        if let Err(e) = self.store.add_reaction(story_id, self.viewer, emoji).await {
            self.notices
                .push(Notice::Error(format!("reaction failed: {e}")));
        }
        Ok(true)
    }

    /// Reply to the current story with a direct message quoting its overlay
    /// text. Returns false when the cooldown swallowed the attempt.
    pub async fn reply(&self, text: &str) -> Result<bool> {
        anyhow::ensure!(!text.trim().is_empty(), "empty_reply");
        let target = {
            let state = self.state.lock();
            state
                .stories
                .get(state.index)
                .map(|s| (s.owner_id, s.text_overlay.clone()))
        };
        let Some((owner, quoted)) = target else {
            anyhow::bail!("no_story");
        };
        if !self.reply_gate.try_fire() {
            return Ok(false);
        }
        if let Err(e) = self
            .messages
            .send_direct(self.viewer, owner, text, quoted.as_deref())
            .await
        {
            self.notices
                .push(Notice::Error(format!("reply failed: {e}")));
        }
        Ok(true)
    }

    /// Start the autoplay driver: a tokio interval that ticks the state
    /// machine. The task holds only a weak reference, so dropping the last
    /// handle to the player stops the timer; starting again cancels any
    /// previous driver first.
    pub fn start_autoplay(self: &Arc<Self>, tick: Duration) {
        self.stop_autoplay();
        let weak = Arc::downgrade(self);
        let elapsed_ms = tick.as_millis() as u64;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(player) = weak.upgrade() else { break };
                if player.tick(elapsed_ms).await == Step::Exited {
                    break;
                }
            }
        });
        *self.ticker.lock() = Some(handle);
    }

    /// First-class timer cancellation, also invoked on drop and exit.
    pub fn stop_autoplay(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
    }

    /// Best-effort view recording: failures must never block playback.
    async fn record_current_view(&self) {
        let target = {
            let state = self.state.lock();
            state
                .stories
                .get(state.index)
                .map(|s| (s.id, s.owner_id))
        };
        let Some((story_id, owner)) = target else {
            return;
        };
        if owner == self.viewer {
            return;
        }
        if let Err(e) = self.store.record_view(story_id, self.viewer).await {
            warn!(error = %e, story = %story_id, "view recording failed");
        }
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.abort();
        }
    }
}
