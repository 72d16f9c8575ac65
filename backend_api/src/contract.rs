//! Contracts for the hosted backend this client consumes. Persistence,
//! uniqueness constraints and ownership checks live behind these traits,
//! not in the controllers.

use crate::model::{Candidate, DecisionOutcome, Story, StoryDraft, SwipeDirection};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Story records plus their view ledger and reaction list.
#[async_trait]
pub trait StoryStore: Send + Sync {
    /// Insert a new story. The store stamps `created_at` and sets
    /// `expires_at` to creation plus the fixed window.
    async fn create(&self, draft: StoryDraft) -> Result<Story>;

    /// Unexpired stories for one owner, ordered by creation ascending.
    async fn stories_for_owner(&self, owner: Uuid, now: i64) -> Result<Vec<Story>>;

    /// Delete a story. Fails with "forbidden" unless `owner` matches.
    async fn delete(&self, owner: Uuid, story_id: Uuid) -> Result<()>;

    /// Record that `viewer` has seen a story. Insert-or-ignore on the
    /// (story, viewer) pair, then recount distinct viewers onto the story.
    /// Repeat calls for the same pair are no-ops.
    async fn record_view(&self, story_id: Uuid, viewer: Uuid) -> Result<()>;

    async fn view_count(&self, story_id: Uuid) -> Result<u64>;

    /// Append a reaction entry. Append semantics: repeated reactions from
    /// one user accumulate.
    async fn add_reaction(&self, story_id: Uuid, user: Uuid, emoji: &str) -> Result<()>;
}

/// Object storage for story media.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store raw bytes under a per-user, per-timestamp path and return the
    /// public URL for the story's media reference.
    async fn upload(&self, owner: Uuid, file_name: &str, data: Vec<u8>) -> Result<String>;
}

/// Recommendation batches and swipe decisions.
#[async_trait]
pub trait Matchmaker: Send + Sync {
    /// Up to `limit` fresh candidates for `user`, excluding anyone already
    /// decided on or blocked.
    async fn candidates(&self, user: Uuid, limit: u32) -> Result<Vec<Candidate>>;

    /// Record a decision. For likes the outcome carries the mutual-match
    /// flag; passes always come back unmatched.
    async fn decide(
        &self,
        user: Uuid,
        candidate: Uuid,
        direction: SwipeDirection,
    ) -> Result<DecisionOutcome>;

    async fn block(&self, user: Uuid, candidate: Uuid) -> Result<()>;

    async fn report(&self, user: Uuid, candidate: Uuid, reason: &str) -> Result<()>;
}

/// Messaging side door used by story replies and the deck's message
/// shortcut. A story reply passes the replied-to overlay text as `quoted`;
/// it never mutates the story itself.
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn send_direct(
        &self,
        from: Uuid,
        to: Uuid,
        body: &str,
        quoted: Option<&str>,
    ) -> Result<()>;
}
