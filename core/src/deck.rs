use crate::notify::{Notice, Notices};
use anyhow::Result;
use backend_api::contract::{Matchmaker, MessageSink};
use backend_api::model::{Candidate, DecisionOutcome, SwipeDirection};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// Swipe deck over one batch of candidates. Decisions apply locally first
/// and are pushed to the matchmaker after; a failed push keeps the local
/// decision so the deck never shows a card the user already swiped.
pub struct Deck {
    user: Uuid,
    batch: u32,
    candidates: Vec<Candidate>,
    decided: Vec<Uuid>,
    decided_set: HashSet<Uuid>,
    cursor: usize,
    exhausted_signalled: bool,
    matchmaker: Arc<dyn Matchmaker>,
    messages: Arc<dyn MessageSink>,
    notices: Notices,
}

impl Deck {
    pub fn new(
        user: Uuid,
        batch: u32,
        matchmaker: Arc<dyn Matchmaker>,
        messages: Arc<dyn MessageSink>,
        notices: Notices,
    ) -> Self {
        Self {
            user,
            batch,
            candidates: Vec::new(),
            decided: Vec::new(),
            decided_set: HashSet::new(),
            cursor: 0,
            exhausted_signalled: false,
            matchmaker,
            messages,
            notices,
        }
    }

    /// Fetch a fresh batch, replacing any local state.
    pub async fn load(&mut self) -> Result<()> {
        self.candidates = self.matchmaker.candidates(self.user, self.batch).await?;
        self.decided.clear();
        self.decided_set.clear();
        self.cursor = 0;
        self.exhausted_signalled = false;
        Ok(())
    }

    pub fn is_exhausted(&self) -> bool {
        self.decided_set.len() >= self.candidates.len()
    }

    pub fn remaining(&self) -> usize {
        self.candidates.len() - self.decided_set.len()
    }

    /// The card on top: the first undecided candidate at or after the
    /// cursor, wrapping around once.
    pub fn current(&self) -> Option<&Candidate> {
        let n = self.candidates.len();
        if n == 0 {
            return None;
        }
        (0..n)
            .map(|step| &self.candidates[(self.cursor + step) % n])
            .find(|c| !self.decided_set.contains(&c.id))
    }

    /// Swipe the top card. The decision is recorded locally and pushed to
    /// the matchmaker; push failures surface as an error notice but do not
    /// roll the card back. Returns None when the deck is empty.
    pub async fn decide(&mut self, direction: SwipeDirection) -> Option<DecisionOutcome> {
        let candidate = self.current()?.id;
        self.mark_decided(candidate);

        let outcome = match self.matchmaker.decide(self.user, candidate, direction).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, %candidate, "decision push failed");
                self.notices
                    .push(Notice::Error(format!("swipe not saved: {e}")));
                DecisionOutcome::default()
            }
        };

        if outcome.matched {
            self.notices.push(Notice::Matched { candidate });
        } else {
            self.notices.push(match direction {
                SwipeDirection::Pass => Notice::Passed,
                SwipeDirection::Like => Notice::Liked,
                SwipeDirection::SuperLike => Notice::SuperLiked,
            });
        }
        self.signal_exhaustion();
        Some(outcome)
    }

    /// Bring back the most recently swiped card. Purely local: the remote
    /// decision already happened and stays recorded. No-op on a fresh deck.
    pub fn undo(&mut self) -> Option<&Candidate> {
        let candidate = self.decided.pop()?;
        self.decided_set.remove(&candidate);
        self.exhausted_signalled = false;
        if let Some(pos) = self.candidates.iter().position(|c| c.id == candidate) {
            self.cursor = pos;
        }
        self.current()
    }

    /// Hide the top card permanently and block the profile. Not undoable;
    /// the card never re-enters the deck.
    pub async fn block_current(&mut self) -> Result<()> {
        let Some(candidate) = self.current().map(|c| c.id) else {
            return Ok(());
        };
        self.decided_set.insert(candidate);
        self.cursor += 1;
        let result = self.matchmaker.block(self.user, candidate).await;
        if let Err(e) = &result {
            self.notices
                .push(Notice::Error(format!("block failed: {e}")));
        }
        self.signal_exhaustion();
        result
    }

    /// Report the top card. The card stays in place; whether to also pass
    /// or block afterwards is the user's call.
    pub async fn report_current(&mut self, reason: &str) -> Result<()> {
        let Some(candidate) = self.current().map(|c| c.id) else {
            return Ok(());
        };
        let result = self.matchmaker.report(self.user, candidate, reason).await;
        if let Err(e) = &result {
            self.notices
                .push(Notice::Error(format!("report failed: {e}")));
        }
        result
    }

    /// Open a conversation with the top card without swiping it.
    pub async fn message_current(&self, body: &str) -> Result<()> {
        let Some(candidate) = self.current().map(|c| c.id) else {
            anyhow::bail!("no_candidate");
        };
        self.messages
            .send_direct(self.user, candidate, body, None)
            .await
    }

    fn mark_decided(&mut self, candidate: Uuid) {
        self.decided.push(candidate);
        self.decided_set.insert(candidate);
        self.cursor += 1;
    }

    // fires at most once per exhaustion; undo re-arms it
    fn signal_exhaustion(&mut self) {
        if self.is_exhausted() && !self.exhausted_signalled {
            self.exhausted_signalled = true;
            self.notices.push(Notice::DeckExhausted);
        }
    }
}
