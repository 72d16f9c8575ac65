//! SQLite-backed implementation of the `backend_api` contracts. Stands in
//! for the hosted backend during local development and in tests; the
//! uniqueness and ownership rules the hosted service enforces are enforced
//! here by the schema.

pub mod db;
pub mod housekeeping;
pub mod matchmaking;
pub mod media;
pub mod messages;
pub mod stories;

use anyhow::Result;
use async_trait::async_trait;
use backend_api::contract::{Matchmaker, MediaStore, MessageSink, StoryStore};
use backend_api::model::{Candidate, DecisionOutcome, Story, StoryDraft, SwipeDirection};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone)]
pub struct LocalBackend {
    pool: Pool<SqliteConnectionManager>,
    media_dir: PathBuf,
}

impl LocalBackend {
    /// Open (or create) the store under `data_dir`.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;
        let manager = SqliteConnectionManager::file(data_dir.join("kindred.db")).with_init(|c| {
            c.execute_batch("PRAGMA foreign_keys = ON;")?;
            c.execute_batch(db::SCHEMA)
        });
        let pool = Pool::new(manager)?;
        Ok(Self {
            pool,
            media_dir: data_dir.join("media"),
        })
    }

    pub fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        Ok(self.pool.get()?)
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    /// Seed a profile so it shows up in candidate batches.
    pub fn seed_profile(&self, profile: &Candidate) -> Result<()> {
        let conn = self.conn()?;
        matchmaking::upsert_profile(&conn, profile)
    }

    /// Counts for the stats CLI: (stories, views, profiles).
    pub fn stats(&self) -> Result<(u64, u64, u64)> {
        let conn = self.conn()?;
        let stories: i64 = conn.query_row("SELECT COUNT(*) FROM stories", [], |r| r.get(0))?;
        let views: i64 = conn.query_row("SELECT COUNT(*) FROM story_views", [], |r| r.get(0))?;
        let profiles: i64 = conn.query_row("SELECT COUNT(*) FROM profiles", [], |r| r.get(0))?;
        Ok((stories as u64, views as u64, profiles as u64))
    }
}

#[async_trait]
impl StoryStore for LocalBackend {
    async fn create(&self, draft: StoryDraft) -> Result<Story> {
        let conn = self.conn()?;
        stories::create_story(&conn, draft)
    }

    async fn stories_for_owner(&self, owner: Uuid, now: i64) -> Result<Vec<Story>> {
        let conn = self.conn()?;
        stories::stories_for_owner(&conn, &owner, now)
    }

    async fn delete(&self, owner: Uuid, story_id: Uuid) -> Result<()> {
        let conn = self.conn()?;
        stories::delete_story(&conn, &owner, &story_id)
    }

    async fn record_view(&self, story_id: Uuid, viewer: Uuid) -> Result<()> {
        let conn = self.conn()?;
        stories::record_view(&conn, &story_id, &viewer)
    }

    async fn view_count(&self, story_id: Uuid) -> Result<u64> {
        let conn = self.conn()?;
        stories::view_count(&conn, &story_id)
    }

    async fn add_reaction(&self, story_id: Uuid, user: Uuid, emoji: &str) -> Result<()> {
        let conn = self.conn()?;
        stories::add_reaction(&conn, &story_id, &user, emoji)
    }
}

#[async_trait]
impl MediaStore for LocalBackend {
    async fn upload(&self, owner: Uuid, file_name: &str, data: Vec<u8>) -> Result<String> {
        let ts = OffsetDateTime::now_utc().unix_timestamp();
        media::save_media(&self.media_dir, &owner, ts, file_name, data).await
    }
}

#[async_trait]
impl Matchmaker for LocalBackend {
    async fn candidates(&self, user: Uuid, limit: u32) -> Result<Vec<Candidate>> {
        let conn = self.conn()?;
        matchmaking::candidates(&conn, &user, limit)
    }

    async fn decide(
        &self,
        user: Uuid,
        candidate: Uuid,
        direction: SwipeDirection,
    ) -> Result<DecisionOutcome> {
        let conn = self.conn()?;
        matchmaking::decide(&conn, &user, &candidate, direction)
    }

    async fn block(&self, user: Uuid, candidate: Uuid) -> Result<()> {
        let conn = self.conn()?;
        matchmaking::block(&conn, &user, &candidate)
    }

    async fn report(&self, user: Uuid, candidate: Uuid, reason: &str) -> Result<()> {
        let conn = self.conn()?;
        matchmaking::report(&conn, &user, &candidate, reason)
    }
}

#[async_trait]
impl MessageSink for LocalBackend {
    async fn send_direct(
        &self,
        from: Uuid,
        to: Uuid,
        body: &str,
        quoted: Option<&str>,
    ) -> Result<()> {
        let conn = self.conn()?;
        messages::send_direct(&conn, &from, &to, body, quoted)
    }
}
