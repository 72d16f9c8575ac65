use crate::LocalBackend;
use anyhow::Result;
use rusqlite::Connection;
use time::OffsetDateTime;
use tokio::time::{interval, Duration};
use tracing::{info, warn};

/// Delete stories past their expiry, along with their views and reactions.
/// Returns the number of stories removed. Retrieval already filters expired
/// rows, so this only reclaims space.
pub fn purge_expired(conn: &Connection, now: i64) -> Result<usize> {
    let removed = conn.execute("DELETE FROM stories WHERE expires_at <= ?1", [now])?;
    Ok(removed)
}

/// Periodically sweep expired stories out of the local store.
pub fn run_housekeeping(backend: LocalBackend, every: Duration) {
    tokio::spawn(async move {
        let mut tick = interval(every);
        loop {
            tick.tick().await;
            let now = OffsetDateTime::now_utc().unix_timestamp();
            match backend.conn().and_then(|conn| purge_expired(&conn, now)) {
                Ok(0) => {}
                Ok(n) => info!(removed = n, "purged expired stories"),
                Err(e) => warn!(error = %e, "story purge failed"),
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use backend_api::model::{StoryDraft, StoryPayload, AUTHORED_STORY_SECS};
    use uuid::Uuid;

    #[test]
    fn purge_removes_only_expired() {
        let conn = db::init_db(":memory:").unwrap();
        let owner = Uuid::new_v4();
        let draft = StoryDraft {
            owner_id: owner,
            payload: StoryPayload::Text,
            text_overlay: Some("x".into()),
            overlay_position: None,
            background_id: None,
            duration_secs: AUTHORED_STORY_SECS,
        };
        let story = crate::stories::create_story(&conn, draft).unwrap();
        let viewer = Uuid::new_v4();
        crate::stories::record_view(&conn, &story.id, &viewer).unwrap();

        assert_eq!(purge_expired(&conn, story.expires_at - 1).unwrap(), 0);
        assert_eq!(purge_expired(&conn, story.expires_at).unwrap(), 1);
        // view rows cascade with the story
        let views: i64 = conn
            .query_row("SELECT COUNT(*) FROM story_views", [], |row| row.get(0))
            .unwrap();
        assert_eq!(views, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_purges_on_tick() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalBackend::open(tmp.path()).unwrap();
        let conn = backend.conn().unwrap();
        let draft = StoryDraft {
            owner_id: Uuid::new_v4(),
            payload: StoryPayload::Text,
            text_overlay: Some("old".into()),
            overlay_position: None,
            background_id: None,
            duration_secs: AUTHORED_STORY_SECS,
        };
        let story = crate::stories::create_story(&conn, draft).unwrap();
        conn.execute(
            "UPDATE stories SET expires_at = 0 WHERE id = ?1",
            [story.id.to_string()],
        )
        .unwrap();
        drop(conn);

        run_housekeeping(backend.clone(), Duration::from_secs(3600));
        // the first interval tick fires immediately
        tokio::time::sleep(Duration::from_millis(1)).await;
        let (stories, _, _) = backend.stats().unwrap();
        assert_eq!(stories, 0);
    }
}
