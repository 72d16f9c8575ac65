use anyhow::{anyhow, Result};
use backend_api::model::{
    MediaKind, OverlayPosition, Reaction, Story, StoryDraft, StoryPayload, STORY_TTL_SECS,
};
use rusqlite::{params, Connection, OptionalExtension, Row};
use time::OffsetDateTime;
use uuid::Uuid;

/// Insert a new story, stamping creation time and the fixed expiry window.
pub fn create_story(conn: &Connection, draft: StoryDraft) -> Result<Story> {
    let id = Uuid::new_v4();
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let expires_at = now + STORY_TTL_SECS;
    let (kind, media_url) = match &draft.payload {
        StoryPayload::Media { url, kind } => (kind.as_str(), Some(url.clone())),
        StoryPayload::Text => ("text", None),
    };
    conn.execute(
        "INSERT INTO stories (id, owner_id, kind, media_url, text_overlay, overlay_position, background_id, duration_secs, created_at, expires_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id.to_string(),
            draft.owner_id.to_string(),
            kind,
            media_url,
            draft.text_overlay,
            draft.overlay_position.map(|p| p.as_str()),
            draft.background_id,
            draft.duration_secs,
            now,
            expires_at,
        ],
    )?;
    Ok(Story {
        id,
        owner_id: draft.owner_id,
        payload: draft.payload,
        text_overlay: draft.text_overlay,
        overlay_position: draft.overlay_position,
        background_id: draft.background_id,
        duration_secs: draft.duration_secs,
        created_at: now,
        expires_at,
        view_count: 0,
        reactions: Vec::new(),
    })
}

fn row_to_story(row: &Row<'_>) -> rusqlite::Result<Story> {
    let kind: String = row.get(2)?;
    let media_url: Option<String> = row.get(3)?;
    let payload = match (kind.as_str(), media_url) {
        ("text", _) | (_, None) => StoryPayload::Text,
        (k, Some(url)) => StoryPayload::Media {
            url,
            kind: MediaKind::parse(k).unwrap_or(MediaKind::Image),
        },
    };
    Ok(Story {
        id: crate::db::uuid_col(row, 0)?,
        owner_id: crate::db::uuid_col(row, 1)?,
        payload,
        text_overlay: row.get(4)?,
        overlay_position: row
            .get::<_, Option<String>>(5)?
            .and_then(|s| OverlayPosition::parse(&s)),
        background_id: row.get(6)?,
        duration_secs: row.get(7)?,
        created_at: row.get(8)?,
        expires_at: row.get(9)?,
        view_count: row.get::<_, i64>(10)? as u64,
        reactions: Vec::new(),
    })
}

const STORY_COLS: &str = "id, owner_id, kind, media_url, text_overlay, overlay_position, background_id, duration_secs, created_at, expires_at, view_count";

/// Unexpired stories for one owner, ordered by creation ascending. Expired
/// rows are filtered out here, never deleted on behalf of the viewer.
pub fn stories_for_owner(conn: &Connection, owner: &Uuid, now: i64) -> Result<Vec<Story>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {STORY_COLS} FROM stories WHERE owner_id = ?1 AND expires_at > ?2 ORDER BY created_at ASC, rowid ASC"
    ))?;
    let mut stories = stmt
        .query_map(params![owner.to_string(), now], row_to_story)?
        .collect::<Result<Vec<_>, _>>()?;
    for story in &mut stories {
        story.reactions = reactions_for(conn, &story.id)?;
    }
    Ok(stories)
}

pub fn get_story(conn: &Connection, id: &Uuid) -> Result<Option<Story>> {
    let mut stmt = conn.prepare(&format!("SELECT {STORY_COLS} FROM stories WHERE id = ?1"))?;
    let story = stmt
        .query_row([id.to_string()], row_to_story)
        .optional()?;
    match story {
        Some(mut s) => {
            s.reactions = reactions_for(conn, &s.id)?;
            Ok(Some(s))
        }
        None => Ok(None),
    }
}

/// Delete a story, enforcing ownership.
pub fn delete_story(conn: &Connection, owner: &Uuid, story_id: &Uuid) -> Result<()> {
    let mut stmt = conn.prepare("SELECT owner_id FROM stories WHERE id = ?1")?;
    let stored: Option<String> = stmt
        .query_row([story_id.to_string()], |row| row.get(0))
        .optional()?;
    let Some(stored) = stored else {
        return Err(anyhow!("not_found"));
    };
    if stored != owner.to_string() {
        anyhow::bail!("forbidden");
    }
    conn.execute("DELETE FROM stories WHERE id = ?1", [story_id.to_string()])?;
    Ok(())
}

/// Record a view: insert-or-ignore on the (story, viewer) pair, then write
/// the recomputed distinct-viewer count back onto the story. The recount is
/// not atomic against concurrent viewers; counts are advisory.
pub fn record_view(conn: &Connection, story_id: &Uuid, viewer: &Uuid) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM stories WHERE id = ?1",
            [story_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        anyhow::bail!("not_found");
    }
    let now = OffsetDateTime::now_utc().unix_timestamp();
    conn.execute(
        "INSERT OR IGNORE INTO story_views (story_id, viewer_id, viewed_at) VALUES (?1, ?2, ?3)",
        params![story_id.to_string(), viewer.to_string(), now],
    )?;
    conn.execute(
        "UPDATE stories SET view_count = (SELECT COUNT(*) FROM story_views WHERE story_id = ?1) WHERE id = ?1",
        [story_id.to_string()],
    )?;
    Ok(())
}

pub fn view_count(conn: &Connection, story_id: &Uuid) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT view_count FROM stories WHERE id = ?1",
        [story_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

/// Append a reaction entry. Repeated reactions from one user accumulate;
/// coalescing rapid taps is the client's job.
pub fn add_reaction(conn: &Connection, story_id: &Uuid, user: &Uuid, emoji: &str) -> Result<()> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM stories WHERE id = ?1",
            [story_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        anyhow::bail!("not_found");
    }
    let now = OffsetDateTime::now_utc().unix_timestamp();
    conn.execute(
        "INSERT INTO story_reactions (story_id, user_id, emoji, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![story_id.to_string(), user.to_string(), emoji, now],
    )?;
    Ok(())
}

fn reactions_for(conn: &Connection, story_id: &Uuid) -> Result<Vec<Reaction>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, emoji, created_at FROM story_reactions WHERE story_id = ?1 ORDER BY created_at ASC, rowid ASC",
    )?;
    let reactions = stmt
        .query_map([story_id.to_string()], |row| {
            Ok(Reaction {
                user_id: crate::db::uuid_col(row, 0)?,
                emoji: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reactions)
}
