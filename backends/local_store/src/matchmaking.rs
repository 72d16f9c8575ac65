use anyhow::Result;
use backend_api::model::{Candidate, DecisionOutcome, SwipeDirection};
use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;
use uuid::Uuid;

/// Insert or refresh a profile row.
pub fn upsert_profile(conn: &Connection, profile: &Candidate) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles (id, display_name, bio, age, photo_url) VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(id) DO UPDATE SET display_name = excluded.display_name, bio = excluded.bio, age = excluded.age, photo_url = excluded.photo_url",
        params![
            profile.id.to_string(),
            profile.display_name,
            profile.bio,
            profile.age,
            profile.photo_url,
        ],
    )?;
    Ok(())
}

/// Recommendation batch: profiles the user has not decided on or blocked,
/// excluding the user themselves. Defaults for optional display fields are
/// resolved here so callers get fully shaped candidates.
pub fn candidates(conn: &Connection, user: &Uuid, limit: u32) -> Result<Vec<Candidate>> {
    let mut stmt = conn.prepare(
        "SELECT id, display_name, bio, age, photo_url FROM profiles \
         WHERE id <> ?1 \
           AND id NOT IN (SELECT candidate_id FROM decisions WHERE user_id = ?1) \
           AND id NOT IN (SELECT blocked_id FROM blocks WHERE user_id = ?1) \
         ORDER BY display_name ASC, id ASC LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![user.to_string(), limit], |row| {
            Ok(Candidate {
                id: crate::db::uuid_col(row, 0)?,
                display_name: row.get(1)?,
                bio: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                age: row.get(3)?,
                photo_url: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Record a swipe decision. Likes and super-likes check for the reverse
/// like to detect a mutual match; passes never match.
pub fn decide(
    conn: &Connection,
    user: &Uuid,
    candidate: &Uuid,
    direction: SwipeDirection,
) -> Result<DecisionOutcome> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    conn.execute(
        "INSERT INTO decisions (user_id, candidate_id, direction, created_at) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(user_id, candidate_id) DO UPDATE SET direction = excluded.direction, created_at = excluded.created_at",
        params![
            user.to_string(),
            candidate.to_string(),
            direction.as_str(),
            now
        ],
    )?;
    if direction == SwipeDirection::Pass {
        return Ok(DecisionOutcome { matched: false });
    }
    let reverse: Option<i64> = conn
        .query_row(
            "SELECT 1 FROM decisions WHERE user_id = ?1 AND candidate_id = ?2 AND direction IN ('like', 'superlike')",
            params![candidate.to_string(), user.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(DecisionOutcome {
        matched: reverse.is_some(),
    })
}

/// Block a candidate. The blocked profile drops out of future batches.
pub fn block(conn: &Connection, user: &Uuid, candidate: &Uuid) -> Result<()> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    conn.execute(
        "INSERT OR IGNORE INTO blocks (user_id, blocked_id, created_at) VALUES (?1, ?2, ?3)",
        params![user.to_string(), candidate.to_string(), now],
    )?;
    Ok(())
}

pub fn report(conn: &Connection, user: &Uuid, candidate: &Uuid, reason: &str) -> Result<()> {
    let now = OffsetDateTime::now_utc().unix_timestamp();
    conn.execute(
        "INSERT INTO reports (id, user_id, candidate_id, reason, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            Uuid::new_v4().to_string(),
            user.to_string(),
            candidate.to_string(),
            reason,
            now
        ],
    )?;
    Ok(())
}
