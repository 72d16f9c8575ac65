use anyhow::Result;
use rusqlite::{params, Connection};
use time::OffsetDateTime;
use uuid::Uuid;

/// Persist a direct message. For story replies the quoted text is carried
/// alongside the body so the conversation shows what was replied to.
pub fn send_direct(
    conn: &Connection,
    from: &Uuid,
    to: &Uuid,
    body: &str,
    quoted: Option<&str>,
) -> Result<()> {
    if body.trim().is_empty() {
        anyhow::bail!("empty_reply");
    }
    let now = OffsetDateTime::now_utc().unix_timestamp();
    conn.execute(
        "INSERT INTO messages (id, from_id, to_id, body, quoted_text, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            Uuid::new_v4().to_string(),
            from.to_string(),
            to.to_string(),
            body,
            quoted,
            now
        ],
    )?;
    Ok(())
}

/// Count of messages delivered to a user, used by tests and the stats CLI.
pub fn inbox_count(conn: &Connection, to: &Uuid) -> Result<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE to_id = ?1",
        [to.to_string()],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}
