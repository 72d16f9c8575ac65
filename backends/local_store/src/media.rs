use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Strip anything that should not land in a file name.
fn sanitize_name(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.replace("..", "_");
    if cleaned.trim_matches('_').is_empty() {
        "upload".into()
    } else {
        cleaned
    }
}

/// Save media bytes under a per-user, per-timestamp path and return the
/// public URL. A short content hash keeps same-second uploads apart.
pub async fn save_media<P: AsRef<Path>>(
    base: P,
    owner: &Uuid,
    ts: i64,
    file_name: &str,
    data: Vec<u8>,
) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update(&data);
    let digest = format!("{:x}", hasher.finalize());
    let name = format!("{}_{}_{}", ts, &digest[..8], sanitize_name(file_name));
    let dir = base.as_ref().join(owner.to_string());
    fs::create_dir_all(&dir).await?;
    fs::write(dir.join(&name), data).await?;
    Ok(format!("/media/{}/{}", owner, name))
}

/// On-disk path for a previously returned media URL.
pub fn media_path<P: AsRef<Path>>(base: P, url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("/media/")?;
    let (owner, name) = rest.split_once('/')?;
    Some(base.as_ref().join(owner).join(name))
}
