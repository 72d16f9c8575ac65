use crate::notify::{Notice, Notices};
use anyhow::Result;
use backend_api::contract::{MediaStore, StoryStore};
use backend_api::model::{
    MediaKind, OverlayPosition, Story, StoryDraft, StoryPayload, AUTHORED_STORY_SECS,
};
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// Validation failures surfaced before any network call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("caption required")]
    EmptyCaption,
    #[error("no media selected")]
    NoMediaSelected,
    #[error("video exceeds {max_mb} MB")]
    VideoTooLarge { max_mb: u64 },
    #[error("unsupported media file")]
    UnsupportedMedia,
}

/// Authoring mode. Switching modes clears mode-specific input so a stale
/// media pick can never leak into a text story.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Media,
    Text,
}

/// A file chosen from the device picker, held in memory until submit.
#[derive(Debug, Clone)]
pub struct PickedFile {
    pub name: String,
    pub kind: MediaKind,
    pub bytes: Vec<u8>,
}

/// Story authoring state. All validation happens locally; `submit` is the
/// only path that touches the backend, and only after validation passed.
pub struct Composer {
    owner: Uuid,
    mode: Mode,
    picked: Option<PickedFile>,
    caption: Option<String>,
    background_id: Option<String>,
    position: OverlayPosition,
    max_video_bytes: usize,
    max_image_dim: u32,
    media: Arc<dyn MediaStore>,
    stories: Arc<dyn StoryStore>,
    notices: Notices,
}

impl Composer {
    pub fn new(
        owner: Uuid,
        max_video_bytes: usize,
        max_image_dim: u32,
        media: Arc<dyn MediaStore>,
        stories: Arc<dyn StoryStore>,
        notices: Notices,
    ) -> Self {
        Self {
            owner,
            mode: Mode::Media,
            picked: None,
            caption: None,
            background_id: None,
            position: OverlayPosition::Center,
            max_video_bytes,
            max_image_dim,
            media,
            stories,
            notices,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn switch_mode(&mut self, mode: Mode) {
        if mode != self.mode {
            self.mode = mode;
            self.picked = None;
            self.caption = None;
            self.background_id = None;
        }
    }

    pub fn pick(&mut self, file: PickedFile) {
        self.picked = Some(file);
    }

    pub fn set_caption(&mut self, caption: &str) {
        let trimmed = caption.trim();
        self.caption = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    pub fn set_background(&mut self, background_id: Option<String>) {
        self.background_id = background_id;
    }

    pub fn set_position(&mut self, position: OverlayPosition) {
        self.position = position;
    }

    /// Check the current input without side effects, so the UI can keep
    /// the post button disabled instead of failing on tap.
    pub fn validate(&self) -> Result<(), ComposeError> {
        match self.mode {
            Mode::Media => {
                let Some(file) = &self.picked else {
                    return Err(ComposeError::NoMediaSelected);
                };
                if file.kind == MediaKind::Video && file.bytes.len() > self.max_video_bytes {
                    return Err(ComposeError::VideoTooLarge {
                        max_mb: (self.max_video_bytes / (1024 * 1024)) as u64,
                    });
                }
            }
            Mode::Text => {
                if self.caption.is_none() {
                    return Err(ComposeError::EmptyCaption);
                }
            }
        }
        Ok(())
    }

    /// Validate, upload media if any and create the story. Authored stories
    /// always get the fixed client-side duration; the 24h expiry is stamped
    /// by the store.
    pub async fn submit(&mut self) -> Result<Story> {
        self.validate()?;
        let payload = match self.mode {
            Mode::Media => {
                // validate() ran above, so the pick is present
                let Some(file) = self.picked.clone() else {
                    return Err(ComposeError::NoMediaSelected.into());
                };
                let (name, bytes) = match file.kind {
                    MediaKind::Image => {
                        let compressed = compress_image(&file.bytes, self.max_image_dim)?;
                        debug!(
                            original = file.bytes.len(),
                            compressed = compressed.len(),
                            "image recompressed for upload"
                        );
                        (jpeg_name(&file.name), compressed)
                    }
                    // videos upload as picked, the size cap already passed
                    MediaKind::Video => (file.name.clone(), file.bytes),
                };
                let url = self.media.upload(self.owner, &name, bytes).await?;
                StoryPayload::Media {
                    url,
                    kind: file.kind,
                }
            }
            Mode::Text => StoryPayload::Text,
        };
        let draft = StoryDraft {
            owner_id: self.owner,
            payload,
            text_overlay: self.caption.clone(),
            overlay_position: Some(self.position),
            background_id: self.background_id.clone(),
            duration_secs: AUTHORED_STORY_SECS,
        };
        let story = self.stories.create(draft).await?;
        self.notices.push(Notice::StoryPosted);
        self.picked = None;
        self.caption = None;
        self.background_id = None;
        Ok(story)
    }
}

/// Decode, downscale to fit the dimension cap while keeping aspect ratio,
/// and re-encode as JPEG. Undecodable bytes are rejected as unsupported.
fn compress_image(bytes: &[u8], max_dim: u32) -> Result<Vec<u8>, ComposeError> {
    let img = image::load_from_memory(bytes).map_err(|_| ComposeError::UnsupportedMedia)?;
    let img = if img.width() > max_dim || img.height() > max_dim {
        img.thumbnail(max_dim, max_dim)
    } else {
        img
    };
    let mut out = Vec::new();
    img.write_to(
        &mut Cursor::new(&mut out),
        image::ImageOutputFormat::Jpeg(85),
    )
    .map_err(|_| ComposeError::UnsupportedMedia)?;
    Ok(out)
}

fn jpeg_name(original: &str) -> String {
    match original.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.jpg"),
        None => format!("{original}.jpg"),
    }
}
