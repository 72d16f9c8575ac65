use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed lifetime of a story after creation.
pub const STORY_TTL_SECS: i64 = 24 * 60 * 60;
/// Playback duration for stories authored by this client.
pub const AUTHORED_STORY_SECS: u32 = 10;
/// Fallback duration for stored stories with a missing or zero duration.
pub const LEGACY_STORY_SECS: u32 = 15;
/// Hard cap for video uploads. Larger files are rejected, never compressed.
pub const MAX_VIDEO_BYTES: usize = 20 * 1024 * 1024;
/// The emoji accepted as story reactions.
pub const REACTION_EMOJI: [&str; 6] = ["\u{2764}\u{fe0f}", "\u{1f602}", "\u{1f62e}", "\u{1f622}", "\u{1f525}", "\u{1f44d}"];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

/// What a story renders. Text stories carry no media at all; the overlay
/// text and background gradient on the story itself do the work.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoryPayload {
    Media { url: String, kind: MediaKind },
    Text,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OverlayPosition {
    Top,
    Center,
    Bottom,
}

impl OverlayPosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayPosition::Top => "top",
            OverlayPosition::Center => "center",
            OverlayPosition::Bottom => "bottom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "top" => Some(OverlayPosition::Top),
            "center" => Some(OverlayPosition::Center),
            "bottom" => Some(OverlayPosition::Bottom),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Reaction {
    pub user_id: Uuid,
    pub emoji: String,
    pub created_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Story {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub payload: StoryPayload,
    pub text_overlay: Option<String>,
    pub overlay_position: Option<OverlayPosition>,
    pub background_id: Option<String>,
    pub duration_secs: u32,
    pub created_at: i64,
    pub expires_at: i64,
    pub view_count: u64,
    pub reactions: Vec<Reaction>,
}

impl Story {
    /// Playback duration, falling back for legacy rows stored without one.
    pub fn effective_duration_secs(&self) -> u32 {
        if self.duration_secs == 0 {
            LEGACY_STORY_SECS
        } else {
            self.duration_secs
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

/// What the composer hands to the store. The store stamps created_at and
/// derives expires_at from the fixed window.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoryDraft {
    pub owner_id: Uuid,
    pub payload: StoryPayload,
    pub text_overlay: Option<String>,
    pub overlay_position: Option<OverlayPosition>,
    pub background_id: Option<String>,
    pub duration_secs: u32,
}

/// A profile offered to the swipe deck. Optional display attributes get
/// their defaults at the storage boundary so controller code never has to
/// probe for missing fields.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: Uuid,
    pub display_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SwipeDirection {
    Pass,
    Like,
    SuperLike,
}

impl SwipeDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwipeDirection::Pass => "pass",
            SwipeDirection::Like => "like",
            SwipeDirection::SuperLike => "superlike",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pass" => Some(SwipeDirection::Pass),
            "like" => Some(SwipeDirection::Like),
            "superlike" => Some(SwipeDirection::SuperLike),
            _ => None,
        }
    }
}

/// Result of a swipe decision. `matched` is only ever true for likes and
/// super-likes where the other side had already liked back.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionOutcome {
    pub matched: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_tagging_roundtrip() {
        let media = StoryPayload::Media {
            url: "/media/u/1_a.jpg".into(),
            kind: MediaKind::Image,
        };
        let s = serde_json::to_string(&media).unwrap();
        assert!(s.contains("\"type\":\"media\""));
        let de: StoryPayload = serde_json::from_str(&s).unwrap();
        assert_eq!(media, de);

        let text = serde_json::to_string(&StoryPayload::Text).unwrap();
        assert_eq!(text, "{\"type\":\"text\"}");
    }

    #[test]
    fn legacy_duration_fallback() {
        let story = Story {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            payload: StoryPayload::Text,
            text_overlay: None,
            overlay_position: None,
            background_id: None,
            duration_secs: 0,
            created_at: 0,
            expires_at: STORY_TTL_SECS,
            view_count: 0,
            reactions: vec![],
        };
        assert_eq!(story.effective_duration_secs(), LEGACY_STORY_SECS);
        assert!(story.is_expired(STORY_TTL_SECS));
        assert!(!story.is_expired(STORY_TTL_SECS - 1));
    }

    #[test]
    fn enum_string_mapping() {
        assert_eq!(OverlayPosition::parse("bottom"), Some(OverlayPosition::Bottom));
        assert_eq!(OverlayPosition::parse("middle"), None);
        assert_eq!(SwipeDirection::parse("superlike"), Some(SwipeDirection::SuperLike));
        assert_eq!(SwipeDirection::Pass.as_str(), "pass");
    }
}
