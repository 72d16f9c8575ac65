pub mod contract;
pub mod model;

pub use contract::{Matchmaker, MediaStore, MessageSink, StoryStore};
pub use model::{
    Candidate, DecisionOutcome, MediaKind, OverlayPosition, Reaction, Story, StoryDraft,
    StoryPayload, SwipeDirection,
};
