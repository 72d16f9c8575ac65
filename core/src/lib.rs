//! Client-side engine: playback, authoring and deck controllers plus the
//! config and notification plumbing shared by the binary and the UI layer.

pub mod compose;
pub mod config;
pub mod deck;
pub mod gate;
pub mod gesture;
pub mod notify;
pub mod playback;

pub use notify::{Notice, Notices};
