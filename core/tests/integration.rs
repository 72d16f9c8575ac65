//! End-to-end flows through the controllers against the SQLite-backed
//! local store, the same wiring the binary uses.

use std::sync::Arc;

use backend_api::contract::{Matchmaker, MediaStore, MessageSink, StoryStore};
use backend_api::model::{
    Candidate, MediaKind, StoryPayload, SwipeDirection, AUTHORED_STORY_SECS, STORY_TTL_SECS,
};
use kindredcore::compose::{Composer, Mode, PickedFile};
use kindredcore::deck::Deck;
use kindredcore::playback::{Player, Step};
use kindredcore::{Notice, Notices};
use local_store::{housekeeping, messages, LocalBackend};
use time::OffsetDateTime;
use uuid::Uuid;

fn open_backend() -> (Arc<LocalBackend>, tempfile::TempDir) {
    let tmp = tempfile::tempdir().unwrap();
    let backend = Arc::new(LocalBackend::open(tmp.path()).unwrap());
    (backend, tmp)
}

fn now() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn text_composer(backend: &Arc<LocalBackend>, owner: Uuid, notices: Notices) -> Composer {
    let mut composer = Composer::new(
        owner,
        20 * 1024 * 1024,
        1080,
        backend.clone() as Arc<dyn MediaStore>,
        backend.clone() as Arc<dyn StoryStore>,
        notices,
    );
    composer.switch_mode(Mode::Text);
    composer
}

fn profile(name: &str) -> Candidate {
    Candidate {
        id: Uuid::new_v4(),
        display_name: name.into(),
        bio: String::new(),
        age: Some(29),
        photo_url: None,
    }
}

#[tokio::test]
async fn compose_view_and_reply_roundtrip() {
    let (backend, _tmp) = open_backend();
    let owner = Uuid::new_v4();
    let viewer = Uuid::new_v4();
    let notices = Notices::default();

    let mut composer = text_composer(&backend, owner, notices.clone());
    composer.set_caption("first");
    composer.submit().await.unwrap();
    composer.set_caption("second");
    composer.submit().await.unwrap();

    let stories = backend.stories_for_owner(owner, now()).await.unwrap();
    assert_eq!(stories.len(), 2);
    assert_eq!(stories[0].text_overlay.as_deref(), Some("first"));
    assert_eq!(stories[0].duration_secs, AUTHORED_STORY_SECS);
    assert_eq!(stories[0].expires_at, stories[0].created_at + STORY_TTL_SECS);

    let player = Player::open(
        viewer,
        stories.clone(),
        backend.clone() as Arc<dyn StoryStore>,
        backend.clone() as Arc<dyn MessageSink>,
        notices,
    )
    .await
    .unwrap();

    assert!(player.reply("loved this").await.unwrap());
    assert_eq!(messages::inbox_count(&backend.conn().unwrap(), &owner).unwrap(), 1);
    let quoted: Option<String> = backend
        .conn()
        .unwrap()
        .query_row(
            "SELECT quoted_text FROM messages WHERE to_id = ?1",
            [owner.to_string()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(quoted.as_deref(), Some("first"));
}

#[tokio::test]
async fn views_deduplicate_across_replay() {
    let (backend, _tmp) = open_backend();
    let owner = Uuid::new_v4();
    let viewer = Uuid::new_v4();
    let notices = Notices::default();

    let mut composer = text_composer(&backend, owner, notices.clone());
    for caption in ["one", "two"] {
        composer.set_caption(caption);
        composer.submit().await.unwrap();
    }
    let stories = backend.stories_for_owner(owner, now()).await.unwrap();

    let player = Player::open(
        viewer,
        stories.clone(),
        backend.clone() as Arc<dyn StoryStore>,
        backend.clone() as Arc<dyn MessageSink>,
        notices,
    )
    .await
    .unwrap();

    // forward, back, forward again: each story still counts one view
    assert_eq!(player.advance().await, Step::Advanced);
    player.retreat();
    assert_eq!(player.advance().await, Step::Advanced);
    assert_eq!(player.advance().await, Step::Exited);

    for story in &stories {
        assert_eq!(backend.view_count(story.id).await.unwrap(), 1);
    }
}

#[tokio::test]
async fn owner_replay_records_no_views() {
    let (backend, _tmp) = open_backend();
    let owner = Uuid::new_v4();
    let notices = Notices::default();

    let mut composer = text_composer(&backend, owner, notices.clone());
    composer.set_caption("mine");
    composer.submit().await.unwrap();
    let stories = backend.stories_for_owner(owner, now()).await.unwrap();

    let player = Player::open(
        owner,
        stories.clone(),
        backend.clone() as Arc<dyn StoryStore>,
        backend.clone() as Arc<dyn MessageSink>,
        notices,
    )
    .await
    .unwrap();
    player.advance().await;
    assert_eq!(backend.view_count(stories[0].id).await.unwrap(), 0);
}

#[tokio::test]
async fn reactions_throttle_but_append_over_time() {
    let (backend, _tmp) = open_backend();
    let owner = Uuid::new_v4();
    let viewer = Uuid::new_v4();
    let notices = Notices::default();

    let mut composer = text_composer(&backend, owner, notices.clone());
    composer.set_caption("react to me");
    let story = composer.submit().await.unwrap();

    let player = Player::open(
        viewer,
        vec![story.clone()],
        backend.clone() as Arc<dyn StoryStore>,
        backend.clone() as Arc<dyn MessageSink>,
        notices,
    )
    .await
    .unwrap();

    // a burst of taps collapses to a single stored reaction
    let mut accepted = 0;
    for _ in 0..5 {
        if player.react("\u{1f525}").await.unwrap() {
            accepted += 1;
        }
    }
    assert_eq!(accepted, 1);

    // repeated reactions outside the window accumulate, they never replace
    backend.add_reaction(story.id, viewer, "\u{1f602}").await.unwrap();
    let stories = backend.stories_for_owner(owner, now()).await.unwrap();
    assert_eq!(stories[0].reactions.len(), 2);
    assert_eq!(stories[0].reactions[0].emoji, "\u{1f525}");
    assert_eq!(stories[0].reactions[1].emoji, "\u{1f602}");
}

#[tokio::test]
async fn expiry_hides_then_purge_reclaims() {
    let (backend, _tmp) = open_backend();
    let owner = Uuid::new_v4();
    let notices = Notices::default();

    let mut composer = text_composer(&backend, owner, notices);
    composer.set_caption("ephemeral");
    let story = composer.submit().await.unwrap();

    assert_eq!(
        backend
            .stories_for_owner(owner, story.expires_at - 1)
            .await
            .unwrap()
            .len(),
        1
    );
    // at the boundary the story is already gone from retrieval
    assert!(backend
        .stories_for_owner(owner, story.expires_at)
        .await
        .unwrap()
        .is_empty());

    let conn = backend.conn().unwrap();
    assert_eq!(housekeeping::purge_expired(&conn, story.expires_at).unwrap(), 1);
    let (stories, views, _) = backend.stats().unwrap();
    assert_eq!((stories, views), (0, 0));
}

#[tokio::test]
async fn delete_is_owner_only_end_to_end() {
    let (backend, _tmp) = open_backend();
    let owner = Uuid::new_v4();
    let viewer = Uuid::new_v4();
    let notices = Notices::default();

    let mut composer = text_composer(&backend, owner, notices.clone());
    composer.set_caption("short lived");
    composer.submit().await.unwrap();
    let stories = backend.stories_for_owner(owner, now()).await.unwrap();

    let intruder = Player::open(
        viewer,
        stories.clone(),
        backend.clone() as Arc<dyn StoryStore>,
        backend.clone() as Arc<dyn MessageSink>,
        notices.clone(),
    )
    .await
    .unwrap();
    assert!(intruder.delete_current().await.is_err());

    let own = Player::open(
        owner,
        stories,
        backend.clone() as Arc<dyn StoryStore>,
        backend.clone() as Arc<dyn MessageSink>,
        notices,
    )
    .await
    .unwrap();
    assert_eq!(own.delete_current().await.unwrap(), Step::Exited);
    assert!(backend
        .stories_for_owner(owner, now())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn image_story_uploads_compressed_media() {
    let (backend, _tmp) = open_backend();
    let owner = Uuid::new_v4();

    let img = image::RgbImage::from_pixel(2000, 1000, image::Rgb([200, 100, 50]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(
            &mut std::io::Cursor::new(&mut png),
            image::ImageOutputFormat::Png,
        )
        .unwrap();

    let mut composer = Composer::new(
        owner,
        20 * 1024 * 1024,
        1080,
        backend.clone() as Arc<dyn MediaStore>,
        backend.clone() as Arc<dyn StoryStore>,
        Notices::default(),
    );
    composer.pick(PickedFile {
        name: "beach.png".into(),
        kind: MediaKind::Image,
        bytes: png,
    });
    let story = composer.submit().await.unwrap();

    let StoryPayload::Media { url, kind } = &story.payload else {
        panic!("expected media payload");
    };
    assert_eq!(*kind, MediaKind::Image);
    assert!(url.ends_with(".jpg"));

    // the stored file decodes and fits the dimension cap
    let path = local_store::media::media_path(backend.media_dir(), url).unwrap();
    let stored = image::open(path).unwrap();
    assert!(stored.width() <= 1080 && stored.height() <= 1080);
}

#[tokio::test]
async fn deck_flow_match_exhaustion_and_undo() {
    let (backend, _tmp) = open_backend();
    let me = profile("me");
    let alex = profile("alex");
    let sam = profile("sam");
    for p in [&me, &alex, &sam] {
        backend.seed_profile(p).unwrap();
    }
    // alex already liked me, so my like back is a match
    backend
        .decide(alex.id, me.id, SwipeDirection::Like)
        .await
        .unwrap();

    let notices = Notices::new(32);
    let mut rx = notices.subscribe();
    let mut deck = Deck::new(
        me.id,
        25,
        backend.clone() as Arc<dyn Matchmaker>,
        backend.clone() as Arc<dyn MessageSink>,
        notices.clone(),
    );
    deck.load().await.unwrap();
    assert_eq!(deck.remaining(), 2);

    // candidates come back ordered by display name: alex then sam
    assert_eq!(deck.current().unwrap().id, alex.id);
    let outcome = deck.decide(SwipeDirection::Like).await.unwrap();
    assert!(outcome.matched);
    assert_eq!(rx.try_recv().unwrap(), Notice::Matched { candidate: alex.id });

    let outcome = deck.decide(SwipeDirection::Pass).await.unwrap();
    assert!(!outcome.matched);
    assert_eq!(rx.try_recv().unwrap(), Notice::Passed);
    assert_eq!(rx.try_recv().unwrap(), Notice::DeckExhausted);

    // undo brings sam back locally, but the remote pass stands: a reload
    // excludes both profiles
    assert_eq!(deck.undo().unwrap().id, sam.id);
    deck.load().await.unwrap();
    assert_eq!(deck.remaining(), 0);
}

#[tokio::test]
async fn blocked_profiles_never_reappear() {
    let (backend, _tmp) = open_backend();
    let me = profile("me");
    let creep = profile("creep");
    backend.seed_profile(&me).unwrap();
    backend.seed_profile(&creep).unwrap();

    let mut deck = Deck::new(
        me.id,
        25,
        backend.clone() as Arc<dyn Matchmaker>,
        backend.clone() as Arc<dyn MessageSink>,
        Notices::default(),
    );
    deck.load().await.unwrap();
    deck.block_current().await.unwrap();
    assert!(deck.current().is_none());

    deck.load().await.unwrap();
    assert_eq!(deck.remaining(), 0);
}
