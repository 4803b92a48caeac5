// Test doubles shared by the scheduler and session tests.
#![allow(dead_code)]

use async_trait::async_trait;
use jukeshare_server::backend::Player;
use jukeshare_server::error::{BackendError, ResolveError};
use jukeshare_server::models::fair_queue::Snapshot;
use jukeshare_server::models::song::Song;
use jukeshare_server::resolver::Resolver;
use jukeshare_server::scheduler::{Outbound, Subscription};
use mockall::mock;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

pub const WAIT: Duration = Duration::from_secs(5);

mock! {
    pub Resolver {}

    #[async_trait]
    impl Resolver for Resolver {
        async fn song_info(&self, query: &str) -> Result<Song, ResolveError>;
        async fn stream_url(&self, url: &str) -> Result<String, ResolveError>;
    }
}

/// Resolver that maps every URL to `stream:<url>` and every query to a song titled after it.
pub fn echo_resolver() -> MockResolver {
    let mut resolver = MockResolver::new();
    resolver
        .expect_song_info()
        .returning(|query| Ok(Song::new(query, None, format!("https://example.com/{}", query))));
    resolver
        .expect_stream_url()
        .returning(|url| Ok(format!("stream:{}", url)));
    resolver
}

pub fn create_test_song(name: &str) -> Song {
    Song::new(name, None, format!("https://example.com/{}", name))
}

/// In-memory player: songs "play" until the test calls `finish_song`.
pub struct FakePlayer {
    empty: watch::Sender<bool>,
    added: Mutex<Vec<String>>,
    skips: AtomicUsize,
    fail_adds: AtomicBool,
    fail_skips: AtomicBool,
}

impl FakePlayer {
    pub fn new() -> Arc<Self> {
        let (empty, _) = watch::channel(true);
        Arc::new(FakePlayer {
            empty,
            added: Mutex::new(Vec::new()),
            skips: AtomicUsize::new(0),
            fail_adds: AtomicBool::new(false),
            fail_skips: AtomicBool::new(false),
        })
    }

    pub fn finish_song(&self) {
        self.empty.send_replace(true);
    }

    pub fn added(&self) -> Vec<String> {
        self.added.lock().unwrap().clone()
    }

    /// Waits until `count` songs reached the player. Finishing a song before
    /// its add landed would leave the next wait hanging.
    pub async fn wait_for_adds(&self, count: usize) {
        tokio::time::timeout(WAIT, async {
            while self.added.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for the player to get a song");
    }

    pub fn skips(&self) -> usize {
        self.skips.load(Ordering::SeqCst)
    }

    pub fn set_fail_adds(&self, fail: bool) {
        self.fail_adds.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_skips(&self, fail: bool) {
        self.fail_skips.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Player for FakePlayer {
    async fn add_to_playlist(&self, stream_url: &str) -> Result<(), BackendError> {
        if self.fail_adds.load(Ordering::SeqCst) {
            return Err(BackendError::Command {
                command: format!("add {:?}", stream_url),
                message: "No such directory".to_string(),
            });
        }
        self.added.lock().unwrap().push(stream_url.to_string());
        self.empty.send_replace(false);
        Ok(())
    }

    async fn skip(&self) -> Result<(), BackendError> {
        if self.fail_skips.load(Ordering::SeqCst) {
            return Err(BackendError::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "Not connected",
            )));
        }
        self.skips.fetch_add(1, Ordering::SeqCst);
        self.empty.send_replace(true);
        Ok(())
    }

    async fn wait_for_song(&self) {
        let mut empty = self.empty.subscribe();
        let _ = empty.wait_for(|empty| *empty).await;
    }

    fn is_ready(&self) -> bool {
        *self.empty.borrow()
    }
}

/// Reads snapshots until one satisfies `predicate`, skipping notices.
pub async fn wait_for_snapshot<F>(subscription: &mut Subscription, predicate: F) -> Arc<Snapshot>
where
    F: Fn(&Snapshot) -> bool,
{
    let search = async {
        loop {
            match subscription.recv().await {
                Some(Outbound::Snapshot(snapshot)) if predicate(&snapshot) => return snapshot,
                Some(_) => continue,
                None => panic!("scheduler closed the subscription"),
            }
        }
    };
    tokio::time::timeout(WAIT, search)
        .await
        .expect("timed out waiting for a matching snapshot")
}

/// Reads until the next notice, skipping snapshots.
pub async fn wait_for_notice(subscription: &mut Subscription) -> String {
    let search = async {
        loop {
            match subscription.recv().await {
                Some(Outbound::Notice(message)) => return message,
                Some(_) => continue,
                None => panic!("scheduler closed the subscription"),
            }
        }
    };
    tokio::time::timeout(WAIT, search)
        .await
        .expect("timed out waiting for a notice")
}

pub fn current_title(snapshot: &Snapshot) -> Option<&str> {
    snapshot
        .current
        .as_ref()
        .map(|now_playing| now_playing.song.title.as_str())
}
