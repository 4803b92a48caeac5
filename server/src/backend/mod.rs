//! Drives one MPD server: a background driver keeps a status/idle session
//! open and tracks whether the playlist is empty, while commands go out on
//! short-lived connections of their own.

pub mod connector;
pub mod driver;
pub mod mock_mpd;
pub mod protocol;

use async_trait::async_trait;
use log::{debug, info};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::backend::connector::Connector;
use crate::backend::driver::{Backoff, Driver};
use crate::backend::protocol::{quote, MpdSession};
use crate::error::BackendError;

/// What the scheduler needs from a playback backend.
#[async_trait]
pub trait Player: Send + Sync {
    async fn add_to_playlist(&self, stream_url: &str) -> Result<(), BackendError>;
    async fn skip(&self) -> Result<(), BackendError>;
    /// Resolves once the backend playlist is empty.
    async fn wait_for_song(&self);
    fn is_ready(&self) -> bool;
}

/// The "playlist is empty" signal plus the add-in-flight flag guarding it.
///
/// Both live under one lock so a status poll can never mark the playlist
/// empty in between an add starting and its song landing in MPD.
pub struct PlaybackSignal {
    empty: watch::Sender<bool>,
    adding: Mutex<bool>,
}

impl Default for PlaybackSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackSignal {
    pub fn new() -> Self {
        let (empty, _) = watch::channel(false);
        PlaybackSignal {
            empty,
            adding: Mutex::new(false),
        }
    }

    /// Applies a `playlistlength` seen in a status reply.
    pub fn observe_playlist_length(&self, length: usize) {
        let adding = self.adding.lock().unwrap_or_else(PoisonError::into_inner);
        if length > 0 {
            self.empty.send_replace(false);
        } else if !*adding {
            self.empty.send_replace(true);
        } else {
            debug!("[-] playlist looks empty but an add is in flight");
        }
    }

    pub fn is_empty(&self) -> bool {
        *self.empty.borrow()
    }

    pub fn is_adding(&self) -> bool {
        *self.adding.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn wait_until_empty(&self) {
        let mut empty = self.empty.subscribe();
        // the sender lives as long as self, so this cannot fail
        let _ = empty.wait_for(|empty| *empty).await;
    }

    /// Marks an add as in flight until the returned guard drops.
    pub fn begin_add(&self) -> Result<AddGuard<'_>, BackendError> {
        let mut adding = self.adding.lock().unwrap_or_else(PoisonError::into_inner);
        if *adding {
            return Err(BackendError::ConcurrencyViolation);
        }
        *adding = true;
        self.empty.send_replace(false);
        Ok(AddGuard { signal: self })
    }
}

pub struct AddGuard<'a> {
    signal: &'a PlaybackSignal,
}

impl Drop for AddGuard<'_> {
    fn drop(&mut self) {
        *self
            .signal
            .adding
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = false;
    }
}

pub struct BackendConnection {
    connector: Arc<dyn Connector>,
    signal: Arc<PlaybackSignal>,
    backoff: Backoff,
    consume: bool,
    shutdown: watch::Sender<bool>,
}

impl BackendConnection {
    pub fn new(connector: Arc<dyn Connector>, backoff: Backoff, consume: bool) -> Self {
        let (shutdown, _) = watch::channel(false);
        BackendConnection {
            connector,
            signal: Arc::new(PlaybackSignal::new()),
            backoff,
            consume,
            shutdown,
        }
    }

    /// Spawns the status/idle driver. It reconnects on its own until
    /// `shutdown` is called.
    pub fn start(&self) -> JoinHandle<()> {
        let driver = Driver::new(
            Arc::clone(&self.connector),
            Arc::clone(&self.signal),
            self.backoff,
            self.consume,
        );
        tokio::spawn(driver.run(self.shutdown.subscribe()))
    }

    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn signal(&self) -> &PlaybackSignal {
        &self.signal
    }

    pub async fn add_to_playlist(&self, stream_url: &str) -> Result<(), BackendError> {
        let _adding = self.signal.begin_add()?;

        let mut session = self.command_session().await?;
        session.command(&format!("add {}", quote(stream_url))).await?;
        session.command("play").await?;
        info!("[+] mpd playing {}", stream_url);
        Ok(())
    }

    pub async fn skip(&self) -> Result<(), BackendError> {
        let mut session = self.command_session().await?;
        session.command("clear").await?;
        info!("[+] mpd playlist cleared");
        Ok(())
    }

    pub async fn wait_for_song(&self) {
        self.signal.wait_until_empty().await
    }

    pub fn is_ready(&self) -> bool {
        self.signal.is_empty()
    }

    async fn command_session(&self) -> Result<MpdSession, BackendError> {
        let transport = self.connector.connect().await?;
        MpdSession::handshake(transport).await
    }
}

#[async_trait]
impl Player for BackendConnection {
    async fn add_to_playlist(&self, stream_url: &str) -> Result<(), BackendError> {
        BackendConnection::add_to_playlist(self, stream_url).await
    }

    async fn skip(&self) -> Result<(), BackendError> {
        BackendConnection::skip(self).await
    }

    async fn wait_for_song(&self) {
        BackendConnection::wait_for_song(self).await
    }

    fn is_ready(&self) -> bool {
        BackendConnection::is_ready(self)
    }
}
