//! The fair-queue scheduler: one coordinator task owns the queue, applies
//! commands in the order they arrive, starts playback whenever the current
//! slot is free, and pushes a snapshot to every subscriber after each change.

use log::{debug, info, warn};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::backend::Player;
use crate::error::{BackendError, PlaybackError};
use crate::models::fair_queue::{FairQueue, NowPlaying, Snapshot};
use crate::models::song::Song;
use crate::resolver::Resolver;

#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    /// Pause after add+play before trusting the backend's empty signal.
    pub settle_delay: Duration,
    /// Upper bound on how long one song may hold the current slot.
    pub song_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            settle_delay: Duration::from_millis(500),
            song_timeout: Duration::from_secs(3600),
        }
    }
}

/// Pushed to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Snapshot(Arc<Snapshot>),
    /// A problem meant for one user only.
    Notice(String),
}

impl Outbound {
    pub fn to_json(&self) -> String {
        match self {
            Outbound::Snapshot(snapshot) => {
                serde_json::to_string(snapshot.as_ref()).unwrap_or_else(|e| {
                    warn!("[!] could not serialize snapshot: {}", e);
                    "{}".to_string()
                })
            }
            Outbound::Notice(message) => json!({ "error": message }).to_string(),
        }
    }
}

type SubscriberId = u64;

enum Command {
    Append {
        user: String,
        song: Song,
    },
    Remove {
        user: String,
        index: usize,
    },
    Subscribe {
        user: String,
        outbound: mpsc::UnboundedSender<Outbound>,
        reply: oneshot::Sender<SubscriberId>,
    },
    Unsubscribe {
        id: SubscriberId,
    },
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    PlaybackFinished {
        ticket: u64,
        failure: Option<String>,
    },
    Shutdown,
}

/// Cheap, cloneable front door to the scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    commands: mpsc::UnboundedSender<Command>,
    player: Arc<dyn Player>,
}

impl SchedulerHandle {
    pub fn append(&self, user: &str, song: Song) {
        self.send(Command::Append {
            user: user.to_string(),
            song,
        });
    }

    pub fn remove(&self, user: &str, index: usize) {
        self.send(Command::Remove {
            user: user.to_string(),
            index,
        });
    }

    /// Asks the backend to drop the current song. The slot frees up once the
    /// backend reports its playlist empty, same as when a song ends.
    pub async fn skip(&self) -> Result<(), BackendError> {
        self.player.skip().await
    }

    /// Registers `user` for snapshots. The current snapshot is delivered right away.
    pub async fn subscribe(&self, user: &str) -> Option<Subscription> {
        let (outbound, receiver) = mpsc::unbounded_channel();
        let (reply, id) = oneshot::channel();
        self.send(Command::Subscribe {
            user: user.to_string(),
            outbound,
            reply,
        });

        let id = id.await.ok()?;
        Some(Subscription {
            id,
            receiver,
            commands: self.commands.clone(),
        })
    }

    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (reply, snapshot) = oneshot::channel();
        self.send(Command::Snapshot { reply });
        snapshot.await.ok()
    }

    /// Stops the coordinator and closes every subscriber channel.
    pub fn shutdown(&self) {
        self.send(Command::Shutdown);
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!("[-] scheduler is gone, dropping command");
        }
    }
}

/// A subscriber's end of the snapshot feed. Unsubscribes on drop.
pub struct Subscription {
    id: SubscriberId,
    receiver: mpsc::UnboundedReceiver<Outbound>,
    commands: mpsc::UnboundedSender<Command>,
}

impl Subscription {
    /// Next message, or `None` once the scheduler shut down.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Outbound> {
        self.receiver.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Unsubscribe { id: self.id });
    }
}

struct Subscriber {
    user: String,
    outbound: mpsc::UnboundedSender<Outbound>,
}

struct Coordinator {
    queue: FairQueue,
    subscribers: HashMap<SubscriberId, Subscriber>,
    next_subscriber: SubscriberId,
    ticket: u64,
    playing: Option<JoinHandle<()>>,
    player: Arc<dyn Player>,
    resolver: Arc<dyn Resolver>,
    config: SchedulerConfig,
    commands: mpsc::WeakUnboundedSender<Command>,
}

/// Starts the coordinator task. It runs until `shutdown` is called or every
/// handle and subscription is dropped.
pub fn start_scheduler(
    player: Arc<dyn Player>,
    resolver: Arc<dyn Resolver>,
    config: SchedulerConfig,
) -> (SchedulerHandle, JoinHandle<()>) {
    let (commands, receiver) = mpsc::unbounded_channel();

    let coordinator = Coordinator {
        queue: FairQueue::new(),
        subscribers: HashMap::new(),
        next_subscriber: 0,
        ticket: 0,
        playing: None,
        player: Arc::clone(&player),
        resolver,
        config,
        commands: commands.downgrade(),
    };

    info!("[+] starting scheduler");
    let task = tokio::spawn(coordinator.run(receiver));

    (SchedulerHandle { commands, player }, task)
}

impl Coordinator {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        while let Some(command) = commands.recv().await {
            let mut changed = match command {
                Command::Shutdown => break,
                command => self.apply(command),
            };

            if self.arbitrate() {
                changed = true;
            }

            if changed {
                self.broadcast();
            }
        }

        if let Some(playing) = self.playing.take() {
            playing.abort();
        }
        self.subscribers.clear();
        info!("[+] scheduler stopped");
    }

    /// Returns whether the queue state changed.
    fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Append { user, song } => {
                info!("[+] {} queued {:?}", user, song.title);
                self.queue.append(&user, song);
                true
            }
            Command::Remove { user, index } => match self.queue.remove(&user, index) {
                Some(song) => {
                    info!("[+] {} removed {:?}", user, song.title);
                    true
                }
                None => {
                    debug!("[-] {} has nothing at index {}", user, index);
                    false
                }
            },
            Command::Subscribe {
                user,
                outbound,
                reply,
            } => {
                let id = self.next_subscriber;
                self.next_subscriber += 1;

                let snapshot = Outbound::Snapshot(Arc::new(self.queue.snapshot()));
                if outbound.send(snapshot).is_ok() && reply.send(id).is_ok() {
                    debug!("[-] subscriber {} joined as {}", id, user);
                    self.subscribers.insert(id, Subscriber { user, outbound });
                }
                false
            }
            Command::Unsubscribe { id } => {
                if self.subscribers.remove(&id).is_some() {
                    debug!("[-] subscriber {} left", id);
                }
                false
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.queue.snapshot());
                false
            }
            Command::PlaybackFinished { ticket, failure } => {
                if ticket != self.ticket {
                    debug!("[-] ignoring stale playback ticket {}", ticket);
                    return false;
                }
                self.playing = None;

                let Some(finished) = self.queue.finish_current() else {
                    return false;
                };
                info!("[+] finished {:?} for {}", finished.song.title, finished.user);

                if let Some(failure) = failure {
                    self.notify(
                        &finished.user,
                        format!("could not play {:?}: {}", finished.song.title, failure),
                    );
                }
                true
            }
            Command::Shutdown => false,
        }
    }

    /// Fills the current slot when it is free. Returns whether anything changed.
    fn arbitrate(&mut self) -> bool {
        if !self.queue.wants_pop() {
            return false;
        }

        let Some(now_playing) = self.queue.pop_next().cloned() else {
            // only emptied queues were left, and the pop dropped them
            return true;
        };

        self.ticket += 1;
        info!(
            "[+] now playing {:?} for {}",
            now_playing.song.title, now_playing.user
        );

        let play = PlayTask {
            player: Arc::clone(&self.player),
            resolver: Arc::clone(&self.resolver),
            config: self.config,
            commands: self.commands.clone(),
            ticket: self.ticket,
        };
        self.playing = Some(tokio::spawn(play.run(now_playing)));
        true
    }

    fn broadcast(&mut self) {
        let snapshot = Outbound::Snapshot(Arc::new(self.queue.snapshot()));
        self.subscribers
            .retain(|_, subscriber| subscriber.outbound.send(snapshot.clone()).is_ok());
    }

    fn notify(&mut self, user: &str, message: String) {
        warn!("[!] telling {}: {}", user, message);
        let notice = Outbound::Notice(message);
        self.subscribers.retain(|_, subscriber| {
            subscriber.user != user || subscriber.outbound.send(notice.clone()).is_ok()
        });
    }
}

/// Plays one song start to finish, then reports back to the coordinator.
struct PlayTask {
    player: Arc<dyn Player>,
    resolver: Arc<dyn Resolver>,
    config: SchedulerConfig,
    commands: mpsc::WeakUnboundedSender<Command>,
    ticket: u64,
}

impl PlayTask {
    async fn run(self, now_playing: NowPlaying) {
        let failure = match self.play(&now_playing.song).await {
            Ok(()) => None,
            Err(error) => {
                warn!("[!] playback of {:?} failed: {}", now_playing.song.title, error);
                Some(error.to_string())
            }
        };

        if let Some(commands) = self.commands.upgrade() {
            let _ = commands.send(Command::PlaybackFinished {
                ticket: self.ticket,
                failure,
            });
        }
    }

    async fn play(&self, song: &Song) -> Result<(), PlaybackError> {
        let stream_url = self.resolver.stream_url(&song.url).await?;
        self.player.add_to_playlist(&stream_url).await?;

        // give the backend a moment to report the new song before we
        // start listening for the playlist to empty out again
        tokio::time::sleep(self.config.settle_delay).await;

        let timeout = self.config.song_timeout;
        if tokio::time::timeout(timeout, self.player.wait_for_song())
            .await
            .is_err()
        {
            if let Err(error) = self.player.skip().await {
                warn!("[!] could not clear a stuck song: {}", error);
            }
            return Err(PlaybackError::Timeout(timeout));
        }

        Ok(())
    }
}
