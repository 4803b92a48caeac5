use serde::{Serialize, Serializer};
use std::collections::VecDeque;

use crate::models::song::Song;

/// One user's pending songs, served FIFO.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserQueue {
    pub user: String,
    pub songs: VecDeque<Song>,
}

impl UserQueue {
    fn new(user: &str) -> Self {
        UserQueue {
            user: user.to_string(),
            songs: VecDeque::new(),
        }
    }
}

/// The song the backend has been asked to play, and who asked for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NowPlaying {
    #[serde(rename = "name")]
    pub user: String,
    pub song: Song,
}

/// Full view of the scheduler, pushed to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    #[serde(serialize_with = "serialize_current")]
    pub current: Option<NowPlaying>,
    pub queues: Vec<UserQueue>,
}

fn serialize_current<S: Serializer>(
    current: &Option<NowPlaying>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match current {
        Some(now_playing) => now_playing.serialize(serializer),
        None => serializer.serialize_str("noone"),
    }
}

/// Round-robin queue of per-user queues plus the current slot.
///
/// Users take turns: after a user's song is popped their queue goes to the
/// back of the order, so nobody can hog the speaker by submitting a lot.
#[derive(Debug, Default)]
pub struct FairQueue {
    order: VecDeque<UserQueue>,
    current: Option<NowPlaying>,
}

impl FairQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, user: &str, song: Song) {
        if let Some(queue) = self.order.iter_mut().find(|q| q.user == user) {
            queue.songs.push_back(song);
            return;
        }

        let mut queue = UserQueue::new(user);
        queue.songs.push_back(song);

        // the playing user was just re-queued at the tail; a newcomer goes
        // ahead of that entry instead of behind it
        let playing_user_at_tail = match (&self.current, self.order.back()) {
            (Some(now_playing), Some(last)) => last.user == now_playing.user,
            _ => false,
        };

        if playing_user_at_tail {
            let position = self.order.len() - 1;
            self.order.insert(position, queue);
        } else {
            self.order.push_back(queue);
        }
    }

    /// Removes the song at `index` from the user's queue. Returns `None`,
    /// and leaves everything untouched, when there is nothing at that spot.
    pub fn remove(&mut self, user: &str, index: usize) -> Option<Song> {
        let queue = self.order.iter_mut().find(|q| q.user == user)?;
        queue.songs.remove(index)
    }

    /// Fills the current slot from the head of the order.
    ///
    /// Does nothing while something is playing. Queues emptied by `remove`
    /// are dropped as the pop walks past them.
    pub fn pop_next(&mut self) -> Option<&NowPlaying> {
        if self.current.is_some() {
            return None;
        }

        while let Some(mut queue) = self.order.pop_front() {
            let Some(song) = queue.songs.pop_front() else {
                continue;
            };

            let user = queue.user.clone();
            if !queue.songs.is_empty() {
                self.order.push_back(queue);
            }

            self.current = Some(NowPlaying { user, song });
            return self.current.as_ref();
        }

        None
    }

    pub fn finish_current(&mut self) -> Option<NowPlaying> {
        self.current.take()
    }

    pub fn current(&self) -> Option<&NowPlaying> {
        self.current.as_ref()
    }

    /// True when the arbitration predicate holds.
    pub fn wants_pop(&self) -> bool {
        self.current.is_none() && !self.order.is_empty()
    }

    /// Number of user queues in the order.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Users in serving order.
    pub fn users(&self) -> Vec<&str> {
        self.order.iter().map(|q| q.user.as_str()).collect()
    }

    pub fn songs_for(&self, user: &str) -> Option<Vec<Song>> {
        self.order
            .iter()
            .find(|q| q.user == user)
            .map(|q| q.songs.iter().cloned().collect())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            current: self.current.clone(),
            queues: self.order.iter().cloned().collect(),
        }
    }
}
