use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Deserialize)]
pub struct Song {
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub url: String,
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.title, self.url)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserQueue {
    pub user: String,
    pub songs: Vec<Song>,
}

// the server sends the string "noone" when nothing is playing
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Current {
    Playing { name: String, song: Song },
    Noone(String),
}

impl Current {
    pub fn now_playing(&self) -> Option<(&str, &Song)> {
        match self {
            Current::Playing { name, song } => Some((name.as_str(), song)),
            Current::Noone(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Snapshot {
    pub current: Current,
    pub queues: Vec<UserQueue>,
}

#[derive(Debug, Deserialize)]
pub struct SkipResponse {
    pub skipped: Option<Song>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_snapshot() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"current": "noone", "queues": []}"#).unwrap();
        assert!(snapshot.current.now_playing().is_none());
        assert!(snapshot.queues.is_empty());
    }

    #[test]
    fn test_playing_snapshot() {
        let json = r#"{
            "current": {"name": "alice", "song": {"title": "a1", "thumbnail_url": null, "url": "https://example.com/a1"}},
            "queues": [{"user": "bob", "songs": [{"title": "b1", "thumbnail_url": "https://img/b1.jpg", "url": "https://example.com/b1"}]}]
        }"#;
        let snapshot: Snapshot = serde_json::from_str(json).unwrap();

        let (name, song) = snapshot.current.now_playing().unwrap();
        assert_eq!(name, "alice");
        assert_eq!(song.title, "a1");
        assert_eq!(snapshot.queues[0].user, "bob");
        assert_eq!(
            snapshot.queues[0].songs[0].to_string(),
            "b1 <https://example.com/b1>"
        );
    }
}
