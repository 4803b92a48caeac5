use serde::{Deserialize, Serialize};

/// A submitted song, as resolved from the user's URL or search query.
///
/// `url` is the page the user asked for, not the media stream; the stream
/// URL is looked up again right before playback since those expire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub url: String,
}

impl Song {
    pub fn new(title: impl Into<String>, thumbnail_url: Option<String>, url: impl Into<String>) -> Self {
        Song {
            title: title.into(),
            thumbnail_url,
            url: url.into(),
        }
    }
}
