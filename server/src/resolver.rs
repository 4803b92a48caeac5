use async_trait::async_trait;
use log::{debug, info};
use serde::Deserialize;
use tokio::process::Command;

use crate::error::ResolveError;
use crate::models::song::Song;

/// Turns what users type into songs, and songs into playable stream URLs.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Looks up a URL, or runs a search when given free text.
    async fn song_info(&self, query: &str) -> Result<Song, ResolveError>;

    /// Direct media URL the backend can stream.
    async fn stream_url(&self, url: &str) -> Result<String, ResolveError>;
}

/// Resolver backed by the `youtube-dl` (or compatible, e.g. `yt-dlp`) binary.
pub struct YoutubeDl {
    program: String,
}

#[derive(Deserialize)]
struct InfoJson {
    title: Option<String>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
    entries: Option<Vec<InfoJson>>,
}

impl YoutubeDl {
    pub fn new(program: &str) -> Self {
        YoutubeDl {
            program: program.to_string(),
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, ResolveError> {
        debug!("[-] running {} {:?}", self.program, args);
        let output = Command::new(&self.program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await?;

        if !output.status.success() {
            return Err(ResolveError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Reads `--dump-single-json` output; search results use their first entry.
pub fn parse_song_info(json: &str, query: &str) -> Result<Song, ResolveError> {
    let mut info: InfoJson = serde_json::from_str(json)?;

    if let Some(entries) = info.entries.take() {
        info = entries
            .into_iter()
            .next()
            .ok_or_else(|| ResolveError::NoResult(query.to_string()))?;
    }

    let title = info
        .title
        .ok_or_else(|| ResolveError::NoResult(query.to_string()))?;

    Ok(Song {
        title,
        thumbnail_url: info.thumbnail,
        url: info.webpage_url.unwrap_or_else(|| query.to_string()),
    })
}

/// First non-blank line of `--get-url` output.
pub fn parse_stream_url(stdout: &str, url: &str) -> Result<String, ResolveError> {
    stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ResolveError::NoResult(url.to_string()))
}

#[async_trait]
impl Resolver for YoutubeDl {
    async fn song_info(&self, query: &str) -> Result<Song, ResolveError> {
        let stdout = self
            .run(&[
                "--dump-single-json",
                "--no-playlist",
                "--no-warnings",
                "--default-search",
                "ytsearch1",
                "--",
                query,
            ])
            .await?;
        let song = parse_song_info(&stdout, query)?;
        info!("[+] resolved {:?} to {:?}", query, song.title);
        Ok(song)
    }

    async fn stream_url(&self, url: &str) -> Result<String, ResolveError> {
        let stdout = self
            .run(&[
                "-f",
                "140/http_mp3_128_url/bestaudio",
                "--get-url",
                "--no-playlist",
                "--",
                url,
            ])
            .await?;
        parse_stream_url(&stdout, url)
    }
}
