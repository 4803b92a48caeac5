//! MPD's line protocol: one command per line, replies end in `OK` or `ACK`.

use log::{debug, trace};
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::backend::connector::Transport;
use crate::error::BackendError;

/// Subsystems named by `changed:` lines during idle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subsystem {
    Player,
    Playlist,
    Other(String),
}

impl Subsystem {
    pub fn from_name(name: &str) -> Self {
        match name {
            "player" => Subsystem::Player,
            "playlist" => Subsystem::Playlist,
            other => Subsystem::Other(other.to_string()),
        }
    }
}

/// What one `idle` round reported before its terminating `OK`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IdleReport {
    pub changed: Vec<Subsystem>,
    pub errors: Vec<String>,
}

impl IdleReport {
    /// Playback or playlist changes are the only ones the scheduler cares about.
    pub fn is_relevant(&self) -> bool {
        self.changed
            .iter()
            .any(|s| matches!(s, Subsystem::Player | Subsystem::Playlist))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub playlist_length: usize,
    pub state: Option<String>,
    pub error: Option<String>,
}

impl Status {
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, BackendError> {
        let mut playlist_length = None;
        let mut state = None;
        let mut error = None;

        for (key, value) in pairs {
            match key.as_str() {
                "playlistlength" => {
                    let length = value.parse().map_err(|_| {
                        BackendError::Protocol(format!("bad playlistlength {:?}", value))
                    })?;
                    playlist_length = Some(length);
                }
                "state" => state = Some(value.clone()),
                "error" => error = Some(value.clone()),
                _ => {}
            }
        }

        let playlist_length = playlist_length
            .ok_or_else(|| BackendError::Protocol("status without playlistlength".to_string()))?;

        Ok(Status {
            playlist_length,
            state,
            error,
        })
    }
}

/// Wraps a command argument in double quotes, escaping `\` and `"`.
pub fn quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// A connected, greeted MPD session.
pub struct MpdSession {
    stream: BufReader<Box<dyn Transport>>,
    version: String,
}

impl MpdSession {
    /// Reads the `OK MPD <version>` greeting. Anything else is a protocol error.
    pub async fn handshake(transport: Box<dyn Transport>) -> Result<Self, BackendError> {
        let mut session = MpdSession {
            stream: BufReader::new(transport),
            version: String::new(),
        };

        let greeting = session.read_line().await?;
        match greeting.strip_prefix("OK MPD ") {
            Some(version) => {
                session.version = version.to_string();
                Ok(session)
            }
            None => Err(BackendError::Protocol(format!(
                "unexpected greeting {:?}",
                greeting
            ))),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Sends one command and collects its `key: value` reply lines.
    pub async fn command(&mut self, line: &str) -> Result<Vec<(String, String)>, BackendError> {
        self.send(line).await?;

        let mut pairs = Vec::new();
        loop {
            let reply = self.read_line().await?;
            if reply == "OK" {
                return Ok(pairs);
            }
            if let Some(ack) = reply.strip_prefix("ACK ") {
                return Err(BackendError::Command {
                    command: line.to_string(),
                    message: ack.to_string(),
                });
            }
            match reply.split_once(": ") {
                Some((key, value)) => pairs.push((key.to_string(), value.to_string())),
                None => {
                    return Err(BackendError::Protocol(format!(
                        "unexpected line {:?} in reply to {:?}",
                        reply, line
                    )))
                }
            }
        }
    }

    pub async fn status(&mut self) -> Result<Status, BackendError> {
        let pairs = self.command("status").await?;
        Status::from_pairs(&pairs)
    }

    /// One `idle` round: blocks until the backend reports a change.
    pub async fn idle(&mut self) -> Result<IdleReport, BackendError> {
        self.send("idle").await?;

        let mut report = IdleReport::default();
        loop {
            let line = self.read_line().await?;
            if line.starts_with("OK") {
                return Ok(report);
            }
            // an ACK ends the reply, no OK follows it
            if let Some(ack) = line.strip_prefix("ACK ") {
                return Err(BackendError::Command {
                    command: "idle".to_string(),
                    message: ack.to_string(),
                });
            }
            if let Some(name) = line.strip_prefix("changed: ") {
                report.changed.push(Subsystem::from_name(name));
            } else if line.starts_with("error:") {
                report.errors.push(line);
            } else {
                debug!("[-] ignoring idle line {:?}", line);
            }
        }
    }

    /// Idles until playback or the playlist changed, or errors were reported.
    pub async fn wait_for_change(&mut self) -> Result<IdleReport, BackendError> {
        loop {
            let report = self.idle().await?;
            if report.is_relevant() || !report.errors.is_empty() {
                return Ok(report);
            }
            debug!("[-] idle woke for {:?}, idling again", report.changed);
        }
    }

    async fn send(&mut self, line: &str) -> Result<(), BackendError> {
        trace!("[-] mpd <- {}", line);
        let stream = self.stream.get_mut();
        stream.write_all(format!("{}\n", line).as_bytes()).await?;
        stream.flush().await?;
        Ok(())
    }

    async fn read_line(&mut self) -> Result<String, BackendError> {
        let mut line = String::new();
        if self.stream.read_line(&mut line).await? == 0 {
            return Err(BackendError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "backend closed the connection",
            )));
        }
        let line = line.trim_end_matches(|c| c == '\n' || c == '\r').to_string();
        trace!("[-] mpd -> {}", line);
        Ok(line)
    }
}
