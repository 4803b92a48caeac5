//! In-process fake MPD server for exercising the driver without a daemon.
//! Every `connect` gets its own duplex pipe served by a task speaking just
//! enough of the protocol: status, idle, add, play, clear, clearerror, consume.

use async_trait::async_trait;
use log::debug;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::broadcast;

use crate::backend::connector::{Connector, Transport};

#[derive(Debug, Clone)]
enum MockEvent {
    Changed(String),
    Error(String),
}

struct MockState {
    playlist: Vec<String>,
    playing: bool,
    consume: bool,
    connected: bool,
    greeting: String,
    reject_add: bool,
    reject_idle: bool,
    commands: Vec<String>,
    connections: usize,
}

#[derive(Clone)]
pub struct MockMpd {
    state: Arc<Mutex<MockState>>,
    events: broadcast::Sender<MockEvent>,
}

impl Default for MockMpd {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMpd {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        MockMpd {
            state: Arc::new(Mutex::new(MockState {
                playlist: Vec::new(),
                playing: false,
                consume: false,
                connected: true,
                greeting: "OK MPD 0.23.5".to_string(),
                reject_add: false,
                reject_idle: false,
                commands: Vec::new(),
                connections: 0,
            })),
            events,
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Refuse new connections.
    pub fn simulate_disconnect(&self) {
        self.state().connected = false;
    }

    pub fn simulate_reconnect(&self) {
        self.state().connected = true;
    }

    /// Greeting sent to new connections; anything but `OK MPD ...` breaks the handshake.
    pub fn set_greeting(&self, greeting: &str) {
        self.state().greeting = greeting.to_string();
    }

    /// Answer `add` with an ACK, like MPD does for unplayable URLs.
    pub fn set_reject_add(&self, reject: bool) {
        self.state().reject_add = reject;
    }

    /// Answer `idle` with an ACK instead of waiting for an event.
    pub fn set_reject_idle(&self, reject: bool) {
        self.state().reject_idle = reject;
    }

    pub fn playlist(&self) -> Vec<String> {
        self.state().playlist.clone()
    }

    pub fn is_consuming(&self) -> bool {
        self.state().consume
    }

    /// Every command received so far, across all connections.
    pub fn commands(&self) -> Vec<String> {
        self.state().commands.clone()
    }

    pub fn connections(&self) -> usize {
        self.state().connections
    }

    /// The head song ends. In consume mode it leaves the playlist.
    pub fn finish_current_song(&self) {
        {
            let mut state = self.state();
            if state.consume && !state.playlist.is_empty() {
                state.playlist.remove(0);
            }
            if state.playlist.is_empty() {
                state.playing = false;
            }
        }
        self.emit_change("player");
        self.emit_change("playlist");
    }

    /// Wakes idling clients with `changed: <subsystem>`.
    pub fn emit_change(&self, subsystem: &str) {
        let _ = self.events.send(MockEvent::Changed(subsystem.to_string()));
    }

    /// Reports an `error:` line to idling clients.
    pub fn emit_error(&self, message: &str) {
        let _ = self.events.send(MockEvent::Error(message.to_string()));
    }

    async fn serve(self, stream: DuplexStream, mut events: broadcast::Receiver<MockEvent>) {
        let mut stream = BufReader::new(stream);
        let greeting = format!("{}\n", self.state().greeting);
        if stream.get_mut().write_all(greeting.as_bytes()).await.is_err() {
            return;
        }

        let mut line = String::new();
        loop {
            line.clear();
            match stream.read_line(&mut line).await {
                Ok(0) | Err(_) => return,
                Ok(_) => {}
            }
            let command = line.trim_end().to_string();
            debug!("[-] mock mpd got {:?}", command);
            self.state().commands.push(command.clone());

            let reject_idle = self.state().reject_idle;
            let reply = if command == "idle" && reject_idle {
                "ACK [4@0] {idle} you don't have permission for \"idle\"\n".to_string()
            } else if command == "idle" {
                match Self::next_event(&mut events).await {
                    Some(MockEvent::Changed(subsystem)) => format!("changed: {}\nOK\n", subsystem),
                    Some(MockEvent::Error(message)) => format!("error: {}\nOK\n", message),
                    None => return,
                }
            } else {
                self.reply(&command)
            };

            if stream.get_mut().write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
    }

    async fn next_event(events: &mut broadcast::Receiver<MockEvent>) -> Option<MockEvent> {
        loop {
            match events.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    fn reply(&self, command: &str) -> String {
        let (name, argument) = match command.split_once(' ') {
            Some((name, argument)) => (name, Some(argument)),
            None => (command, None),
        };

        let mut changed = Vec::new();
        let reply = {
            let mut state = self.state();
            match (name, argument) {
                ("status", None) => format!(
                    "volume: 100\nplaylistlength: {}\nstate: {}\nOK\n",
                    state.playlist.len(),
                    if state.playing { "play" } else { "stop" }
                ),
                ("consume", Some(flag)) => {
                    state.consume = flag.trim_matches('"') == "1";
                    changed.push("options");
                    "OK\n".to_string()
                }
                ("add", Some(_)) if state.reject_add => {
                    "ACK [50@0] {add} No such directory\n".to_string()
                }
                ("add", Some(url)) => {
                    state.playlist.push(unquote(url));
                    changed.push("playlist");
                    "OK\n".to_string()
                }
                ("play", None) => {
                    state.playing = !state.playlist.is_empty();
                    changed.push("player");
                    "OK\n".to_string()
                }
                ("clear", None) => {
                    state.playlist.clear();
                    state.playing = false;
                    changed.push("playlist");
                    changed.push("player");
                    "OK\n".to_string()
                }
                ("clearerror", None) => "OK\n".to_string(),
                _ => format!("ACK [5@0] {{}} unknown command \"{}\"\n", name),
            }
        };

        for subsystem in changed {
            self.emit_change(subsystem);
        }
        reply
    }
}

fn unquote(argument: &str) -> String {
    let inner = argument
        .strip_prefix('"')
        .and_then(|a| a.strip_suffix('"'))
        .unwrap_or(argument);

    let mut unquoted = String::with_capacity(inner.len());
    let mut escaped = false;
    for c in inner.chars() {
        if c == '\\' && !escaped {
            escaped = true;
            continue;
        }
        escaped = false;
        unquoted.push(c);
    }
    unquoted
}

#[async_trait]
impl Connector for MockMpd {
    async fn connect(&self) -> io::Result<Box<dyn Transport>> {
        {
            let mut state = self.state();
            if !state.connected {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    "Not connected",
                ));
            }
            state.connections += 1;
        }

        let (client, server) = tokio::io::duplex(4096);
        let events = self.events.subscribe();
        tokio::spawn(self.clone().serve(server, events));
        Ok(Box::new(client))
    }
}
