use log::{debug, info, warn};
use std::sync::Arc;

use crate::error::ValidationError;
use crate::resolver::Resolver;
use crate::scheduler::SchedulerHandle;

pub const MAX_USERNAME_LEN: usize = 20;

/// Usernames are 1-20 ASCII letters or digits.
pub fn validate_username(name: &str) -> Result<&str, ValidationError> {
    let valid = !name.is_empty()
        && name.len() <= MAX_USERNAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric());

    if valid {
        Ok(name)
    } else {
        Err(ValidationError::BadUsername(name.to_string()))
    }
}

/// A text command from a connected user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Queue(String),
    Remove(usize),
    SkipMe,
    VolUp,
    VolDown,
}

impl SessionCommand {
    pub fn parse(text: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        let (name, argument) = match text.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, Some(argument.trim())),
            None => (text, None),
        };

        match (name, argument) {
            ("queue", Some(query)) if !query.is_empty() => Ok(SessionCommand::Queue(query.to_string())),
            ("queue", _) => Err(ValidationError::MissingArgument("queue")),
            ("remove", Some(index)) => index
                .parse()
                .map(SessionCommand::Remove)
                .map_err(|_| ValidationError::InvalidIndex(index.to_string())),
            ("remove", None) => Err(ValidationError::MissingArgument("remove")),
            ("skipme", None) => Ok(SessionCommand::SkipMe),
            ("volup", None) => Ok(SessionCommand::VolUp),
            ("voldown", None) => Ok(SessionCommand::VolDown),
            _ => Err(ValidationError::UnknownCommand(text.to_string())),
        }
    }
}

/// One connected user's view of the jukebox.
pub struct Session {
    user: String,
    scheduler: SchedulerHandle,
    resolver: Arc<dyn Resolver>,
}

impl Session {
    pub fn new(
        user: &str,
        scheduler: SchedulerHandle,
        resolver: Arc<dyn Resolver>,
    ) -> Result<Self, ValidationError> {
        let user = validate_username(user)?;
        Ok(Session {
            user: user.to_string(),
            scheduler,
            resolver,
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    /// Runs one command. Returns a message for this user when something went
    /// wrong that they should hear about.
    pub async fn handle(&self, text: &str) -> Option<String> {
        let command = match SessionCommand::parse(text) {
            Ok(command) => command,
            Err(error) => {
                debug!("[-] {} sent {:?}: {}", self.user, text, error);
                return None;
            }
        };

        match command {
            SessionCommand::Queue(query) => match self.resolver.song_info(&query).await {
                Ok(song) => {
                    self.scheduler.append(&self.user, song);
                    None
                }
                Err(error) => {
                    warn!("[!] could not resolve {:?} for {}: {}", query, self.user, error);
                    Some(format!("could not queue {:?}: {}", query, error))
                }
            },
            SessionCommand::Remove(index) => {
                self.scheduler.remove(&self.user, index);
                None
            }
            SessionCommand::SkipMe => {
                info!("[+] {} skipped the current song", self.user);
                match self.scheduler.skip().await {
                    Ok(()) => None,
                    Err(error) => {
                        warn!("[!] skip failed: {}", error);
                        Some(format!("could not skip: {}", error))
                    }
                }
            }
            SessionCommand::VolUp | SessionCommand::VolDown => {
                debug!("[-] volume control is not implemented");
                None
            }
        }
    }
}
