use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::backend::connector::Connector;
use crate::backend::protocol::MpdSession;
use crate::backend::PlaybackSignal;
use crate::error::BackendError;

/// Where the driver is in its connect/status/idle cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Connecting,
    PollingStatus,
    Idling,
    Recovering,
}

/// How the work for a state ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    /// idle returned `error:` lines
    BackendErrors,
    Failed,
}

impl DriverState {
    pub fn next(self, outcome: Outcome) -> DriverState {
        use DriverState::*;
        use Outcome::*;

        match (self, outcome) {
            (_, Failed) => Connecting,
            (Connecting, _) => PollingStatus,
            (PollingStatus, _) => Idling,
            (Idling, Done) => PollingStatus,
            (Idling, BackendErrors) => Recovering,
            (Recovering, _) => PollingStatus,
        }
    }
}

/// Exponential reconnect delay with +/-30% jitter.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub min: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn new(min: Duration, max: Duration) -> Self {
        Backoff { min, max }
    }

    /// Base delay for the given failed-attempt count (1 = first retry).
    pub fn base(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.min.saturating_mul(1u32 << exponent).min(self.max)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base(attempt);
        let jitter = rand::random::<f64>() * 0.6 - 0.3;
        base.mul_f64(1.0 + jitter)
    }
}

pub(crate) struct Driver {
    connector: Arc<dyn Connector>,
    signal: Arc<PlaybackSignal>,
    backoff: Backoff,
    consume: bool,
    session: Option<MpdSession>,
    failures: u32,
}

impl Driver {
    pub(crate) fn new(
        connector: Arc<dyn Connector>,
        signal: Arc<PlaybackSignal>,
        backoff: Backoff,
        consume: bool,
    ) -> Self {
        Driver {
            connector,
            signal,
            backoff,
            consume,
            session: None,
            failures: 0,
        }
    }

    pub(crate) async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut state = DriverState::Connecting;

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = tokio::select! {
                _ = shutdown.changed() => break,
                outcome = self.step(state) => outcome,
            };

            let next = state.next(outcome);
            debug!("[-] backend driver {:?} -> {:?}", state, next);
            state = next;
        }

        info!("[+] backend driver stopped");
    }

    async fn step(&mut self, state: DriverState) -> Outcome {
        let result = match state {
            DriverState::Connecting => self.connect().await,
            DriverState::PollingStatus => self.poll_status().await,
            DriverState::Idling => self.idle().await,
            DriverState::Recovering => self.recover().await,
        };

        match result {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!("[!] backend {:?} failed: {}", state, error);
                self.session = None;
                if state == DriverState::Connecting {
                    self.failures = self.failures.saturating_add(1);
                } else {
                    self.failures = 1;
                }
                Outcome::Failed
            }
        }
    }

    async fn connect(&mut self) -> Result<Outcome, BackendError> {
        if self.failures > 0 {
            let delay = self.backoff.delay(self.failures);
            info!(
                "[!] reconnecting to mpd in {:?} (attempt {})",
                delay, self.failures
            );
            tokio::time::sleep(delay).await;
        }

        let transport = self.connector.connect().await?;
        let mut session = MpdSession::handshake(transport).await?;
        info!("[+] connected to mpd {}", session.version());

        if self.consume {
            session.command("consume 1").await?;
        }

        self.session = Some(session);
        self.failures = 0;
        Ok(Outcome::Done)
    }

    async fn poll_status(&mut self) -> Result<Outcome, BackendError> {
        let status = self.session()?.status().await?;
        debug!(
            "[-] mpd status: playlistlength={} state={:?}",
            status.playlist_length, status.state
        );
        if let Some(error) = &status.error {
            warn!("[!] mpd status reports an error: {}", error);
        }
        self.signal.observe_playlist_length(status.playlist_length);
        Ok(Outcome::Done)
    }

    async fn idle(&mut self) -> Result<Outcome, BackendError> {
        let report = self.session()?.wait_for_change().await?;
        if report.errors.is_empty() {
            Ok(Outcome::Done)
        } else {
            warn!("[!] mpd reported errors: {:?}", report.errors);
            Ok(Outcome::BackendErrors)
        }
    }

    async fn recover(&mut self) -> Result<Outcome, BackendError> {
        let session = self.session()?;
        session.command("clearerror").await?;
        session.command("clear").await?;
        info!("[+] cleared mpd error state and playlist");
        Ok(Outcome::Done)
    }

    fn session(&mut self) -> Result<&mut MpdSession, BackendError> {
        self.session
            .as_mut()
            .ok_or_else(|| BackendError::Protocol("no open session".to_string()))
    }
}
