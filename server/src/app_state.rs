use log::info;
use std::sync::Arc;

use jukeshare_server::backend::connector::TcpConnector;
use jukeshare_server::backend::driver::Backoff;
use jukeshare_server::backend::BackendConnection;
use jukeshare_server::config::Config;
use jukeshare_server::resolver::{Resolver, YoutubeDl};
use jukeshare_server::scheduler::{start_scheduler, SchedulerConfig, SchedulerHandle};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<BackendConnection>,
    pub scheduler: SchedulerHandle,
    pub resolver: Arc<dyn Resolver>,
}

/// Connects the pieces and spawns the background tasks. Needs a running runtime.
pub fn initialize(config: &Config) -> AppState {
    info!(
        "[+] using mpd at {}:{}, resolver {}",
        config.mpd_host, config.mpd_port, config.youtube_dl
    );

    let connector = Arc::new(TcpConnector::new(&config.mpd_host, config.mpd_port));
    let backend = Arc::new(BackendConnection::new(
        connector,
        Backoff::new(config.reconnect_min, config.reconnect_max),
        config.mpd_consume,
    ));
    // the driver reconnects on its own; it stops via backend.shutdown()
    let _driver = backend.start();

    let resolver: Arc<dyn Resolver> = Arc::new(YoutubeDl::new(&config.youtube_dl));

    let (scheduler, _coordinator) = start_scheduler(
        backend.clone(),
        Arc::clone(&resolver),
        SchedulerConfig {
            settle_delay: config.settle_delay,
            song_timeout: config.song_timeout,
        },
    );

    AppState {
        backend,
        scheduler,
        resolver,
    }
}
