use log::info;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Orbit, Rocket};

use crate::app_state::AppState;

/// Stops the scheduler and the mpd driver when Rocket shuts down.
pub struct SchedulerShutdown;

#[rocket::async_trait]
impl Fairing for SchedulerShutdown {
    fn info(&self) -> Info {
        Info {
            name: "Scheduler Shutdown",
            kind: Kind::Shutdown,
        }
    }

    async fn on_shutdown(&self, rocket: &Rocket<Orbit>) {
        if let Some(app_state) = rocket.state::<AppState>() {
            info!("[!] shutting down scheduler and mpd driver");
            // closes every subscriber channel, which ends the websocket loops
            app_state.scheduler.shutdown();
            app_state.backend.shutdown();
        }
    }
}
