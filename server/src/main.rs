#[macro_use]
extern crate rocket;

use log::warn;
use rocket::fs::FileServer;

use jukeshare_server::config::Config;

mod app_state;
mod fairings;
mod routes;

use crate::fairings::SchedulerShutdown;

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger
    env_logger::init();

    let config = Config::from_env()?;
    let app_state = app_state::initialize(&config);

    let mut rocket = rocket::build()
        .manage(app_state) // rocket::State
        .attach(SchedulerShutdown)
        .mount("/", routes::all_routes());

    if config.static_dir.is_dir() {
        rocket = rocket.mount("/", FileServer::from(&config.static_dir));
    } else {
        warn!("[!] static dir {:?} not found, serving the API only", config.static_dir);
    }

    // rocket::Error wants to be inspected, so flatten it into its message
    let _rocket = rocket.launch().await.map_err(|e| e.to_string())?;

    Ok(())
}
