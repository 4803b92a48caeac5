use log::error;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::Route;
use rocket::State;

use crate::app_state::AppState;
use jukeshare_server::models::song::Song;

#[derive(serde::Serialize)]
pub struct SkipResponse {
    skipped: Option<Song>,
}

#[post("/skip")]
pub async fn skip(app_state: &State<AppState>) -> Result<Json<SkipResponse>, Status> {
    // what was playing when the skip went out; the scheduler moves on
    // once mpd reports the cleared playlist
    let skipped = app_state
        .scheduler
        .snapshot()
        .await
        .and_then(|snapshot| snapshot.current)
        .map(|now_playing| now_playing.song);

    if let Err(error) = app_state.scheduler.skip().await {
        error!("[!] Error skipping song: {}", error);
        return Err(Status::ServiceUnavailable);
    }

    Ok(Json(SkipResponse { skipped }))
}

// Return routes defined in this module
pub fn routes() -> Vec<Route> {
    routes![skip]
}
