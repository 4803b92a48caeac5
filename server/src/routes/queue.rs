use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::app_state::AppState;
use jukeshare_server::models::fair_queue::Snapshot;
use jukeshare_server::models::song::Song;

#[get("/queue")]
async fn get_queue(app_state: &State<AppState>) -> Result<Json<Snapshot>, Status> {
    app_state
        .scheduler
        .snapshot()
        .await
        .map(Json)
        .ok_or(Status::ServiceUnavailable)
}

// one user's pending songs, in the order they will play
#[get("/queue/<user>")]
async fn get_user_queue(app_state: &State<AppState>, user: &str) -> Result<Json<Vec<Song>>, Status> {
    let snapshot = app_state
        .scheduler
        .snapshot()
        .await
        .ok_or(Status::ServiceUnavailable)?;

    snapshot
        .queues
        .into_iter()
        .find(|queue| queue.user == user)
        .map(|queue| Json(queue.songs.into_iter().collect()))
        .ok_or(Status::NotFound)
}

// Return routes defined in this module
pub fn routes() -> Vec<rocket::Route> {
    routes![get_queue, get_user_queue]
}
