use log::{info, warn};
use rocket::futures::{SinkExt, StreamExt};
use rocket::State;
use rocket_ws::{Channel, Message, WebSocket};

use crate::app_state::AppState;
use jukeshare_server::scheduler::Outbound;
use jukeshare_server::session::Session;

// The first text frame is the username, every frame after that is a command.
// Snapshots are pushed whenever the queue changes.
#[get("/ws")]
fn websocket(ws: WebSocket, app_state: &State<AppState>) -> Channel<'static> {
    let scheduler = app_state.scheduler.clone();
    let resolver = app_state.resolver.clone();

    ws.channel(move |mut stream| {
        Box::pin(async move {
            let username = loop {
                match stream.next().await {
                    Some(Ok(Message::Text(name))) => break name,
                    Some(Ok(_)) => continue,
                    Some(Err(error)) => return Err(error),
                    None => return Ok(()),
                }
            };

            let session = match Session::new(&username, scheduler.clone(), resolver) {
                Ok(session) => session,
                Err(error) => {
                    warn!("[!] rejecting websocket login: {}", error);
                    let notice = Outbound::Notice(error.to_string());
                    stream.send(Message::Text(notice.to_json())).await?;
                    return Ok(());
                }
            };

            let Some(mut subscription) = scheduler.subscribe(session.user()).await else {
                return Ok(());
            };
            info!("[+] {} connected", session.user());

            loop {
                tokio::select! {
                    message = stream.next() => match message {
                        Some(Ok(Message::Text(text))) => {
                            if let Some(reply) = session.handle(&text).await {
                                let notice = Outbound::Notice(reply);
                                stream.send(Message::Text(notice.to_json())).await?;
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Ok(_)) => {}
                        Some(Err(error)) => {
                            warn!("[!] websocket error for {}: {}", session.user(), error);
                            break;
                        }
                    },
                    outbound = subscription.recv() => match outbound {
                        Some(outbound) => stream.send(Message::Text(outbound.to_json())).await?,
                        // scheduler shut down
                        None => break,
                    },
                }
            }

            info!("[-] {} disconnected", session.user());
            Ok(())
        })
    })
}

// Return routes defined in this module
pub fn routes() -> Vec<rocket::Route> {
    routes![websocket]
}
