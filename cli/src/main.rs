extern crate clap;
extern crate colored;
extern crate log;
extern crate reqwest;
extern crate serde;
extern crate tokio;

use colored::*;

#[allow(unused_imports)]
use log::{debug, error, info, warn};

mod banner;
use crate::banner::print_banner;

mod models;
use crate::models::snapshot::{SkipResponse, Snapshot, Song};

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display what is playing and who is queued
    Status,
    /// Skip the currently playing song
    Skip,
    /// Show one user's pending songs
    Queue(QueueArgs),
}

#[derive(Parser, Debug)]
struct QueueArgs {
    #[clap(help = "Name of the user", required = true)]
    user: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize the logger
    env_logger::init();

    let api_hostname = match std::env::var("JUKESHARE_HOST") {
        Ok(hostname) => {
            info!("[-] jukeshare API base URL: {}", hostname);
            hostname.trim_end_matches('/').to_string()
        }
        Err(_) => {
            eprintln!("Error: JUKESHARE_HOST environment variable is not set.");
            std::process::exit(1);
        }
    };

    let cli = Cli::parse();

    match cli.command {
        Commands::Status => match status(&api_hostname).await {
            Ok(_) => debug!("Status: OK"),
            Err(err) => eprintln!("[!] Error: {}", err),
        },
        Commands::Skip => match skip_song(&api_hostname).await {
            Ok(_) => debug!("Skipped song"),
            Err(err) => eprintln!("[!] Error: {}", err),
        },
        Commands::Queue(args) => {
            debug!("Queue command for user: {:?}", args.user);
            match user_queue(&api_hostname, &args.user).await {
                Ok(_) => debug!("Queue: OK"),
                Err(err) => eprintln!("[!] Error: {}", err),
            }
        }
    }

    Ok(())
}

async fn get_snapshot(api_hostname: &str) -> Option<Snapshot> {
    let client = reqwest::Client::new();
    let url = format!("{}/queue", api_hostname);

    let response = client.get(&url).send().await.ok()?;
    if !response.status().is_success() {
        eprintln!(
            "Error: Failed to fetch queue status (HTTP {})",
            response.status()
        );
        return None;
    }

    let body = response.text().await.ok()?;
    debug!("[?] raw queue response body: {}", body);

    match serde_json::from_str::<Snapshot>(&body) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            eprintln!("Error: Failed to deserialize queue response: {}", e);
            None
        }
    }
}

fn print_songs(songs: &[Song]) {
    for (index, song) in songs.iter().enumerate() {
        let color = if index % 2 == 0 { "cyan" } else { "magenta" };
        println!("    {}. {}", index, song.to_string().color(color));
    }
}

async fn status(api_hostname: &str) -> Result<(), reqwest::Error> {
    print_banner();

    let Some(snapshot) = get_snapshot(api_hostname).await else {
        eprintln!("[!] unable to fetch queue, is your host configuration correct? is the service offline?");
        std::process::exit(1);
    };

    println!("{}", "now playing:".green().bold());
    match snapshot.current.now_playing() {
        Some((name, song)) => {
            println!("    {}", song.title.yellow().bold());
            println!("    {} {}", "queued by".cyan(), name.cyan().bold());
        }
        None => println!("  {}", "nothing is playing.".red().bold()),
    }

    if snapshot.queues.is_empty() {
        println!("{}", "no songs in the queue.".red().bold());
        return Ok(());
    }

    // queues are listed in the order users take their turns
    println!("{}", "up next:".red().bold());
    for queue in &snapshot.queues {
        println!(
            "  {} ({})",
            queue.user.green().bold(),
            queue.songs.len().to_string().green()
        );
        print_songs(&queue.songs);
    }

    Ok(())
}

async fn skip_song(api_hostname: &str) -> Result<(), reqwest::Error> {
    let client = reqwest::Client::new();
    let url = format!("{}/skip", api_hostname);

    let response = client
        .post(&url)
        .header(reqwest::header::CONTENT_LENGTH, "0")
        .send()
        .await?;

    if !response.status().is_success() {
        eprintln!(
            "[!] Error: Failed to skip song (HTTP {})",
            response.status()
        );
        return Ok(());
    }

    let body = response.text().await?;
    debug!("[+] Skip accepted: {}", body);

    match serde_json::from_str::<SkipResponse>(&body) {
        Ok(SkipResponse {
            skipped: Some(song),
        }) => {
            println!("{}", "[!] SKIPPING SONG".red().bold());
            println!("    {}", song.title.red());
        }
        Ok(SkipResponse { skipped: None }) => {
            println!("{}", "[-] nothing was playing".yellow());
        }
        Err(e) => {
            eprintln!("Error: Failed to parse JSON response: {}", e);
        }
    }

    Ok(())
}

async fn user_queue(api_hostname: &str, user: &str) -> Result<(), reqwest::Error> {
    let client = reqwest::Client::new();
    let url = format!("{}/queue/{}", api_hostname, user);

    let response = client.get(&url).send().await?;

    if response.status() == reqwest::StatusCode::NOT_FOUND {
        println!("{} {}", user.green().bold(), "has nothing queued.".red());
        return Ok(());
    }
    if !response.status().is_success() {
        eprintln!(
            "Error: Failed to fetch queue for {} (HTTP {})",
            user,
            response.status()
        );
        return Ok(());
    }

    let body = response.text().await?;
    debug!("[?] raw user queue response body: {}", body);

    match serde_json::from_str::<Vec<Song>>(&body) {
        Ok(songs) => {
            println!(
                "{}{}{}",
                user.green().bold(),
                " queue length: ".green(),
                songs.len().to_string().green().bold()
            );
            print_songs(&songs);
        }
        Err(e) => {
            eprintln!("Error: Failed to deserialize queue response: {}", e);
        }
    }

    Ok(())
}
