pub mod utils;

use clap::{Args, Subcommand};
use lastfm_scrobble::{
    PlaybackSource, ScrobbleEntry, ScrobbleMode, SessionPersistence, SubmissionClient,
    SubmissionClientImpl, SubmissionOutcome,
};
use std::time::Duration;

/// Track description shared by the submission commands.
#[derive(Args, Clone, Debug)]
pub struct TrackArgs {
    /// Artist name
    #[arg(long)]
    pub artist: String,

    /// Track title
    #[arg(long)]
    pub track: String,

    /// Album name (optional)
    #[arg(long)]
    pub album: Option<String>,

    /// Track length in seconds
    #[arg(long, default_value = "0")]
    pub duration: u64,

    /// Position of the track on its album (optional)
    #[arg(long)]
    pub track_number: Option<u32>,

    /// MusicBrainz recording ID (optional)
    #[arg(long)]
    pub mbid: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate and store the session key for later runs
    ///
    /// Usage examples:
    /// # Log in with LASTFM_USERNAME and LASTFM_PASSWORD
    /// lastfm-scrobble login
    Login,

    /// Report the track that is currently playing
    ///
    /// Usage examples:
    /// # Update now playing
    /// lastfm-scrobble now-playing --artist "Radiohead" --track "Idioteque" --duration 309
    NowPlaying {
        #[command(flatten)]
        track: TrackArgs,
    },

    /// Scrobble a played track
    ///
    /// Usage examples:
    /// # Scrobble a track that just finished
    /// lastfm-scrobble scrobble --artist "Radiohead" --track "Idioteque" --duration 309
    ///
    /// # Scrobble with an explicit start time (Unix seconds)
    /// lastfm-scrobble scrobble --artist "Radiohead" --track "Idioteque" --started-at 1700000000
    Scrobble {
        #[command(flatten)]
        track: TrackArgs,

        /// When playback started, as Unix seconds (defaults to now minus the duration)
        #[arg(long)]
        started_at: Option<i64>,
    },
}

pub async fn execute_command(
    command: Commands,
    client: &SubmissionClientImpl,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Login => {
            let session = client.session().await;
            println!(
                "✅ Logged in as {}",
                session.username.as_deref().unwrap_or("<unknown>")
            );
            Ok(())
        }
        Commands::NowPlaying { track } => {
            let entry = build_entry(&track, None)?;
            println!("🎵 Now playing: {entry}");
            let outcome = client.report_now_playing(&entry).await;
            finish(client, outcome).await
        }
        Commands::Scrobble { track, started_at } => {
            let entry = build_entry(&track, started_at)?;
            println!("📝 Scrobbling: {entry}");
            let outcome = client.scrobble(&entry).await;
            finish(client, outcome).await
        }
    }
}

fn build_entry(
    track: &TrackArgs,
    started_at: Option<i64>,
) -> Result<ScrobbleEntry, Box<dyn std::error::Error>> {
    let duration = Duration::from_secs(track.duration);
    let started_at = match started_at {
        Some(timestamp) => chrono::DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| format!("Invalid start time: {timestamp}"))?,
        None => chrono::Utc::now() - chrono::Duration::seconds(track.duration as i64),
    };

    let mut entry = ScrobbleEntry::new(
        track.artist.as_str(),
        track.track.as_str(),
        started_at,
        PlaybackSource::User,
        duration,
        ScrobbleMode::Played,
    )?;
    if let Some(album) = &track.album {
        entry = entry.with_album(album.as_str());
    }
    if let Some(track_number) = track.track_number {
        entry = entry.with_track_number(track_number);
    }
    if let Some(mbid) = &track.mbid {
        entry = entry.with_mbid(mbid.as_str());
    }

    Ok(entry)
}

/// Report the outcome and keep a refreshed session key for the next run.
async fn finish(
    client: &SubmissionClientImpl,
    outcome: SubmissionOutcome,
) -> Result<(), Box<dyn std::error::Error>> {
    let session = client.session().await;
    if session.username.is_some() && client.session_store().refresh_count().await > 0 {
        if let Err(e) = SessionPersistence::save_session(&session) {
            println!("⚠️  Warning: Failed to save refreshed session: {e}");
        }
    }

    outcome.into_result()?;
    println!("✅ Accepted by Last.fm");
    Ok(())
}
