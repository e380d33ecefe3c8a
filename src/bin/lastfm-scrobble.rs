mod commands;

use clap::Parser;
use commands::{execute_command, utils::get_credentials, utils::load_or_create_client, Commands};

/// Last.fm scrobble submission tool
#[derive(Parser)]
#[command(
    name = "lastfm-scrobble",
    about = "Report now-playing tracks and scrobbles to Last.fm",
    long_about = None
)]
struct Cli {
    /// Show detailed debug information
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let credentials = match get_credentials() {
        Ok(creds) => creds,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            eprintln!();
            eprintln!("Please set the following environment variables:");
            eprintln!("  LASTFM_API_KEY=your_api_key");
            eprintln!("  LASTFM_API_SECRET=your_api_secret");
            eprintln!("  LASTFM_USERNAME=your_lastfm_username");
            eprintln!("  LASTFM_PASSWORD=your_lastfm_password");
            eprintln!();
            eprintln!("LASTFM_SESSION_KEY may be set instead of the password to reuse a session.");
            std::process::exit(1);
        }
    };

    if args.verbose {
        if let Some(username) = &credentials.username {
            println!("🔐 Using username: {username}");
        }
    }

    let force_login = matches!(args.command, Commands::Login);
    let client = match load_or_create_client(&credentials, force_login).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ Failed to create client: {e}");
            std::process::exit(1);
        }
    };

    if args.verbose {
        println!("✅ Client ready");
    }

    if let Err(e) = execute_command(args.command, &client).await {
        eprintln!("❌ Command failed: {e}");
        std::process::exit(1);
    }

    Ok(())
}
