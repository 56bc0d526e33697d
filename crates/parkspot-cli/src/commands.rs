use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::{Parser, Subcommand, ValueEnum};
use parkspot_core::config::Config;
use parkspot_core::models::{RegisterRequest, SpotKind};
use parkspot_core::{
    ApiClient, AppState, AuthClient, FetchRequest, LifecycleAction, LifecycleGuard,
    RegisterOutcome, Session,
};
use tracing::warn;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Environment variables:\n  PARKSPOT_API_URL    Override the API base URL\n  RUST_LOG            Log filter (default: warn)")]
pub struct Cli {
    /// Keep tokens in process memory instead of the OS keychain
    #[arg(long, global = true)]
    pub memory_store: bool,

    /// Also write logs to a daily-rolling file in the cache directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session
    Login {
        /// Defaults to the last username used
        username: Option<String>,
        /// Keep the session in the keychain across restarts
        #[arg(long)]
        remember: bool,
    },
    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Forget all stored tokens
    Logout,
    /// Show whether a session is active and where it is stored
    Status,
    /// List parking and charging spots
    Spots {
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// List your bookings
    Bookings,
    /// Send an authenticated GET and print the response body
    Fetch { path: String },
    /// Simulate the app moving to the background
    Background,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Parking,
    Ev,
}

impl From<KindArg> for SpotKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Parking => SpotKind::Parking,
            KindArg::Ev => SpotKind::EvCharging,
        }
    }
}

/// Each command is its own process, so an in-memory session never reaches
/// the next one.
const SESSION_ONLY_NOTICE: &str =
    "Note: session-only logins end when this command exits; use --remember to stay logged in.";

/// Notice to print when tokens will not outlive the current command.
fn session_only_notice(remembered: bool) -> Option<&'static str> {
    (!remembered).then_some(SESSION_ONLY_NOTICE)
}

/// Composition root shared by every command.
pub struct Context {
    pub config: Config,
    pub session: Arc<Session>,
    pub auth: Arc<AuthClient>,
    pub api: ApiClient,
}

pub async fn run(command: Command, ctx: &mut Context) -> Result<()> {
    match command {
        Command::Login { username, remember } => login(ctx, username, remember).await,
        Command::Register {
            username,
            email,
            full_name,
            phone,
        } => {
            let password = rpassword::prompt_password("Password: ")
                .context("Failed to read password")?;
            let request = RegisterRequest {
                username,
                password,
                email,
                full_name,
                phone_number: phone,
            };
            match ctx.auth.register(&request).await {
                RegisterOutcome::Registered(user) => {
                    println!("Registered {} (id {})", user.display_name(), user.id);
                    Ok(())
                }
                RegisterOutcome::Rejected { message } => bail!("Registration failed: {}", message),
            }
        }
        Command::Refresh => {
            ctx.auth.refresh_token().await?;
            println!("Access token refreshed");
            Ok(())
        }
        Command::Logout => {
            ctx.auth.logout();
            println!("Logged out");
            Ok(())
        }
        Command::Status => {
            if !ctx.session.has_session() {
                println!("Not logged in");
            } else if ctx.session.is_remembered() {
                println!("Logged in (remembered in keychain)");
            } else {
                println!("Logged in (this session only)");
            }
            Ok(())
        }
        Command::Spots { kind } => {
            let spots = ctx.api.list_spots(kind.map(SpotKind::from)).await?;
            if spots.is_empty() {
                println!("No spots found");
            }
            for spot in spots {
                let price = spot
                    .price_per_hour
                    .map(|p| format!("{:.2}/h", p))
                    .unwrap_or_else(|| "-".to_string());
                let availability = if spot.available { "available" } else { "taken" };
                println!("{:>6}  {:<30} {:<12} {}", spot.id, spot.name, price, availability);
            }
            Ok(())
        }
        Command::Bookings => {
            let bookings = ctx.api.my_bookings().await?;
            if bookings.is_empty() {
                println!("No bookings");
            }
            for booking in bookings {
                println!(
                    "{:>6}  spot {:<6} {} ({} min) {:?}",
                    booking.id,
                    booking.spot_id,
                    booking.start_time.format("%Y-%m-%d %H:%M"),
                    booking.duration_minutes(),
                    booking.status
                );
            }
            Ok(())
        }
        Command::Fetch { path } => {
            let response = ctx.auth.authenticated_fetch(FetchRequest::get(path)).await?;
            let status = response.status();
            let body = response.text().await.context("Failed to read response body")?;
            println!("{}", status);
            match serde_json::from_str::<serde_json::Value>(&body) {
                Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
                Err(_) => println!("{}", body),
            }
            Ok(())
        }
        Command::Background => {
            if let Some(notice) = session_only_notice(ctx.session.is_remembered()) {
                println!("{}", notice);
            }
            let guard = LifecycleGuard::new(ctx.session.clone());
            match guard.on_state_change(AppState::Background) {
                LifecycleAction::ClearedSessionTokens => println!("Session-only tokens cleared"),
                LifecycleAction::Retained => println!("Remembered session retained"),
                LifecycleAction::NoOp => println!("Nothing to do"),
            }
            Ok(())
        }
    }
}

async fn login(ctx: &mut Context, username: Option<String>, remember: bool) -> Result<()> {
    let username = match username.or_else(|| ctx.config.last_username.clone()) {
        Some(username) => username,
        None => bail!("No username given and none remembered from a previous login"),
    };
    let password = rpassword::prompt_password(format!("Password for {}: ", username))
        .context("Failed to read password")?;

    ctx.auth.login(&username, &password, remember).await?;

    ctx.config.last_username = Some(username.clone());
    if let Err(e) = ctx.config.save() {
        warn!(error = %e, "Failed to save config");
    }

    if remember {
        println!("Logged in as {} (remembered)", username);
    } else {
        println!("Logged in as {} for this session", username);
    }
    if let Some(notice) = session_only_notice(remember) {
        println!("{}", notice);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_login_with_remember() {
        let cli = Cli::try_parse_from(["parkspot", "login", "driver", "--remember"]).unwrap();
        match cli.command {
            Command::Login { username, remember } => {
                assert_eq!(username.as_deref(), Some("driver"));
                assert!(remember);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_session_only_notice() {
        assert_eq!(session_only_notice(false), Some(SESSION_ONLY_NOTICE));
        assert_eq!(session_only_notice(true), None);
    }

    #[test]
    fn test_parse_spots_kind_and_global_flag() {
        let cli = Cli::try_parse_from(["parkspot", "spots", "--kind", "ev", "--memory-store"]).unwrap();
        assert!(cli.memory_store);
        match cli.command {
            Command::Spots { kind } => {
                assert_eq!(kind.map(SpotKind::from), Some(SpotKind::EvCharging));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
