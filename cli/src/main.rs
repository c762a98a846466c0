use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use collabmatch::guard::RouteError;
use collabmatch::{
    ClientConfig, Navigator, Outcome, ProfileUpdate, RegisterFields, RegisterOutcome, RouteGuard, SessionError,
    SessionStore,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Session(#[from] SessionError),
    #[error("{0}")]
    Route(#[from] RouteError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("not signed in; run `collabmatch login` first")]
    NotSignedIn,
    #[error("nothing to update; pass at least one profile flag")]
    EmptyProfileUpdate,
}

#[derive(Parser, Debug)]
#[command(name = "collabmatch", about = "collabmatch session CLI")]
struct Cli {
    /// API base URL (overrides config from the environment).
    #[arg(long, env = "COLLABMATCH_API_URL")]
    api_url: Option<String>,

    /// Where the session token is kept between runs.
    #[arg(long, env = "COLLABMATCH_SESSION_FILE")]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COLLABMATCH_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register(RegisterArgs),
    /// Sign out and forget the stored session.
    Logout,
    /// Show the signed-in user.
    Whoami,
    /// Update the signed-in user's profile.
    Profile(ProfileArgs),
    /// Finish an OAuth sign-in from the provider's callback URL.
    OauthCallback { url: String },
    /// Show where navigating to a path would land.
    Route { path: String },
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "COLLABMATCH_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long = "skill")]
    skills: Vec<String>,
    #[arg(long = "interest")]
    interests: Vec<String>,
}

#[derive(Args, Debug)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    bio: Option<String>,
    #[arg(long = "skill")]
    skills: Vec<String>,
    #[arg(long = "interest")]
    interests: Vec<String>,
    #[arg(long)]
    avatar_url: Option<String>,
    /// Mark profile setup as finished.
    #[arg(long, default_value_t = false)]
    complete: bool,
}

impl From<RegisterArgs> for RegisterFields {
    fn from(args: RegisterArgs) -> Self {
        Self {
            name: args.name,
            email: args.email,
            password: args.password,
            bio: args.bio,
            skills: args.skills,
            interests: args.interests,
        }
    }
}

impl From<ProfileArgs> for ProfileUpdate {
    fn from(args: ProfileArgs) -> Self {
        Self {
            name: args.name,
            bio: args.bio,
            skills: (!args.skills.is_empty()).then_some(args.skills),
            interests: (!args.interests.is_empty()).then_some(args.interests),
            avatar_url: args.avatar_url,
            profile_complete: args.complete.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(cli.api_url.as_deref(), cli.session_file)?;
    tracing::debug!(api_url = %config.api_url, session_file = %config.session_file.display(), "config loaded");

    let store = SessionStore::from_config(&config)?;
    if restores_session(&cli.command) {
        store.start().await;
    }
    let result = run(&store, cli.command).await;
    store.shutdown();
    result
}

fn build_config(api_url: Option<&str>, session_file: Option<PathBuf>) -> Result<ClientConfig, SessionError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(api_url) = api_url {
        config = config.with_api_url(api_url)?;
    }
    if let Some(session_file) = session_file {
        config.session_file = session_file;
    }
    Ok(config)
}

/// `logout` revokes the persisted token as-is; restoring first would drop it
/// whenever the API is unreachable, and the remote call would never happen.
fn restores_session(command: &Command) -> bool {
    !matches!(command, Command::Logout)
}

async fn run(store: &SessionStore, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password } => {
            let user = store.login(&email, &password).await?;
            print_json(&json!({ "signed_in": user }))
        }
        Command::Register(args) => match store.register(&args.into()).await? {
            RegisterOutcome::SignedIn(user) => print_json(&json!({ "signed_in": user })),
            RegisterOutcome::Pending => print_json(&json!({ "pending": true })),
        },
        Command::Logout => {
            store.logout().await;
            print_json(&json!({ "signed_out": true }))
        }
        Command::Whoami => {
            let user = store.user().ok_or(CliError::NotSignedIn)?;
            print_json(&json!({ "user": user, "phase": store.phase().as_str() }))
        }
        Command::Profile(args) => {
            let update = ProfileUpdate::from(args);
            if update.is_empty() {
                return Err(CliError::EmptyProfileUpdate);
            }
            let user = store.update_profile(&update).await?;
            print_json(&json!({ "user": user, "phase": store.phase().as_str() }))
        }
        Command::OauthCallback { url } => {
            let user = store.complete_oauth(&url).await?;
            print_json(&json!({ "signed_in": user }))
        }
        Command::Route { path } => {
            let mut navigator = Navigator::new(RouteGuard::default());
            let outcome = navigator.navigate(&store.session(), &path)?;
            print_json(&outcome_json(&path, outcome))
        }
    }
}

fn outcome_json(requested: &str, outcome: &Outcome) -> Value {
    let (action, path) = match outcome {
        Outcome::Render(path) => ("render", path),
        Outcome::Wait(path) => ("wait", path),
    };
    json!({ "requested": requested, "action": action, "path": path })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
