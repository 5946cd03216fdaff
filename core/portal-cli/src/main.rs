//! portal-session: command-line driver for the student portal session.
//!
//! Each invocation resumes the persisted session (if it is still within its
//! inactivity budget), performs one action, and exits. `watch` keeps the
//! session open in the foreground and runs the warning countdown live.
//!
//! ## Subcommands
//!
//! - `login` / `logout` / `status`: session entry, exit, and inspection
//! - `update`, `confirm`, `verify-mobile`, `history`: portal flows
//! - `watch`: live session; stdin lines count as interactions
//! - `simulate`: replays a scripted timeline on a manual clock

mod context;
mod logging;
mod portal;
mod render;
mod session;
mod simulate;
mod watch;

use clap::{Parser, Subcommand};
use session_core::StorageConfig;

use context::Context;

#[derive(Parser)]
#[command(name = "portal-session")]
#[command(about = "Student portal session lifecycle")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and persist the session
    Login {
        #[arg(long)]
        roll_no: String,

        /// Falls back to PORTAL_PASSWORD, then a prompt on stdin
        #[arg(long)]
        password: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show the current session and its remaining inactivity budget
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Submit profile changes (only fields that differ are sent)
    Update {
        /// Field assignment, e.g. `--set city=Nashik` (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE", required = true)]
        assignments: Vec<String>,
    },

    /// Confirm the stored profile data is correct
    Confirm,

    /// Verify the registered mobile number with a one-time code
    VerifyMobile,

    /// List the profile update log
    History,

    /// Keep the session open; type `stay`, `logout`, or an interaction per line
    Watch,

    /// Replay a timeline such as `wait:8m click wait:2m stay logout`
    Simulate {
        #[arg(value_name = "STEP", required = true)]
        steps: Vec<String>,

        /// Also print every countdown second
        #[arg(long)]
        ticks: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let storage = StorageConfig::default();
    let _logging_guard = logging::init(&storage.logs_dir());
    let context = Context::load(storage);

    let result = match cli.command {
        Commands::Login { roll_no, password } => session::login(&context, &roll_no, password),
        Commands::Logout => session::logout(&context),
        Commands::Status { json } => session::status(&context, json),
        Commands::Update { assignments } => portal::update(&context, &assignments),
        Commands::Confirm => portal::confirm(&context),
        Commands::VerifyMobile => portal::verify_mobile(&context),
        Commands::History => portal::history(&context),
        Commands::Watch => watch::run(&context),
        Commands::Simulate { steps, ticks } => simulate::run(&context.config, &steps, ticks),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "portal-session failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
