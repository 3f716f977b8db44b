use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sitegate_core::storage::data_dir;
use sitegate_core::App;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "sitegate", version, about = "Block sites during a daily time window")]
struct Cli {
    /// Data directory (defaults to ~/.config/sitegate)
    #[arg(long, global = true, env = "SITEGATE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon: reconcile on start, every interval and on settings changes
    Run(commands::run::RunArgs),
    /// Run a single reconciliation now
    Reconcile(commands::run::ReconcileArgs),
    /// Show or edit the block list and window
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// List the rules currently held by the engine
    Rules(commands::rules::RulesArgs),
    /// Show whether blocking is active right now
    Status(commands::rules::StatusArgs),
}

fn init_logging(app: &App) {
    let filter = EnvFilter::try_from_env("SITEGATE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(&app.config.log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let dir = match cli.data_dir {
        Some(dir) => dir,
        None => data_dir()?,
    };
    if let Commands::Config {
        action: commands::config::ConfigAction::Reset,
    } = cli.command
    {
        return commands::config::reset(&dir);
    }

    let app = App::open(dir)?;
    init_logging(&app);
    if app.first_run {
        info!(data_dir = %app.data_dir().display(), "Initialized data directory");
    }

    match cli.command {
        Commands::Run(args) => commands::run::run(app, args).await,
        Commands::Reconcile(args) => commands::run::reconcile(app, args).await,
        Commands::Settings { action } => commands::settings::run(app, action).await,
        Commands::Config { action } => commands::config::run(app, action),
        Commands::Rules(args) => commands::rules::list(app, args).await,
        Commands::Status(args) => commands::rules::status(app, args).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
