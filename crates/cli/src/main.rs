mod config_commands;
mod query_commands;

use std::{path::PathBuf, process::ExitCode};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    quill_config::QuillConfig,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "quill", about = "Quill: GraphQL over users, posts and profiles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides discovery of quill.toml).
    #[arg(long, global = true, env = "QUILL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a document against an in-memory store and print the response.
    Exec(query_commands::ExecArgs),
    /// Parse and validate a document without executing it.
    Check {
        /// Document file, or `-` for stdin.
        query: PathBuf,
    },
    /// Print the schema as SDL.
    Schema,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Initialise tracing. Logs go to stderr so stdout carries only command
/// output.
fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<QuillConfig> {
    match path {
        Some(path) => quill_config::load_config(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(quill_config::discover_and_load()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "quill starting");

    match cli.command {
        Commands::Exec(args) => {
            let config = load_config(cli.config.as_ref())?;
            query_commands::handle_exec(args, &config).await
        },
        Commands::Check { query } => {
            let config = load_config(cli.config.as_ref())?;
            query_commands::handle_check(&query, &config)
        },
        Commands::Schema => {
            print!("{}", quill_graphql::sdl::print_schema(quill_graphql::schema()));
            Ok(ExitCode::SUCCESS)
        },
        Commands::Config { action } => config_commands::handle_config(action, cli.config),
    }
}
