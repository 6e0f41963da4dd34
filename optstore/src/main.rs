use std::path::PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use optstore::cli::{parse_value, CommandRunner, OptionCommand};
use optstore::config::{self, CliConfig};
use optstore_cache::ScopeParam;

#[derive(Parser)]
#[command(name = "optstore")]
#[command(about = "Scoped option store with autoload caching", long_about = None)]
struct Cli {
    /// Data directory (defaults to ~/.optstore)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// YAML config file (defaults to config.yaml in the data directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Scope to operate on; 0, false or an empty string mean the current scope
    #[arg(short, long, default_value = "0")]
    scope: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an option's value
    Get {
        /// Option name
        name: String,

        /// JSON value to print when the option is not set
        #[arg(long)]
        default: Option<String>,
    },

    /// Create an option; fails if it already exists
    Add {
        /// Option name
        name: String,

        /// Option value
        value: String,

        /// Load this option with the scope's bulk warm-up
        #[arg(long, conflicts_with = "no_autoload")]
        autoload: bool,

        /// Keep this option out of the bulk warm-up
        #[arg(long)]
        no_autoload: bool,

        /// Parse VALUE as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change an option's value, skipping writes that change nothing
    Update {
        /// Option name
        name: String,

        /// New value
        value: String,

        /// Parse VALUE as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete an option
    Delete {
        /// Option name
        name: String,
    },

    /// Turn bulk loading of an option on or off
    Autoload {
        /// Option name
        name: String,

        #[arg(value_enum)]
        state: Toggle,
    },

    /// List the autoloaded options of the scope
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "optstore=info,optstore_cache=info".into())
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let lookup_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => config::default_data_dir()?,
    };
    let cli_config = CliConfig::load(cli.config.as_deref(), &lookup_dir)?;
    let data_dir = config::resolve_data_dir(cli.data_dir.as_deref(), &cli_config)?;
    tracing::debug!("Using data directory {:?}", data_dir);

    let runner = CommandRunner::new(
        data_dir,
        cli_config.engine.clone(),
        ScopeParam::from_arg(&cli.scope),
    )?;

    let command = match cli.command {
        Commands::Get { name, default } => OptionCommand::Get {
            name,
            default: default.as_deref().map(|raw| parse_value(raw, true)).transpose()?,
        },
        Commands::Add {
            name,
            value,
            autoload,
            no_autoload,
            json,
        } => OptionCommand::Add {
            name,
            value: parse_value(&value, json)?,
            autoload: match (autoload, no_autoload) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
        },
        Commands::Update { name, value, json } => OptionCommand::Update {
            name,
            value: parse_value(&value, json)?,
        },
        Commands::Delete { name } => OptionCommand::Delete { name },
        Commands::Autoload { name, state } => OptionCommand::Autoload {
            name,
            enabled: matches!(state, Toggle::On),
        },
        Commands::List => OptionCommand::List,
    };

    let output = runner.run(command).await?;
    if output.success {
        println!("{}", output.message);
        Ok(())
    } else {
        eprintln!("{}", output.message);
        std::process::exit(1);
    }
}
