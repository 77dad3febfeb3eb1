//! schemafill: fill JSON Schema 2020-12 defaults into JSON documents.

use clap::{Parser, Subcommand};
use schemafill_config::AppConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "schemafill")]
#[command(about = "Fill JSON Schema defaults into JSON documents", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of ~/.schemafill/config.toml
    #[arg(long, global = true, env = "SCHEMAFILL_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill schema defaults into a document
    Apply {
        /// Schema to apply
        #[arg(short, long)]
        schema: PathBuf,

        /// Document to fill (`-` reads stdin). Without it, the document
        /// is built from the schema's root default.
        #[arg(short, long)]
        instance: Option<PathBuf>,

        /// Extra schema files available as `$ref` targets
        #[arg(long = "with")]
        with: Vec<PathBuf>,

        /// Fail if the filled document does not conform to the schema
        #[arg(long)]
        validate: bool,

        /// Print the document on a single line
        #[arg(long)]
        compact: bool,
    },

    /// Check a document against a schema
    Validate {
        #[arg(short, long)]
        schema: PathBuf,

        /// Document to check (`-` reads stdin)
        #[arg(short, long)]
        instance: PathBuf,

        #[arg(long = "with")]
        with: Vec<PathBuf>,
    },

    /// Remove members the schema's `properties` do not declare
    Strip {
        #[arg(short, long)]
        schema: PathBuf,

        #[arg(short, long)]
        instance: PathBuf,
    },

    /// Decode a form query string into a typed JSON object
    DecodeQuery {
        #[arg(short, long)]
        schema: PathBuf,

        /// Query string, e.g. `name=Ada&age=36`
        query: String,
    },

    /// Show or inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print a default config file
    Default,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    let config = AppConfig::load_with_env(&config_path)
        .map_err(|e| format!("Failed to load config: {e}"))?;

    init_tracing(&config, cli.verbose);

    match cli.command {
        Commands::Apply {
            schema,
            instance,
            with,
            validate,
            compact,
        } => commands::apply::run(
            &config,
            commands::apply::ApplyArgs {
                schema,
                instance,
                with,
                validate,
                compact,
            },
        ),
        Commands::Validate {
            schema,
            instance,
            with,
        } => commands::validate::run(&config, &schema, &instance, &with),
        Commands::Strip { schema, instance } => commands::strip::run(&config, &schema, &instance),
        Commands::DecodeQuery { schema, query } => {
            commands::decode_query::run(&config, &schema, &query)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(&config),
            ConfigAction::Path => commands::config_cmd::path(&config_path),
            ConfigAction::Default => commands::config_cmd::default(),
        },
    }
}

/// `RUST_LOG` wins, then `--verbose`, then the configured level. Logs go
/// to stderr so stdout carries only documents.
fn init_tracing(config: &AppConfig, verbose: bool) {
    let level = if verbose { "debug" } else { config.log.level.as_str() };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if config.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
