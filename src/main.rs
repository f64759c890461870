#![forbid(unsafe_code)]
//! classmeta Command Line Interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use classmeta::commands::{
    execute_class, execute_classes, execute_constants, execute_find, execute_map, ClassOptions,
    ClassesOptions, ConstantsOptions, FindOptions, MapOptions, MetaField,
};
use classmeta::config::CONFIG_FILE;
use classmeta::Config;

#[derive(Parser)]
#[command(name = "classmeta")]
#[command(about = "Class and class-constant metadata lookup from docblock annotations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Source root to index (overrides the config file)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List indexed classes
    Classes {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show metadata annotated on a class
    Class {
        /// Fully-qualified class name
        class: String,

        /// Groups to match (can specify multiple; default: Default)
        #[arg(short, long = "group")]
        groups: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show constant metadata of a class, including inherited constants
    Constants {
        /// Fully-qualified class name
        class: String,

        /// Groups to match (can specify multiple; default: Default)
        #[arg(short, long = "group")]
        groups: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find the constant metadata for a constant value
    Find {
        /// Fully-qualified class name
        class: String,

        /// Constant value (JSON literal or plain text)
        value: String,

        /// Groups to match (can specify multiple; default: Default)
        #[arg(short, long = "group")]
        groups: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a JSON object built from constant metadata
    Map {
        /// Fully-qualified class name
        class: String,

        /// Field used as key (property, value, groups, data.<key>)
        #[arg(long, default_value = "property")]
        key: MetaField,

        /// Field used as value (property, value, groups, data.<key>)
        #[arg(long, default_value = "value")]
        value: MetaField,

        /// Groups to match (can specify multiple; default: Default)
        #[arg(short, long = "group")]
        groups: Vec<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "classmeta=debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();

    // Load config
    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };
    if let Some(root) = cli.root {
        config.root = root;
    }

    match cli.command {
        Commands::Classes { json } => execute_classes(ClassesOptions { json }, &config),
        Commands::Class { class, groups, json } => {
            execute_class(ClassOptions { class, groups, json }, &config)
        }
        Commands::Constants { class, groups, json } => {
            execute_constants(ConstantsOptions { class, groups, json }, &config)
        }
        Commands::Find {
            class,
            value,
            groups,
            json,
        } => execute_find(
            FindOptions {
                class,
                value,
                groups,
                json,
            },
            &config,
        ),
        Commands::Map {
            class,
            key,
            value,
            groups,
        } => execute_map(
            MapOptions {
                class,
                key,
                value,
                groups,
            },
            &config,
        ),
    }
}
