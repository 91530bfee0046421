use clap::{ArgAction, Parser, Subcommand};
use tracing::Level;
use tracing_subscriber;

pub const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Debug, Clone)]
pub enum Command {
    Download {
        config_path: Option<String>,
        distrib_dir: Option<String>,
        patch_dir: Option<String>,
        no_distrib: bool,
        no_patch: bool,
        silent: bool,
        versions: Vec<String>,
        snapshot_path: Option<String>,
        endpoint: Option<String>,
        pacing_ms: Option<u64>,
        idle_timeout_secs: Option<u64>,
        max_requeues: Option<usize>,
    },
    List {
        config_path: Option<String>,
        snapshot_path: Option<String>,
        endpoint: Option<String>,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Download {
            config_path: None,
            distrib_dir: None,
            patch_dir: None,
            no_distrib: false,
            no_patch: false,
            silent: false,
            versions: Vec::new(),
            snapshot_path: None,
            endpoint: None,
            pacing_ms: None,
            idle_timeout_secs: None,
            max_requeues: None,
        }
    }
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "patchgrab",
    version,
    about = "Download game client distributions and patches from the launcher patch list, resuming interrupted transfers"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Fetch the patch list, pick versions and download them (default)
    Download {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets the settings file (default: config.json)"
        )]
        config: Option<String>,

        #[arg(
            long = "distrib-dir",
            value_name = "DIR",
            help = "Overrides the directory for full distributions",
            conflicts_with = "no_distrib"
        )]
        distrib_dir: Option<String>,

        #[arg(
            long = "patch-dir",
            value_name = "DIR",
            help = "Overrides the directory for patches",
            conflicts_with = "no_patch"
        )]
        patch_dir: Option<String>,

        #[arg(long = "no-distrib", help = "Skip full distributions")]
        no_distrib: bool,

        #[arg(long = "no-patch", help = "Skip patches")]
        no_patch: bool,

        #[arg(
            short = 's',
            long = "silent",
            help = "Download every listed version without prompting"
        )]
        silent: bool,

        #[arg(
            long = "only",
            value_name = "VERSION",
            help = "Downloads only the given versions (repeat or use comma-separated values)",
            action = ArgAction::Append,
            value_delimiter = ','
        )]
        versions: Vec<String>,

        #[arg(
            long = "snapshot",
            value_name = "FILE",
            help = "Sets where the catalog snapshot is written (default: list.json)"
        )]
        snapshot: Option<String>,

        #[arg(long = "endpoint", value_name = "URL", help = "Overrides the patch list URL")]
        endpoint: Option<String>,

        #[arg(
            long = "pacing-ms",
            value_name = "MS",
            help = "Pause between status updates, in milliseconds"
        )]
        pacing_ms: Option<u64>,

        #[arg(
            long = "idle-timeout-secs",
            value_name = "SECS",
            help = "Retry a transfer after this many seconds without data (0 disables)"
        )]
        idle_timeout_secs: Option<u64>,

        #[arg(
            long = "max-requeues",
            value_name = "N",
            help = "Give up on an item after this many retries (default: retry forever)"
        )]
        max_requeues: Option<usize>,
    },

    /// Fetch the patch list, write the catalog snapshot and print it
    List {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets the settings file (default: config.json)"
        )]
        config: Option<String>,

        #[arg(
            long = "snapshot",
            value_name = "FILE",
            help = "Sets where the catalog snapshot is written (default: list.json)"
        )]
        snapshot: Option<String>,

        #[arg(long = "endpoint", value_name = "URL", help = "Overrides the patch list URL")]
        endpoint: Option<String>,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    let command = match cli.command {
        None => Command::default(),
        Some(CliCommand::Download {
            config,
            distrib_dir,
            patch_dir,
            no_distrib,
            no_patch,
            silent,
            versions,
            snapshot,
            endpoint,
            pacing_ms,
            idle_timeout_secs,
            max_requeues,
        }) => Command::Download {
            config_path: config,
            distrib_dir,
            patch_dir,
            no_distrib,
            no_patch,
            silent,
            versions,
            snapshot_path: snapshot,
            endpoint,
            pacing_ms,
            idle_timeout_secs,
            max_requeues,
        },
        Some(CliCommand::List {
            config,
            snapshot,
            endpoint,
        }) => Command::List {
            config_path: config,
            snapshot_path: snapshot,
            endpoint,
        },
    };

    Args { command, log_level }
}
