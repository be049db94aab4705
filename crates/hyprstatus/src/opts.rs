use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Struct that gets generated from `RawOpt`.
#[derive(Debug, PartialEq, Eq)]
pub struct Opt {
    pub log_debug: bool,
    pub config_path: Option<PathBuf>,
    pub action: Action,
}

#[derive(Parser, Debug, PartialEq, Eq)]
#[command(author = "elkowar", version, about, long_about = None)]
pub(super) struct RawOpt {
    /// Write out debug logs.
    #[arg(long = "debug", global = true)]
    log_debug: bool,

    /// Override the path to the configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Follow Hyprland and the system tray and print every display change as a JSON line.
    /// Reads click actions as JSON lines from stdin. This is the default.
    #[command(name = "run")]
    Run,

    /// Query the open windows once and print the application groups.
    #[command(name = "groups")]
    Groups,

    /// Register as a tray host, wait for the initial items and print them.
    #[command(name = "tray")]
    Tray {
        /// How long to wait for item properties, in milliseconds.
        #[arg(long, default_value_t = 500)]
        wait_ms: u64,
    },

    /// Generate a shell completion script
    #[command(name = "shell-completions")]
    ShellCompletions {
        #[arg(short, long)]
        shell: clap_complete::shells::Shell,
    },
}

impl Opt {
    pub fn from_env() -> Self {
        let raw: RawOpt = RawOpt::parse();
        raw.into()
    }
}

impl From<RawOpt> for Opt {
    fn from(other: RawOpt) -> Self {
        let RawOpt { log_debug, config, action } = other;
        Opt { log_debug, config_path: config, action: action.unwrap_or(Action::Run) }
    }
}
