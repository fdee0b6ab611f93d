//! CLI argument definitions for rxrec.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "rxrec",
    version,
    about = "Reconcile medication lists against reference vocabularies",
    long_about = "Reconcile a medication list against a local drug list and a concept \
                  dictionary.\n\n\
                  Automatic fuzzy matching runs first; whatever is left is resolved \
                  interactively. Also bundles the OpenMRS server, git, database and VM \
                  chores of the same deployment."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Configuration file (default: $RXREC_CONFIG, ./rxrec.toml, then the user config dir).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Match a medication list against the local list and the dictionary.
    Match(MatchArgs),

    /// OpenMRS SDK server tasks.
    #[command(subcommand)]
    Server(ServerCommand),

    /// Git chores across the configured module checkouts.
    #[command(subcommand)]
    Git(GitCommand),

    /// MySQL resets for the configured database.
    #[command(subcommand)]
    Db(DbCommand),

    /// Virtual machine helpers.
    #[command(subcommand)]
    Vm(VmCommand),
}

#[derive(Args, Default)]
pub struct MatchArgs {
    /// Medication list to reconcile (CSV).
    #[arg(long = "source", value_name = "PATH")]
    pub source: Option<PathBuf>,

    /// Local drug list (CSV).
    #[arg(long = "local", value_name = "PATH")]
    pub local: Option<PathBuf>,

    /// Concept dictionary export (JSON).
    #[arg(long = "dictionary", value_name = "PATH")]
    pub dictionary: Option<PathBuf>,

    /// Directory for the final match files.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Directory for resume checkpoints.
    #[arg(long = "intermediates-dir", value_name = "DIR")]
    pub intermediates_dir: Option<PathBuf>,

    /// Scores must exceed this to auto-match against the local list.
    #[arg(long = "local-threshold", value_name = "N", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub local_threshold: Option<u8>,

    /// Scores must exceed this to auto-match against the dictionary.
    #[arg(long = "dictionary-threshold", value_name = "N", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub dictionary_threshold: Option<u8>,

    /// Fail on duplicate reference codes instead of keeping the last one.
    #[arg(long = "reject-duplicates")]
    pub reject_duplicates: bool,

    /// Print each stage's matches as a table.
    #[arg(long = "show-matches")]
    pub show_matches: bool,

    /// Stop after the automatic stages.
    #[arg(long = "no-interactive")]
    pub no_interactive: bool,
}

#[derive(Subcommand)]
pub enum ServerCommand {
    /// Point the server's runtime properties at the PIH config.
    Configure,

    /// Deploy the distribution to the SDK server.
    Deploy {
        /// Answer every SDK prompt with its default.
        #[arg(long = "no-prompt")]
        no_prompt: bool,

        /// Run Maven offline.
        #[arg(long = "offline")]
        offline: bool,
    },

    /// Build the module in the current directory.
    Install,

    /// Pull SDK-managed modules.
    Pull,

    /// Deploy, then run the server.
    Run {
        /// Run Maven offline.
        #[arg(long = "offline")]
        offline: bool,

        /// Start the server without deploying first.
        #[arg(long = "skip-deploy")]
        skip_deploy: bool,
    },

    /// Create the SDK server (password from RXREC_DB_PASSWORD, else prompted).
    Setup,

    /// Watch the module in the current directory.
    Watch,
}

#[derive(Subcommand)]
pub enum GitCommand {
    /// List checkouts that have a local branch.
    BranchFind {
        #[arg(value_name = "BRANCH")]
        branch: String,
    },

    /// Check out a branch wherever it exists.
    Checkout {
        #[arg(value_name = "BRANCH")]
        branch: String,
    },

    /// Pull checkouts on the main branch, fetch the rest.
    Pull,

    /// Push a branch to the fork remote wherever it exists.
    Push {
        #[arg(value_name = "BRANCH")]
        branch: String,

        #[arg(long = "force")]
        force: bool,
    },

    /// Show checkouts that are off the main branch or dirty.
    Status,
}

#[derive(Subcommand)]
pub enum DbCommand {
    /// Mark every module as started.
    EnableModules,

    /// Empty the address hierarchy tables.
    ClearAddressHierarchy,

    /// Empty the identifier generation tables.
    ClearIdgen,
}

#[derive(Subcommand)]
pub enum VmCommand {
    /// Boot a raw disk image under QEMU/KVM.
    RunDisk {
        #[arg(value_name = "DISK")]
        disk: PathBuf,
    },
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
