//! Command-line interface for playstat.
//!
//! A thin operator tool over a session database:
//! - `import`: load closed sessions from JSON lines
//! - `stats`: session aggregation summary
//! - `activity`: activity index for one or all players
//! - `graph`: chart-ready series as JSON
//! - `config`: show or create the configuration file

mod commands;

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use tracing::warn;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::storage::{SessionQuery, SqliteStore};
use crate::util::time::{Clock, SystemClock, DAY};

/// Player session statistics for game servers.
#[derive(Debug, Parser)]
#[command(name = "playstat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the session database (default: from config, then data dir).
    #[arg(long, global = true, env = "PLAYSTAT_DB")]
    pub db: Option<PathBuf>,

    /// Output format for structured data.
    #[arg(short = 'o', long, global = true, default_value = "text", env = "PLAYSTAT_OUTPUT")]
    pub output: OutputFormat,

    /// Output as JSON (shorthand for -o json).
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "warn", env = "PLAYSTAT_LOG_LEVEL")]
    pub log_level: LogLevel,

    /// Log format (text, json, compact, pretty).
    #[arg(long, global = true, default_value = "text", env = "PLAYSTAT_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Number of threads for parallel processing (default: number of CPUs).
    #[arg(short = 'j', long, global = true, env = "PLAYSTAT_THREADS")]
    pub threads: Option<usize>,

    /// Path to custom configuration file.
    #[arg(long, global = true, env = "PLAYSTAT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Log level options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogLevel {
    /// Only errors.
    Error,
    /// Errors and warnings.
    #[default]
    Warn,
    /// Errors, warnings, and informational messages.
    Info,
    /// All of the above plus debug messages.
    Debug,
    /// All messages including trace-level details.
    Trace,
}

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format.
    #[default]
    Text,
    /// Structured JSON format for machine consumption.
    Json,
    /// Compact single-line format.
    Compact,
    /// Pretty format with full details.
    Pretty,
}

impl LogLevel {
    /// Convert to tracing filter level.
    #[must_use]
    pub fn to_filter_string(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Output format for CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// JSON output.
    Json,
}

impl Cli {
    /// Get effective output format.
    #[must_use]
    pub fn effective_output(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            self.output
        }
    }
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Import closed sessions from a JSON lines file.
    Import(ImportArgs),

    /// Show session statistics.
    Stats(StatsArgs),

    /// Compute activity indexes.
    #[command(alias = "ai")]
    Activity(ActivityArgs),

    /// Print chart-ready series as JSON.
    Graph(GraphArgs),

    /// Manage configuration.
    Config(ConfigArgs),

    /// Generate shell completions.
    Completions(CompletionsArgs),
}

/// Session filter shared by the read commands.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct RangeArgs {
    /// Only sessions of this player.
    #[arg(short = 'p', long)]
    pub player: Option<Uuid>,

    /// Only sessions on this server.
    #[arg(short = 's', long)]
    pub server: Option<Uuid>,

    /// Only sessions starting at or after this epoch-ms timestamp.
    #[arg(long, conflicts_with = "days")]
    pub after: Option<i64>,

    /// Only sessions starting before this epoch-ms timestamp.
    #[arg(long, conflicts_with = "days")]
    pub before: Option<i64>,

    /// Only sessions starting within the last N days.
    #[arg(long)]
    pub days: Option<u32>,
}

impl RangeArgs {
    /// Build the storage query these arguments describe.
    pub fn to_query(&self, now: i64) -> SessionQuery {
        let mut query = SessionQuery::all();
        if let Some(player) = self.player {
            query = query.player(player);
        }
        if let Some(server) = self.server {
            query = query.server(server);
        }
        match self.days {
            Some(days) => query.between(now - i64::from(days) * DAY, now),
            None => query.between(
                self.after.unwrap_or(i64::MIN),
                self.before.unwrap_or(i64::MAX),
            ),
        }
    }
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON lines file with one closed session per line ("-" for stdin).
    pub input: PathBuf,

    /// Abort on the first malformed line instead of skipping it.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the stats command.
#[derive(Debug, Parser)]
pub struct StatsArgs {
    /// Session filter.
    #[command(flatten)]
    pub range: RangeArgs,

    /// Also list the top players by playtime.
    #[arg(long)]
    pub top: bool,
}

/// Arguments for the activity command.
#[derive(Debug, Parser)]
pub struct ActivityArgs {
    /// Only this player (default: every player in the database).
    #[arg(short = 'p', long)]
    pub player: Option<Uuid>,

    /// Reference date in epoch ms (default: now).
    #[arg(long)]
    pub date: Option<i64>,

    /// Print player counts per activity label instead of per-player indexes.
    #[arg(long)]
    pub groups: bool,
}

/// Kinds of graph the graph command can build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphKind {
    /// Playtime per day.
    Playtime,
    /// Sessions per day.
    Sessions,
    /// Unique players per day.
    Players,
    /// Per-world playtime per day, stacked.
    Worlds,
    /// World playtime pie with gamemode drilldown.
    Pie,
    /// Session starts per weekday and hour.
    Punchcard,
    /// Players with the most playtime.
    Top,
}

/// Arguments for the graph command.
#[derive(Debug, Parser)]
pub struct GraphArgs {
    /// Graph to build.
    #[arg(value_enum)]
    pub kind: GraphKind,

    /// Session filter.
    #[command(flatten)]
    pub range: RangeArgs,

    /// Override the line simplification tolerance.
    #[arg(long)]
    pub epsilon: Option<f64>,

    /// Do not insert zero points for days without data.
    #[arg(long)]
    pub no_fill: bool,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    /// Config action to perform.
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommand actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Print the configuration file path.
    Path,
    /// Write a configuration file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Arguments for the completions command.
#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Shell to generate completions for.
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompletionShell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// PowerShell.
    Powershell,
    /// Elvish shell.
    Elvish,
}

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Shell::Bash,
            CompletionShell::Zsh => Shell::Zsh,
            CompletionShell::Fish => Shell::Fish,
            CompletionShell::Powershell => Shell::PowerShell,
            CompletionShell::Elvish => Shell::Elvish,
        }
    }
}

/// Generate shell completions and print to stdout.
pub fn generate_completions(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let shell: Shell = shell.into();
    generate(shell, &mut cmd, "playstat", &mut io::stdout());
}

/// Initialize logging based on CLI options.
fn init_logging(cli: &Cli) {
    use tracing_subscriber::{
        fmt::{self, format::FmtSpan},
        layer::SubscriberExt,
        util::SubscriberInitExt,
        EnvFilter,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_string()));

    let result = match cli.log_format {
        LogFormat::Json => {
            let layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Compact => {
            let layer = fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .pretty()
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
        LogFormat::Text => {
            let layer = fmt::layer().with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init()
        }
    };

    if let Err(e) = result {
        eprintln!("Warning: Could not initialize logging: {e}");
    }
}

/// Initialize rayon thread pool with custom thread count if specified.
fn init_thread_pool(threads: Option<usize>) {
    if let Some(num_threads) = threads.filter(|n| *n > 0) {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Already initialized is fine
    }
}

/// Load the configuration for this invocation.
///
/// An explicit `--config` path must load; the default location falls back to
/// defaults with a warning.
fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load_from(path),
        None => Ok(Config::load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        })),
    }
}

/// Open the session database selected by `--db` or the configuration.
pub(crate) fn open_store(cli: &Cli, config: &Config) -> Result<SqliteStore> {
    let path = match &cli.db {
        Some(path) => path.clone(),
        None => config.storage.database_path()?,
    };
    SqliteStore::open(path)
}

/// Current wall-clock time for commands that default to "now".
pub(crate) fn now_ms() -> i64 {
    SystemClock.now_ms()
}

/// Run the CLI application.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    init_thread_pool(cli.threads);
    init_logging(&cli);

    // `config init` creates the file the other commands read
    let config = match &cli.command {
        Commands::Config(ConfigArgs {
            action: ConfigAction::Init { .. },
        })
        | Commands::Completions(_) => Config::default(),
        _ => load_config(&cli)?,
    };

    match &cli.command {
        Commands::Import(args) => commands::import::run(&cli, &config, args),
        Commands::Stats(args) => commands::stats::run(&cli, &config, args),
        Commands::Activity(args) => commands::activity::run(&cli, &config, args),
        Commands::Graph(args) => commands::graph::run(&cli, &config, args),
        Commands::Config(args) => commands::config::run(&cli, &config, args),
        Commands::Completions(args) => {
            generate_completions(args.shell);
            Ok(())
        }
    }
}
