// gridbase CLI - drive the grid engine headlessly

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use gridbase_cli::exit_codes::EXIT_SUCCESS;
use gridbase_cli::{run_replay, CliError, OutputFormat, ReplayOptions};
use gridbase_config::GridSettings;

#[derive(Parser)]
#[command(name = "gridbase")]
#[command(about = "Spreadsheet grid engine (headless)")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log engine activity to stderr (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a script of grid actions against a CSV file and print the result
    #[command(after_help = "\
Examples:
  gridbase replay people.csv edits.jsonl
  gridbase replay people.csv edits.jsonl --format csv > out.csv
  gridbase replay people.csv edits.jsonl --number zip --settings grid.toml -v")]
    Replay {
        /// CSV file; the header row names the columns
        data: PathBuf,

        /// Script with one JSON action per line
        script: PathBuf,

        /// Settings file (.json or .toml); defaults to the user settings
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Output format
        #[arg(long, short = 'f', value_enum, default_value = "tsv")]
        format: OutputFormat,

        /// Treat the named column as NUMBER (repeatable)
        #[arg(long = "number", value_name = "COL")]
        number: Vec<String>,
    },

    /// Print the effective settings as JSON
    Settings {
        /// Settings file (.json or .toml); defaults to the user settings
        #[arg(long)]
        settings: Option<PathBuf>,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GRIDBASE_COMMIT"), ")",
        "\nengine:  gridbase-engine ", env!("CARGO_PKG_VERSION"),
        "\nbuild:   ", env!("GRIDBASE_PROFILE"),
    )
}

fn cmd_replay(options: ReplayOptions) -> Result<(), CliError> {
    let stdout = io::stdout();
    let summary = run_replay(&options, stdout.lock())?;
    log::info!(
        "replayed {} action(s), {} failed write(s)",
        summary.actions,
        summary.mutation_failures
    );
    if summary.mutation_failures > 0 {
        return Err(CliError::runtime(format!(
            "{} store write(s) were rejected",
            summary.mutation_failures
        )));
    }
    Ok(())
}

fn cmd_settings(path: Option<PathBuf>) -> Result<(), CliError> {
    let settings = match path {
        Some(path) => GridSettings::load_from(&path)
            .map_err(|e| CliError::usage(format!("{}: {}", path.display(), e)))?,
        None => GridSettings::load(),
    };
    let json = serde_json::to_string_pretty(&settings)
        .map_err(|e| CliError::runtime(format!("cannot serialize settings: {}", e)))?;
    writeln!(io::stdout(), "{}", json).map_err(|e| CliError::runtime(e.to_string()))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Replay {
            data,
            script,
            settings,
            format,
            number,
        } => cmd_replay(ReplayOptions {
            data,
            script,
            settings,
            format,
            number,
        }),
        Commands::Settings { settings } => cmd_settings(settings),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}
