//! CLI parser and dispatch.

mod commands;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use doctime::services::date_detection::{HeaderMode, MalformedHeaderPolicy};

/// Header parsing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HeaderModeArg {
    /// Legacy stripping and slicing rules
    Compat,
    /// Digits only, sliced as YYYY MM DD
    Strict,
}

impl From<HeaderModeArg> for HeaderMode {
    fn from(arg: HeaderModeArg) -> Self {
        match arg {
            HeaderModeArg::Compat => HeaderMode::Compat,
            HeaderModeArg::Strict => HeaderMode::Strict,
        }
    }
}

/// What to do with a malformed Principal Date header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MalformedArg {
    /// Stop with an error
    Fail,
    /// Warn and use the approximator
    Fallback,
}

impl From<MalformedArg> for MalformedHeaderPolicy {
    fn from(arg: MalformedArg) -> Self {
        match arg {
            MalformedArg::Fail => MalformedHeaderPolicy::Fail,
            MalformedArg::Fallback => MalformedHeaderPolicy::Fallback,
        }
    }
}

#[derive(Parser)]
#[command(name = "doctime")]
#[command(about = "Creation time, event filtering and TIMEX tagging for annotated notes")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

/// Options for creation time resolution shared by `dct` and `run`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DctArgs {
    /// Header parsing mode (overrides config)
    #[arg(long, value_enum)]
    header_mode: Option<HeaderModeArg>,

    /// Malformed header handling (overrides config)
    #[arg(long, value_enum)]
    on_malformed_header: Option<MalformedArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a document's creation time
    Dct {
        /// Annotated document (JSON)
        input: PathBuf,

        #[command(flatten)]
        args: DctArgs,

        /// Write the resolved date back into the input document
        #[arg(short, long)]
        write: bool,
    },

    /// Remove event mentions matching the filter list
    Filter {
        /// Annotated document (JSON)
        input: PathBuf,

        /// Filter term list, one term per line (overrides config)
        #[arg(long, env = "DOCTIME_FILTER_LIST")]
        filter_list: Option<String>,

        /// Write the filtered document here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render time mentions as TIMEX tagged sentences
    Timex {
        /// Annotated document (JSON)
        input: PathBuf,

        /// Output directory (overrides config)
        #[arg(long, env = "DOCTIME_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Run creation time resolution, event filtering and TIMEX rendering
    Run {
        /// Annotated document (JSON)
        input: PathBuf,

        #[command(flatten)]
        args: DctArgs,

        /// Filter term list, one term per line (overrides config)
        #[arg(long, env = "DOCTIME_FILTER_LIST")]
        filter_list: Option<String>,

        /// Output directory (overrides config)
        #[arg(long, env = "DOCTIME_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Dct { input, args, write } => {
            let config = helpers::load_config(cli.config.as_deref(), &input)?;
            commands::cmd_dct(&config, &input, &args, write)
        }
        Commands::Filter {
            input,
            filter_list,
            output,
        } => {
            let config = helpers::load_config(cli.config.as_deref(), &input)?;
            commands::cmd_filter(&config, &input, filter_list.as_deref(), output.as_deref())
        }
        Commands::Timex { input, output_dir } => {
            let config = helpers::load_config(cli.config.as_deref(), &input)?;
            commands::cmd_timex(&config, &input, output_dir)
        }
        Commands::Run {
            input,
            args,
            filter_list,
            output_dir,
        } => {
            let config = helpers::load_config(cli.config.as_deref(), &input)?;
            commands::cmd_run(&config, &input, &args, filter_list.as_deref(), output_dir)
        }
    }
}
