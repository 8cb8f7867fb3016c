use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use hid_descriptor_tool::{
    resolve_limits, run_compare, run_importance, run_items, run_states, OutputFormat,
};

#[derive(Debug, Parser)]
#[command(name = "hid_descriptor")]
#[command(about = "Inspect, minimize-check and compare USB HID report descriptors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Emit JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Maximum Push nesting, base table included (overrides HID_DESCRIPTOR_MAX_STACK_DEPTH).
    #[arg(long, global = true)]
    max_stack_depth: Option<usize>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List every item with its type, tag and payload.
    Items {
        /// Binary report descriptor.
        file: PathBuf,
    },
    /// Flag each item as required (true) or removable (false).
    Importance {
        /// Binary report descriptor.
        file: PathBuf,
    },
    /// Print the attribute table seen by every Main item.
    States {
        /// Binary report descriptor.
        file: PathBuf,
    },
    /// Check whether two descriptors produce the same Main items and state tables.
    Compare {
        /// First binary report descriptor.
        left: PathBuf,
        /// Second binary report descriptor.
        right: PathBuf,
    },
}

fn run(cli: Cli) -> Result<ExitCode> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Items { file } => run_items(&file, format, &mut out)?,
        Commands::Importance { file } => {
            run_importance(&file, format, resolve_limits(cli.max_stack_depth)?, &mut out)?
        }
        Commands::States { file } => {
            run_states(&file, format, resolve_limits(cli.max_stack_depth)?, &mut out)?
        }
        Commands::Compare { left, right } => {
            let limits = resolve_limits(cli.max_stack_depth)?;
            let equivalent = run_compare(&left, &right, format, limits, &mut out)?;
            out.flush()?;
            if !equivalent {
                return Ok(ExitCode::from(1));
            }
        }
    }

    out.flush()?;
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            tracing::debug!("command failed: {err:?}");
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
