//! envrc
//!
//! Resolves layered configuration for a project and prints values, sections
//! or the list of candidate files.

use anyhow::{Result, anyhow};
use clap::Parser;
use envrc::cli::get::GetArgs;
use envrc::cli::{Cli, Command, Section};
use envrc::config::{ResolvedConfig, Resolver};
use envrc::format::{
    OutputFormat, format_files, format_info, format_map, format_value, format_variables,
};
use std::fs::OpenOptions;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

/// Environment variable holding an optional tracing filter directive.
const LOG_FILTER_ENV: &str = "ENVRC_LOG";

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = || {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(level).into())
            .with_env_var(LOG_FILTER_ENV)
            .from_env_lossy()
    };

    match cli.log.as_str() {
        "0" | "off" => {}
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn run_get(config: &ResolvedConfig, args: &GetArgs, format: OutputFormat) -> Result<()> {
    let result = config.lookup(&args.names, args.fallback_value(), args.lookup_options());

    if args.trace {
        eprintln!("{}", format_variables(&config.registry().snapshot(), format));
    }

    match result? {
        Some(value) => {
            println!("{}", format_value(&value));
            Ok(())
        }
        None => Err(anyhow!("no value for {}", args.names.join(", "))),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let format = OutputFormat::from_str(&cli.format)
        .ok_or_else(|| anyhow!("Invalid format '{}'. Valid options: json, markdown", cli.format))?;
    let options = cli.resolve_options().map_err(|e| anyhow!(e))?;

    let config = Resolver::new().resolve(options)?;
    debug!(
        cwd = %config.cwd().display(),
        files = config.existing_files().len(),
        "Resolved configuration"
    );

    match &cli.command {
        Some(Command::Get(args)) => run_get(&config, args, format)?,
        Some(Command::Dump { section }) => {
            let (title, map) = match section {
                Section::Values => ("Values", config.values()),
                Section::Merged => ("Merged", config.merged()),
                Section::Env => ("Environment", config.env()),
            };
            println!("{}", format_map(title, map, format));
        }
        Some(Command::Files { existing }) => {
            print!("{}", format_files(&config, *existing, format));
            if format == OutputFormat::Json {
                println!();
            }
        }
        Some(Command::Info) => println!("{}", format_info(&config, format)),
        None => println!("{}", format_map("Values", config.values(), format)),
    }

    Ok(())
}
