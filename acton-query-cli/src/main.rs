use clap::{Parser, Subcommand};
use colored::Colorize;

mod commands;

use acton_query::config::Config;
use commands::check::CheckArgs;
use commands::parse::ParseArgs;

/// acton-query - Interpret list-endpoint query strings against a resource schema
#[derive(Parser)]
#[command(name = "acton-query")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log filter (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true, value_name = "LEVEL", env = "ACTON_QUERY_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a query string and print the resulting descriptor as JSON
    Parse(ParseArgs),
    /// Load a schema file and report what it declares
    Check(CheckArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    acton_query::observability::init_tracing(&config.logging)?;

    match cli.command {
        Commands::Parse(args) => commands::parse::execute(args, &config),
        Commands::Check(args) => commands::check::execute(args),
    }
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);

            if let Some(source) = e.source() {
                eprintln!("\n{} {}", "Caused by:".yellow(), source);
            }

            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from([
            "acton-query",
            "--log-level",
            "debug",
            "parse",
            "--schema",
            "users.toml",
            "--no-default-sort",
            "age[gt]=18",
        ])
        .unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Commands::Parse(args) => {
                assert_eq!(args.query, "age[gt]=18");
                assert!(args.no_default_sort);
                assert!(!args.keep_empty_filter);
                assert!(!args.pretty);
            }
            Commands::Check(_) => panic!("expected parse command"),
        }
    }
}
