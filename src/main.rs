//! The main entry point for the `decomment` command-line application.
//!
//! This file is responsible for parsing command-line arguments and dispatching
//! to the appropriate command handler in the `decomment` library.

use anyhow::{Context, Result};
use decomment::cli::{self, Commands};
use decomment::pipeline::{self, StripRequest};
use decomment::{collector, logging, rewriter};
use std::process;

fn main() -> Result<()> {
    let args = cli::parse_args();
    logging::init_logging(args.verbose);

    match args.command {
        Commands::Strip {
            select,
            decode,
            backup,
            dry_run,
            fail_fast,
            format,
            output,
            quiet,
        } => {
            let mut config = select.resolve_config().context("Failed to load configuration")?;
            if let Some(policy) = decode {
                config.decode = policy;
            }
            config.backup |= backup;

            let target = select.dir.display().to_string();
            let result = pipeline::run_strip(StripRequest {
                dir: select.dir,
                config,
                dry_run,
                fail_fast,
                format,
                output,
                quiet,
                verbose: args.verbose,
            })
            .with_context(|| format!("Failed to strip comments under {target}"))?;
            if !result.is_success() {
                process::exit(1);
            }
            Ok(())
        }
        Commands::List { select } => {
            let config = select.resolve_config().context("Failed to load configuration")?;
            Ok(collector::run_list(select.dir, &config)?)
        }
        Commands::Restore { dir, keep_backups } => Ok(rewriter::run_restore(dir, keep_backups)?),
    }
}
