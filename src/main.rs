/*!
 * Command-line interface for code-extractor
 */

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, warn};

use code_extractor::config::{Args, Config};
use code_extractor::project::ProjectKind;
use code_extractor::report::{ReportFormat, Reporter, ScanReport};
use code_extractor::scanner::Scanner;

fn main() -> io::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if let Some(shell) = args.generate {
        let mut command = Args::command();
        let name = command.get_name().to_string();
        clap_complete::generate(shell, &mut command, name, &mut io::stdout());
        return Ok(());
    }

    init_logging(args.verbose, args.quiet);
    debug!("CLI args parsed: {:?}", args);

    let quiet = args.quiet;
    let config = Config::from_args(args);
    config.validate()?;

    if let Some(label) = &config.project_type {
        if !ProjectKind::labels().contains(label) {
            warn!(
                "Project type {:?} has no dedicated ignore rules (known: {})",
                label,
                ProjectKind::labels().join(", ")
            );
        }
    }

    let progress = if quiet {
        ProgressBar::hidden()
    } else {
        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {prefix:.bold.cyan} {pos} files {wide_msg:.dim.white} ⏱️  {elapsed_precise}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        progress.enable_steady_tick(Duration::from_millis(100));
        progress.set_prefix("📊 Scanning");
        progress.set_message(format!("📂 {}", config.target_dir.display()));
        progress
    };

    let start_time = Instant::now();
    let scanner = Scanner::new(config, Arc::new(progress.clone()));
    let outcome = scanner.scan()?;
    let duration = start_time.elapsed();

    progress.finish_and_clear();

    if quiet {
        println!("{}", outcome.output_path.display());
    } else {
        let reporter = Reporter::new(ReportFormat::ConsoleTable);
        reporter.print_report(&ScanReport::new(&outcome, duration));
    }

    Ok(())
}

/// Map `-v` occurrences to a log level; `--quiet` turns logging off
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Off
    } else {
        match verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}
