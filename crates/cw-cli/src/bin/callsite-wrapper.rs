//! callsite-wrapper binary
//!
//! # Usage
//!
//! ```bash
//! # Rewrite one translation unit of a CMake build
//! callsite-wrapper build src/main.cpp > main.rewritten.cpp
//!
//! # Keep going past malformed annotations
//! callsite-wrapper build src/*.cpp --on-contract-violation skip
//! ```

use clap::Parser;
use console::style;
use cw_cli::{
    cli::{Cli, LogFormat, LogLevel},
    config::CliConfig,
    diagnostics::{setup_error_reporting, DiagnosticStyle},
    tool::{CallsiteTool, ToolOptions},
    Result,
};
use tracing::{debug, error};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up error reporting
    setup_error_reporting()?;

    // Configure logging
    setup_logging(cli.verbose, cli.quiet, cli.log, cli.log_format)?;

    let mut config = CliConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    debug!(?config, "effective configuration");

    let options = ToolOptions {
        build_dir: cli.build_dir.clone(),
        files: cli.files.clone(),
        clang: config.clang.path.clone(),
        extra_args: config.clang.extra_args.clone(),
        rewrite: config.rewrite_options(),
        style: match cli.log_format {
            LogFormat::Pretty => DiagnosticStyle::Fancy,
            LogFormat::Json => DiagnosticStyle::Plain,
        },
        verbose: cli.verbose > 0,
    };

    let result = CallsiteTool::new(options).and_then(|tool| {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        tool.run(&mut out)
    });

    match result {
        Ok(report) if report.success() => {
            if !cli.quiet {
                eprintln!(
                    "{} {} of {} files rewritten",
                    style("✓").green(),
                    report.rewritten(),
                    report.files.len()
                );
            }
            Ok(())
        }
        Ok(report) => {
            eprintln!(
                "{} {} of {} files failed",
                style("✗").red(),
                report.failed(),
                report.files.len()
            );
            std::process::exit(1);
        }
        Err(e) => {
            error!("{}", e);
            if cli.verbose > 0 {
                error!(?e, "detailed error context");
            }
            std::process::exit(1);
        }
    }
}

fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_level: Option<LogLevel>,
    log_format: LogFormat,
) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if let Some(level) = log_level {
        EnvFilter::new(match level {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        })
    } else if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    // stdout carries the rewritten sources.
    let formatter = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_level(true);

    match log_format {
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(formatter)
                .with(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(formatter.json())
                .with(filter)
                .init();
        }
    }

    Ok(())
}
