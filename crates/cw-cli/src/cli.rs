//! Command-line arguments

use crate::config::CliConfig;
use clap::{Parser, ValueEnum};
use cw_rewrite::ContractPolicy;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "callsite-wrapper",
    version = env!("CARGO_PKG_VERSION"),
    about = "Rewrite calls to functions annotated with callsite_wrapped_by",
    long_about = r#"
Every call `f(a, b)` to a function declared with
__attribute__((annotate("callsite_wrapped_by", Wrapper, Tag))) is replaced by
`({<Tag body> Wrapper(a, b, f, &Tag);})`. The rewritten text of each input file is
written to stdout, one file after another.

EXAMPLES:
    callsite-wrapper build src/main.cpp
    callsite-wrapper build src/a.cpp src/b.cpp --on-contract-violation skip
    "#
)]
pub struct Cli {
    /// Build directory containing compile_commands.json
    pub build_dir: PathBuf,

    /// Source files to rewrite
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Enable verbose logging (use multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Set log level (overrides --verbose/--quiet)
    #[arg(long, value_enum)]
    pub log: Option<LogLevel>,

    /// Set log output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Clang executable used to dump the AST
    #[arg(long)]
    pub clang: Option<PathBuf>,

    /// Extra argument appended to every compile command
    #[arg(long = "extra-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub extra_args: Vec<String>,

    /// What to do when an annotation is malformed or its tag has no body
    #[arg(long, value_name = "abort|skip")]
    pub on_contract_violation: Option<ContractPolicy>,

    /// Warn about call sites that were left alone because their source ranges are unusable
    #[arg(long)]
    pub report_skipped: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Cli {
    /// Applies command-line flags on top of the loaded configuration.
    pub fn apply(&self, config: &mut CliConfig) {
        if let Some(clang) = &self.clang {
            config.clang.path = Some(clang.clone());
        }
        config.clang.extra_args.extend(self.extra_args.iter().cloned());
        if let Some(policy) = self.on_contract_violation {
            config.rewrite.on_contract_violation = policy;
        }
        if self.report_skipped {
            config.rewrite.report_skipped = true;
        }
    }
}
