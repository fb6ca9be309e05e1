//! Everything needed for parsing `yodk`'s CLI arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Struct containing the CLI configuration for yodk.
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Specify the log level.
    #[arg(value_enum, short, long, default_value_t = LogLevel::default())]
    pub verbosity: LogLevel,
}

impl Cli {
    pub fn init() -> Self {
        Cli::parse()
    }
}

/// Enum for specifying yodk's log level.
#[derive(ValueEnum, Clone, Default, Debug)]
pub enum LogLevel {
    #[default]
    #[value(alias("0"))]
    Error,

    #[value(alias("1"))]
    Warn,

    #[value(alias("2"))]
    Info,

    #[value(alias("3"))]
    Debug,

    #[value(alias("4"))]
    Trace,
}

impl From<&LogLevel> for log::Level {
    fn from(value: &LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse (and, for .nolol, convert) a script and report any errors.
    Compile(CompileArgs),

    /// Run a script to completion and print its final variables.
    Run(RunArgs),

    /// Step through a script with an interactive debugger.
    Debug(DebugArgs),

    /// Run a YAML test file against one or more scripts.
    Test(TestArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// The script to compile (.yolol or .nolol).
    pub file: PathBuf,

    /// Print the resulting YOLOL source instead of just checking it.
    #[arg(long)]
    pub print: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// The script to run (.yolol or .nolol).
    pub file: PathBuf,

    /// Maximum number of times the program may wrap back to line 1 (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    pub iterations: u64,

    /// Maximum number of lines to execute in total (0 = unlimited).
    #[arg(long, default_value_t = 0)]
    pub max_lines: u64,
}

#[derive(Args, Debug, Clone)]
pub struct DebugArgs {
    /// The script to debug (.yolol or .nolol).
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct TestArgs {
    /// The YAML test file to run.
    pub file: PathBuf,
}
