//! # yodk
//!
//! Command-line front-end for the YOLOL/NOLOL toolkit: compile, run, debug
//! and test scripts from one binary.

mod cli;
mod commands;
mod error;

use cli::{Cli, Commands};
use colored::Colorize;
use log::error;

fn main() {
    let args = Cli::init();
    simple_logger::init_with_level(log::Level::from(&args.verbosity)).unwrap();

    let result = match args.command {
        Commands::Compile(args) => commands::compile::run(args).map(|()| true),
        Commands::Run(args) => commands::run::run(args).map(|()| true),
        Commands::Debug(args) => commands::debug::run(args).map(|()| true),
        Commands::Test(args) => commands::test::run(args),
    };

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(err) => {
            error!("{}", err.to_string().red());
            std::process::exit(2);
        }
    }
}
