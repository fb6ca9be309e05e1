use colored::Colorize;
use log::{error, info};

use yodk_rs::vm::Vm;

use crate::cli::RunArgs;
use crate::error::YodkError;

/// Runs a script to completion on its own VM (no coordinator -- a single
/// script has no one to share globals with) and prints its final
/// variables.
pub fn run(args: RunArgs) -> Result<(), YodkError> {
    let (program, _translations) = super::load_program(&args.file)?;
    let vm = Vm::new();

    vm.set_iterations(args.iterations);
    vm.set_max_executed_lines(args.max_lines);
    vm.set_error_handler(|_, err| {
        error!("{err}");
        true
    });

    info!("running '{}'", args.file.display());
    vm.run(program);
    vm.wait_for_termination();

    let mut vars: Vec<_> = vm.get_variables().into_iter().collect();
    vars.sort_by(|a, b| a.0.cmp(&b.0));
    for (name, value) in vars {
        println!("{} = {value}", name.cyan());
    }
    Ok(())
}
