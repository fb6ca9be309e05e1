use colored::Colorize;
use log::info;

use yodk_rs::printer::print_yolol;

use crate::cli::CompileArgs;
use crate::error::YodkError;

/// Parses (and, for `.nolol`, converts) a script, reporting any error.
/// With `--print`, also prints the resulting YOLOL source.
pub fn run(args: CompileArgs) -> Result<(), YodkError> {
    let (program, translations) = super::load_program(&args.file)?;
    info!("'{}' compiled cleanly ({} line(s))", args.file.display(), program.lines.len());
    if !translations.is_empty() {
        info!("{} variable(s) were shortened during conversion", translations.len());
    }
    if args.print {
        println!("{}", print_yolol(&program));
    }
    println!("{}", "OK".green());
    Ok(())
}
