use colored::Colorize;
use log::info;

use yodk_rs::testfile::run_test_file;

use crate::cli::TestArgs;
use crate::error::YodkError;

/// Runs every case in a YAML test file and reports pass/fail per case.
/// Returns an error-carrying exit only on a malformed test file or script;
/// case failures are reported but don't themselves produce a `YodkError`.
pub fn run(args: TestArgs) -> Result<bool, YodkError> {
    info!("running test file '{}'", args.file.display());
    let report = run_test_file(&args.file)?;

    let mut all_passed = true;
    for case in &report.cases {
        if case.passed() {
            println!("{} {}", "PASS".green(), case.name);
        } else {
            all_passed = false;
            println!("{} {}", "FAIL".red(), case.name);
            for mismatch in &case.mismatches {
                println!("    {}: {}", mismatch.variable, mismatch.detail);
            }
            for err in &case.runtime_errors {
                println!("    {err}");
            }
        }
    }
    Ok(all_passed)
}
