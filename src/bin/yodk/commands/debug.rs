use std::io::{self, Write};

use colored::Colorize;
use log::info;

use yodk_rs::printer::print_yolol;
use yodk_rs::vm::{Vm, VmState};

use crate::cli::DebugArgs;
use crate::error::YodkError;

/// A minimal REPL over [`Vm`]'s public API: `run|r`, `pause|p`,
/// `continue|c`, `step|s`, `break|b N`, `delete|d N`, `vars|v`, `info|i`,
/// `list|l`, `disas`, `quit|q`.
pub fn run(args: DebugArgs) -> Result<(), YodkError> {
    let (program, translations) = super::load_program(&args.file)?;
    if !translations.is_empty() {
        info!("{} variable(s) were shortened during conversion", translations.len());
    }
    let printed = print_yolol(&program);

    let vm = Vm::new();
    vm.set_breakpoint_handler(|vm| {
        println!("{} at line {}", "breakpoint hit".yellow(), vm.current_source_line());
    });
    vm.set_error_handler(|_, err| {
        println!("{} {err}", "error:".red());
        true
    });
    vm.set_finish_handler(|_| {
        println!("{}", "program finished".green());
    });

    let stdin = io::stdin();
    let mut started = false;

    loop {
        print!("yodk> ");
        io::stdout().flush().ok();
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let mut parts = line.trim().split_whitespace();
        let Some(cmd) = parts.next() else { continue };
        let arg = parts.next();

        match cmd {
            "run" | "r" => {
                if started {
                    println!("already running; use 'continue' instead");
                } else {
                    vm.run(program.clone());
                    started = true;
                }
            }
            "pause" | "p" => vm.pause(),
            "continue" | "c" => vm.resume(),
            "step" | "s" => vm.step(),
            "break" | "b" => match arg.and_then(|a| a.parse::<i64>().ok()) {
                Some(source_line) => match resolve_source_line(&program, source_line) {
                    Some(pc) => vm.add_breakpoint(pc),
                    None => println!("no statement found at source line {source_line}"),
                },
                None => println!("usage: break <line>"),
            },
            "delete" | "d" => match arg.and_then(|a| a.parse::<i64>().ok()) {
                Some(source_line) => match resolve_source_line(&program, source_line) {
                    Some(pc) => vm.remove_breakpoint(pc),
                    None => println!("no statement found at source line {source_line}"),
                },
                None => println!("usage: delete <line>"),
            },
            "vars" | "v" => {
                let mut vars: Vec<_> = vm.get_variables().into_iter().collect();
                vars.sort_by(|a, b| a.0.cmp(&b.0));
                for (name, value) in vars {
                    println!("{} = {value}", name.cyan());
                }
            }
            "info" | "i" => {
                println!(
                    "state: {:?}, ast line: {}, source line: {}",
                    vm.state(),
                    vm.current_ast_line(),
                    vm.current_source_line()
                );
            }
            "list" | "l" => println!("{printed}"),
            "disas" => print_disassembly(&program, &vm),
            "quit" | "q" => {
                if started && vm.state() != VmState::Done {
                    vm.terminate();
                    vm.wait_for_termination();
                }
                break;
            }
            other => println!("unknown command '{other}'"),
        }
    }
    Ok(())
}

/// Finds the 1-based AST line whose source [`Position`] matches
/// `source_line`, if any. For an unconverted `.yolol` script this is the
/// identity mapping; for a converted `.nolol` script it follows whatever
/// line the packer folded that source line onto.
///
/// [`Position`]: yodk_rs::Position
fn resolve_source_line(program: &yodk_rs::ast::yolol::Program, source_line: i64) -> Option<i64> {
    program
        .lines
        .iter()
        .position(|line| line.position.line as i64 == source_line)
        .map(|idx| idx as i64 + 1)
}

/// Best-effort: prints the packed program with the VM's current line
/// marked. Not a stable contract -- for a converted program the packer may
/// have merged several source lines onto one physical line, so this is a
/// debugging aid rather than an exact reverse mapping.
fn print_disassembly(program: &yodk_rs::ast::yolol::Program, vm: &Vm) {
    let current = vm.current_ast_line();
    for (idx, line) in program.lines.iter().enumerate() {
        let marker = if idx as i64 + 1 == current { "-> " } else { "   " };
        println!("{marker}{:>3}: {}", idx + 1, yodk_rs::printer::yolol::print_statement_list(&line.statements));
    }
}
