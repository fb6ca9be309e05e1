//! A tree-walking interpreter over a YOLOL [`Program`], plus the
//! [`Coordinator`] that lets several of them share `:`-prefixed globals.
//!
//! Each [`Vm`] runs on its own OS thread; its state lives behind a
//! `Mutex` + `Condvar` pair so that `pause`/`resume`/`step`/`terminate`
//! from the owning thread and the execution loop on the VM's own thread
//! never race. Handlers are always invoked with that mutex released, so a
//! handler is free to call back into the VM's own public API (e.g. read a
//! variable, or request termination) without deadlocking itself.

pub mod coordinator;
mod error;

pub use coordinator::Coordinator;
pub use error::RuntimeError;

use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

use rust_decimal::Decimal;

use crate::ast::yolol::{AssignOp, Dereference, Expression, Line, PrePost, Program, Statement};
use crate::ast::Spanned;
use crate::parser::yolol::parse_program;
use crate::parser::ParseErrors;
use crate::value::{run_binary_operation, run_builtin, run_increment, run_unary_operation, Variable};

use self::coordinator::TurnHandle;

/// A VM's execution state, mirroring the debugger's state machine: a fresh
/// VM is `Idle`; `run` moves it to `Running`; it settles in `Done` once its
/// iteration or line cap is hit, or `terminate()` forces it through `Kill`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Idle,
    Running,
    Paused,
    Step,
    Kill,
    Done,
}

type BreakHandler = Box<dyn FnMut(&Vm) + Send>;
/// Returns whether the VM should keep running past this error.
type ErrorHandler = Box<dyn FnMut(&Vm, &RuntimeError) -> bool + Send>;
type FinishHandler = Box<dyn FnMut(&Vm) + Send>;

#[derive(Default)]
struct Handlers {
    on_break: Option<BreakHandler>,
    on_error: Option<ErrorHandler>,
    on_finish: Option<FinishHandler>,
}

struct Inner {
    state: VmState,
    program: Option<Program>,
    vars: HashMap<String, Variable>,
    /// 1-based index into `program.lines`; `len + 1` means the current pass
    /// has run off the last line.
    pc: usize,
    breakpoints: HashSet<i64>,
    /// Breakpoint hits left to ignore, consumed one at a time; used so
    /// `step()` can cross a breakpoint on the line it starts from.
    skip_bp: usize,
    iterations: u64,
    iteration_cap: Option<u64>,
    lines_executed: u64,
    line_cap: Option<u64>,
    thread: Option<JoinHandle<()>>,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            state: VmState::Idle,
            program: None,
            vars: HashMap::new(),
            pc: 1,
            breakpoints: HashSet::new(),
            skip_bp: 0,
            iterations: 0,
            iteration_cap: None,
            lines_executed: 0,
            line_cap: None,
            thread: None,
        }
    }
}

struct Shared {
    inner: Mutex<Inner>,
    cond: Condvar,
    handlers: Mutex<Handlers>,
    coordinator: Option<Coordinator>,
    turn: Mutex<Option<TurnHandle>>,
}

/// A tree-walking interpreter over a single YOLOL [`Program`].
///
/// Cloning a `Vm` is cheap and yields another handle to the same
/// interpreter; this is how the execution thread, the [`Coordinator`] and
/// registered handlers all refer back to "this VM" without a borrow.
#[derive(Clone)]
pub struct Vm {
    shared: Arc<Shared>,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_coordinator(None)
    }

    /// Creates a VM that shares `:`-prefixed globals through `coordinator`
    /// and synchronizes its per-line execution turns with every other VM
    /// registered on it.
    pub fn with_coordinator(coordinator: Option<Coordinator>) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner::default()),
                cond: Condvar::new(),
                handlers: Mutex::new(Handlers::default()),
                coordinator,
                turn: Mutex::new(None),
            }),
        }
    }

    /// Resets the VM's state and starts executing `program` on a dedicated
    /// thread.
    pub fn run(&self, program: Program) {
        {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.program = Some(program);
            inner.vars.clear();
            inner.pc = 1;
            inner.skip_bp = 0;
            inner.iterations = 0;
            inner.lines_executed = 0;
            inner.state = VmState::Running;
        }
        if let Some(coordinator) = &self.shared.coordinator {
            let handle = coordinator.register_vm(self);
            *self.shared.turn.lock().unwrap() = Some(handle);
        }
        let vm = self.clone();
        let join = thread::spawn(move || drive(vm));
        self.shared.inner.lock().unwrap().thread = Some(join);
    }

    /// Parses `source` as YOLOL and runs it; the VM never touches NOLOL
    /// source directly -- [`crate::converter`] handles that beforehand.
    pub fn run_source(&self, source: &str) -> Result<(), ParseErrors> {
        let program = parse_program(source)?;
        self.run(program);
        Ok(())
    }

    pub fn pause(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        if matches!(inner.state, VmState::Running | VmState::Step) {
            inner.state = VmState::Paused;
        }
        self.shared.cond.notify_all();
    }

    pub fn resume(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        if inner.state == VmState::Paused {
            inner.state = VmState::Running;
        }
        self.shared.cond.notify_all();
    }

    /// Arranges for exactly one more line to run before the VM pauses
    /// again, even if it is sitting on a breakpoint right now.
    pub fn step(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        if matches!(inner.state, VmState::Paused | VmState::Idle) {
            inner.skip_bp = inner.skip_bp.max(1);
            inner.state = VmState::Step;
        }
        self.shared.cond.notify_all();
    }

    pub fn terminate(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        inner.state = VmState::Kill;
        self.shared.cond.notify_all();
    }

    pub fn wait_for_termination(&self) {
        let handle = self.shared.inner.lock().unwrap().thread.take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    pub fn add_breakpoint(&self, line: i64) {
        self.shared.inner.lock().unwrap().breakpoints.insert(line);
    }

    pub fn remove_breakpoint(&self, line: i64) {
        self.shared.inner.lock().unwrap().breakpoints.remove(&line);
    }

    pub fn list_breakpoints(&self) -> Vec<i64> {
        let mut lines: Vec<i64> = self
            .shared
            .inner
            .lock()
            .unwrap()
            .breakpoints
            .iter()
            .copied()
            .collect();
        lines.sort_unstable();
        lines
    }

    pub fn set_breakpoint_handler(&self, handler: impl FnMut(&Vm) + Send + 'static) {
        self.shared.handlers.lock().unwrap().on_break = Some(Box::new(handler));
    }

    pub fn set_error_handler(&self, handler: impl FnMut(&Vm, &RuntimeError) -> bool + Send + 'static) {
        self.shared.handlers.lock().unwrap().on_error = Some(Box::new(handler));
    }

    pub fn set_finish_handler(&self, handler: impl FnMut(&Vm) + Send + 'static) {
        self.shared.handlers.lock().unwrap().on_finish = Some(Box::new(handler));
    }

    pub fn get_variable(&self, name: &str) -> Variable {
        let inner = self.shared.inner.lock().unwrap();
        get_var(&inner, self.shared.coordinator.as_ref(), name)
    }

    pub fn set_variable(&self, name: &str, value: Variable) {
        let mut inner = self.shared.inner.lock().unwrap();
        set_var(&mut inner, self.shared.coordinator.as_ref(), name, value);
    }

    /// A deep-copy snapshot of this VM's local variables. Never aliases
    /// live state, so the caller can inspect it at leisure even while the
    /// VM keeps running.
    pub fn get_variables(&self) -> HashMap<String, Variable> {
        self.shared.inner.lock().unwrap().vars.clone()
    }

    pub fn state(&self) -> VmState {
        self.shared.inner.lock().unwrap().state
    }

    /// The 1-based line the VM is about to execute (or has just stopped
    /// on), indexed into the YOLOL AST it was given.
    pub fn current_ast_line(&self) -> i64 {
        self.shared.inner.lock().unwrap().pc as i64
    }

    /// Same line, but reported via the original source [`Position`] carried
    /// on it -- for a converted NOLOL program this differs from
    /// [`Self::current_ast_line`].
    ///
    /// [`Position`]: crate::lexer::Position
    pub fn current_source_line(&self) -> i64 {
        let inner = self.shared.inner.lock().unwrap();
        match &inner.program {
            Some(program) => program
                .lines
                .get(inner.pc.saturating_sub(1))
                .map(|line| line.position.line as i64)
                .unwrap_or(inner.pc as i64),
            None => inner.pc as i64,
        }
    }

    /// `count == 0` means "no cap" -- the VM loops forever until `terminate()`
    /// or an error handler declines to continue.
    pub fn set_iterations(&self, count: u64) {
        self.shared.inner.lock().unwrap().iteration_cap = if count == 0 { None } else { Some(count) };
    }

    /// `count == 0` means "no cap" on the number of statement lines executed.
    pub fn set_max_executed_lines(&self, count: u64) {
        self.shared.inner.lock().unwrap().line_cap = if count == 0 { None } else { Some(count) };
    }

    fn mark_done(&self) {
        {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.state = VmState::Done;
        }
        self.shared.cond.notify_all();
        if let Some(coordinator) = &self.shared.coordinator {
            coordinator.unregister_vm(self);
        }
        *self.shared.turn.lock().unwrap() = None;
    }

    fn invoke_break_handler(&self) {
        let mut handlers = self.shared.handlers.lock().unwrap();
        if let Some(handler) = handlers.on_break.as_mut() {
            handler(self);
        }
    }

    fn invoke_finish_handler(&self) {
        let mut handlers = self.shared.handlers.lock().unwrap();
        if let Some(handler) = handlers.on_finish.as_mut() {
            handler(self);
        }
    }

    fn invoke_error_handler(&self, err: &RuntimeError) -> bool {
        let mut handlers = self.shared.handlers.lock().unwrap();
        match handlers.on_error.as_mut() {
            Some(handler) => handler(self, err),
            None => false,
        }
    }

    fn is_same(&self, other: &Vm) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

fn is_global(name: &str) -> bool {
    name.starts_with(':')
}

fn get_var(inner: &Inner, coordinator: Option<&Coordinator>, name: &str) -> Variable {
    if is_global(name) {
        if let Some(coordinator) = coordinator {
            return coordinator.get_variable(name);
        }
    }
    inner.vars.get(name).cloned().unwrap_or_default()
}

fn set_var(inner: &mut Inner, coordinator: Option<&Coordinator>, name: &str, value: Variable) {
    if is_global(name) {
        if let Some(coordinator) = coordinator {
            coordinator.set_variable(name, value);
            return;
        }
    }
    inner.vars.insert(name.to_string(), value);
}

/// What executing one statement did to the line cursor.
enum StmtOutcome {
    Continue,
    Jump(i64),
}

fn eval_dereference(
    d: &Dereference,
    inner: &mut Inner,
    coordinator: Option<&Coordinator>,
) -> Result<Variable, RuntimeError> {
    let current = get_var(inner, coordinator, &d.variable);
    if d.operator.is_empty() {
        return Ok(current);
    }
    let updated = run_increment(&d.operator, &current)
        .map_err(|e| RuntimeError::from_value_error(e, d.start(), d.end()))?;
    set_var(inner, coordinator, &d.variable, updated.clone());
    match d.pre_post {
        PrePost::Pre => Ok(updated),
        PrePost::Post | PrePost::None => Ok(current),
    }
}

fn is_truthy(value: &Variable) -> bool {
    match value {
        Variable::Number(n) => !n.is_zero(),
        Variable::String(s) => !s.is_empty(),
    }
}

fn eval_expr(
    expr: &Expression,
    inner: &mut Inner,
    coordinator: Option<&Coordinator>,
) -> Result<Variable, RuntimeError> {
    match expr {
        Expression::StringConstant(s) => Ok(Variable::String(s.value.clone())),
        Expression::NumberConstant(n) => Decimal::from_str(&n.value)
            .map(Variable::Number)
            .map_err(|_| {
                RuntimeError::new(
                    format!("invalid number literal '{}'", n.value),
                    expr.start(),
                    expr.end(),
                )
            }),
        Expression::Dereference(d) => eval_dereference(d, inner, coordinator),
        Expression::UnaryOperation(u) => {
            let operand = eval_expr(&u.exp, inner, coordinator)?;
            run_unary_operation(u.op, &operand)
                .map_err(|e| RuntimeError::from_value_error(e, expr.start(), expr.end()))
        }
        Expression::BinaryOperation(b) => {
            let l = eval_expr(&b.l, inner, coordinator)?;
            let r = eval_expr(&b.r, inner, coordinator)?;
            run_binary_operation(&b.op, &l, &r)
                .map_err(|e| RuntimeError::from_value_error(e, expr.start(), expr.end()))
        }
        Expression::FuncCall(f) => {
            let arg = eval_expr(&f.arg, inner, coordinator)?;
            run_builtin(&f.function, &arg)
                .map_err(|e| RuntimeError::from_value_error(e, expr.start(), expr.end()))
        }
    }
}

fn exec_statement(
    stmt: &Statement,
    inner: &mut Inner,
    coordinator: Option<&Coordinator>,
) -> Result<StmtOutcome, RuntimeError> {
    match stmt {
        Statement::Assignment(a) => {
            let rhs = eval_expr(&a.expr, inner, coordinator)?;
            let value = match a.operator {
                AssignOp::Assign => rhs,
                _ => {
                    let op = a.operator.as_binary_op().expect("non-Assign op has a binary form");
                    let current = get_var(inner, coordinator, &a.variable);
                    run_binary_operation(op, &current, &rhs)
                        .map_err(|e| RuntimeError::from_value_error(e, a.start(), a.end()))?
                }
            };
            set_var(inner, coordinator, &a.variable, value);
            Ok(StmtOutcome::Continue)
        }
        Statement::GoTo(g) => Ok(StmtOutcome::Jump(g.line)),
        Statement::Dereference(d) => {
            eval_dereference(d, inner, coordinator)?;
            Ok(StmtOutcome::Continue)
        }
        Statement::If(ifs) => {
            let cond = eval_expr(&ifs.condition, inner, coordinator)?;
            let block = if is_truthy(&cond) {
                Some(&ifs.then_block)
            } else {
                ifs.else_block.as_ref()
            };
            if let Some(block) = block {
                for s in block {
                    if let StmtOutcome::Jump(target) = exec_statement(s, inner, coordinator)? {
                        return Ok(StmtOutcome::Jump(target));
                    }
                }
            }
            Ok(StmtOutcome::Continue)
        }
    }
}

/// Executes every statement on `line` until one of them requests a jump, or
/// the line runs out. Returns the 1-based target line of that jump, if any.
fn execute_line(
    line: &Line,
    inner: &mut Inner,
    coordinator: Option<&Coordinator>,
) -> Result<Option<i64>, RuntimeError> {
    for stmt in &line.statements {
        if let StmtOutcome::Jump(target) = exec_statement(stmt, inner, coordinator)? {
            return Ok(Some(target));
        }
    }
    Ok(None)
}

/// The body of a VM's dedicated execution thread. Runs until `Kill`, an
/// unhandled runtime error, or a configured iteration/line cap is hit.
fn drive(vm: Vm) {
    'drive: loop {
        let mut inner = vm.shared.inner.lock().unwrap();
        while inner.state == VmState::Paused {
            inner = vm.shared.cond.wait(inner).unwrap();
        }

        if inner.state == VmState::Kill {
            drop(inner);
            vm.mark_done();
            vm.invoke_finish_handler();
            break 'drive;
        }
        if inner.state == VmState::Done {
            break 'drive;
        }

        let len = match &inner.program {
            Some(program) => program.lines.len(),
            None => break 'drive,
        };
        if len == 0 {
            drop(inner);
            vm.mark_done();
            vm.invoke_finish_handler();
            break 'drive;
        }

        if inner.pc > len {
            inner.iterations += 1;
            let cap_hit = inner.iteration_cap.map(|cap| inner.iterations >= cap).unwrap_or(false);
            if cap_hit {
                drop(inner);
                vm.mark_done();
                vm.invoke_finish_handler();
                break 'drive;
            }
            inner.pc = 1;
        }

        let pc = inner.pc;
        if inner.skip_bp == 0 && inner.breakpoints.contains(&(pc as i64)) {
            // Arm a one-line skip so resuming executes this line instead of
            // re-reporting the same breakpoint forever.
            inner.skip_bp = 1;
            inner.state = VmState::Paused;
            drop(inner);
            vm.invoke_break_handler();
            continue 'drive;
        }
        if inner.skip_bp > 0 {
            inner.skip_bp -= 1;
        }

        let was_step = inner.state == VmState::Step;
        let line = inner.program.as_ref().unwrap().lines[pc - 1].clone();
        let coordinator = vm.shared.coordinator.clone();

        let line_position = line.position.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            execute_line(&line, &mut inner, coordinator.as_ref())
        }))
        .unwrap_or_else(|payload| Err(RuntimeError::internal(panic_message(&*payload), line_position)));

        let mut took_turn = false;
        match outcome {
            Ok(jump) => {
                inner.lines_executed += 1;
                let cap_hit = inner.line_cap.map(|cap| inner.lines_executed >= cap).unwrap_or(false);
                inner.pc = match jump {
                    Some(target) => (target.max(1) as usize).min(len + 1),
                    None => pc + 1,
                };
                if was_step {
                    inner.state = VmState::Paused;
                }
                drop(inner);
                vm.shared.cond.notify_all();
                took_turn = true;
                if cap_hit {
                    vm.mark_done();
                    vm.invoke_finish_handler();
                    break 'drive;
                }
            }
            Err(err) => {
                inner.state = VmState::Paused;
                drop(inner);
                vm.shared.cond.notify_all();
                let keep_going = vm.invoke_error_handler(&err);
                if !keep_going {
                    vm.mark_done();
                    vm.invoke_finish_handler();
                    break 'drive;
                }
                let mut inner = vm.shared.inner.lock().unwrap();
                inner.pc = pc + 1;
                inner.state = VmState::Running;
                drop(inner);
                vm.shared.cond.notify_all();
                took_turn = true;
            }
        }

        if took_turn {
            let mut turn_guard = vm.shared.turn.lock().unwrap();
            if let Some(turn) = turn_guard.as_mut() {
                turn.finish_turn();
                turn.wait_for_turn();
            }
        }
    }
}

/// Extracts a human-readable message from a caught panic payload, falling
/// back to a generic description for payloads that are neither `&str` nor
/// `String` (the two types `panic!`/`unwrap`/`expect` actually produce).
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_and_wait(vm: &Vm, source: &str, iterations: u64) {
        vm.set_iterations(iterations);
        vm.run_source(source).unwrap();
        vm.wait_for_termination();
    }

    #[test]
    fn runs_straight_line_program_to_completion() {
        let vm = Vm::new();
        run_and_wait(&vm, "a = 1\nb = a + 1\n", 1);
        assert_eq!(vm.state(), VmState::Done);
        assert_eq!(vm.get_variable("a"), Variable::number(Decimal::ONE));
        assert_eq!(vm.get_variable("b"), Variable::number(Decimal::from(2)));
    }

    #[test]
    fn goto_skips_a_line() {
        let vm = Vm::new();
        run_and_wait(&vm, "goto 3\nb = 1\nc = 1\n", 1);
        assert_eq!(vm.get_variable("b"), Variable::default());
        assert_eq!(vm.get_variable("c"), Variable::number(Decimal::ONE));
    }

    #[test]
    fn loops_for_the_configured_iteration_count() {
        let vm = Vm::new();
        run_and_wait(&vm, "a = a + 1\n", 5);
        assert_eq!(vm.get_variable("a"), Variable::number(Decimal::from(5)));
    }

    #[test]
    fn breakpoint_pauses_before_the_line_runs() {
        let vm = Vm::new();
        vm.add_breakpoint(2);
        let hit = Arc::new(Mutex::new(false));
        let hit2 = hit.clone();
        vm.set_breakpoint_handler(move |_| {
            *hit2.lock().unwrap() = true;
        });
        vm.set_iterations(1);
        vm.run_source("a = 1\nb = 2\n").unwrap();
        // give the thread a moment to hit the breakpoint and pause
        std::thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(vm.state(), VmState::Paused);
        assert!(*hit.lock().unwrap());
        assert_eq!(vm.get_variable("a"), Variable::number(Decimal::ONE));
        assert_eq!(vm.get_variable("b"), Variable::default());
        vm.resume();
        vm.wait_for_termination();
        assert_eq!(vm.get_variable("b"), Variable::number(Decimal::from(2)));
    }

    #[test]
    fn division_by_zero_is_delivered_to_the_error_handler() {
        let vm = Vm::new();
        let seen = Arc::new(Mutex::new(false));
        let seen2 = seen.clone();
        vm.set_error_handler(move |_, _| {
            *seen2.lock().unwrap() = true;
            false
        });
        run_and_wait(&vm, "a = 1 / 0\n", 1);
        assert!(*seen.lock().unwrap());
        assert_eq!(vm.state(), VmState::Done);
    }

    #[test]
    fn zero_iterations_means_unlimited_but_the_line_cap_still_stops_it() {
        let vm = Vm::new();
        vm.set_iterations(0);
        vm.set_max_executed_lines(5);
        vm.run_source("a = a + 1\n").unwrap();
        vm.wait_for_termination();
        assert_eq!(vm.state(), VmState::Done);
        assert_eq!(vm.get_variable("a"), Variable::number(Decimal::from(5)));
    }

    #[test]
    fn zero_max_lines_means_unlimited_but_the_iteration_cap_still_stops_it() {
        let vm = Vm::new();
        vm.set_iterations(3);
        vm.set_max_executed_lines(0);
        vm.run_source("a = a + 1\n").unwrap();
        vm.wait_for_termination();
        assert_eq!(vm.state(), VmState::Done);
        assert_eq!(vm.get_variable("a"), Variable::number(Decimal::from(3)));
    }

    #[test]
    fn panic_message_prefers_the_str_or_string_payload() {
        let str_payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(&*str_payload), "boom");

        let string_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(&*string_payload), "kaboom");

        let other_payload: Box<dyn std::any::Any + Send> = Box::new(42_i32);
        assert_eq!(panic_message(&*other_payload), "unknown panic");
    }

    #[test]
    fn two_vms_share_globals_through_a_coordinator() {
        let coordinator = Coordinator::new();
        let producer = Vm::with_coordinator(Some(coordinator.clone()));
        let consumer = Vm::with_coordinator(Some(coordinator.clone()));

        producer.set_iterations(1);
        consumer.set_iterations(1);
        consumer.run_source(":x = :x\nb = :x\n").unwrap();
        producer.run_source(":x = 7\na = 1\n").unwrap();

        producer.wait_for_termination();
        consumer.wait_for_termination();

        assert_eq!(coordinator.get_variable(":x"), Variable::number(Decimal::from(7)));
    }
}
