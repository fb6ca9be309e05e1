//! Turn-based scheduler shared by several [`super::Vm`]s.
//!
//! Every registered VM executes exactly one YOLOL line per coordinator
//! "tick": it calls [`TurnHandle::finish_turn`] once it has executed its
//! line, then [`TurnHandle::wait_for_turn`] before starting the next one.
//! The tick only advances once every registered VM has called
//! `finish_turn`, so no VM can read a `:`-prefixed global before every
//! other VM has had a chance to update it this round -- a tick is a
//! barrier, not a lock-step clock.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use crate::value::Variable;

use super::Vm;

struct State {
    globals: HashMap<String, Variable>,
    registered: usize,
    arrived: usize,
    round: u64,
    terminated: bool,
}

struct Shared {
    state: Mutex<State>,
    cond: Condvar,
}

/// Shared owner of the global (`:`-prefixed) variable space and the
/// per-tick barrier. Cheap to clone; every clone refers to the same
/// underlying scheduler.
#[derive(Clone)]
pub struct Coordinator {
    shared: Arc<Shared>,
    vms: Arc<Mutex<Vec<Vm>>>,
}

impl Default for Coordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl Coordinator {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    globals: HashMap::new(),
                    registered: 0,
                    arrived: 0,
                    round: 0,
                    terminated: false,
                }),
                cond: Condvar::new(),
            }),
            vms: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Registers `vm` with the coordinator and returns the handle it should
    /// use to synchronize its per-line turns.
    pub fn register_vm(&self, vm: &Vm) -> TurnHandle {
        let mut state = self.shared.state.lock().unwrap();
        state.registered += 1;
        let last_round = state.round;
        drop(state);
        self.vms.lock().unwrap().push(vm.clone());
        TurnHandle {
            shared: self.shared.clone(),
            last_round,
        }
    }

    /// Removes `vm` from the registry. If every still-registered VM had
    /// already called `finish_turn` for the current round, this unblocks
    /// them immediately rather than waiting on a VM that will never arrive.
    pub fn unregister_vm(&self, vm: &Vm) {
        self.vms.lock().unwrap().retain(|v| !v.is_same(vm));
        let mut state = self.shared.state.lock().unwrap();
        state.registered = state.registered.saturating_sub(1);
        if state.registered > 0 && state.arrived >= state.registered {
            state.arrived = 0;
            state.round += 1;
            self.shared.cond.notify_all();
        }
    }

    pub fn get_variable(&self, name: &str) -> Variable {
        let state = self.shared.state.lock().unwrap();
        state.globals.get(name).cloned().unwrap_or_default()
    }

    pub fn set_variable(&self, name: &str, value: Variable) {
        let mut state = self.shared.state.lock().unwrap();
        state.globals.insert(name.to_string(), value);
    }

    /// Resumes every currently registered VM.
    pub fn run(&self) {
        for vm in self.vms.lock().unwrap().iter() {
            vm.resume();
        }
    }

    /// Requests termination of every registered VM and wakes any VM
    /// currently blocked in [`TurnHandle::wait_for_turn`].
    pub fn terminate(&self) {
        for vm in self.vms.lock().unwrap().iter() {
            vm.terminate();
        }
        let mut state = self.shared.state.lock().unwrap();
        state.terminated = true;
        self.shared.cond.notify_all();
    }

    pub fn wait_for_termination(&self) {
        let vms: Vec<Vm> = self.vms.lock().unwrap().clone();
        for vm in &vms {
            vm.wait_for_termination();
        }
    }
}

/// A registered VM's private view of the barrier. Not `Sync`: each VM keeps
/// its own handle and only ever calls into it from its own thread.
pub struct TurnHandle {
    shared: Arc<Shared>,
    last_round: u64,
}

impl TurnHandle {
    /// Marks this VM as done for the current round. Advances the round (and
    /// wakes everyone waiting on it) once every registered VM has checked in.
    pub fn finish_turn(&mut self) {
        let mut state = self.shared.state.lock().unwrap();
        state.arrived += 1;
        if state.arrived >= state.registered.max(1) {
            state.arrived = 0;
            state.round += 1;
            self.shared.cond.notify_all();
        }
        self.last_round = state.round;
    }

    /// Blocks until the round this handle last observed has advanced (i.e.
    /// until every VM registered at the time has called `finish_turn`), or
    /// until the coordinator is terminated.
    pub fn wait_for_turn(&mut self) {
        let mut state = self.shared.state.lock().unwrap();
        while state.round == self.last_round && !state.terminated {
            state = self.shared.cond.wait(state).unwrap();
        }
        self.last_round = state.round;
    }
}
