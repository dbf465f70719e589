//! Program-finished triggers registered by the host
//!
//! The host registers a trigger per program and branch; when the hub reports
//! that branch finished, [`ProgramTriggers::fire`] hands the trigger back so
//! the host can execute it.

use std::collections::HashMap;

use isy_parser::{Fork, Phase};
use parking_lot::RwLock;

/// Which branch completion a trigger waits for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    ThenFinished,
    ElseFinished,
}

impl TriggerKind {
    fn fork(&self) -> Fork {
        match self {
            TriggerKind::ThenFinished => Fork::Then,
            TriggerKind::ElseFinished => Fork::Else,
        }
    }
}

#[derive(Debug)]
pub struct ProgramTriggers<T> {
    then_finished: RwLock<HashMap<String, T>>,
    else_finished: RwLock<HashMap<String, T>>,
}

impl<T> Default for ProgramTriggers<T> {
    fn default() -> Self {
        Self {
            then_finished: RwLock::new(HashMap::new()),
            else_finished: RwLock::new(HashMap::new()),
        }
    }
}

impl<T: Clone> ProgramTriggers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self, kind: TriggerKind) -> &RwLock<HashMap<String, T>> {
        match kind {
            TriggerKind::ThenFinished => &self.then_finished,
            TriggerKind::ElseFinished => &self.else_finished,
        }
    }

    /// Register `trigger` for `program_id`, returning any trigger it replaced
    pub fn register(&self, program_id: impl Into<String>, kind: TriggerKind, trigger: T) -> Option<T> {
        self.table(kind).write().insert(program_id.into(), trigger)
    }

    pub fn unregister(&self, program_id: &str, kind: TriggerKind) -> Option<T> {
        self.table(kind).write().remove(program_id)
    }

    /// Trigger to execute for a program status update, if any
    pub fn fire(&self, program_id: &str, fork: Fork, phase: Phase) -> Option<T> {
        if phase != Phase::Finished {
            return None;
        }
        let kind = [TriggerKind::ThenFinished, TriggerKind::ElseFinished]
            .into_iter()
            .find(|kind| kind.fork() == fork)?;
        self.table(kind).read().get(program_id).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.then_finished.read().is_empty() && self.else_finished.read().is_empty()
    }
}
