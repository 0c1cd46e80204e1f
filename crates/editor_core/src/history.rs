//! Bounded undo/redo stacks of reversible commands.

use std::collections::VecDeque;

use shared::protocol::EditorEvent;
use tokio::sync::broadcast;
use tracing::debug;

pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// A reversible unit of mutation over some target state.
pub trait Command<S>: Send {
    fn label(&self) -> &str;
    fn execute(&self, target: &mut S);
    fn undo(&self, target: &mut S);
}

pub struct HistoryManager<S> {
    undo_stack: VecDeque<Box<dyn Command<S>>>,
    redo_stack: Vec<Box<dyn Command<S>>>,
    capacity: usize,
    events: Option<broadcast::Sender<EditorEvent>>,
}

impl<S> HistoryManager<S> {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            capacity: capacity.max(1),
            events: None,
        }
    }

    pub fn with_events(capacity: usize, events: broadcast::Sender<EditorEvent>) -> Self {
        Self {
            events: Some(events),
            ..Self::new(capacity)
        }
    }

    /// Records a command whose effect has already been applied.
    ///
    /// Clears the redo stack and evicts the oldest entry once over capacity.
    pub fn record(&mut self, command: Box<dyn Command<S>>) {
        self.redo_stack.clear();
        self.undo_stack.push_back(command);
        while self.undo_stack.len() > self.capacity {
            if let Some(evicted) = self.undo_stack.pop_front() {
                debug!(label = evicted.label(), "history full; dropping oldest command");
            }
        }
        self.notify();
    }

    pub fn undo(&mut self, target: &mut S) -> bool {
        let Some(command) = self.undo_stack.pop_back() else {
            return false;
        };
        command.undo(target);
        self.redo_stack.push(command);
        self.notify();
        true
    }

    pub fn redo(&mut self, target: &mut S) -> bool {
        let Some(command) = self.redo_stack.pop() else {
            return false;
        };
        command.execute(target);
        self.undo_stack.push_back(command);
        self.notify();
        true
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.notify();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Labels on the undo stack, oldest first.
    pub fn undo_labels(&self) -> Vec<&str> {
        self.undo_stack.iter().map(|c| c.label()).collect()
    }

    /// Labels on the redo stack, next-to-redo last.
    pub fn redo_labels(&self) -> Vec<&str> {
        self.redo_stack.iter().map(|c| c.label()).collect()
    }

    fn notify(&self) {
        if let Some(events) = &self.events {
            let _ = events.send(EditorEvent::HistoryChanged {
                can_undo: self.can_undo(),
                can_redo: self.can_redo(),
            });
        }
    }
}

impl<S> Default for HistoryManager<S> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

#[cfg(test)]
#[path = "tests/history_tests.rs"]
mod tests;
