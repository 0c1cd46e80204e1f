//! Multi-select over one rendered list, driven by click modifiers.

use std::sync::Arc;

use shared::protocol::EditorEvent;
use tokio::sync::broadcast;
use tracing::debug;

pub trait SelectionContainer: Send + Sync {
    fn name(&self) -> &str;
    fn item_ids(&self, item_selector: &str) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
}

impl Modifiers {
    pub fn ctrl() -> Self {
        Self {
            ctrl: true,
            ..Self::default()
        }
    }

    pub fn shift() -> Self {
        Self {
            shift: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClickEvent {
    pub item_id: Option<String>,
    pub modifiers: Modifiers,
}

impl ClickEvent {
    pub fn on(item_id: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            item_id: Some(item_id.into()),
            modifiers,
        }
    }
}

struct Binding {
    container: Arc<dyn SelectionContainer>,
    item_selector: String,
}

#[derive(Default)]
pub struct SelectionManager {
    selected: Vec<String>,
    last_selected_id: Option<String>,
    binding: Option<Binding>,
    events: Option<broadcast::Sender<EditorEvent>>,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: broadcast::Sender<EditorEvent>) -> Self {
        Self {
            events: Some(events),
            ..Self::default()
        }
    }

    /// Binds to a container. An existing binding is replaced, never stacked.
    pub fn attach(&mut self, container: Arc<dyn SelectionContainer>, item_selector: impl Into<String>) {
        if self.binding.is_some() {
            self.detach();
        }
        debug!(container = container.name(), "selection attached");
        self.binding = Some(Binding {
            container,
            item_selector: item_selector.into(),
        });
    }

    pub fn detach(&mut self) {
        if let Some(binding) = self.binding.take() {
            debug!(container = binding.container.name(), "selection detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.binding.is_some()
    }

    /// Resolves one click on the bound container. Returns `false` when the click
    /// was ignored (nothing attached, or no item under the pointer).
    pub fn handle_click(&mut self, click: &ClickEvent) -> bool {
        let Some(id) = click.item_id.as_deref().filter(|id| !id.is_empty()) else {
            return false;
        };
        let Some(binding) = &self.binding else {
            return false;
        };
        let container = Arc::clone(&binding.container);
        let item_selector = binding.item_selector.clone();

        if click.modifiers.ctrl || click.modifiers.meta {
            self.toggle(id);
        } else if click.modifiers.shift {
            let ordered = container.item_ids(&item_selector);
            self.select_range_in(id, &ordered);
        } else if self.selected.len() == 1 && self.is_selected(id) {
            self.clear();
        } else {
            self.select_single(id);
        }

        self.last_selected_id = self.is_selected(id).then(|| id.to_string());
        self.notify();
        true
    }

    pub fn toggle(&mut self, id: &str) {
        if let Some(pos) = self.selected.iter().position(|s| s == id) {
            self.selected.remove(pos);
        } else {
            self.selected.push(id.to_string());
        }
    }

    pub fn select_single(&mut self, id: &str) {
        self.clear();
        self.selected.push(id.to_string());
    }

    /// Shift-range against the bound container's current item order.
    pub fn select_range(&mut self, end_id: &str) {
        let ordered = self
            .binding
            .as_ref()
            .map(|b| b.container.item_ids(&b.item_selector))
            .unwrap_or_default();
        self.select_range_in(end_id, &ordered);
    }

    /// Adds the inclusive span between the anchor and `end_id` within `ordered`.
    ///
    /// Without an anchor this degrades to a single selection. If either end is
    /// missing from `ordered` nothing changes.
    pub fn select_range_in(&mut self, end_id: &str, ordered: &[String]) {
        let Some(anchor) = self.last_selected_id.as_deref() else {
            self.select_single(end_id);
            return;
        };
        let start = ordered.iter().position(|id| id == anchor);
        let end = ordered.iter().position(|id| id == end_id);
        let (Some(start), Some(end)) = (start, end) else {
            return;
        };
        let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
        for id in &ordered[lo..=hi] {
            if !self.is_selected(id) {
                self.selected.push(id.clone());
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    pub fn clear_and_notify(&mut self) {
        self.clear();
        self.last_selected_id = None;
        self.notify();
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.clone()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s == id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn last_selected_id(&self) -> Option<&str> {
        self.last_selected_id.as_deref()
    }

    pub fn set_anchor(&mut self, id: Option<&str>) {
        self.last_selected_id = id.map(str::to_string);
    }

    fn notify(&self) {
        let Some(events) = &self.events else {
            return;
        };
        let container = self
            .binding
            .as_ref()
            .map(|b| b.container.name().to_string())
            .unwrap_or_default();
        let _ = events.send(EditorEvent::SelectionChanged {
            container,
            selected_ids: self.selected_ids(),
        });
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
