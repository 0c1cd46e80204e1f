//! Maps drag-layer indices (local to one rendered list, possibly counting
//! group headers) onto indices into the canonical action array.

use tracing::{debug, error};

use crate::error::EditorError;

pub const DEFAULT_GROUP_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grouping {
    pub enabled: bool,
    pub group_size: usize,
}

impl Grouping {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            group_size: DEFAULT_GROUP_SIZE,
        }
    }

    pub fn enabled(group_size: usize) -> Self {
        Self {
            enabled: true,
            group_size,
        }
    }

    pub fn applies_to(&self, len: usize) -> bool {
        self.enabled && self.group_size > 0 && len > self.group_size
    }

    pub fn group_count(&self, len: usize) -> usize {
        if self.applies_to(len) {
            len.div_ceil(self.group_size)
        } else {
            1
        }
    }
}

impl Default for Grouping {
    fn default() -> Self {
        Self::disabled()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DropContainer {
    pub group_index: Option<usize>,
    pub leading_headers: usize,
}

impl DropContainer {
    pub fn whole_timeline() -> Self {
        Self {
            group_index: None,
            leading_headers: 0,
        }
    }

    pub fn expanded_group(index: usize) -> Self {
        Self {
            group_index: Some(index),
            leading_headers: index + 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragEnd {
    pub from: DropContainer,
    pub to: DropContainer,
    pub old_index: usize,
    pub new_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovePlan {
    pub from: usize,
    pub to: usize,
}

impl MovePlan {
    pub fn apply<T>(&self, items: &mut Vec<T>) {
        let item = items.remove(self.from);
        let to = self.to.min(items.len());
        items.insert(to, item);
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReorderTranslator {
    grouping: Grouping,
}

impl ReorderTranslator {
    pub fn new(grouping: Grouping) -> Self {
        Self { grouping }
    }

    pub fn grouping(&self) -> Grouping {
        self.grouping
    }

    pub fn set_grouping(&mut self, grouping: Grouping) {
        self.grouping = grouping;
    }

    pub fn to_global(&self, container: DropContainer, local_index: usize, len: usize) -> usize {
        match container.group_index {
            Some(group) if self.grouping.applies_to(len) => {
                group * self.grouping.group_size
                    + local_index.saturating_sub(container.leading_headers)
            }
            _ => local_index,
        }
    }

    /// Translates a reorder inside one list.
    ///
    /// `Ok(None)` means the drag ended in a different list and is not a move.
    /// An out-of-range source aborts with [`EditorError::IndexOutOfRange`].
    pub fn plan_move(&self, drag: &DragEnd, len: usize) -> Result<Option<MovePlan>, EditorError> {
        if drag.from != drag.to {
            debug!(?drag, "drag ended in another list; not a reorder");
            return Ok(None);
        }

        let from = self.to_global(drag.from, drag.old_index, len);
        if from >= len {
            error!(
                local = drag.old_index,
                global = from,
                len,
                "reorder source index out of range; move aborted"
            );
            return Err(EditorError::IndexOutOfRange { index: from, len });
        }
        let to = self.to_global(drag.to, drag.new_index, len).min(len - 1);
        Ok(Some(MovePlan { from, to }))
    }

    pub fn plan_insert(&self, container: DropContainer, local_index: usize, len: usize) -> usize {
        self.to_global(container, local_index, len).min(len)
    }
}

pub trait DropSource {
    type Item;
    type Payload;

    fn accepts(&self, item: &Self::Item) -> bool;
    fn extract(&self, item: &Self::Item) -> Option<Self::Payload>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraggedItem {
    Character {
        character_id: Option<i64>,
        character_name: Option<String>,
    },
    Other {
        label: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterPayload {
    pub character_id: i64,
    pub name: String,
}

/// Accepts character cards that carry both a non-zero id and a name.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharacterDropSource;

impl DropSource for CharacterDropSource {
    type Item = DraggedItem;
    type Payload = CharacterPayload;

    fn accepts(&self, item: &DraggedItem) -> bool {
        matches!(item, DraggedItem::Character { .. })
    }

    fn extract(&self, item: &DraggedItem) -> Option<CharacterPayload> {
        match item {
            DraggedItem::Character {
                character_id: Some(id),
                character_name: Some(name),
            } if *id != 0 && !name.is_empty() => Some(CharacterPayload {
                character_id: *id,
                name: name.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "tests/reorder_tests.rs"]
mod tests;
