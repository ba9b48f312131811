//! Ordered Action List
//!
//! The list behind an [`ActionsQueue`](super::ActionsQueue). It is a plain
//! data structure; the queue supplies locking and notification.
//!
//! # Insertion Rules
//!
//! - An action whose id is already queued replaces that entry in place.
//! - `Normal` appends.
//! - `High` and `Highest` go right after the last queued action of the same
//!   band. With none queued, the search moves up one band at a time; with
//!   nothing found at all, the action goes to the front.
//! - `ReplaceAll` discards the list.

use super::action::{Priority, QueueAction};

pub(crate) struct ActionsCache<A: QueueAction> {
    actions: Vec<A>,
}

impl<A: QueueAction> ActionsCache<A> {
    pub(crate) fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// The head of the queue.
    pub(crate) fn current(&self) -> Option<&A> {
        self.actions.first()
    }

    pub(crate) fn as_slice(&self) -> &[A] {
        &self.actions
    }

    pub(crate) fn len(&self) -> usize {
        self.actions.len()
    }

    pub(crate) fn add(&mut self, action: A) {
        let id = action.id();
        if let Some(index) = self.actions.iter().position(|queued| queued.id() == id) {
            self.actions[index] = action;
            return;
        }

        match action.priority() {
            Priority::Normal => self.actions.push(action),
            priority @ (Priority::High | Priority::Highest) => {
                let index = self.insertion_index(priority).unwrap_or(0);
                self.actions.insert(index, action);
            }
            Priority::ReplaceAll => {
                self.actions.clear();
                self.actions.push(action);
            }
        }
    }

    /// Replace the first action matching `matches` in place, or add `action`
    /// normally if none matches.
    pub(crate) fn replace_first<F>(&mut self, matches: F, action: A)
    where
        F: FnMut(&A) -> bool,
    {
        let Some(index) = self.actions.iter().position(matches) else {
            self.add(action);
            return;
        };

        // Keep ids unique: drop any other entry the replacement collides with.
        let id = action.id();
        let shift = self.actions[..index]
            .iter()
            .filter(|queued| queued.id() == id)
            .count();
        let mut position = 0;
        self.actions.retain(|queued| {
            let keep = position == index || queued.id() != id;
            position += 1;
            keep
        });

        self.actions[index - shift] = action;
    }

    pub(crate) fn finish_current(&mut self) -> Option<A> {
        if self.actions.is_empty() {
            None
        } else {
            Some(self.actions.remove(0))
        }
    }

    /// Remove every action matching `matches`. Returns how many were removed.
    pub(crate) fn finish_all_where<F>(&mut self, mut matches: F) -> usize
    where
        F: FnMut(&A) -> bool,
    {
        let before = self.actions.len();
        self.actions.retain(|action| !matches(action));
        before - self.actions.len()
    }

    pub(crate) fn clear(&mut self) -> usize {
        let removed = self.actions.len();
        self.actions.clear();
        removed
    }

    fn insertion_index(&self, priority: Priority) -> Option<usize> {
        let mut band = Some(priority);
        while let Some(current) = band {
            if let Some(last) = self
                .actions
                .iter()
                .rposition(|action| action.priority() == current)
            {
                return Some(last + 1);
            }
            band = current.higher();
        }
        None
    }
}
