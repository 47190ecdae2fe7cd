//! The selection model.
//!
//! The model never sees rendered elements. The host hands it the current
//! visible order of selectable keys whenever rows mount, unmount, or are
//! re-sorted, and range selection indexes into that list.

use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexSet;
use tracing::debug;

use lxg_dataset::DataSet;
use lxg_types::{GridConfig, RowKey, SubscriptionId, Subscribers};

use crate::modifiers::{ModifierKey, Modifiers};

/// How [`SelectionModel::select`] combines keys with the current selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectMode {
    /// Replace the selection with exactly these keys.
    Normal,
    /// Add these keys to the selection.
    Append,
    /// Remove keys that are selected, add keys that are not.
    Toggle,
}

/// Notifications delivered to [`SelectionModel::subscribe`] callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionEvent {
    /// The selected set changed; `count` is its new size.
    Changed { count: usize },
}

/// Selected keys plus the rendered order they are chosen from.
#[derive(Debug)]
pub struct SelectionModel<K> {
    selected: IndexSet<K>,
    visible: Vec<K>,
    positions: HashMap<K, usize>,
    multiple: bool,
    modifiers: Modifiers,
    /// The last key clicked without Shift; ranges extend from here.
    anchor: Option<K>,
    subscribers: Subscribers<SelectionEvent>,
}

impl<K: Clone + Eq + Hash> SelectionModel<K> {
    /// Create an empty model. With `multiple`, plain clicks toggle.
    pub fn new(multiple: bool) -> Self {
        Self {
            selected: IndexSet::new(),
            visible: Vec::new(),
            positions: HashMap::new(),
            multiple,
            modifiers: Modifiers::empty(),
            anchor: None,
            subscribers: Subscribers::new(),
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.multi_select)
    }

    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    // ---------------------------------------------------------------
    // Visible order
    // ---------------------------------------------------------------

    /// Install the authoritative rendered order of selectable keys.
    ///
    /// Selected keys that are no longer visible stay selected but drop out
    /// of [`selection`](Self::selection); use [`retain`](Self::retain) to
    /// forget keys whose rows were removed.
    pub fn set_visible(&mut self, keys: Vec<K>) {
        self.positions = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), i))
            .collect();
        self.visible = keys;
        if self
            .anchor
            .as_ref()
            .is_some_and(|anchor| !self.positions.contains_key(anchor))
        {
            self.anchor = None;
        }
    }

    pub fn visible(&self) -> &[K] {
        &self.visible
    }

    /// Number of selectable (visible) items.
    pub fn selectable_count(&self) -> usize {
        self.visible.len()
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// Whether `key` is selected, visible or not. Keys of removed rows stay
    /// selected until [`retain`](Self::retain) drops them.
    pub fn is_selected(&self, key: &K) -> bool {
        self.selected.contains(key)
    }

    /// Visible keys that are selected, in rendered order.
    pub fn selection(&self) -> Vec<K> {
        self.visible
            .iter()
            .filter(|k| self.selected.contains(*k))
            .cloned()
            .collect()
    }

    /// Every selected key, visible or not.
    pub fn selected_keys(&self) -> impl Iterator<Item = &K> {
        self.selected.iter()
    }

    /// Includes hidden keys and keys of removed rows not yet retained away.
    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn anchor(&self) -> Option<&K> {
        self.anchor.as_ref()
    }

    // ---------------------------------------------------------------
    // Selection
    // ---------------------------------------------------------------

    /// Combine `keys` with the selection according to `mode`.
    ///
    /// Keys that are not visible are ignored. Without an explicit mode,
    /// `Normal` is used, promoted to `Toggle` for multi-select models.
    /// Returns `true` if the selected set changed.
    pub fn select<I: IntoIterator<Item = K>>(&mut self, keys: I, mode: Option<SelectMode>) -> bool {
        let mode = match mode {
            Some(mode) => mode,
            None if self.multiple => SelectMode::Toggle,
            None => SelectMode::Normal,
        };
        let keys: IndexSet<K> = keys
            .into_iter()
            .filter(|k| self.positions.contains_key(k))
            .collect();

        let next = match mode {
            SelectMode::Normal => keys,
            SelectMode::Append => self.selected.union(&keys).cloned().collect(),
            SelectMode::Toggle => self.selected.symmetric_difference(&keys).cloned().collect(),
        };
        self.replace(next)
    }

    /// Select every visible key.
    pub fn select_all(&mut self) -> bool {
        let all = self.visible.iter().cloned().collect();
        self.replace(all)
    }

    pub fn clear(&mut self) -> bool {
        self.replace(IndexSet::new())
    }

    /// Keep only the selected keys for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&K) -> bool) -> bool {
        let next = self.selected.iter().filter(|k| keep(*k)).cloned().collect();
        self.replace(next)
    }

    fn replace(&mut self, next: IndexSet<K>) -> bool {
        let changed = next.len() != self.selected.len()
            || next.iter().any(|k| !self.selected.contains(k));
        if !changed {
            return false;
        }
        self.selected = next;
        debug!(selected = self.selected.len(), "selection changed");
        self.subscribers.notify(&SelectionEvent::Changed {
            count: self.selected.len(),
        });
        true
    }

    // ---------------------------------------------------------------
    // Pointer and keyboard
    // ---------------------------------------------------------------

    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    pub fn key_down(&mut self, key: ModifierKey) {
        self.modifiers.insert(key.into());
    }

    pub fn key_up(&mut self, key: ModifierKey) {
        self.modifiers.remove(key.into());
    }

    /// Forget held modifiers, e.g. when the container loses focus and the
    /// matching keyup will never arrive.
    pub fn blur(&mut self) {
        self.modifiers = Modifiers::empty();
    }

    /// Handle a click on `key` using the currently held modifiers.
    ///
    /// - Shift with an anchor: replace the selection with the visible range
    ///   between anchor and `key`; the anchor stays put.
    /// - Control/Meta: toggle `key`.
    /// - Otherwise: `select([key], None)`.
    ///
    /// Non-shift clicks move the anchor to `key`. Clicks on keys that are
    /// not visible do nothing.
    pub fn click(&mut self, key: K) -> bool {
        if !self.positions.contains_key(&key) {
            return false;
        }

        if self.modifiers.is_range() {
            if let Some(range) = self.anchor.as_ref().and_then(|a| self.range(a, &key)) {
                return self.select(range, Some(SelectMode::Normal));
            }
        }

        self.anchor = Some(key.clone());
        if self.modifiers.is_toggle() {
            self.select([key], Some(SelectMode::Toggle))
        } else {
            self.select([key], None)
        }
    }

    /// The visible keys between `from` and `to` inclusive, in rendered
    /// order, regardless of which one comes first.
    pub fn range(&self, from: &K, to: &K) -> Option<Vec<K>> {
        let a = *self.positions.get(from)?;
        let b = *self.positions.get(to)?;
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        Some(self.visible[start..=end].to_vec())
    }

    // ---------------------------------------------------------------
    // Observers
    // ---------------------------------------------------------------

    pub fn subscribe(&mut self, callback: impl FnMut(&SelectionEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }
}

impl SelectionModel<RowKey> {
    /// Follow a dataset: take its rendered order and forget selected keys
    /// whose rows were removed, so a key inserted again starts unselected.
    /// Returns `true` if the selection changed.
    pub fn sync(&mut self, dataset: &DataSet) -> bool {
        self.set_visible(dataset.visible_keys());
        self.retain(|key| dataset.get(key).is_some())
    }
}
