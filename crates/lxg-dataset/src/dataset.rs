//! The [`DataSet`]: live rows, their snapshot, and derived views.
//!
//! # Invariants
//!
//! - Row keys are unique within `data` and within `snapshot`.
//! - `snapshot` changes only through [`DataSet::commit`] (or construction).
//! - Every write bumps exactly the versions of the sources it touched; a
//!   derived view is rebuilt on the first read after one of its sources
//!   changed and never otherwise.
//!
//! Rows are shared between `data` and `snapshot` through `Rc` and copied on
//! first write, so an untouched row costs nothing to diff.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::debug;

use lxg_diff::{ChangeSet, DiffIter, ValueRef};
use lxg_types::{
    Branch, DottedPath, Memo, Row, RowKey, SubscriptionId, Subscribers, Value, Version,
};

use crate::error::{DataSetError, DataSetResult};
use crate::group::{group_by_value, GroupFn, GroupSpec};
use crate::node::{flatten_keys, Node};
use crate::sort::{sort_rows, SortSpec};

/// Notifications delivered to [`DataSet::subscribe`] callbacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataSetEvent {
    /// One or more rows or cells in `data` changed.
    DataChanged,
    /// The snapshot was replaced by the current data.
    SnapshotReplaced,
    SortingChanged,
    GroupingChanged,
}

/// Rebuild counters for the derived views.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewStats {
    pub tree_builds: u64,
    pub diff_runs: u64,
}

/// The authoritative row collection of one loaded file-set.
pub struct DataSet {
    data: Vec<Rc<Row>>,
    snapshot: Vec<Rc<Row>>,
    sorting: Option<SortSpec>,
    grouping: Option<GroupSpec>,
    column_groupers: HashMap<String, GroupFn>,
    /// Next key handed out by [`DataSet::insert`].
    next_index: u64,

    data_version: Version,
    snapshot_version: Version,
    view_version: Version,

    tree: Memo<(Version, Version), Vec<Node>>,
    changes: Memo<(Version, Version), ChangeSet>,
    subscribers: Subscribers<DataSetEvent>,
}

impl std::fmt::Debug for DataSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataSet")
            .field("rows", &self.data.len())
            .field("snapshot_rows", &self.snapshot.len())
            .field("sorting", &self.sorting)
            .field("grouping", &self.grouping)
            .field("data_version", &self.data_version)
            .finish()
    }
}

impl DataSet {
    fn with_rows(rows: Vec<Rc<Row>>) -> Self {
        let next_index = rows
            .iter()
            .filter_map(|r| r.key.as_index())
            .max()
            .map_or(0, |max| max + 1);
        Self {
            snapshot: rows.clone(),
            data: rows,
            sorting: None,
            grouping: None,
            column_groupers: HashMap::new(),
            next_index,
            data_version: Version::new(),
            snapshot_version: Version::new(),
            view_version: Version::new(),
            tree: Memo::new(),
            changes: Memo::new(),
            subscribers: Subscribers::new(),
        }
    }

    /// Create a dataset from plain records, keyed by their position.
    pub fn from_records(records: Vec<Branch>) -> Self {
        let rows = records
            .into_iter()
            .enumerate()
            .map(|(i, cells)| Rc::new(Row::new(i as u64, cells)))
            .collect();
        Self::with_rows(rows)
    }

    /// Create a dataset from explicitly keyed rows.
    pub fn from_rows(rows: Vec<Row>) -> DataSetResult<Self> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert(&row.key) {
                return Err(DataSetError::DuplicateKey(row.key.clone()));
            }
        }
        Ok(Self::with_rows(rows.into_iter().map(Rc::new).collect()))
    }

    // ---------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The live rows in insertion order.
    pub fn rows(&self) -> &[Rc<Row>] {
        &self.data
    }

    /// The rows as of the last commit.
    pub fn snapshot(&self) -> &[Rc<Row>] {
        &self.snapshot
    }

    /// The row at `index` in insertion order.
    pub fn row(&self, index: usize) -> DataSetResult<&Row> {
        self.data
            .get(index)
            .map(Rc::as_ref)
            .ok_or(DataSetError::IndexOutOfRange {
                index,
                len: self.data.len(),
            })
    }

    /// A single cell by position.
    pub fn cell(&self, index: usize, column: &str) -> DataSetResult<Option<&Value>> {
        Ok(self.row(index)?.get(column))
    }

    /// The row carrying `key`, if any.
    pub fn get(&self, key: &RowKey) -> Option<&Row> {
        self.data.iter().find(|r| r.key == *key).map(Rc::as_ref)
    }

    pub fn position_of(&self, key: &RowKey) -> Option<usize> {
        self.data.iter().position(|r| r.key == *key)
    }

    pub fn sorting(&self) -> Option<&SortSpec> {
        self.sorting.as_ref()
    }

    pub fn grouping(&self) -> Option<&GroupSpec> {
        self.grouping.as_ref()
    }

    // ---------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------

    /// Write `value` into `column` of the row at `index`.
    ///
    /// Writing the value a cell already holds is not a change.
    pub fn mutate(
        &mut self,
        index: usize,
        column: impl Into<String>,
        value: Value,
    ) -> DataSetResult<()> {
        let len = self.data.len();
        let slot = self
            .data
            .get_mut(index)
            .ok_or(DataSetError::IndexOutOfRange { index, len })?;
        let column = column.into();
        if slot.get(&column) == Some(&value) {
            return Ok(());
        }
        Rc::make_mut(slot).set(column, value);
        self.data_changed();
        Ok(())
    }

    /// [`mutate`](Self::mutate) addressed by row key.
    pub fn mutate_key(
        &mut self,
        key: &RowKey,
        column: impl Into<String>,
        value: Value,
    ) -> DataSetResult<()> {
        let index = self
            .position_of(key)
            .ok_or_else(|| DataSetError::RowNotFound(key.clone()))?;
        self.mutate(index, column, value)
    }

    /// Replace every row's cells with `transform(row)`. Keys are preserved.
    pub fn mutate_each(&mut self, mut transform: impl FnMut(&Row) -> Branch) {
        self.data = self
            .data
            .iter()
            .map(|row| Rc::new(Row::new(row.key.clone(), transform(row))))
            .collect();
        self.data_changed();
    }

    /// Remove the rows at `indices`, returning them in ascending index order.
    ///
    /// All indices are checked before anything is removed; duplicates are
    /// ignored. The snapshot is untouched, so removed rows surface as
    /// `removed` mutations.
    pub fn remove(&mut self, indices: &[usize]) -> DataSetResult<Vec<Rc<Row>>> {
        let len = self.data.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(DataSetError::IndexOutOfRange { index, len });
        }
        if indices.is_empty() {
            return Ok(Vec::new());
        }

        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();

        let mut removed: Vec<Rc<Row>> = sorted
            .iter()
            .rev()
            .map(|&i| self.data.remove(i))
            .collect();
        removed.reverse();

        debug!(count = removed.len(), remaining = self.data.len(), "removed rows");
        self.data_changed();
        Ok(removed)
    }

    /// Insert a new record, keyed by the next free index, at `at` (or the
    /// end). Returns the assigned key.
    pub fn insert(&mut self, cells: Branch, at: Option<usize>) -> DataSetResult<RowKey> {
        let index = self.check_insert_position(at)?;
        let mut key = RowKey::Index(self.next_index);
        while self.position_of(&key).is_some() {
            self.next_index += 1;
            key = RowKey::Index(self.next_index);
        }
        self.next_index += 1;

        self.data.insert(index, Rc::new(Row::new(key.clone(), cells)));
        self.data_changed();
        Ok(key)
    }

    /// Insert an explicitly keyed row at `at` (or the end).
    pub fn insert_row(&mut self, row: Row, at: Option<usize>) -> DataSetResult<()> {
        let index = self.check_insert_position(at)?;
        if self.position_of(&row.key).is_some() {
            return Err(DataSetError::DuplicateKey(row.key));
        }
        if let Some(i) = row.key.as_index() {
            self.next_index = self.next_index.max(i + 1);
        }
        self.data.insert(index, Rc::new(row));
        self.data_changed();
        Ok(())
    }

    fn check_insert_position(&self, at: Option<usize>) -> DataSetResult<usize> {
        let len = self.data.len();
        match at {
            None => Ok(len),
            Some(index) if index <= len => Ok(index),
            Some(index) => Err(DataSetError::IndexOutOfRange { index, len }),
        }
    }

    /// Make the current data the new snapshot (the "save" boundary).
    pub fn commit(&mut self) {
        self.snapshot = self.data.clone();
        self.snapshot_version.bump();
        debug!(rows = self.snapshot.len(), "snapshot committed");
        self.subscribers.notify(&DataSetEvent::SnapshotReplaced);
    }

    /// Discard all uncommitted changes.
    pub fn revert(&mut self) {
        self.data = self.snapshot.clone();
        debug!(rows = self.data.len(), "reverted to snapshot");
        self.data_changed();
    }

    fn data_changed(&mut self) {
        self.data_version.bump();
        self.subscribers.notify(&DataSetEvent::DataChanged);
    }

    // ---------------------------------------------------------------
    // View criteria
    // ---------------------------------------------------------------

    /// Replace the sort criterion; `None` restores insertion order.
    pub fn set_sorting(&mut self, sorting: Option<SortSpec>) {
        self.sorting = sorting;
        self.view_version.bump();
        self.subscribers.notify(&DataSetEvent::SortingChanged);
    }

    /// Replace the group criterion; `None` yields a flat list of rows.
    pub fn set_grouping(&mut self, grouping: Option<GroupSpec>) {
        self.grouping = grouping;
        self.view_version.bump();
        self.subscribers.notify(&DataSetEvent::GroupingChanged);
    }

    /// Register the grouping function used when grouping by `column`
    /// without an explicit function on the [`GroupSpec`].
    pub fn set_column_grouping(
        &mut self,
        column: impl Into<String>,
        grouping: impl Fn(&str, &[Rc<Row>]) -> Vec<Node> + 'static,
    ) {
        self.column_groupers.insert(column.into(), Rc::new(grouping));
        self.view_version.bump();
        self.subscribers.notify(&DataSetEvent::GroupingChanged);
    }

    pub fn clear_column_grouping(&mut self, column: &str) {
        if self.column_groupers.remove(column).is_some() {
            self.view_version.bump();
            self.subscribers.notify(&DataSetEvent::GroupingChanged);
        }
    }

    // ---------------------------------------------------------------
    // Derived views
    // ---------------------------------------------------------------

    /// The presentation tree: rows sorted (if set), then grouped (if set).
    pub fn value(&self) -> Rc<Vec<Node>> {
        self.tree
            .get_or_compute((self.data_version, self.view_version), || {
                let nodes = self.build_tree();
                debug!(
                    rows = self.data.len(),
                    top_level = nodes.len(),
                    "rebuilt node tree"
                );
                nodes
            })
    }

    /// Row keys in rendered order, for hosts driving range selection.
    pub fn visible_keys(&self) -> Vec<RowKey> {
        flatten_keys(&self.value())
    }

    /// Every change between the snapshot and the live data.
    pub fn mutations(&self) -> DataSetResult<Rc<ChangeSet>> {
        self.changes
            .try_get_or_compute((self.data_version, self.snapshot_version), || {
                let changes: ChangeSet = self.diff_iter().collect::<Result<_, _>>()?;
                debug!(mutations = changes.len(), "recomputed change set");
                Ok(changes)
            })
    }

    /// Returns `true` if the data differs from the snapshot.
    pub fn is_dirty(&self) -> DataSetResult<bool> {
        Ok(!self.mutations()?.is_empty())
    }

    pub fn stats(&self) -> ViewStats {
        ViewStats {
            tree_builds: self.tree.builds(),
            diff_runs: self.changes.builds(),
        }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&DataSetEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    fn build_tree(&self) -> Vec<Node> {
        let mut rows = self.data.clone();
        if let Some(sorting) = &self.sorting {
            sort_rows(&mut rows, sorting);
        }

        let Some(grouping) = &self.grouping else {
            return rows.into_iter().map(Node::Row).collect();
        };
        let grouper = grouping
            .grouping
            .as_ref()
            .or_else(|| self.column_groupers.get(&grouping.by));
        match grouper {
            Some(grouper) => grouper(&grouping.by, &rows),
            None => group_by_value(&grouping.by, &rows),
        }
    }

    /// Pair snapshot and data rows by key: snapshot order first, then rows
    /// that exist only in the data. Each row contributes paths rooted at its
    /// key.
    fn diff_iter(&self) -> DiffIter<'_> {
        let current: HashMap<&RowKey, &Rc<Row>> =
            self.data.iter().map(|r| (&r.key, r)).collect();
        let original: HashSet<&RowKey> = self.snapshot.iter().map(|r| &r.key).collect();

        let mut iter = DiffIter::new();
        for old in &self.snapshot {
            let new = current.get(&old.key).copied();
            if new.is_some_and(|new| Rc::ptr_eq(old, new)) {
                continue;
            }
            iter.push(
                DottedPath::root().child(old.key.to_string()),
                Some(ValueRef::Branch(&old.cells)),
                new.map(|new| ValueRef::Branch(&new.cells)),
            );
        }
        for new in self.data.iter().filter(|r| !original.contains(&r.key)) {
            iter.push(
                DottedPath::root().child(new.key.to_string()),
                None,
                Some(ValueRef::Branch(&new.cells)),
            );
        }
        iter
    }
}
