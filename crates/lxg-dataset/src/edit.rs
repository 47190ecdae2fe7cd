//! Debounced cell edits.
//!
//! Text inputs produce a value per keystroke; committing each one would
//! rebuild every derived view per keystroke. A [`CellEditor`] keeps one
//! trailing-debounce deadline per cell: each new value cancels and
//! reschedules the pending one, and [`CellEditor::poll`] commits the edits
//! whose deadline has passed. There is no leading edge and no max-wait.
//!
//! The host drives time: it passes `now` to `schedule`/`poll` from its event
//! loop tick, and calls [`CellEditor::cancel_row`] when a row unmounts so a
//! pending commit never lands on a disposed row.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use lxg_types::config::MAX_DEBOUNCE_MS;
use lxg_types::{GridConfig, RowKey, Value};

use crate::dataset::DataSet;
use crate::error::DataSetError;

/// Identifies one editable cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: RowKey,
    pub column: String,
}

impl CellAddress {
    pub fn new(row: impl Into<RowKey>, column: impl Into<String>) -> Self {
        Self {
            row: row.into(),
            column: column.into(),
        }
    }
}

#[derive(Debug)]
struct PendingEdit {
    value: Value,
    deadline: Instant,
}

/// Per-cell trailing debounce in front of [`DataSet::mutate_key`].
#[derive(Debug)]
pub struct CellEditor {
    delay: Duration,
    pending: HashMap<CellAddress, PendingEdit>,
}

impl CellEditor {
    /// An editor committing `delay` after the last keystroke. Delays above
    /// the configured maximum are clamped to it.
    pub fn new(delay: Duration) -> Self {
        let delay = delay.min(Duration::from_millis(MAX_DEBOUNCE_MS));
        Self {
            delay,
            pending: HashMap::new(),
        }
    }

    pub fn from_config(config: &GridConfig) -> Self {
        Self::new(config.debounce())
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a new value for `address`, replacing any pending one and
    /// restarting its timer.
    pub fn schedule(&mut self, address: CellAddress, value: Value, now: Instant) {
        self.pending.insert(
            address,
            PendingEdit {
                value,
                deadline: now.checked_add(self.delay).unwrap_or(now),
            },
        );
    }

    /// Drop the pending edit for one cell. Returns `true` if one existed.
    pub fn cancel(&mut self, address: &CellAddress) -> bool {
        self.pending.remove(address).is_some()
    }

    /// Drop every pending edit of a row that is being torn down.
    pub fn cancel_row(&mut self, row: &RowKey) -> usize {
        let before = self.pending.len();
        self.pending.retain(|address, _| address.row != *row);
        before - self.pending.len()
    }

    pub fn is_pending(&self, address: &CellAddress) -> bool {
        self.pending.contains_key(address)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// The earliest deadline, so a host can arm a single timer.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|edit| edit.deadline).min()
    }

    /// Commit every edit whose deadline is at or before `now`, in deadline
    /// order. Returns the number of edits applied.
    ///
    /// An edit whose row no longer exists is dropped.
    pub fn poll(&mut self, now: Instant, dataset: &mut DataSet) -> usize {
        let due: Vec<CellAddress> = self
            .pending
            .iter()
            .filter(|(_, edit)| edit.deadline <= now)
            .map(|(address, _)| address.clone())
            .collect();
        self.commit(due, Some(now), dataset)
    }

    /// Commit every pending edit regardless of its deadline.
    pub fn flush(&mut self, dataset: &mut DataSet) -> usize {
        let all: Vec<CellAddress> = self.pending.keys().cloned().collect();
        self.commit(all, None, dataset)
    }

    fn commit(
        &mut self,
        addresses: Vec<CellAddress>,
        now: Option<Instant>,
        dataset: &mut DataSet,
    ) -> usize {
        let mut edits: Vec<(CellAddress, PendingEdit)> = addresses
            .into_iter()
            .filter_map(|address| {
                let edit = self.pending.remove(&address)?;
                Some((address, edit))
            })
            .collect();
        edits.sort_by_key(|(_, edit)| edit.deadline);

        let mut applied = 0;
        for (address, edit) in edits {
            if let Some(now) = now {
                let overshoot = now.saturating_duration_since(edit.deadline);
                if overshoot.as_millis() > 5 {
                    debug!(
                        overshoot_ms = overshoot.as_millis() as u64,
                        row = %address.row,
                        "edit debounce overshoot"
                    );
                }
            }

            match dataset.mutate_key(&address.row, address.column.as_str(), edit.value) {
                Ok(()) => applied += 1,
                Err(DataSetError::RowNotFound(row)) => {
                    warn!(row = %row, column = %address.column, "dropping edit for disposed row");
                }
                Err(e) => {
                    warn!(error = %e, row = %address.row, "failed to commit edit");
                }
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lxg_types::Branch;

    fn dataset() -> DataSet {
        let rows = ["greeting", "farewell"]
            .into_iter()
            .map(|key| {
                let mut cells = Branch::new();
                cells.insert("en".into(), Value::from(key));
                lxg_types::Row::new(key, cells)
            })
            .collect();
        DataSet::from_rows(rows).unwrap()
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn keystrokes_coalesce_into_one_commit() {
        let mut ds = dataset();
        let mut editor = CellEditor::new(ms(200));
        let cell = CellAddress::new("greeting", "en");
        let t0 = Instant::now();

        editor.schedule(cell.clone(), Value::from("H"), t0);
        editor.schedule(cell.clone(), Value::from("He"), t0 + ms(100));
        editor.schedule(cell.clone(), Value::from("Hey"), t0 + ms(250));

        // The first deadline (t0+200) was rescheduled away.
        assert_eq!(editor.poll(t0 + ms(300), &mut ds), 0);
        assert_eq!(editor.poll(t0 + ms(450), &mut ds), 1);
        assert_eq!(ds.cell(0, "en").unwrap(), Some(&Value::from("Hey")));
        assert_eq!(ds.stats().diff_runs, 0);
        assert_eq!(ds.mutations().unwrap().len(), 1);
    }

    #[test]
    fn cells_debounce_independently() {
        let mut ds = dataset();
        let mut editor = CellEditor::new(ms(100));
        let t0 = Instant::now();

        editor.schedule(CellAddress::new("greeting", "en"), Value::from("Hi"), t0);
        editor.schedule(
            CellAddress::new("farewell", "en"),
            Value::from("Bye"),
            t0 + ms(80),
        );
        assert_eq!(editor.next_deadline(), Some(t0 + ms(100)));

        assert_eq!(editor.poll(t0 + ms(100), &mut ds), 1);
        assert_eq!(editor.pending_count(), 1);
        assert_eq!(editor.poll(t0 + ms(180), &mut ds), 1);
        assert_eq!(editor.pending_count(), 0);
    }

    #[test]
    fn unmounting_a_row_suppresses_its_commit() {
        let mut ds = dataset();
        let mut editor = CellEditor::new(ms(100));
        let t0 = Instant::now();
        let cell = CellAddress::new("greeting", "en");

        editor.schedule(cell.clone(), Value::from("Hi"), t0);
        assert_eq!(editor.cancel_row(&RowKey::from("greeting")), 1);
        assert!(!editor.is_pending(&cell));
        assert_eq!(editor.poll(t0 + ms(500), &mut ds), 0);
        assert!(!ds.is_dirty().unwrap());
    }

    #[test]
    fn edit_for_removed_row_is_dropped() {
        let mut ds = dataset();
        let mut editor = CellEditor::new(ms(100));
        let t0 = Instant::now();

        editor.schedule(CellAddress::new("greeting", "en"), Value::from("Hi"), t0);
        ds.remove(&[0]).unwrap();

        assert_eq!(editor.poll(t0 + ms(100), &mut ds), 0);
        assert_eq!(editor.pending_count(), 0);
    }

    #[test]
    fn flush_ignores_deadlines() {
        let mut ds = dataset();
        let mut editor = CellEditor::from_config(&GridConfig::default());
        let dropped = CellAddress::new("greeting", "en");
        editor.schedule(dropped.clone(), Value::from("Yo"), Instant::now());
        editor.schedule(
            CellAddress::new("farewell", "en"),
            Value::from("Ciao"),
            Instant::now(),
        );

        assert!(editor.cancel(&dropped));
        assert!(!editor.cancel(&dropped));
        assert_eq!(editor.flush(&mut ds), 1);
        assert_eq!(ds.cell(0, "en").unwrap(), Some(&Value::from("greeting")));
        assert_eq!(ds.cell(1, "en").unwrap(), Some(&Value::from("Ciao")));
    }

    #[test]
    fn oversized_delay_is_clamped() {
        let mut ds = dataset();
        let mut editor = CellEditor::new(Duration::MAX);
        assert_eq!(editor.delay(), ms(MAX_DEBOUNCE_MS));

        let t0 = Instant::now();
        editor.schedule(CellAddress::new("greeting", "en"), Value::from("Hi"), t0);
        assert_eq!(editor.next_deadline(), Some(t0 + ms(MAX_DEBOUNCE_MS)));
        assert_eq!(editor.poll(t0 + ms(MAX_DEBOUNCE_MS), &mut ds), 1);
    }
}
