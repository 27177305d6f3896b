/// Board session: the integration layer between a front end and the core.
///
/// Owns the board engine, the selection, the document store and the view
/// state (search query and status filter). Front ends construct one session
/// and pass it around explicitly.
///
/// Every call here is UI-facing: rejected or stale requests are logged and
/// reported as "not applied" instead of failing. After each applied change the
/// document is saved (best effort) and the selection is kept in sync:
/// deleted tasks are pruned, deleting a column clears the whole selection.
use std::collections::HashSet;
use std::sync::Arc;

use crate::board::{BoardEngine, BoardResult};
use crate::dnd::{DropEvent, DropIntent};
use crate::ids::{Clock, IdGenerator};
use crate::search::{FilterStatus, TaskFilter, DEFAULT_FUZZY_THRESHOLD};
use crate::selection::SelectionSet;
use crate::storage::{load_or_seed, DocumentStore};
use crate::types::Document;

pub struct BoardSession<S: DocumentStore> {
    engine: BoardEngine,
    selection: SelectionSet,
    store: S,
    search_query: String,
    filter_status: FilterStatus,
    fuzzy_threshold: f64,
}

impl<S: DocumentStore> BoardSession<S> {
    /// Load the stored board (or the seed board) and start with an empty selection.
    pub fn open(store: S, ids: Box<dyn IdGenerator>, clock: Box<dyn Clock>) -> Self {
        let doc = load_or_seed(&store);
        Self::with_engine(store, BoardEngine::new(doc, ids, clock))
    }

    pub fn with_engine(store: S, engine: BoardEngine) -> Self {
        Self {
            engine,
            selection: SelectionSet::new(),
            store,
            search_query: String::new(),
            filter_status: FilterStatus::All,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }

    pub fn document(&self) -> &Document {
        self.engine.document()
    }

    pub fn snapshot(&self) -> Arc<Document> {
        self.engine.snapshot()
    }

    pub fn version(&self) -> u64 {
        self.engine.version()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    // View state

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    pub fn filter_status(&self) -> FilterStatus {
        self.filter_status
    }

    pub fn set_filter_status(&mut self, status: FilterStatus) {
        self.filter_status = status;
    }

    pub fn set_fuzzy_threshold(&mut self, threshold: f64) {
        self.fuzzy_threshold = threshold;
    }

    /// Task ids of a column that pass the current search query and status filter.
    pub fn visible_tasks(&self, column_id: &str) -> Vec<String> {
        let doc = self.engine.document();
        let Some(column) = doc.columns.get(column_id) else {
            return Vec::new();
        };
        TaskFilter::with_threshold(&self.search_query, self.filter_status, self.fuzzy_threshold)
            .apply(&column.task_ids, &doc.tasks)
    }

    // Board mutations

    pub fn add_task(&mut self, column_id: &str, text: &str) -> Option<String> {
        let result = self.engine.add_task(column_id, text);
        self.settle("add_task", result)
    }

    pub fn delete_task(&mut self, task_id: &str) -> bool {
        let result = self.engine.delete_task(task_id);
        if result.is_ok() {
            self.selection.prune(task_id);
        }
        self.settle("delete_task", result).is_some()
    }

    pub fn edit_task(&mut self, task_id: &str, text: &str) -> bool {
        let result = self.engine.edit_task(task_id, text);
        self.settle("edit_task", result).is_some()
    }

    pub fn toggle_task(&mut self, task_id: &str) -> bool {
        let result = self.engine.toggle_task(task_id);
        self.settle("toggle_task", result).is_some()
    }

    pub fn add_column(&mut self, title: &str) -> Option<String> {
        let result = self.engine.add_column(title);
        self.settle("add_column", result)
    }

    pub fn delete_column(&mut self, column_id: &str) -> bool {
        let result = self.engine.delete_column(column_id);
        if result.is_ok() {
            self.selection.deselect_all();
        }
        self.settle("delete_column", result).is_some()
    }

    pub fn edit_column(&mut self, column_id: &str, title: &str) -> bool {
        let result = self.engine.edit_column(column_id, title);
        self.settle("edit_column", result).is_some()
    }

    pub fn move_task(&mut self, task_id: &str, target_column_id: &str, target_index: Option<usize>) -> bool {
        let result = self
            .engine
            .move_task_to_column(task_id, target_column_id, target_index);
        self.settle("move_task", result).is_some()
    }

    pub fn reorder_task(&mut self, column_id: &str, from_index: usize, to_index: usize) -> bool {
        let result = self.engine.reorder_task(column_id, from_index, to_index);
        self.settle("reorder_task", result).is_some()
    }

    pub fn reorder_column(&mut self, from_index: usize, to_index: usize) -> bool {
        let result = self.engine.reorder_column(from_index, to_index);
        self.settle("reorder_column", result).is_some()
    }

    /// Apply a completed drag-and-drop gesture. Same-position drops are no-ops.
    ///
    /// Reorders act on the dragged item's current position. A drop whose
    /// dragged item is no longer in the source list is rejected.
    pub fn apply_drop(&mut self, event: &DropEvent) -> bool {
        match event.intent() {
            Some(DropIntent::ReorderTask {
                column_id,
                from_index,
                to_index,
            }) => {
                let position = self
                    .engine
                    .document()
                    .columns
                    .get(&column_id)
                    .and_then(|col| col.task_ids.iter().position(|id| *id == event.draggable_id));
                match self.resolve_drag_source(event, position, from_index) {
                    Some(from) => self.reorder_task(&column_id, from, to_index),
                    None => false,
                }
            }
            Some(DropIntent::MoveTask {
                task_id,
                target_column_id,
                target_index,
            }) => self.move_task(&task_id, &target_column_id, Some(target_index)),
            Some(DropIntent::ReorderColumn {
                from_index,
                to_index,
            }) => {
                let position = self
                    .engine
                    .document()
                    .column_order
                    .iter()
                    .position(|id| *id == event.draggable_id);
                match self.resolve_drag_source(event, position, from_index) {
                    Some(from) => self.reorder_column(from, to_index),
                    None => false,
                }
            }
            None => {
                log::debug!(
                    target: "taskboard.session",
                    "Drop of {} resolved to no change",
                    event.draggable_id
                );
                false
            }
        }
    }

    /// Replace the board with the seed board.
    pub fn reset(&mut self) {
        self.engine.replace(Document::seed());
        self.selection.deselect_all();
        self.persist();
    }

    // Bulk actions. Each saves once and clears the selection afterwards.

    /// Delete every listed task. Returns how many were deleted.
    pub fn bulk_delete(&mut self, task_ids: &[String]) -> usize {
        let mut applied = 0;
        for id in task_ids {
            match self.engine.delete_task(id) {
                Ok(_) => {
                    self.selection.prune(id);
                    applied += 1;
                }
                Err(e) => log::debug!(target: "taskboard.session", "bulk_delete skipped {}: {}", id, e),
            }
        }
        self.finish_bulk("bulk_delete", applied)
    }

    /// Set the completion flag of every listed task to `completed`.
    /// Returns how many tasks actually changed.
    pub fn bulk_set_completed(&mut self, task_ids: &[String], completed: bool) -> usize {
        let mut applied = 0;
        for id in task_ids {
            match self.engine.set_completed(id, completed) {
                Ok(true) => applied += 1,
                Ok(false) => {}
                Err(e) => log::debug!(target: "taskboard.session", "bulk_set_completed skipped {}: {}", id, e),
            }
        }
        self.finish_bulk("bulk_set_completed", applied)
    }

    /// Append every listed task to `target_column_id`, in board order.
    /// Tasks already in the target column keep their position.
    pub fn bulk_move(&mut self, task_ids: &[String], target_column_id: &str) -> usize {
        let doc = self.engine.document();
        if !doc.columns.contains_key(target_column_id) {
            log::debug!(
                target: "taskboard.session",
                "bulk_move ignored: Column not found: {}",
                target_column_id
            );
            return 0;
        }

        let wanted: HashSet<&str> = task_ids.iter().map(String::as_str).collect();
        let ordered: Vec<String> = doc
            .ordered_columns()
            .into_iter()
            .filter(|col| col.id != target_column_id)
            .flat_map(|col| col.task_ids.iter())
            .filter(|id| wanted.contains(id.as_str()))
            .cloned()
            .collect();

        let mut applied = 0;
        for id in &ordered {
            match self.engine.move_task_to_column(id, target_column_id, None) {
                Ok(()) => applied += 1,
                Err(e) => log::debug!(target: "taskboard.session", "bulk_move skipped {}: {}", id, e),
            }
        }
        self.finish_bulk("bulk_move", applied)
    }

    // Selection

    /// Toggle one task in the selection. Unknown tasks are not selectable.
    pub fn toggle_selected(&mut self, task_id: &str) -> bool {
        if !self.engine.document().tasks.contains_key(task_id) {
            log::debug!(target: "taskboard.session", "toggle_selected ignored: Task not found: {}", task_id);
            return false;
        }
        self.selection.toggle(task_id)
    }

    /// Select or deselect every task of a column (toggle-all).
    pub fn toggle_select_all(&mut self, column_id: &str) {
        if let Some(column) = self.engine.document().columns.get(column_id) {
            self.selection.select_all_in_column(column_id, &column.task_ids);
        }
    }

    pub fn is_all_selected(&self, column_id: &str) -> bool {
        self.engine
            .document()
            .columns
            .get(column_id)
            .is_some_and(|column| self.selection.is_all_selected(column_id, &column.task_ids))
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    pub fn selected_ids(&self) -> Vec<String> {
        self.selection.ids()
    }

    fn resolve_drag_source(&self, event: &DropEvent, position: Option<usize>, from_index: usize) -> Option<usize> {
        match position {
            Some(from) if from != from_index => {
                log::debug!(
                    target: "taskboard.session",
                    "Drop of {} reported index {} but it is at {}",
                    event.draggable_id,
                    from_index,
                    from
                );
                Some(from)
            }
            Some(from) => Some(from),
            None => {
                log::debug!(
                    target: "taskboard.session",
                    "Drop ignored: {} is not in the source list",
                    event.draggable_id
                );
                None
            }
        }
    }

    fn settle<T>(&mut self, op: &str, result: BoardResult<T>) -> Option<T> {
        match result {
            Ok(value) => {
                log::debug!(target: "taskboard.session", "{} applied (version {})", op, self.engine.version());
                self.persist();
                Some(value)
            }
            Err(e) => {
                log::debug!(target: "taskboard.session", "{} ignored: {}", op, e);
                None
            }
        }
    }

    fn finish_bulk(&mut self, op: &str, applied: usize) -> usize {
        self.selection.deselect_all();
        if applied > 0 {
            log::debug!(target: "taskboard.session", "{} applied to {} tasks", op, applied);
            self.persist();
        }
        applied
    }

    /// Best-effort save of the current snapshot.
    fn persist(&self) {
        if let Err(e) = self.store.save(self.engine.document()) {
            log::warn!(target: "taskboard.session", "Failed to save board: {}", e);
        }
    }
}
