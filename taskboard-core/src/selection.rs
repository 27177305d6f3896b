/// Multi-select state for bulk actions.
///
/// Kept apart from the board engine. The owner of both (see `session`) is
/// responsible for pruning deleted tasks and clearing on column deletion.
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: BTreeSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the id if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle(&mut self, task_id: &str) -> bool {
        if self.selected.remove(task_id) {
            false
        } else {
            self.selected.insert(task_id.to_string());
            true
        }
    }

    /// Toggle-all for one column: deselect every member when all are already
    /// selected, otherwise select every member.
    pub fn select_all_in_column(&mut self, column_id: &str, column_task_ids: &[String]) {
        if self.is_all_selected(column_id, column_task_ids) {
            for id in column_task_ids {
                self.selected.remove(id);
            }
        } else {
            self.selected.extend(column_task_ids.iter().cloned());
        }
    }

    pub fn deselect_all(&mut self) {
        self.selected.clear();
    }

    /// True when the column has tasks and every one of them is selected.
    pub fn is_all_selected(&self, _column_id: &str, column_task_ids: &[String]) -> bool {
        !column_task_ids.is_empty() && column_task_ids.iter().all(|id| self.selected.contains(id))
    }

    /// Drop a deleted task from the selection.
    pub fn prune(&mut self, task_id: &str) -> bool {
        self.selected.remove(task_id)
    }

    pub fn is_selected(&self, task_id: &str) -> bool {
        self.selected.contains(task_id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }
}
