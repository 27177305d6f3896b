use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    /// Back-reference to the owning column. Must agree with that column's `task_ids`.
    pub column_id: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub title: String,
    /// Display order of the column's tasks.
    #[serde(default)]
    pub task_ids: Vec<String>,
}

/// The complete persisted board: flat task map, column map and column order.
///
/// Tasks are not nested inside columns. A column only references its tasks
/// by id, and each task points back at its column through `column_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
    #[serde(default)]
    pub columns: BTreeMap<String, Column>,
    #[serde(default)]
    pub column_order: Vec<String>,
}

/// First broken cross-reference found by [`Document::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("column {column_id} references missing task {task_id}")]
    DanglingTaskRef { column_id: String, task_id: String },

    #[error("task {task_id} is listed in column {listed_in} but points at {column_id}")]
    BackReferenceMismatch {
        task_id: String,
        listed_in: String,
        column_id: String,
    },

    #[error("task {task_id} points at missing column {column_id}")]
    MissingColumn { task_id: String, column_id: String },

    #[error("task {task_id} appears {count} times in column {column_id}")]
    TaskListedTimes {
        task_id: String,
        column_id: String,
        count: usize,
    },

    #[error("column order is not a permutation of the column ids")]
    ColumnOrderMismatch,

    #[error("map key {key} does not match the stored id {id}")]
    KeyMismatch { key: String, id: String },
}

impl Document {
    /// Columns in display order. Ids in `column_order` without a column are skipped.
    pub fn ordered_columns(&self) -> Vec<&Column> {
        self.column_order
            .iter()
            .filter_map(|id| self.columns.get(id))
            .collect()
    }

    /// Tasks of a column in display order. Empty for an unknown column.
    pub fn column_tasks(&self, column_id: &str) -> Vec<&Task> {
        self.columns
            .get(column_id)
            .map(|col| {
                col.task_ids
                    .iter()
                    .filter_map(|id| self.tasks.get(id))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Verify the cross-references between tasks, columns and column order.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for (key, task) in &self.tasks {
            if key != &task.id {
                return Err(InvariantViolation::KeyMismatch {
                    key: key.clone(),
                    id: task.id.clone(),
                });
            }
        }

        for (key, column) in &self.columns {
            if key != &column.id {
                return Err(InvariantViolation::KeyMismatch {
                    key: key.clone(),
                    id: column.id.clone(),
                });
            }
            for task_id in &column.task_ids {
                let task = self.tasks.get(task_id).ok_or_else(|| {
                    InvariantViolation::DanglingTaskRef {
                        column_id: column.id.clone(),
                        task_id: task_id.clone(),
                    }
                })?;
                if task.column_id != column.id {
                    return Err(InvariantViolation::BackReferenceMismatch {
                        task_id: task_id.clone(),
                        listed_in: column.id.clone(),
                        column_id: task.column_id.clone(),
                    });
                }
            }
        }

        for task in self.tasks.values() {
            let column = self.columns.get(&task.column_id).ok_or_else(|| {
                InvariantViolation::MissingColumn {
                    task_id: task.id.clone(),
                    column_id: task.column_id.clone(),
                }
            })?;
            let count = column.task_ids.iter().filter(|id| *id == &task.id).count();
            if count != 1 {
                return Err(InvariantViolation::TaskListedTimes {
                    task_id: task.id.clone(),
                    column_id: column.id.clone(),
                    count,
                });
            }
        }

        let unique: HashSet<&String> = self.column_order.iter().collect();
        if unique.len() != self.column_order.len()
            || unique.len() != self.columns.len()
            || !unique.iter().all(|id| self.columns.contains_key(*id))
        {
            return Err(InvariantViolation::ColumnOrderMismatch);
        }

        Ok(())
    }

    /// The sample board shown on first run.
    pub fn seed() -> Self {
        const COLUMNS: &[(&str, &str)] = &[
            ("column-1", "Critical"),
            ("column-2", "Major"),
            ("column-3", "Minor"),
        ];
        const TASKS: &[(&str, &str, bool, &str)] = &[
            ("task-1", "Fix critical production bug", false, "column-1"),
            ("task-2", "Server migration", false, "column-1"),
            ("task-3", "Security patch v1.2", false, "column-1"),
            ("task-4", "Update API documentation", true, "column-2"),
            ("task-5", "Implement OAuth2 flow", false, "column-2"),
            ("task-6", "Refactor state management", false, "column-2"),
            ("task-7", "Design new landing page", false, "column-2"),
            ("task-8", "Fix CSS alignment in footer", true, "column-3"),
            ("task-9", "Update favicon", false, "column-3"),
            ("task-10", "Add logging to auth helper", false, "column-3"),
        ];
        const SEED_EPOCH_MS: i64 = 1_740_000_000_000;

        let mut doc = Document::default();
        for (id, title) in COLUMNS {
            doc.columns.insert(
                id.to_string(),
                Column {
                    id: id.to_string(),
                    title: title.to_string(),
                    task_ids: Vec::new(),
                },
            );
            doc.column_order.push(id.to_string());
        }
        for (i, (id, text, completed, column_id)) in TASKS.iter().enumerate() {
            doc.tasks.insert(
                id.to_string(),
                Task {
                    id: id.to_string(),
                    text: text.to_string(),
                    completed: *completed,
                    column_id: column_id.to_string(),
                    created_at: SEED_EPOCH_MS + i as i64 * 1_000_000,
                },
            );
            if let Some(col) = doc.columns.get_mut(*column_id) {
                col.task_ids.push(id.to_string());
            }
        }
        doc
    }
}
