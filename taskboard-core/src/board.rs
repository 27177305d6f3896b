/// Board state engine.
///
/// Owns the current `Document` behind an `Arc` and applies mutations
/// copy-on-write: a snapshot taken before a mutation is never affected by it.
/// Every mutation validates first and only then touches the document, so an
/// `Err` always leaves the document and its version unchanged.
use std::sync::Arc;

use crate::ids::{Clock, IdGenerator, SystemClock, UuidGenerator};
use crate::types::{Column, Document, Task};

const MAX_ID_ATTEMPTS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("{field} must not be blank")]
    BlankText { field: &'static str },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("No unused id after {attempts} attempts")]
    IdCollision { attempts: usize },
}

impl BoardError {
    /// Stale references (unknown task or column) that UI paths treat as no-ops.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::TaskNotFound(_) | Self::ColumnNotFound(_))
    }
}

pub type BoardResult<T = ()> = Result<T, BoardError>;

pub struct BoardEngine {
    doc: Arc<Document>,
    version: u64,
    ids: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
}

impl BoardEngine {
    pub fn new(doc: Document, ids: Box<dyn IdGenerator>, clock: Box<dyn Clock>) -> Self {
        Self {
            doc: Arc::new(doc),
            version: 0,
            ids,
            clock,
        }
    }

    /// Engine with random UUIDs and the system clock.
    pub fn with_defaults(doc: Document) -> Self {
        Self::new(doc, Box::new(UuidGenerator), Box::new(SystemClock))
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Shared handle to the current state. Later mutations do not affect it.
    pub fn snapshot(&self) -> Arc<Document> {
        Arc::clone(&self.doc)
    }

    /// Incremented once per applied mutation.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Swap in a whole new document (e.g. reset to the seed board).
    pub fn replace(&mut self, doc: Document) {
        self.doc = Arc::new(doc);
        self.version += 1;
    }

    pub fn add_task(&mut self, column_id: &str, text: &str) -> BoardResult<String> {
        let text = non_blank(text, "task text")?;
        self.require_column(column_id)?;
        let id = self.mint_id()?;
        let task = Task {
            id: id.clone(),
            text: text.to_string(),
            completed: false,
            column_id: column_id.to_string(),
            created_at: self.clock.now_millis(),
        };

        let doc = self.commit();
        if let Some(col) = doc.columns.get_mut(column_id) {
            col.task_ids.push(id.clone());
        }
        doc.tasks.insert(id.clone(), task);
        log::debug!(target: "taskboard.engine", "Added task {} to column {}", id, column_id);
        Ok(id)
    }

    /// Remove a task from the map and from its column. Returns the removed task.
    pub fn delete_task(&mut self, task_id: &str) -> BoardResult<Task> {
        self.require_task(task_id)?;

        let doc = self.commit();
        let task = doc
            .tasks
            .remove(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        if let Some(col) = doc.columns.get_mut(&task.column_id) {
            col.task_ids.retain(|id| id != task_id);
        }
        log::debug!(target: "taskboard.engine", "Deleted task {}", task_id);
        Ok(task)
    }

    pub fn edit_task(&mut self, task_id: &str, text: &str) -> BoardResult {
        let text = non_blank(text, "task text")?;
        self.require_task(task_id)?;

        if let Some(task) = self.commit().tasks.get_mut(task_id) {
            task.text = text.to_string();
        }
        Ok(())
    }

    /// Flip the completion flag. Returns the new value.
    pub fn toggle_task(&mut self, task_id: &str) -> BoardResult<bool> {
        self.require_task(task_id)?;

        let task = self
            .commit()
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        task.completed = !task.completed;
        Ok(task.completed)
    }

    /// Set the completion flag. Returns `false` when it already had that value.
    pub fn set_completed(&mut self, task_id: &str, completed: bool) -> BoardResult<bool> {
        let current = self
            .doc
            .tasks
            .get(task_id)
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        if current.completed == completed {
            return Ok(false);
        }
        self.toggle_task(task_id).map(|_| true)
    }

    pub fn add_column(&mut self, title: &str) -> BoardResult<String> {
        let title = non_blank(title, "column title")?;
        let id = self.mint_id()?;

        let doc = self.commit();
        doc.columns.insert(
            id.clone(),
            Column {
                id: id.clone(),
                title: title.to_string(),
                task_ids: Vec::new(),
            },
        );
        doc.column_order.push(id.clone());
        log::debug!(target: "taskboard.engine", "Added column {} ({})", id, title);
        Ok(id)
    }

    /// Remove a column together with every task it owns.
    /// Returns the ids of the cascaded tasks.
    pub fn delete_column(&mut self, column_id: &str) -> BoardResult<Vec<String>> {
        self.require_column(column_id)?;

        let doc = self.commit();
        let column = doc
            .columns
            .remove(column_id)
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))?;
        for task_id in &column.task_ids {
            doc.tasks.remove(task_id);
        }
        // Tasks pointing here but missing from the list would otherwise dangle.
        doc.tasks.retain(|_, task| task.column_id != column_id);
        doc.column_order.retain(|id| id != column_id);
        log::debug!(
            target: "taskboard.engine",
            "Deleted column {} with {} tasks",
            column_id,
            column.task_ids.len()
        );
        Ok(column.task_ids)
    }

    pub fn edit_column(&mut self, column_id: &str, title: &str) -> BoardResult {
        let title = non_blank(title, "column title")?;
        self.require_column(column_id)?;

        if let Some(col) = self.commit().columns.get_mut(column_id) {
            col.title = title.to_string();
        }
        Ok(())
    }

    /// Relocate a task to `target_column_id` at `target_index` (end of list when `None`).
    ///
    /// The index is interpreted against the target list with the task already
    /// removed, and clamped to its length. Moving within the same column is a
    /// reposition.
    pub fn move_task_to_column(
        &mut self,
        task_id: &str,
        target_column_id: &str,
        target_index: Option<usize>,
    ) -> BoardResult {
        let source_column_id = self
            .doc
            .tasks
            .get(task_id)
            .map(|t| t.column_id.clone())
            .ok_or_else(|| BoardError::TaskNotFound(task_id.to_string()))?;
        self.require_column(target_column_id)?;

        let doc = self.commit();
        if let Some(source) = doc.columns.get_mut(&source_column_id) {
            source.task_ids.retain(|id| id != task_id);
        }
        if let Some(target) = doc.columns.get_mut(target_column_id) {
            let index = target_index
                .unwrap_or(target.task_ids.len())
                .min(target.task_ids.len());
            target.task_ids.insert(index, task_id.to_string());
        }
        if let Some(task) = doc.tasks.get_mut(task_id) {
            task.column_id = target_column_id.to_string();
        }
        log::debug!(
            target: "taskboard.engine",
            "Moved task {} from {} to {}",
            task_id,
            source_column_id,
            target_column_id
        );
        Ok(())
    }

    /// Remove-then-insert within a column's task list. Indices are clamped.
    pub fn reorder_task(&mut self, column_id: &str, from_index: usize, to_index: usize) -> BoardResult {
        let len = self
            .doc
            .columns
            .get(column_id)
            .map(|c| c.task_ids.len())
            .ok_or_else(|| BoardError::ColumnNotFound(column_id.to_string()))?;
        let Some((from, to)) = clamp_move(len, from_index, to_index) else {
            return Ok(());
        };

        if let Some(col) = self.commit().columns.get_mut(column_id) {
            splice_move(&mut col.task_ids, from, to);
        }
        Ok(())
    }

    /// Remove-then-insert on the column order. Indices are clamped.
    pub fn reorder_column(&mut self, from_index: usize, to_index: usize) -> BoardResult {
        let Some((from, to)) = clamp_move(self.doc.column_order.len(), from_index, to_index) else {
            return Ok(());
        };

        splice_move(&mut self.commit().column_order, from, to);
        Ok(())
    }

    fn commit(&mut self) -> &mut Document {
        self.version += 1;
        Arc::make_mut(&mut self.doc)
    }

    fn require_task(&self, task_id: &str) -> BoardResult {
        if self.doc.tasks.contains_key(task_id) {
            Ok(())
        } else {
            Err(BoardError::TaskNotFound(task_id.to_string()))
        }
    }

    fn require_column(&self, column_id: &str) -> BoardResult {
        if self.doc.columns.contains_key(column_id) {
            Ok(())
        } else {
            Err(BoardError::ColumnNotFound(column_id.to_string()))
        }
    }

    /// Ids are unique across tasks and columns alike.
    fn mint_id(&self) -> BoardResult<String> {
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = self.ids.generate();
            if !self.doc.tasks.contains_key(&candidate) && !self.doc.columns.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        log::warn!(target: "taskboard.engine", "Id generator kept returning ids already in use");
        Err(BoardError::IdCollision {
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

fn non_blank<'a>(text: &'a str, field: &'static str) -> BoardResult<&'a str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(BoardError::BlankText { field })
    } else {
        Ok(trimmed)
    }
}

/// Clamp a remove-then-insert pair for a list of `len` items.
/// `None` when nothing would change.
fn clamp_move(len: usize, from: usize, to: usize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let from = from.min(len - 1);
    let to = to.min(len - 1);
    (from != to).then_some((from, to))
}

fn splice_move(list: &mut Vec<String>, from: usize, to: usize) {
    let item = list.remove(from);
    list.insert(to, item);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FixedClock, SequentialIds};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn engine(doc: Document) -> BoardEngine {
        BoardEngine::new(doc, Box::new(SequentialIds::new("id")), Box::new(FixedClock(1_000)))
    }

    fn task_ids(engine: &BoardEngine, column_id: &str) -> Vec<String> {
        engine.document().columns[column_id].task_ids.clone()
    }

    fn all_listed(doc: &Document) -> Vec<String> {
        let mut ids: Vec<String> = doc
            .columns
            .values()
            .flat_map(|c| c.task_ids.iter().cloned())
            .collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_add_task() {
        let mut e = engine(Document::seed());
        let id = e.add_task("column-1", "  Write tests  ").unwrap();

        let task = &e.document().tasks[&id];
        assert_eq!(task.text, "Write tests");
        assert!(!task.completed);
        assert_eq!(task.column_id, "column-1");
        assert_eq!(task.created_at, 1_000);
        assert_eq!(task_ids(&e, "column-1").last(), Some(&id));
        assert_eq!(e.document().check_invariants(), Ok(()));
        assert_eq!(e.version(), 1);
    }

    #[test]
    fn test_add_task_rejects_blank() {
        let mut e = engine(Document::seed());
        let before = e.snapshot();
        assert_eq!(
            e.add_task("column-1", "   "),
            Err(BoardError::BlankText { field: "task text" })
        );
        assert_eq!(*e.snapshot(), *before);
        assert_eq!(e.version(), 0);
    }

    #[test]
    fn test_add_task_unknown_column() {
        let mut e = engine(Document::seed());
        let err = e.add_task("nope", "x").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(e.document().task_count(), 10);
    }

    #[test]
    fn test_add_then_delete_restores_document() {
        let mut e = engine(Document::seed());
        let before = e.snapshot();
        let id = e.add_task("column-2", "x").unwrap();
        let removed = e.delete_task(&id).unwrap();
        assert_eq!(removed.text, "x");
        assert_eq!(*e.snapshot(), *before);
    }

    #[test]
    fn test_delete_unknown_task_is_noop() {
        let mut e = engine(Document::seed());
        assert_eq!(
            e.delete_task("ghost"),
            Err(BoardError::TaskNotFound("ghost".into()))
        );
        assert_eq!(e.version(), 0);
    }

    #[test]
    fn test_edit_and_toggle() {
        let mut e = engine(Document::seed());
        e.edit_task("task-1", " Fix prod ").unwrap();
        assert_eq!(e.document().tasks["task-1"].text, "Fix prod");
        assert!(e.edit_task("task-1", "").is_err());
        assert!(e.edit_task("ghost", "x").unwrap_err().is_not_found());

        assert_eq!(e.toggle_task("task-1"), Ok(true));
        assert_eq!(e.toggle_task("task-1"), Ok(false));
        assert!(e.toggle_task("ghost").is_err());
    }

    #[test]
    fn test_set_completed_is_not_a_toggle() {
        let mut e = engine(Document::seed());
        assert_eq!(e.set_completed("task-4", true), Ok(false));
        assert!(e.document().tasks["task-4"].completed);
        assert_eq!(e.version(), 0);
        assert_eq!(e.set_completed("task-4", false), Ok(true));
        assert!(!e.document().tasks["task-4"].completed);
        assert_eq!(e.version(), 1);
        assert!(e.set_completed("ghost", true).unwrap_err().is_not_found());
    }

    #[test]
    fn test_add_edit_column() {
        let mut e = engine(Document::seed());
        let id = e.add_column("Backlog").unwrap();
        assert_eq!(e.document().column_order.last(), Some(&id));
        assert!(e.document().columns[&id].task_ids.is_empty());

        e.edit_column(&id, "Icebox").unwrap();
        assert_eq!(e.document().columns[&id].title, "Icebox");
        assert!(e.edit_column(&id, " ").is_err());
        assert!(e.add_column("\t").is_err());
        assert_eq!(e.document().check_invariants(), Ok(()));
    }

    #[test]
    fn test_delete_column_cascades() {
        let mut e = engine(Document::seed());
        let removed = e.delete_column("column-2").unwrap();
        assert_eq!(removed, vec!["task-4", "task-5", "task-6", "task-7"]);

        let doc = e.document();
        assert!(!doc.columns.contains_key("column-2"));
        assert!(!doc.column_order.contains(&"column-2".to_string()));
        assert!(doc.tasks.values().all(|t| t.column_id != "column-2"));
        assert_eq!(doc.task_count(), 6);
        assert_eq!(doc.check_invariants(), Ok(()));

        assert!(e.delete_column("column-2").unwrap_err().is_not_found());
    }

    #[test]
    fn test_move_across_columns() {
        let mut e = engine(Document::seed());
        let before = all_listed(e.document());
        e.move_task_to_column("task-1", "column-3", Some(1)).unwrap();

        assert_eq!(task_ids(&e, "column-1"), vec!["task-2", "task-3"]);
        assert_eq!(task_ids(&e, "column-3"), vec!["task-8", "task-1", "task-9", "task-10"]);
        assert_eq!(e.document().tasks["task-1"].column_id, "column-3");
        assert_eq!(e.document().task_count(), 10);
        assert_eq!(all_listed(e.document()), before);
        assert_eq!(e.document().check_invariants(), Ok(()));
    }

    #[test]
    fn test_move_defaults_to_end_and_clamps() {
        let mut e = engine(Document::seed());
        e.move_task_to_column("task-1", "column-2", None).unwrap();
        assert_eq!(task_ids(&e, "column-2").last().map(String::as_str), Some("task-1"));

        e.move_task_to_column("task-2", "column-2", Some(99)).unwrap();
        assert_eq!(task_ids(&e, "column-2").last().map(String::as_str), Some("task-2"));
        assert_eq!(e.document().check_invariants(), Ok(()));
    }

    #[test]
    fn test_move_within_column_uses_post_removal_index() {
        let mut e = engine(Document::seed());
        e.move_task_to_column("task-4", "column-2", Some(2)).unwrap();
        assert_eq!(task_ids(&e, "column-2"), vec!["task-5", "task-6", "task-4", "task-7"]);
        assert_eq!(e.document().check_invariants(), Ok(()));
    }

    #[test]
    fn test_move_unknown_ids() {
        let mut e = engine(Document::seed());
        assert!(e.move_task_to_column("ghost", "column-1", None).is_err());
        assert_eq!(
            e.move_task_to_column("task-1", "ghost", None),
            Err(BoardError::ColumnNotFound("ghost".into()))
        );
        assert_eq!(e.version(), 0);
    }

    #[test]
    fn test_reorder_task() {
        let mut e = engine(Document::seed());
        e.reorder_task("column-2", 0, 3).unwrap();
        assert_eq!(task_ids(&e, "column-2"), vec!["task-5", "task-6", "task-7", "task-4"]);
        e.reorder_task("column-2", 3, 0).unwrap();
        assert_eq!(task_ids(&e, "column-2"), vec!["task-4", "task-5", "task-6", "task-7"]);
    }

    #[test]
    fn test_reorder_identity_is_unchanged() {
        let mut e = engine(Document::seed());
        let before = task_ids(&e, "column-1");
        for i in 0..before.len() {
            e.reorder_task("column-1", i, i).unwrap();
            assert_eq!(task_ids(&e, "column-1"), before);
        }
        assert_eq!(e.version(), 0);
    }

    #[test]
    fn test_reorder_clamps_out_of_range() {
        let mut e = engine(Document::seed());
        e.reorder_task("column-1", 10, 0).unwrap();
        assert_eq!(task_ids(&e, "column-1"), vec!["task-3", "task-1", "task-2"]);

        let id = e.add_column("Empty").unwrap();
        assert_eq!(e.reorder_task(&id, 3, 5), Ok(()));
        assert!(e.reorder_task("ghost", 0, 1).unwrap_err().is_not_found());
    }

    #[test]
    fn test_reorder_column() {
        let mut e = engine(Document::seed());
        e.reorder_column(2, 0).unwrap();
        assert_eq!(e.document().column_order, vec!["column-3", "column-1", "column-2"]);
        e.reorder_column(0, 100).unwrap();
        assert_eq!(e.document().column_order, vec!["column-1", "column-2", "column-3"]);
        assert_eq!(e.document().check_invariants(), Ok(()));
    }

    #[test]
    fn test_snapshot_is_copy_on_write() {
        let mut e = engine(Document::seed());
        let before = e.snapshot();
        e.delete_task("task-1").unwrap();
        assert!(before.tasks.contains_key("task-1"));
        assert!(!e.document().tasks.contains_key("task-1"));
    }

    #[test]
    fn test_minted_ids_skip_existing() {
        let mut e = BoardEngine::new(
            Document::seed(),
            Box::new(SequentialIds::new("task")),
            Box::new(FixedClock(0)),
        );
        let id = e.add_task("column-1", "fresh").unwrap();
        assert_eq!(id, "task-11");
    }

    #[test]
    fn test_id_collision_gives_up() {
        struct Constant;
        impl IdGenerator for Constant {
            fn generate(&self) -> String {
                "task-1".into()
            }
        }
        let mut e = BoardEngine::new(Document::seed(), Box::new(Constant), Box::new(FixedClock(0)));
        assert_eq!(
            e.add_task("column-1", "x"),
            Err(BoardError::IdCollision { attempts: 64 })
        );
        assert_eq!(e.document().task_count(), 10);
    }

    #[test]
    fn test_invariants_hold_across_sequence() {
        let mut e = engine(Document::seed());
        let col = e.add_column("Later").unwrap();
        let a = e.add_task(&col, "a").unwrap();
        let b = e.add_task("column-1", "b").unwrap();
        e.move_task_to_column(&b, &col, Some(0)).unwrap();
        e.reorder_task(&col, 0, 1).unwrap();
        e.toggle_task(&a).unwrap();
        e.reorder_column(3, 1).unwrap();
        e.delete_column("column-3").unwrap();
        e.move_task_to_column("task-5", "column-1", Some(0)).unwrap();
        e.delete_task("task-2").unwrap();
        e.edit_column(&col, "Soon").unwrap();

        assert_eq!(e.document().check_invariants(), Ok(()));
        assert_eq!(task_ids(&e, &col), vec![a, b]);
        assert_eq!(e.document().column_order, vec!["column-1", col.as_str(), "column-2"]);
    }

    fn pick(rng: &mut StdRng, ids: &[String]) -> String {
        if ids.is_empty() || rng.gen_bool(0.05) {
            return "ghost".to_string();
        }
        ids[rng.gen_range(0..ids.len())].clone()
    }

    #[test]
    fn test_invariants_hold_across_random_operations() {
        let mut rng = StdRng::seed_from_u64(0x7a5c_b0a2d);
        let mut e = engine(Document::seed());

        for step in 0..2_000 {
            let doc = e.snapshot();
            let tasks: Vec<String> = doc.tasks.keys().cloned().collect();
            let columns = doc.column_order.clone();
            let version = e.version();

            let result = match rng.gen_range(0..12) {
                0 | 1 => {
                    let column = pick(&mut rng, &columns);
                    e.add_task(&column, "random").map(|_| ())
                }
                2 => e.delete_task(&pick(&mut rng, &tasks)).map(|_| ()),
                3 => e.edit_task(&pick(&mut rng, &tasks), "edited"),
                4 => e.toggle_task(&pick(&mut rng, &tasks)).map(|_| ()),
                5 => e.add_column("random").map(|_| ()),
                6 => {
                    if rng.gen_bool(0.3) {
                        e.delete_column(&pick(&mut rng, &columns)).map(|_| ())
                    } else {
                        e.edit_column(&pick(&mut rng, &columns), "renamed")
                    }
                }
                7 | 8 => {
                    let task = pick(&mut rng, &tasks);
                    let column = pick(&mut rng, &columns);
                    let index = rng.gen_bool(0.5).then(|| rng.gen_range(0..8));
                    e.move_task_to_column(&task, &column, index)
                }
                9 | 10 => {
                    let column = pick(&mut rng, &columns);
                    let (from, to) = (rng.gen_range(0..8), rng.gen_range(0..8));
                    e.reorder_task(&column, from, to)
                }
                _ => e.reorder_column(rng.gen_range(0..6), rng.gen_range(0..6)),
            };

            if result.is_err() {
                assert_eq!(e.version(), version, "step {}", step);
                assert_eq!(*e.snapshot(), *doc, "step {}", step);
            }
            assert_eq!(e.document().check_invariants(), Ok(()), "step {}", step);
        }
    }
}
