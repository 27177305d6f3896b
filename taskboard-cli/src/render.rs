/// Board rendering for the terminal and for `--json` output.
use serde::Serialize;
use std::fmt::Write;

use taskboard_core::storage::DocumentStore;
use taskboard_core::{BoardSession, Task};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub total: usize,
    pub tasks: Vec<&'a Task>,
}

/// The board as currently filtered by the session's view state.
pub fn board_view<S: DocumentStore>(session: &BoardSession<S>) -> Vec<ColumnView<'_>> {
    let doc = session.document();
    doc.ordered_columns()
        .into_iter()
        .map(|col| ColumnView {
            id: &col.id,
            title: &col.title,
            total: col.task_ids.len(),
            tasks: session
                .visible_tasks(&col.id)
                .iter()
                .filter_map(|id| doc.tasks.get(id))
                .collect(),
        })
        .collect()
}

pub fn render_text(columns: &[ColumnView<'_>]) -> String {
    let mut out = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if col.tasks.len() == col.total {
            let _ = writeln!(out, "{} ({}) [{}]", col.title, col.id, col.total);
        } else {
            let _ = writeln!(out, "{} ({}) [{}/{}]", col.title, col.id, col.tasks.len(), col.total);
        }
        if col.tasks.is_empty() {
            let _ = writeln!(out, "  No tasks yet");
        }
        for task in &col.tasks {
            let mark = if task.completed { "x" } else { " " };
            let _ = writeln!(out, "  [{}] {}  {}", mark, task.id, task.text);
        }
    }
    out
}
