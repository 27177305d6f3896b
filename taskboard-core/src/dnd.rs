/// Drag-and-drop drop events and their translation into board operations.
///
/// Gesture tracking belongs to the front end. The core only sees the final
/// drop with both ends fully resolved.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragKind {
    Task,
    Column,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropLocation {
    /// Containing column for task drags. Unused for column drags.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_id: Option<String>,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropEvent {
    pub kind: DragKind,
    pub draggable_id: String,
    pub source: DropLocation,
    /// `None` when released outside any drop target.
    #[serde(default)]
    pub destination: Option<DropLocation>,
}

/// The single board operation a drop resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropIntent {
    ReorderTask {
        column_id: String,
        from_index: usize,
        to_index: usize,
    },
    MoveTask {
        task_id: String,
        target_column_id: String,
        target_index: usize,
    },
    ReorderColumn {
        from_index: usize,
        to_index: usize,
    },
}

impl DropEvent {
    pub fn intent(&self) -> Option<DropIntent> {
        let destination = self.destination.as_ref()?;

        match self.kind {
            DragKind::Column => (destination.index != self.source.index).then(|| {
                DropIntent::ReorderColumn {
                    from_index: self.source.index,
                    to_index: destination.index,
                }
            }),
            DragKind::Task => {
                let source_column = self.source.column_id.as_ref()?;
                let target_column = destination.column_id.as_ref()?;
                if source_column == target_column {
                    (destination.index != self.source.index).then(|| DropIntent::ReorderTask {
                        column_id: source_column.clone(),
                        from_index: self.source.index,
                        to_index: destination.index,
                    })
                } else {
                    Some(DropIntent::MoveTask {
                        task_id: self.draggable_id.clone(),
                        target_column_id: target_column.clone(),
                        target_index: destination.index,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(column: Option<&str>, index: usize) -> DropLocation {
        DropLocation {
            column_id: column.map(str::to_string),
            index,
        }
    }

    fn task_drop(source: DropLocation, destination: Option<DropLocation>) -> DropEvent {
        DropEvent {
            kind: DragKind::Task,
            draggable_id: "task-1".into(),
            source,
            destination,
        }
    }

    #[test]
    fn test_task_within_column() {
        let event = task_drop(at(Some("c1"), 0), Some(at(Some("c1"), 2)));
        assert_eq!(
            event.intent(),
            Some(DropIntent::ReorderTask {
                column_id: "c1".into(),
                from_index: 0,
                to_index: 2
            })
        );
    }

    #[test]
    fn test_task_across_columns() {
        let event = task_drop(at(Some("c1"), 0), Some(at(Some("c2"), 1)));
        assert_eq!(
            event.intent(),
            Some(DropIntent::MoveTask {
                task_id: "task-1".into(),
                target_column_id: "c2".into(),
                target_index: 1
            })
        );
    }

    #[test]
    fn test_noop_drops() {
        assert_eq!(task_drop(at(Some("c1"), 1), None).intent(), None);
        assert_eq!(task_drop(at(Some("c1"), 1), Some(at(Some("c1"), 1))).intent(), None);
        assert_eq!(task_drop(at(None, 1), Some(at(Some("c1"), 0))).intent(), None);
    }

    #[test]
    fn test_column_drop() {
        let event = DropEvent {
            kind: DragKind::Column,
            draggable_id: "c3".into(),
            source: at(None, 2),
            destination: Some(at(None, 0)),
        };
        assert_eq!(
            event.intent(),
            Some(DropIntent::ReorderColumn {
                from_index: 2,
                to_index: 0
            })
        );
    }

    #[test]
    fn test_parses_front_end_payload() {
        let raw = r#"{"kind":"task","draggableId":"t9","source":{"columnId":"a","index":0},"destination":{"columnId":"b","index":3}}"#;
        let event: DropEvent = serde_json::from_str(raw).unwrap();
        assert!(matches!(event.intent(), Some(DropIntent::MoveTask { target_index: 3, .. })));
    }
}
