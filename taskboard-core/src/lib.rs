//! Core of the task board: document model, board engine, selection,
//! search/filter, drag-and-drop intents and document storage.

pub mod board;
pub mod dnd;
pub mod ids;
pub mod search;
pub mod selection;
pub mod session;
pub mod storage;
pub mod types;

pub use board::{BoardEngine, BoardError, BoardResult};
pub use search::{filter_tasks, FilterStatus, TaskFilter};
pub use selection::SelectionSet;
pub use session::BoardSession;
pub use types::{Column, Document, Task};
