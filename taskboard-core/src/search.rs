use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::types::Task;

/// Minimum normalized similarity for a fuzzy text match.
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterStatus {
    #[default]
    All,
    Completed,
    Incomplete,
}

impl FilterStatus {
    pub fn accepts(self, completed: bool) -> bool {
        match self {
            Self::All => true,
            Self::Completed => completed,
            Self::Incomplete => !completed,
        }
    }
}

impl FromStr for FilterStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "completed" | "done" => Ok(Self::Completed),
            "incomplete" | "active" | "open" => Ok(Self::Incomplete),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}

/// A compiled query plus status filter, evaluated per task.
///
/// A task passes the text predicate when its lowercased text contains the
/// lowercased query, or when their similarity reaches the threshold. An empty
/// query disables the text predicate.
#[derive(Debug, Clone)]
pub struct TaskFilter {
    query: Option<Vec<char>>,
    query_lower: String,
    status: FilterStatus,
    threshold: f64,
}

impl TaskFilter {
    pub fn compile(query: &str, status: FilterStatus) -> Self {
        Self::with_threshold(query, status, DEFAULT_FUZZY_THRESHOLD)
    }

    pub fn with_threshold(query: &str, status: FilterStatus, threshold: f64) -> Self {
        let query_lower = query.to_lowercase();
        Self {
            query: (!query_lower.is_empty()).then(|| query_lower.chars().collect()),
            query_lower,
            status,
            threshold,
        }
    }

    /// True when neither predicate can reject anything.
    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.status == FilterStatus::All
    }

    pub fn matches(&self, task: &Task) -> bool {
        if !self.status.accepts(task.completed) {
            return false;
        }
        let Some(query) = &self.query else {
            return true;
        };

        let text = task.text.to_lowercase();
        if text.contains(&self.query_lower) {
            return true;
        }
        let text: Vec<char> = text.chars().collect();
        similarity_chars(&text, query) >= self.threshold
    }

    /// Ordered subsequence of `task_ids` that passes the filter.
    /// Ids missing from `tasks` are dropped.
    pub fn apply(&self, task_ids: &[String], tasks: &BTreeMap<String, Task>) -> Vec<String> {
        task_ids
            .iter()
            .filter(|id| tasks.get(*id).is_some_and(|task| self.matches(task)))
            .cloned()
            .collect()
    }
}

/// Filter `task_ids` by `query` and `status`, preserving order.
pub fn filter_tasks(
    task_ids: &[String],
    tasks: &BTreeMap<String, Task>,
    query: &str,
    status: FilterStatus,
) -> Vec<String> {
    TaskFilter::compile(query, status).apply(task_ids, tasks)
}

/// Levenshtein distance over chars (single-char insert, delete, substitute).
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    edit_distance_chars(&a, &b)
}

/// `1 - distance / max_len`, computed case-insensitively. Two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    similarity_chars(&a, &b)
}

fn similarity_chars(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - edit_distance_chars(a, b) as f64 / max_len as f64
}

fn edit_distance_chars(a: &[char], b: &[char]) -> usize {
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Two rolling rows instead of the full matrix.
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = substitution.min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
