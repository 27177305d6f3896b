/// Resolve user-typed task and column references to ids.
///
/// Generated ids are UUIDs, so an unambiguous id prefix is accepted. Columns
/// can also be named by title (case-insensitive). Unresolved input is passed
/// through unchanged and the session then treats it as an unknown id.
use taskboard_core::Document;

pub fn task_id(doc: &Document, input: &str) -> String {
    if doc.tasks.contains_key(input) {
        return input.to_string();
    }
    unique_prefix(doc.tasks.keys(), input).unwrap_or_else(|| input.to_string())
}

pub fn column_id(doc: &Document, input: &str) -> String {
    if doc.columns.contains_key(input) {
        return input.to_string();
    }
    let by_title: Vec<&String> = doc
        .columns
        .values()
        .filter(|c| c.title.eq_ignore_ascii_case(input))
        .map(|c| &c.id)
        .collect();
    if let [only] = by_title.as_slice() {
        return (*only).clone();
    }
    unique_prefix(doc.columns.keys(), input).unwrap_or_else(|| input.to_string())
}

pub fn task_ids(doc: &Document, inputs: &[String]) -> Vec<String> {
    inputs.iter().map(|input| task_id(doc, input)).collect()
}

fn unique_prefix<'a>(ids: impl Iterator<Item = &'a String>, prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    let mut matches = ids.filter(|id| id.starts_with(prefix));
    let first = matches.next()?;
    matches.next().is_none().then(|| first.clone())
}
