use crate::app::AppState;
use crate::store::StudentRecord;

/// True if `record`'s name or id contains the lowercased `query`.
pub fn matches_query(record: &StudentRecord, query: &str) -> bool {
    query.is_empty()
        || record.name().to_lowercase().contains(query)
        || record.id().to_string().contains(query)
}

/// Rebuild the table view from the store, applying the current search query.
///
/// Keeps the selection in range; call [`reset_selection`] after a new query.
pub fn apply_search(app: &mut AppState) {
    let q = app.search_query.trim().to_lowercase();
    app.students = app
        .store
        .records()
        .iter()
        .filter(|s| matches_query(s, &q))
        .cloned()
        .collect();
    app.selected_index = app
        .selected_index
        .min(app.students.len().saturating_sub(1));
}

pub fn reset_selection(app: &mut AppState) {
    app.selected_index = 0;
}

/// Move the selection onto the row holding `id`, clearing the filter if it hides that row.
pub fn select_id(app: &mut AppState, id: u32) {
    if !app.students.iter().any(|s| s.id() == id) {
        app.search_query.clear();
        apply_search(app);
    }
    if let Some(idx) = app.students.iter().position(|s| s.id() == id) {
        app.selected_index = idx;
    }
}
