//! In-memory table state: search, column visibility, sort, pagination and
//! selection over already-fetched rows.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::rows::{Column, TableRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// Stateful table over rows of type `R`.
#[derive(Debug, Clone)]
pub struct DataTable<R: TableRow> {
    rows: Vec<R>,
    search: String,
    hidden: HashSet<&'static str>,
    sort: Option<SortState>,
    page_size: usize,
    page_index: usize,
    selected: BTreeSet<String>,
}

impl<R: TableRow> DataTable<R> {
    pub fn new(rows: Vec<R>, page_size: usize) -> Self {
        Self {
            rows,
            search: String::new(),
            hidden: HashSet::new(),
            sort: None,
            page_size: page_size.max(1),
            page_index: 0,
            selected: BTreeSet::new(),
        }
    }

    /// Replace the rows after a reload. Selections of rows that are gone
    /// are dropped.
    pub fn set_rows(&mut self, rows: Vec<R>) {
        self.rows = rows;
        let present: HashSet<&str> = self.rows.iter().map(|r| r.row_id()).collect();
        self.selected.retain(|id| present.contains(id.as_str()));
        self.clamp_page();
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, query: impl Into<String>) {
        self.search = query.into();
        self.clamp_page();
    }

    /// Columns currently shown, in declaration order.
    pub fn visible_columns(&self) -> Vec<&'static Column> {
        R::columns()
            .iter()
            .filter(|c| !self.hidden.contains(c.key))
            .collect()
    }

    pub fn is_column_visible(&self, key: &str) -> bool {
        !self.hidden.contains(key)
    }

    /// Show or hide a column. Unknown keys are ignored.
    pub fn set_column_visible(&mut self, key: &str, visible: bool) {
        let Some(column) = R::columns().iter().find(|c| c.key == key) else {
            return;
        };
        if visible {
            self.hidden.remove(column.key);
        } else {
            self.hidden.insert(column.key);
        }
        // Hidden columns drop out of search
        self.clamp_page();
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    /// Sort by a single column. Unknown keys clear the sort.
    pub fn set_sort(&mut self, key: &str, direction: SortDirection) {
        self.sort = R::columns()
            .iter()
            .find(|c| c.key == key)
            .map(|c| SortState {
                column: c.key,
                direction,
            });
    }

    /// Header click: ascending, then descending, then unsorted.
    pub fn toggle_sort(&mut self, key: &str) {
        match self.sort.as_ref() {
            Some(s) if s.column == key && s.direction == SortDirection::Asc => {
                self.set_sort(key, SortDirection::Desc)
            }
            Some(s) if s.column == key => self.sort = None,
            _ => self.set_sort(key, SortDirection::Asc),
        }
    }

    pub fn clear_sort(&mut self) {
        self.sort = None;
    }

    fn matches(&self, row: &R, needle: &str) -> bool {
        self.visible_columns()
            .iter()
            .filter(|c| c.searchable)
            .any(|c| row.cell(c.key).display().to_lowercase().contains(needle))
    }

    /// Rows passing the search, in sort order.
    pub fn filtered_rows(&self) -> Vec<&R> {
        let needle = self.search.trim().to_lowercase();
        let mut rows: Vec<&R> = if needle.is_empty() {
            self.rows.iter().collect()
        } else {
            self.rows.iter().filter(|r| self.matches(r, &needle)).collect()
        };

        if let Some(sort) = &self.sort {
            rows.sort_by(|a, b| {
                let ord = a.cell(sort.column).compare(&b.cell(sort.column));
                match sort.direction {
                    SortDirection::Asc => ord,
                    SortDirection::Desc => ord.reverse(),
                }
            });
        }
        rows
    }

    pub fn filtered_count(&self) -> usize {
        self.filtered_rows().len()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.clamp_page();
    }

    /// Number of pages; an empty table still has one.
    pub fn page_count(&self) -> usize {
        let count = self.filtered_count();
        count.div_ceil(self.page_size).max(1)
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn set_page_index(&mut self, index: usize) {
        self.page_index = index.min(self.page_count() - 1);
    }

    pub fn next_page(&mut self) {
        self.set_page_index(self.page_index + 1);
    }

    pub fn previous_page(&mut self) {
        self.set_page_index(self.page_index.saturating_sub(1));
    }

    fn clamp_page(&mut self) {
        self.set_page_index(self.page_index);
    }

    /// Rows on the current page.
    pub fn page_rows(&self) -> Vec<&R> {
        self.filtered_rows()
            .into_iter()
            .skip(self.page_index * self.page_size)
            .take(self.page_size)
            .collect()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    /// Select or deselect one row. Ids not in the table are ignored.
    pub fn set_selected(&mut self, id: &str, selected: bool) {
        if !selected {
            self.selected.remove(id);
        } else if self.rows.iter().any(|r| r.row_id() == id) {
            self.selected.insert(id.to_string());
        }
    }

    pub fn toggle_selected(&mut self, id: &str) {
        let selected = self.is_selected(id);
        self.set_selected(id, !selected);
    }

    pub fn select_page(&mut self) {
        let ids: Vec<String> = self
            .page_rows()
            .iter()
            .map(|r| r.row_id().to_string())
            .collect();
        self.selected.extend(ids);
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Selected ids, sorted.
    pub fn selected_ids(&self) -> Vec<String> {
        self.selected.iter().cloned().collect()
    }

    pub fn selected_rows(&self) -> Vec<&R> {
        self.rows
            .iter()
            .filter(|r| self.selected.contains(r.row_id()))
            .collect()
    }
}
