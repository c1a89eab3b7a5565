use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;

use super::menu::MenuEntry;

/// True when every character of `query` appears in `text` in order,
/// ignoring case
pub fn fuzzy_match(text: &str, query: &str) -> bool {
    SkimMatcherV2::default()
        .ignore_case()
        .fuzzy_match(text, query)
        .is_some()
}

pub fn matches(entry: &MenuEntry, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    let title = entry.title.to_lowercase();
    let description = entry.description.to_lowercase();

    title.contains(&needle)
        || description.contains(&needle)
        || fuzzy_match(&title, &needle)
        || fuzzy_match(&description, &needle)
}

/// Indices of the matching entries, in their original order
pub fn filter(entries: &[MenuEntry], query: &str) -> Vec<usize> {
    entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| matches(entry, query))
        .map(|(i, _)| i)
        .collect()
}

/// Menu entries plus the filtered view the user navigates. The view holds
/// indices into `entries`; the cursor and digit shortcuts index the view.
#[derive(Debug, Clone)]
pub struct FilteredList {
    entries: Vec<MenuEntry>,
    query: String,
    view: Vec<usize>,
    cursor: usize,
}

impl FilteredList {
    pub fn new(entries: Vec<MenuEntry>) -> Self {
        let view = (0..entries.len()).collect();
        Self {
            entries,
            query: String::new(),
            view,
            cursor: 0,
        }
    }

    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_filtered(&self) -> bool {
        !self.query.is_empty()
    }

    /// Entries currently shown, in display order
    pub fn visible(&self) -> impl Iterator<Item = &MenuEntry> {
        self.view.iter().filter_map(|&i| self.entries.get(i))
    }

    pub fn len(&self) -> usize {
        self.view.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected(&self) -> Option<&MenuEntry> {
        self.view.get(self.cursor).and_then(|&i| self.entries.get(i))
    }

    /// Recompute the view for a new query; the cursor goes back to the top
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.view = filter(&self.entries, query);
        self.cursor = 0;
    }

    pub fn clear_query(&mut self) {
        self.set_query("");
    }

    pub fn move_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.cursor + 1 < self.view.len() {
            self.cursor += 1;
        }
    }

    pub fn select(&mut self, position: usize) -> Option<&MenuEntry> {
        if position >= self.view.len() {
            return None;
        }
        self.cursor = position;
        self.selected()
    }

    /// Digit shortcut `k` selects position `k - 1` of the current view
    pub fn select_shortcut(&mut self, digit: char) -> Option<&MenuEntry> {
        let k = digit.to_digit(10).filter(|k| (1..=9).contains(k))?;
        self.select(k as usize - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::menu::{main_menu, MenuAction};

    fn entry(title: &str, description: &str) -> MenuEntry {
        MenuEntry::new('1', title, description, MenuAction::Back)
    }

    #[test]
    fn empty_query_matches_everything_in_order() {
        let entries = main_menu();
        assert!(entries.iter().all(|e| matches(e, "")));
        assert_eq!(filter(&entries, ""), (0..entries.len()).collect::<Vec<_>>());
    }

    #[test]
    fn fuzzy_subsequence_matches_title() {
        let backup = entry("Backup & Restore", "Manage backups");
        assert!(!backup.title.to_lowercase().contains("bkp"));
        assert!(matches(&backup, "bkp"));
        assert!(matches(&backup, "BKP"));
        assert!(!matches(&backup, "pkb"));
    }

    #[test]
    fn substring_matches_description() {
        let entries = vec![
            entry("Tools", "Install, update or remove tools"),
            entry("Secrets", "Bitwarden integration"),
        ];
        assert_eq!(filter(&entries, "bitwarden"), vec![1]);
        assert_eq!(filter(&entries, "xyz"), Vec::<usize>::new());
    }

    #[test]
    fn typing_resets_the_cursor() {
        let mut list = FilteredList::new(main_menu());
        list.move_down();
        list.move_down();
        assert_eq!(list.cursor(), 2);
        list.set_query("t");
        assert_eq!(list.cursor(), 0);
        list.clear_query();
        assert_eq!(list.len(), list.entries().len());
    }

    #[test]
    fn digit_selects_the_same_entry_as_the_cursor() {
        let mut list = FilteredList::new(main_menu());
        list.set_query("tool");
        assert!(list.len() >= 2);

        let by_digit = list.select_shortcut('2').cloned();
        list.select(0);
        list.move_down();
        assert_eq!(by_digit.as_ref(), list.selected());
    }

    #[test]
    fn out_of_range_digit_is_ignored() {
        let mut list = FilteredList::new(main_menu());
        list.set_query("quit");
        assert_eq!(list.len(), 1);
        assert!(list.select_shortcut('5').is_none());
        assert!(list.select_shortcut('0').is_none());
        assert_eq!(list.cursor(), 0);
    }

    #[test]
    fn no_matches_is_an_empty_view() {
        let mut list = FilteredList::new(main_menu());
        list.set_query("zzzz");
        assert!(list.is_empty());
        assert!(list.selected().is_none());
        list.move_down();
        assert_eq!(list.cursor(), 0);
    }
}
