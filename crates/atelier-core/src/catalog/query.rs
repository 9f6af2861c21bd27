//! Directory filtering over a reconciled catalog view.

use serde::{Deserialize, Serialize};

use super::model::CatalogEntry;
use crate::bookmark::BookmarkSet;

/// Category value that matches every entry.
pub const ALL_CATEGORIES: &str = "All";

/// Search term plus category filter, as typed into the directory screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub search_term: String,
    #[serde(default)]
    pub category: Option<String>,
}

impl CatalogQuery {
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Returns true when `entry` passes both the search and category filters.
    ///
    /// The search is a case-insensitive substring match against the name,
    /// the description, or any use case.
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        self.matches_search(entry) && self.matches_category(entry)
    }

    /// Applies the query to a view, preserving view order.
    pub fn apply<'a>(&self, view: &'a [CatalogEntry]) -> Vec<&'a CatalogEntry> {
        view.iter().filter(|entry| self.matches(entry)).collect()
    }

    fn matches_search(&self, entry: &CatalogEntry) -> bool {
        if self.search_term.is_empty() {
            return true;
        }
        let needle = self.search_term.to_lowercase();
        entry.name.to_lowercase().contains(&needle)
            || entry.description.to_lowercase().contains(&needle)
            || entry
                .use_cases
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle))
    }

    fn matches_category(&self, entry: &CatalogEntry) -> bool {
        match self.category.as_deref() {
            None | Some(ALL_CATEGORIES) => true,
            Some(category) => entry.category == category,
        }
    }
}

/// Distinct categories of a view, in first-seen order.
pub fn categories(view: &[CatalogEntry]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for entry in view {
        if !entry.category.is_empty() && !seen.contains(&entry.category.as_str()) {
            seen.push(entry.category.as_str());
        }
    }
    seen
}

/// Resolves a bookmark set against a view.
///
/// Bookmarked ids that no longer exist in the view are skipped.
pub fn bookmarked_entries<'a>(
    view: &'a [CatalogEntry],
    bookmarks: &BookmarkSet,
) -> Vec<&'a CatalogEntry> {
    view.iter()
        .filter(|entry| bookmarks.contains(&entry.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> Vec<CatalogEntry> {
        vec![
            CatalogEntry::new("midjourney", "Midjourney")
                .with_category("Generalist Generative AI")
                .with_use_cases(["ideation", "rendering"]),
            CatalogEntry::new("spacelyai", "Spacely AI")
                .with_category("Interior-Specific AI")
                .with_description("Layout exploration for real rooms"),
            CatalogEntry::new("dalle3", "DALL-E 3")
                .with_category("Generalist Generative AI")
                .with_use_cases(["image-generation"]),
        ]
    }

    #[test]
    fn test_empty_query_matches_all() {
        let view = view();
        assert_eq!(CatalogQuery::default().apply(&view).len(), 3);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let view = view();

        let by_name = CatalogQuery::new("MIDJOURNEY").apply(&view);
        assert_eq!(by_name[0].id, "midjourney");

        let by_description = CatalogQuery::new("layout").apply(&view);
        assert_eq!(by_description[0].id, "spacelyai");

        let by_use_case = CatalogQuery::new("Image-Gen").apply(&view);
        assert_eq!(by_use_case[0].id, "dalle3");
    }

    #[test]
    fn test_category_filter() {
        let view = view();

        let all = CatalogQuery::default().with_category(ALL_CATEGORIES);
        assert_eq!(all.apply(&view).len(), 3);

        let interior = CatalogQuery::default().with_category("Interior-Specific AI");
        let hits = interior.apply(&view);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "spacelyai");

        let combined = CatalogQuery::new("ideation").with_category("Interior-Specific AI");
        assert!(combined.apply(&view).is_empty());
    }

    #[test]
    fn test_categories_first_seen_order() {
        let view = view();
        assert_eq!(
            categories(&view),
            vec!["Generalist Generative AI", "Interior-Specific AI"]
        );
    }

    #[test]
    fn test_bookmarked_entries_skip_unknown_ids() {
        let view = view();
        let bookmarks = BookmarkSet::from_ids(["dalle3", "removed-tool", "midjourney"]);

        let resolved: Vec<&str> = bookmarked_entries(&view, &bookmarks)
            .into_iter()
            .map(|e| e.id.as_str())
            .collect();

        assert_eq!(resolved, vec!["midjourney", "dalle3"]);
    }
}
