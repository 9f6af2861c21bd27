//! Catalog domain model.

use serde::{Deserialize, Serialize};

/// A single tool listed in the directory.
///
/// `id` is the unique key across the merged view. All other fields are
/// descriptive and replaced wholesale when a newer record for the same id
/// arrives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub use_cases: Vec<String>,
    #[serde(default)]
    pub link: String,
    #[serde(default, alias = "logo")]
    pub logo_ref: String,
}

impl CatalogEntry {
    /// Creates an entry with only the identifying fields set.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            use_cases: Vec::new(),
            link: String::new(),
            logo_ref: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_use_cases<I, S>(mut self, use_cases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.use_cases = use_cases.into_iter().map(Into::into).collect();
        self
    }
}

/// Path of a remote collection.
///
/// Catalog and bookmark collections live under an application namespace so
/// several deployments can share one store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef(String);

impl CollectionRef {
    /// Public catalog collection: `artifacts/{app_id}/public/data/tools`.
    pub fn catalog(app_id: &str) -> Self {
        Self(format!("artifacts/{app_id}/public/data/tools"))
    }

    /// Per-identity bookmarks: `artifacts/{app_id}/users/{identity}/bookmarks`.
    pub fn bookmarks(app_id: &str, identity: &str) -> Self {
        Self(format!("artifacts/{app_id}/users/{identity}/bookmarks"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_paths() {
        assert_eq!(
            CollectionRef::catalog("demo").as_str(),
            "artifacts/demo/public/data/tools"
        );
        assert_eq!(
            CollectionRef::bookmarks("demo", "user-1").to_string(),
            "artifacts/demo/users/user-1/bookmarks"
        );
    }

    #[test]
    fn test_entry_accepts_remote_field_names() {
        let json = r#"{
            "id": "midjourney",
            "name": "Midjourney",
            "useCases": ["ideation"],
            "logo": "https://example.invalid/mj.png"
        }"#;
        let entry: CatalogEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.use_cases, vec!["ideation"]);
        assert_eq!(entry.logo_ref, "https://example.invalid/mj.png");
        assert!(entry.description.is_empty());
    }
}
