//! Merging the seed catalog with a live remote snapshot.

use std::collections::HashMap;

use super::model::CatalogEntry;

/// Merges `seed` and `remote` into one de-duplicated, ordered view.
///
/// Seed entries are laid down first, in order. Remote entries are then
/// written over them: an id already present keeps its slot but takes the
/// remote record whole, a new id is appended. Duplicate ids inside either
/// input collapse the same way, so the last record for an id wins.
///
/// Pure function; called again on every remote emission.
pub fn reconcile(seed: &[CatalogEntry], remote: &[CatalogEntry]) -> Vec<CatalogEntry> {
    let mut merged: Vec<CatalogEntry> = Vec::with_capacity(seed.len() + remote.len());
    let mut slots: HashMap<&str, usize> = HashMap::with_capacity(seed.len() + remote.len());

    for entry in seed.iter().chain(remote.iter()) {
        match slots.get(entry.id.as_str()) {
            Some(&slot) => merged[slot] = entry.clone(),
            None => {
                slots.insert(entry.id.as_str(), merged.len());
                merged.push(entry.clone());
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str) -> CatalogEntry {
        CatalogEntry::new(id, name)
    }

    fn ids(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_remote_overrides_seed_and_appends_new() {
        let seed = vec![entry("a", "v1")];
        let remote = vec![entry("a", "v2"), entry("b", "v9")];

        let merged = reconcile(&seed, &remote);

        assert_eq!(merged, vec![entry("a", "v2"), entry("b", "v9")]);
    }

    #[test]
    fn test_seed_survives_empty_remote() {
        let seed = vec![entry("midjourney", "Midjourney"), entry("dalle3", "DALL-E 3")];

        let merged = reconcile(&seed, &[]);

        assert_eq!(merged, seed);
    }

    #[test]
    fn test_remote_replaces_whole_record() {
        let seed = vec![
            entry("a", "Seed A")
                .with_description("seed description")
                .with_use_cases(["ideation"]),
        ];
        let remote = vec![entry("a", "Remote A")];

        let merged = reconcile(&seed, &remote);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].name, "Remote A");
        assert!(merged[0].description.is_empty());
        assert!(merged[0].use_cases.is_empty());
    }

    #[test]
    fn test_untouched_seed_entries_keep_position() {
        let seed = vec![entry("a", "A"), entry("b", "B"), entry("c", "C")];
        let remote = vec![entry("d", "D"), entry("b", "B2")];

        let merged = reconcile(&seed, &remote);

        assert_eq!(ids(&merged), vec!["a", "b", "c", "d"]);
        assert_eq!(merged[1].name, "B2");
    }

    #[test]
    fn test_union_of_ids_without_duplicates() {
        let seed = vec![entry("a", "A"), entry("b", "B")];
        let remote = vec![entry("b", "B"), entry("c", "C"), entry("c", "C2")];

        let merged = reconcile(&seed, &remote);

        assert_eq!(ids(&merged), vec!["a", "b", "c"]);
        assert_eq!(merged[2].name, "C2");
    }

    #[test]
    fn test_deterministic() {
        let seed = vec![entry("x", "X"), entry("y", "Y")];
        let remote = vec![entry("y", "Y2"), entry("z", "Z")];

        assert_eq!(reconcile(&seed, &remote), reconcile(&seed, &remote));
    }
}
