use anyhow::{Context as _, Result};
use atelier_core::catalog::{CatalogQuery, categories, reconcile};
use atelier_infrastructure::SeedCatalog;

use super::Context;

pub fn run(
    ctx: &Context,
    search: Option<String>,
    category: Option<String>,
    list_categories: bool,
) -> Result<()> {
    let seed_path = ctx.paths.seed_catalog_file()?;
    let seed = SeedCatalog::load_or_builtin(&seed_path)
        .with_context(|| format!("Failed to load seed catalog {}", seed_path.display()))?;

    // No remote snapshot is available offline, so the view is the seed alone
    let view = reconcile(seed.entries(), &[]);

    if list_categories {
        for name in categories(&view) {
            println!("{name}");
        }
        return Ok(());
    }

    let query = CatalogQuery {
        search_term: search.unwrap_or_default(),
        category,
    };
    let matches = query.apply(&view);
    if matches.is_empty() {
        println!("No tools match the current filters.");
        return Ok(());
    }

    for entry in &matches {
        println!("{:<20} {:<18} {}", entry.id, entry.category, entry.name);
        if !entry.description.is_empty() {
            println!("{:<20} {}", "", entry.description);
        }
        if !entry.link.is_empty() {
            println!("{:<20} {}", "", entry.link);
        }
    }
    println!("\n{} of {} tools", matches.len(), view.len());
    Ok(())
}
