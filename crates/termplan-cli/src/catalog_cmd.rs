//! `termplan catalog check`: validate a catalog file.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Result, bail};

use termplan_core::CourseCode;
use termplan_core::course::Catalog;

use crate::session::load_catalog;

pub fn run_catalog_check(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        bail!("no catalog given; pass a path, --catalog, or set TERMPLAN_CATALOG");
    };
    let catalog = load_catalog(path)?;
    println!("Catalog {} is valid.", path.display());
    print!("{}", render_summary(&catalog));
    Ok(())
}

/// Codes referenced by some requirement but absent from the catalog.
pub fn unknown_references(catalog: &Catalog) -> BTreeSet<&CourseCode> {
    catalog
        .courses
        .iter()
        .flat_map(|c| c.referenced_codes())
        .filter(|code| !catalog.courses.contains(code.as_str()))
        .collect()
}

pub fn render_summary(catalog: &Catalog) -> String {
    let mut out = String::new();
    let with_requirements = catalog
        .courses
        .iter()
        .filter(|c| c.has_requirements())
        .count();
    out.push_str(&format!(
        "  Courses:           {}\n  With requirements: {}\n",
        catalog.courses.len(),
        with_requirements
    ));

    if !catalog.prerequisite_cycle.is_empty() {
        let codes: Vec<&str> = catalog
            .prerequisite_cycle
            .iter()
            .map(|c| c.as_str())
            .collect();
        out.push('\n');
        out.push_str(&format!("Warning: prerequisite cycle among {}\n", codes.join(", ")));
    }

    let unknown = unknown_references(catalog);
    if !unknown.is_empty() {
        out.push('\n');
        out.push_str("Referenced but not in catalog:\n");
        for code in unknown {
            out.push_str(&format!("  - {code}\n"));
        }
    }
    out
}
