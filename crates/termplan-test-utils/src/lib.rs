//! Shared test utilities for termplan integration tests.
//!
//! Provides a small sample catalog, a builder for plans, and helpers that
//! write plan and catalog files into a temporary directory.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use termplan_core::course::{Catalog, parse_catalog_toml};
use termplan_core::plan::PlanToml;
use termplan_core::{Course, CourseCode, Plan, TermId};

/// A catalog covering the first-year CS sequence plus a few awkward cases:
/// an antirequisite pair, a corequisite, and a non-credit course.
pub const SAMPLE_CATALOG: &str = r#"
[[courses]]
code = "CS 135"
name = "Designing Functional Programs"
credits = 1
antirequisites = ["CS 145"]

[[courses]]
code = "CS 145"
name = "Designing Functional Programs (Advanced)"
credits = 1
antirequisites = ["CS 135"]

[[courses]]
code = "CS 136"
name = "Elementary Algorithm Design and Data Abstraction"
credits = 1
prerequisites = ["CS 135 | CS 145"]
antirequisites = ["CS 146"]

[[courses]]
code = "CS 146"
name = "Elementary Algorithm Design and Data Abstraction (Advanced)"
credits = 1
prerequisites = ["CS 145"]
antirequisites = ["CS 136"]

[[courses]]
code = "CS 136L"
name = "Tools and Techniques for Software Development"
credits = 0
corequisites = ["CS 136 | CS 146"]

[[courses]]
code = "MATH 135"
name = "Algebra for Honours Mathematics"
credits = 1

[[courses]]
code = "MATH 239"
name = "Introduction to Combinatorics"
credits = 1
prerequisites = [{ all_of = ["MATH 135", { any_of = ["CS 136", "CS 146"] }] }]

[[courses]]
code = "COOP 1"
name = "Co-operative Work Term"
credits = -1
notes = ["Work terms do not count toward the credit total"]
"#;

/// Parse [`SAMPLE_CATALOG`].
pub fn sample_catalog() -> Catalog {
    parse_catalog_toml(SAMPLE_CATALOG).expect("sample catalog should parse")
}

/// Look up one course from [`SAMPLE_CATALOG`].
pub fn sample_course(code: &str) -> Course {
    sample_catalog()
        .courses
        .get(code)
        .cloned()
        .unwrap_or_else(|| panic!("{code} is not in the sample catalog"))
}

/// Shorthand for a normalised course code.
pub fn code(s: &str) -> CourseCode {
    CourseCode::new(s).expect("valid course code")
}

/// Id of the term at `index`.
pub fn term_id(plan: &Plan, index: usize) -> TermId {
    plan.terms()[index].id()
}

/// Codes in the term at `index`, as strings.
pub fn term_codes(plan: &Plan, index: usize) -> Vec<String> {
    plan.terms()[index]
        .courses()
        .iter()
        .map(|c| c.to_string())
        .collect()
}

/// Builds plans for tests. Courses are taken from [`SAMPLE_CATALOG`] unless
/// registered explicitly.
pub struct PlanBuilder {
    plan: Plan,
}

impl PlanBuilder {
    pub fn new(terms: usize) -> Self {
        Self {
            plan: Plan::with_terms("test plan", terms),
        }
    }

    /// Register every course of the sample catalog.
    pub fn with_sample_catalog(mut self) -> Self {
        for course in sample_catalog().courses.iter() {
            self.plan.register_course(course.clone());
        }
        self
    }

    pub fn course(mut self, course: Course) -> Self {
        self.plan.register_course(course);
        self
    }

    /// Place a registered course at the end of the term at `term_index`.
    pub fn place(mut self, code_str: &str, term_index: usize) -> Self {
        let term = term_id(&self.plan, term_index);
        self.plan
            .place_course(&code(code_str), term, None)
            .unwrap_or_else(|e| panic!("placing {code_str}: {e}"));
        self
    }

    pub fn taken(mut self, code_str: &str) -> Self {
        self.plan
            .mark_taken(&code(code_str))
            .unwrap_or_else(|e| panic!("marking {code_str} taken: {e}"));
        self
    }

    pub fn build(self) -> Plan {
        self.plan
    }
}

/// A temporary directory that is removed when dropped.
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("failed to create temp dir")
}

/// Write `plan` as a snapshot to `dir/plan.toml` and return the path.
pub fn write_plan_file(dir: &Path, plan: &Plan) -> PathBuf {
    let path = dir.join("plan.toml");
    let content =
        toml::to_string_pretty(&PlanToml::from_plan(plan)).expect("plan should serialize");
    std::fs::write(&path, content).expect("failed to write plan file");
    path
}

/// Write [`SAMPLE_CATALOG`] to `dir/catalog.toml` and return the path.
pub fn write_sample_catalog(dir: &Path) -> PathBuf {
    let path = dir.join("catalog.toml");
    std::fs::write(&path, SAMPLE_CATALOG).expect("failed to write catalog file");
    path
}
