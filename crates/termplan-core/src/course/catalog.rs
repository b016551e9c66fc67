//! Course catalog TOML parser with validation.
//!
//! Parses a catalog file into a [`Catalog`] and validates:
//! - The catalog contains at least one course.
//! - Course codes are unique.
//! - No requirement list contains an empty group.
//! - No course lists itself as a requisite.
//!
//! Prerequisite cycles are detected with Kahn's algorithm but only reported:
//! published calendars routinely contain mutually exclusive pairs and the
//! evaluator handles them fine.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Course, CourseCode, CourseRegistry};

/// Top-level structure of a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CatalogToml {
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// A validated catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub courses: CourseRegistry,
    /// Codes involved in a prerequisite cycle, in catalog order. Empty when
    /// the prerequisite graph is acyclic.
    pub prerequisite_cycle: Vec<CourseCode>,
}

/// Errors that can occur during catalog parsing and validation.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("catalog must contain at least one course")]
    NoCourses,

    #[error("duplicate course code: {0}")]
    DuplicateCourse(CourseCode),

    #[error("course {course} has an empty group in its {list}")]
    EmptyGroup { course: CourseCode, list: &'static str },

    #[error("course {course} lists itself in its {list}")]
    SelfReference { course: CourseCode, list: &'static str },
}

/// Parse and validate a catalog TOML string.
pub fn parse_catalog_toml(content: &str) -> Result<Catalog, CatalogError> {
    let raw: CatalogToml = toml::from_str(content)?;
    build_catalog(raw.courses)
}

/// Validate a list of courses and index it into a [`Catalog`].
pub fn build_catalog(courses: Vec<Course>) -> Result<Catalog, CatalogError> {
    if courses.is_empty() {
        return Err(CatalogError::NoCourses);
    }

    let mut seen = HashSet::new();
    for course in &courses {
        if !seen.insert(&course.code) {
            return Err(CatalogError::DuplicateCourse(course.code.clone()));
        }
        validate_lists(course)?;
    }

    let prerequisite_cycle = find_prerequisite_cycle(&courses);

    Ok(Catalog {
        courses: courses.into_iter().collect(),
        prerequisite_cycle,
    })
}

fn validate_lists(course: &Course) -> Result<(), CatalogError> {
    let lists = [
        ("prerequisites", &course.prerequisites),
        ("corequisites", &course.corequisites),
        ("antirequisites", &course.antirequisites),
    ];

    for (list, reqs) in lists {
        for req in reqs {
            if req.has_empty_group() {
                return Err(CatalogError::EmptyGroup {
                    course: course.code.clone(),
                    list,
                });
            }
            if req.mentions(&course.code) {
                return Err(CatalogError::SelfReference {
                    course: course.code.clone(),
                    list,
                });
            }
        }
    }

    Ok(())
}

/// Kahn's algorithm over prerequisite edges between catalog courses.
///
/// Returns the codes left with a non-zero in-degree, i.e. those on or
/// downstream of a cycle.
fn find_prerequisite_cycle(courses: &[Course]) -> Vec<CourseCode> {
    let code_to_idx: HashMap<&CourseCode, usize> = courses
        .iter()
        .enumerate()
        .map(|(i, c)| (&c.code, i))
        .collect();

    let n = courses.len();
    let mut in_degree = vec![0usize; n];
    let mut adj: Vec<Vec<usize>> = vec![vec![]; n];

    for (course_idx, course) in courses.iter().enumerate() {
        let mut deps: Vec<usize> = course
            .prerequisites
            .iter()
            .flat_map(|r| r.codes())
            .filter_map(|code| code_to_idx.get(code).copied())
            .collect();
        deps.sort_unstable();
        deps.dedup();

        for dep_idx in deps {
            // Edge: prerequisite -> course.
            adj[dep_idx].push(course_idx);
            in_degree[course_idx] += 1;
        }
    }

    let mut queue: VecDeque<usize> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg == 0)
        .map(|(i, _)| i)
        .collect();

    while let Some(node) = queue.pop_front() {
        for &neighbor in &adj[node] {
            in_degree[neighbor] -= 1;
            if in_degree[neighbor] == 0 {
                queue.push_back(neighbor);
            }
        }
    }

    in_degree
        .iter()
        .enumerate()
        .filter(|(_, deg)| **deg > 0)
        .map(|(i, _)| courses[i].code.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_catalog() {
        let toml_str = r#"
[[courses]]
code = "CS 135"
name = "Designing Functional Programs"
credits = 1

[[courses]]
code = "CS 136"
name = "Elementary Algorithm Design"
credits = 1
prerequisites = ["CS 135 | CS 145"]
antirequisites = ["CS 146"]
notes = ["Offered every term"]
"#;
        let catalog = parse_catalog_toml(toml_str).expect("should parse");
        assert_eq!(catalog.courses.len(), 2);
        assert!(catalog.prerequisite_cycle.is_empty());

        let cs136 = catalog.courses.get("CS 136").unwrap();
        assert_eq!(cs136.prerequisites[0].to_string(), "CS 135 | CS 145");
        assert_eq!(cs136.notes, vec!["Offered every term"]);
    }

    #[test]
    fn rejects_missing_courses() {
        let err = parse_catalog_toml("").unwrap_err();
        assert!(matches!(err, CatalogError::NoCourses), "expected NoCourses, got: {err}");
    }

    #[test]
    fn rejects_duplicate_codes_after_normalisation() {
        let toml_str = r#"
[[courses]]
code = "cs 135"

[[courses]]
code = "CS  135"
"#;
        let err = parse_catalog_toml(toml_str).unwrap_err();
        assert!(
            matches!(err, CatalogError::DuplicateCourse(ref c) if c.as_str() == "CS 135"),
            "expected DuplicateCourse, got: {err}"
        );
    }

    #[test]
    fn rejects_empty_group() {
        let toml_str = r#"
[[courses]]
code = "CS 136"
prerequisites = [{ any_of = [] }]
"#;
        let err = parse_catalog_toml(toml_str).unwrap_err();
        assert!(
            matches!(err, CatalogError::EmptyGroup { list: "prerequisites", .. }),
            "expected EmptyGroup, got: {err}"
        );
    }

    #[test]
    fn rejects_self_reference() {
        let toml_str = r#"
[[courses]]
code = "CS 136"
corequisites = ["CS 136 | CS 146"]
"#;
        let err = parse_catalog_toml(toml_str).unwrap_err();
        assert!(
            matches!(err, CatalogError::SelfReference { list: "corequisites", .. }),
            "expected SelfReference, got: {err}"
        );
    }

    #[test]
    fn rejects_malformed_requirement() {
        let toml_str = r#"
[[courses]]
code = "CS 136"
prerequisites = ["CS 135 &"]
"#;
        let err = parse_catalog_toml(toml_str).unwrap_err();
        assert!(matches!(err, CatalogError::TomlError(_)), "expected TomlError, got: {err}");
    }

    #[test]
    fn reports_prerequisite_cycle() {
        let toml_str = r#"
[[courses]]
code = "A 1"
prerequisites = ["B 1"]

[[courses]]
code = "B 1"
prerequisites = ["A 1"]

[[courses]]
code = "C 1"
"#;
        let catalog = parse_catalog_toml(toml_str).expect("cycles are not fatal");
        let cycle: Vec<&str> = catalog.prerequisite_cycle.iter().map(|c| c.as_str()).collect();
        assert_eq!(cycle, vec!["A 1", "B 1"]);
    }

    #[test]
    fn references_outside_catalog_are_ignored_for_cycles() {
        let toml_str = r#"
[[courses]]
code = "A 1"
prerequisites = ["ZZZ 999"]
"#;
        let catalog = parse_catalog_toml(toml_str).expect("should parse");
        assert!(catalog.prerequisite_cycle.is_empty());
    }
}
