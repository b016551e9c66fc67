//! Plan snapshot parser with validation.
//!
//! Parses a `plan.toml` string into a [`Plan`] and validates:
//! - Term ids are unique.
//! - No course is placed in more than one term (or twice in one term).
//! - No course is both taken and placed.
//! - Registry entries are unique.
//!
//! Malformed requirement expressions inside `[[courses]]` surface as TOML
//! errors, since they fail during deserialization.

use std::collections::HashSet;

use thiserror::Error;

use crate::course::CourseCode;

use super::toml_format::PlanToml;
use super::{Plan, TermId};

/// Errors that can occur during plan parsing and validation.
#[derive(Debug, Error)]
pub enum PlanParseError {
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("duplicate term id: {0}")]
    DuplicateTermId(TermId),

    #[error("course {0} is placed more than once")]
    DuplicatePlacement(CourseCode),

    #[error("course {0} is marked taken but is also placed in a term")]
    TakenAndPlaced(CourseCode),

    #[error("duplicate registry entry for course {0}")]
    DuplicateCourse(CourseCode),
}

/// Parse and validate a `plan.toml` string.
pub fn parse_plan_toml(content: &str) -> Result<Plan, PlanParseError> {
    let snapshot: PlanToml = toml::from_str(content)?;
    validate(&snapshot)?;
    Ok(snapshot.into_plan())
}

fn validate(snapshot: &PlanToml) -> Result<(), PlanParseError> {
    let mut term_ids = HashSet::new();
    for term in &snapshot.terms {
        if !term_ids.insert(term.id) {
            return Err(PlanParseError::DuplicateTermId(term.id));
        }
    }

    let mut placed = HashSet::new();
    for code in snapshot.terms.iter().flat_map(|t| &t.courses) {
        if !placed.insert(code) {
            return Err(PlanParseError::DuplicatePlacement(code.clone()));
        }
    }

    if let Some(code) = snapshot.taken.iter().find(|c| placed.contains(c)) {
        return Err(PlanParseError::TakenAndPlaced(code.clone()));
    }

    let mut registered = HashSet::new();
    for course in &snapshot.courses {
        if !registered.insert(&course.code) {
            return Err(PlanParseError::DuplicateCourse(course.code.clone()));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const T1: &str = "6f1c7f3e-9a3b-4c1d-8e2f-0a1b2c3d4e5f";
    const T2: &str = "0d9e8f7a-6b5c-4d3e-9f1a-2b3c4d5e6f70";

    #[test]
    fn parse_valid_snapshot() {
        let toml_str = format!(
            r#"
taken = ["MATH 135"]

[plan]
name = "Honours CS"

[[terms]]
id = "{T1}"
name = "Fall 2026"
courses = ["CS 135"]

[[terms]]
id = "{T2}"
courses = ["CS 136"]

[[courses]]
code = "CS 135"
name = "Designing Functional Programs"
credits = 1

[[courses]]
code = "CS 136"
credits = 1
prerequisites = ["CS 135 | CS 145"]
"#
        );
        let plan = parse_plan_toml(&toml_str).expect("should parse");
        assert_eq!(plan.name(), "Honours CS");
        assert_eq!(plan.terms().len(), 2);

        let t2: TermId = T2.parse().unwrap();
        assert_eq!(plan.term_display_name(t2).unwrap(), "Term 2");
        assert_eq!(plan.term_of(&CourseCode::new("cs 136").unwrap()), Some(t2));
        assert!(plan.is_taken(&CourseCode::new("MATH 135").unwrap()));
        assert_eq!(plan.registry().len(), 2);
    }

    #[test]
    fn rejects_duplicate_term_id() {
        let toml_str = format!(
            r#"
[plan]
name = "p"

[[terms]]
id = "{T1}"

[[terms]]
id = "{T1}"
"#
        );
        let err = parse_plan_toml(&toml_str).unwrap_err();
        assert!(matches!(err, PlanParseError::DuplicateTermId(_)), "got: {err}");
    }

    #[test]
    fn rejects_course_in_two_terms() {
        let toml_str = format!(
            r#"
[plan]
name = "p"

[[terms]]
id = "{T1}"
courses = ["CS 135"]

[[terms]]
id = "{T2}"
courses = ["cs 135"]
"#
        );
        let err = parse_plan_toml(&toml_str).unwrap_err();
        assert!(
            matches!(err, PlanParseError::DuplicatePlacement(ref c) if c.as_str() == "CS 135"),
            "got: {err}"
        );
    }

    #[test]
    fn rejects_taken_and_placed() {
        let toml_str = format!(
            r#"
taken = ["CS 135"]

[plan]
name = "p"

[[terms]]
id = "{T1}"
courses = ["CS 135"]
"#
        );
        let err = parse_plan_toml(&toml_str).unwrap_err();
        assert!(matches!(err, PlanParseError::TakenAndPlaced(_)), "got: {err}");
    }

    #[test]
    fn rejects_duplicate_registry_entry() {
        let toml_str = r#"
[plan]
name = "p"

[[courses]]
code = "CS 135"

[[courses]]
code = "CS 135"
"#;
        let err = parse_plan_toml(toml_str).unwrap_err();
        assert!(matches!(err, PlanParseError::DuplicateCourse(_)), "got: {err}");
    }

    #[test]
    fn rejects_bad_requirement_expression() {
        let toml_str = r#"
[plan]
name = "p"

[[courses]]
code = "CS 136"
prerequisites = ["(CS 135"]
"#;
        let err = parse_plan_toml(toml_str).unwrap_err();
        assert!(matches!(err, PlanParseError::TomlError(_)), "got: {err}");
    }

    #[test]
    fn snapshot_round_trips_through_plan() {
        let toml_str = format!(
            r#"
[plan]
name = "p"

[[terms]]
id = "{T1}"
courses = ["A 1"]

[[courses]]
code = "A 1"
credits = 2
"#
        );
        let plan = parse_plan_toml(&toml_str).unwrap();
        let written = toml::to_string(&PlanToml::from_plan(&plan)).unwrap();
        let reparsed = parse_plan_toml(&written).unwrap();
        assert_eq!(plan, reparsed);
    }
}
