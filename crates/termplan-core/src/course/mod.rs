//! Course metadata: codes, credits, requirement lists, and the registry of
//! courses known to a plan.

pub mod catalog;

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::requirement::Requirement;

pub use catalog::{Catalog, CatalogError, CatalogToml, build_catalog, parse_catalog_toml};

// ---------------------------------------------------------------------------
// CourseCode
// ---------------------------------------------------------------------------

/// Characters that carry meaning in the requirement grammar and therefore
/// cannot appear inside a course code.
pub const RESERVED_CHARS: [char; 4] = ['(', ')', '&', '|'];

/// A normalised course identifier such as `CS 135`.
///
/// Codes are trimmed, runs of whitespace collapse to a single space, and
/// letters are upper-cased, so `" cs   135"` and `"CS 135"` compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseCode(String);

impl CourseCode {
    pub fn new(raw: &str) -> Result<Self, CourseCodeError> {
        let normalised = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_uppercase();

        if normalised.is_empty() {
            return Err(CourseCodeError::Empty);
        }
        if let Some(c) = normalised.chars().find(|c| RESERVED_CHARS.contains(c)) {
            return Err(CourseCodeError::ReservedChar {
                code: normalised,
                ch: c,
            });
        }
        Ok(Self(normalised))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CourseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CourseCode {
    type Err = CourseCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CourseCode {
    type Error = CourseCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CourseCode> for String {
    fn from(code: CourseCode) -> Self {
        code.0
    }
}

impl Borrow<str> for CourseCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Error returned when a string cannot be used as a [`CourseCode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CourseCodeError {
    #[error("course code must not be empty")]
    Empty,

    #[error("course code {code:?} contains reserved character {ch:?}")]
    ReservedChar { code: String, ch: char },
}

// ---------------------------------------------------------------------------
// Credits
// ---------------------------------------------------------------------------

/// Credit weight of a course. Negative values mark a non-credit course that
/// is excluded from totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credits(pub i32);

impl Credits {
    /// Sentinel used by catalogs for non-credit courses.
    pub const NON_CREDIT: Credits = Credits(-1);

    pub fn is_counted(self) -> bool {
        self.0 >= 0
    }

    /// Credits that contribute to a total (0 for non-credit courses).
    pub fn counted(self) -> u32 {
        u32::try_from(self.0).unwrap_or(0)
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_counted() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("non-credit")
        }
    }
}

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

/// Metadata for a single course.
///
/// Each requirement list has "all of" semantics: every listed expression
/// must hold for the list to be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub code: CourseCode,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub credits: Credits,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prerequisites: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub antirequisites: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub corequisites: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl Course {
    /// A course with no requirements.
    pub fn new(code: CourseCode, name: impl Into<String>, credits: Credits) -> Self {
        Self {
            code,
            name: name.into(),
            credits,
            prerequisites: Vec::new(),
            antirequisites: Vec::new(),
            corequisites: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_prerequisite(mut self, requirement: Requirement) -> Self {
        self.prerequisites.push(requirement);
        self
    }

    pub fn with_corequisite(mut self, requirement: Requirement) -> Self {
        self.corequisites.push(requirement);
        self
    }

    pub fn with_antirequisite(mut self, requirement: Requirement) -> Self {
        self.antirequisites.push(requirement);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn has_requirements(&self) -> bool {
        !(self.prerequisites.is_empty()
            && self.antirequisites.is_empty()
            && self.corequisites.is_empty())
    }

    /// Every course code referenced by any requirement list, in list order,
    /// without duplicates.
    pub fn referenced_codes(&self) -> Vec<&CourseCode> {
        let mut out: Vec<&CourseCode> = Vec::new();
        for req in self
            .prerequisites
            .iter()
            .chain(&self.corequisites)
            .chain(&self.antirequisites)
        {
            for code in req.codes() {
                if !out.contains(&code) {
                    out.push(code);
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// CourseRegistry
// ---------------------------------------------------------------------------

/// Courses known to a plan, keyed by code.
///
/// A code that is placed in a term but absent from the registry represents a
/// pending fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseRegistry {
    courses: BTreeMap<CourseCode, Course>,
}

impl CourseRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, code: &str) -> Option<&Course> {
        self.courses.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.courses.contains_key(code)
    }

    /// Insert or replace a course, returning the previous entry.
    pub fn insert(&mut self, course: Course) -> Option<Course> {
        self.courses.insert(course.code.clone(), course)
    }

    pub fn remove(&mut self, code: &str) -> Option<Course> {
        self.courses.remove(code)
    }

    /// Iterate courses in code order.
    pub fn iter(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl FromIterator<Course> for CourseRegistry {
    fn from_iter<I: IntoIterator<Item = Course>>(iter: I) -> Self {
        let mut registry = Self::new();
        for course in iter {
            registry.insert(course);
        }
        registry
    }
}
