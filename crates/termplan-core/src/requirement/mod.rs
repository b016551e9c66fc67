//! Requirement expressions.
//!
//! A requirement is either a single course code or a boolean group of
//! nested requirements. The evaluator supplies the predicate that decides
//! whether a single course "counts" (placed earlier, same term, taken, ...);
//! this module only knows how to combine those answers.

pub mod parser;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::course::CourseCode;

pub use parser::{RequirementParseError, parse_requirement};

/// A requirement expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRequirement", into = "RawRequirement")]
pub enum Requirement {
    /// Satisfied when the predicate holds for this course.
    Course(CourseCode),
    /// Satisfied when every branch is satisfied.
    AllOf(Vec<Requirement>),
    /// Satisfied when at least one branch is satisfied.
    AnyOf(Vec<Requirement>),
}

impl Requirement {
    pub fn course(code: CourseCode) -> Self {
        Self::Course(code)
    }

    pub fn all_of(items: impl IntoIterator<Item = Requirement>) -> Self {
        Self::AllOf(items.into_iter().collect())
    }

    pub fn any_of(items: impl IntoIterator<Item = Requirement>) -> Self {
        Self::AnyOf(items.into_iter().collect())
    }

    /// Evaluate the expression with short-circuiting: `AllOf` stops at the
    /// first failing branch, `AnyOf` at the first passing one.
    ///
    /// An empty `AllOf` is satisfied and an empty `AnyOf` is not.
    pub fn evaluate<F>(&self, pred: &F) -> bool
    where
        F: Fn(&CourseCode) -> bool,
    {
        match self {
            Self::Course(code) => pred(code),
            Self::AllOf(items) => items.iter().all(|r| r.evaluate(pred)),
            Self::AnyOf(items) => items.iter().any(|r| r.evaluate(pred)),
        }
    }

    /// All course codes in the expression, depth-first, left to right.
    pub fn codes(&self) -> Vec<&CourseCode> {
        let mut out = Vec::new();
        self.collect_codes(&mut out);
        out
    }

    fn collect_codes<'a>(&'a self, out: &mut Vec<&'a CourseCode>) {
        match self {
            Self::Course(code) => out.push(code),
            Self::AllOf(items) | Self::AnyOf(items) => {
                for item in items {
                    item.collect_codes(out);
                }
            }
        }
    }

    /// Whether any group in the expression has no branches.
    pub fn has_empty_group(&self) -> bool {
        match self {
            Self::Course(_) => false,
            Self::AllOf(items) | Self::AnyOf(items) => {
                items.is_empty() || items.iter().any(Requirement::has_empty_group)
            }
        }
    }

    pub fn mentions(&self, code: &CourseCode) -> bool {
        self.codes().contains(&code)
    }
}

impl From<CourseCode> for Requirement {
    fn from(code: CourseCode) -> Self {
        Self::Course(code)
    }
}

// ---------------------------------------------------------------------------
// Display: the same grammar accepted by `parse_requirement`
// ---------------------------------------------------------------------------

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Course(code) => write!(f, "{code}"),
            Self::AllOf(items) => write_group(f, items, " & "),
            Self::AnyOf(items) => write_group(f, items, " | "),
        }
    }
}

fn write_group(f: &mut fmt::Formatter<'_>, items: &[Requirement], sep: &str) -> fmt::Result {
    if items.is_empty() {
        return f.write_str("()");
    }
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write_nested(f, item)?;
    }
    Ok(())
}

/// Nested groups are always parenthesised; single-branch groups collapse to
/// their branch.
fn write_nested(f: &mut fmt::Formatter<'_>, item: &Requirement) -> fmt::Result {
    match item {
        Requirement::Course(code) => write!(f, "{code}"),
        Requirement::AllOf(items) | Requirement::AnyOf(items) if items.len() == 1 => {
            write_nested(f, &items[0])
        }
        group => write!(f, "({group})"),
    }
}

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

/// On-disk shape of a requirement: either a textual expression or an
/// explicit group table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawRequirement {
    Text(String),
    AllOf { all_of: Vec<Requirement> },
    AnyOf { any_of: Vec<Requirement> },
}

impl TryFrom<RawRequirement> for Requirement {
    type Error = RequirementParseError;

    fn try_from(raw: RawRequirement) -> Result<Self, Self::Error> {
        match raw {
            RawRequirement::Text(text) => parse_requirement(&text),
            RawRequirement::AllOf { all_of } => Ok(Self::AllOf(all_of)),
            RawRequirement::AnyOf { any_of } => Ok(Self::AnyOf(any_of)),
        }
    }
}

impl From<Requirement> for RawRequirement {
    fn from(req: Requirement) -> Self {
        match req {
            Requirement::Course(code) => Self::Text(code.into()),
            // Groups whose branches are all plain codes stay readable as text.
            group if is_flat_group(&group) => Self::Text(group.to_string()),
            Requirement::AllOf(all_of) => Self::AllOf { all_of },
            Requirement::AnyOf(any_of) => Self::AnyOf { any_of },
        }
    }
}

fn is_flat_group(req: &Requirement) -> bool {
    match req {
        Requirement::AllOf(items) | Requirement::AnyOf(items) => {
            !items.is_empty() && items.iter().all(|i| matches!(i, Requirement::Course(_)))
        }
        Requirement::Course(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> Requirement {
        Requirement::course(CourseCode::new(s).unwrap())
    }

    #[test]
    fn evaluate_any_of_short_circuits() {
        let req = Requirement::any_of([c("A 1"), c("B 1")]);
        let pred = |code: &CourseCode| code.as_str() == "B 1";
        assert!(req.evaluate(&pred));

        let none = |_: &CourseCode| false;
        assert!(!req.evaluate(&none));
    }

    #[test]
    fn evaluate_all_of_requires_every_branch() {
        let req = Requirement::all_of([c("A 1"), Requirement::any_of([c("B 1"), c("C 1")])]);
        let only_a = |code: &CourseCode| code.as_str() == "A 1";
        assert!(!req.evaluate(&only_a));

        let a_and_c = |code: &CourseCode| matches!(code.as_str(), "A 1" | "C 1");
        assert!(req.evaluate(&a_and_c));
    }

    #[test]
    fn empty_groups_follow_identity_elements() {
        let always = |_: &CourseCode| true;
        assert!(Requirement::AllOf(vec![]).evaluate(&always));
        assert!(!Requirement::AnyOf(vec![]).evaluate(&always));
        assert!(Requirement::any_of([Requirement::AllOf(vec![])]).has_empty_group());
    }

    #[test]
    fn display_parenthesises_nested_groups() {
        let req = Requirement::all_of([
            Requirement::any_of([c("MATH 135"), c("MATH 145")]),
            c("CS 136"),
        ]);
        assert_eq!(req.to_string(), "(MATH 135 | MATH 145) & CS 136");
    }

    #[test]
    fn display_collapses_single_branch_groups() {
        let req = Requirement::any_of([Requirement::all_of([c("CS 135")]), c("CS 145")]);
        assert_eq!(req.to_string(), "CS 135 | CS 145");
    }

    #[test]
    fn deserializes_text_and_tables() {
        #[derive(Deserialize)]
        struct Wrapper {
            reqs: Vec<Requirement>,
        }

        let toml_str = r#"
reqs = [
    "cs 135",
    "MATH 135 | MATH 145",
    { all_of = ["CS 136", { any_of = ["STAT 230", "STAT 240"] }] },
]
"#;
        let parsed: Wrapper = toml::from_str(toml_str).expect("should parse");
        assert_eq!(parsed.reqs[0], c("CS 135"));
        assert_eq!(parsed.reqs[1], Requirement::any_of([c("MATH 135"), c("MATH 145")]));
        assert_eq!(
            parsed.reqs[2],
            Requirement::all_of([c("CS 136"), Requirement::any_of([c("STAT 230"), c("STAT 240")])])
        );
    }

    #[test]
    fn serializes_flat_groups_as_text() {
        #[derive(Serialize)]
        struct Wrapper {
            reqs: Vec<Requirement>,
        }

        let out = toml::to_string(&Wrapper {
            reqs: vec![Requirement::any_of([c("A 1"), c("B 2")])],
        })
        .unwrap();
        assert!(out.contains(r#""A 1 | B 2""#), "unexpected output: {out}");
    }
}
