//! Satisfaction evaluator.
//!
//! Given a course, the plan it lives in and the term it is (or would be)
//! placed in, decide whether its prerequisites, corequisites and
//! antirequisites are satisfied. Evaluation is a pure function of its
//! inputs: it borrows the plan immutably and keeps no state between calls.
//!
//! Temporal predicates, relative to the subject's term index `s`:
//!
//! | list           | a referenced course counts when it is...       |
//! |----------------|------------------------------------------------|
//! | prerequisites  | taken, or placed in a term with index `< s`    |
//! | corequisites   | taken, or placed in a term with index `<= s`   |
//! | antirequisites | taken, or placed in a term with index `<= s`   |
//!
//! A counting antirequisite is a conflict, and any conflict makes the
//! course unsatisfied regardless of the other lists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::course::{Course, CourseCode};
use crate::error::{PlannerError, Result};
use crate::plan::{Plan, TermId};
use crate::requirement::Requirement;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// How references to courses the plan has never heard of are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingCoursePolicy {
    /// An unknown course is simply absent: it never satisfies anything.
    #[default]
    Unsatisfied,
    /// An unknown course satisfies prerequisites and corequisites. Useful
    /// when the catalog is incomplete.
    Ignore,
}

impl fmt::Display for MissingCoursePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unsatisfied => "unsatisfied",
            Self::Ignore => "ignore",
        };
        f.write_str(s)
    }
}

impl FromStr for MissingCoursePolicy {
    type Err = MissingCoursePolicyParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "unsatisfied" => Ok(Self::Unsatisfied),
            "ignore" => Ok(Self::Ignore),
            other => Err(MissingCoursePolicyParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`MissingCoursePolicy`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid missing-course policy: {0:?} (expected unsatisfied or ignore)")]
pub struct MissingCoursePolicyParseError(pub String);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalOptions {
    pub missing_courses: MissingCoursePolicy,
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequirementKind {
    Prerequisite,
    Corequisite,
    Antirequisite,
}

impl fmt::Display for RequirementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Prerequisite => "prerequisite",
            Self::Corequisite => "corequisite",
            Self::Antirequisite => "antirequisite",
        };
        f.write_str(s)
    }
}

/// Result of one listed requirement expression.
///
/// For antirequisites `satisfied` means "no conflict".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementOutcome {
    pub kind: RequirementKind,
    pub requirement: Requirement,
    pub satisfied: bool,
}

/// Verdict for a single course in a single term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SatisfactionReport {
    pub course: CourseCode,
    pub term: TermId,
    /// One entry per listed expression, in list order: prerequisites, then
    /// corequisites, then antirequisites.
    pub outcomes: Vec<RequirementOutcome>,
    /// Antirequisite expressions that matched.
    pub conflicts: Vec<Requirement>,
    /// Prerequisite/corequisite codes that are neither placed nor taken,
    /// sorted and de-duplicated.
    pub missing: Vec<CourseCode>,
    pub satisfied: bool,
}

impl SatisfactionReport {
    pub fn prerequisites_met(&self) -> bool {
        self.kind_met(RequirementKind::Prerequisite)
    }

    pub fn corequisites_met(&self) -> bool {
        self.kind_met(RequirementKind::Corequisite)
    }

    pub fn has_conflict(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Outcomes of one kind that failed.
    pub fn failed(&self, kind: RequirementKind) -> impl Iterator<Item = &RequirementOutcome> {
        self.outcomes
            .iter()
            .filter(move |o| o.kind == kind && !o.satisfied)
    }

    fn kind_met(&self, kind: RequirementKind) -> bool {
        self.failed(kind).next().is_none()
    }
}

/// Credits scheduled in one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermCredits {
    pub term: TermId,
    pub name: String,
    pub credits: u32,
}

/// Verdicts for every placed course in a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanReport {
    /// One report per placed, registered course, in term order.
    pub courses: Vec<SatisfactionReport>,
    /// Placed courses without registry metadata (not evaluated).
    pub pending: Vec<CourseCode>,
    pub terms: Vec<TermCredits>,
    pub total_credits: u32,
}

impl PlanReport {
    pub fn unsatisfied(&self) -> impl Iterator<Item = &SatisfactionReport> {
        self.courses.iter().filter(|r| !r.satisfied)
    }

    pub fn is_satisfied(&self) -> bool {
        self.unsatisfied().next().is_none()
    }

    pub fn get(&self, code: &CourseCode) -> Option<&SatisfactionReport> {
        self.courses.iter().find(|r| &r.course == code)
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Where a referenced course sits relative to the subject's term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Standing {
    Taken,
    Placed(usize),
    Absent,
}

struct Context<'a> {
    plan: &'a Plan,
    subject: &'a CourseCode,
    term_index: usize,
    options: &'a EvalOptions,
}

impl Context<'_> {
    fn standing(&self, code: &CourseCode) -> Standing {
        if self.plan.is_taken(code) {
            Standing::Taken
        } else {
            match self.plan.location(code) {
                Some(p) => Standing::Placed(p.term_index),
                None => Standing::Absent,
            }
        }
    }

    fn unknown_ignored(&self, code: &CourseCode) -> bool {
        self.options.missing_courses == MissingCoursePolicy::Ignore
            && !self.plan.registry().contains(code.as_str())
    }

    fn prerequisite_counts(&self, code: &CourseCode) -> bool {
        match self.standing(code) {
            Standing::Taken => true,
            Standing::Placed(idx) => idx < self.term_index,
            Standing::Absent => self.unknown_ignored(code),
        }
    }

    fn corequisite_counts(&self, code: &CourseCode) -> bool {
        match self.standing(code) {
            Standing::Taken => true,
            Standing::Placed(idx) => idx <= self.term_index,
            Standing::Absent => self.unknown_ignored(code),
        }
    }

    fn antirequisite_present(&self, code: &CourseCode) -> bool {
        if code == self.subject {
            return false;
        }
        match self.standing(code) {
            Standing::Taken => true,
            Standing::Placed(idx) => idx <= self.term_index,
            Standing::Absent => false,
        }
    }
}

/// Evaluate `course` as if it were placed in `term`.
///
/// The course does not need to actually be placed there, which lets callers
/// preview a drop target. Fails only when `term` is not part of the plan.
pub fn evaluate_course(
    course: &Course,
    plan: &Plan,
    term: TermId,
    options: &EvalOptions,
) -> Result<SatisfactionReport> {
    let term_index = plan.term_index(term).ok_or(PlannerError::TermNotFound(term))?;
    let ctx = Context {
        plan,
        subject: &course.code,
        term_index,
        options,
    };

    let mut outcomes = Vec::with_capacity(
        course.prerequisites.len() + course.corequisites.len() + course.antirequisites.len(),
    );

    for req in &course.prerequisites {
        outcomes.push(RequirementOutcome {
            kind: RequirementKind::Prerequisite,
            requirement: req.clone(),
            satisfied: req.evaluate(&|c: &CourseCode| ctx.prerequisite_counts(c)),
        });
    }
    for req in &course.corequisites {
        outcomes.push(RequirementOutcome {
            kind: RequirementKind::Corequisite,
            requirement: req.clone(),
            satisfied: req.evaluate(&|c: &CourseCode| ctx.corequisite_counts(c)),
        });
    }

    let mut conflicts = Vec::new();
    for req in &course.antirequisites {
        let present = req.evaluate(&|c: &CourseCode| ctx.antirequisite_present(c));
        if present {
            conflicts.push(req.clone());
        }
        outcomes.push(RequirementOutcome {
            kind: RequirementKind::Antirequisite,
            requirement: req.clone(),
            satisfied: !present,
        });
    }

    let mut missing: Vec<CourseCode> = course
        .prerequisites
        .iter()
        .chain(&course.corequisites)
        .flat_map(Requirement::codes)
        .filter(|c| ctx.standing(c) == Standing::Absent)
        .cloned()
        .collect();
    missing.sort();
    missing.dedup();

    let satisfied = conflicts.is_empty() && outcomes.iter().all(|o| o.satisfied);

    Ok(SatisfactionReport {
        course: course.code.clone(),
        term,
        outcomes,
        conflicts,
        missing,
        satisfied,
    })
}

/// Evaluate every placed course in its current term.
pub fn evaluate_plan(plan: &Plan, options: &EvalOptions) -> PlanReport {
    let mut courses = Vec::new();
    let mut pending = Vec::new();

    for (_, term, code) in plan.placed_courses() {
        let Some(course) = plan.course(code.as_str()) else {
            pending.push(code.clone());
            continue;
        };
        // The term comes from the plan itself, so it always resolves.
        if let Ok(report) = evaluate_course(course, plan, term.id(), options) {
            courses.push(report);
        }
    }

    let terms = plan
        .terms()
        .iter()
        .enumerate()
        .map(|(idx, term)| TermCredits {
            term: term.id(),
            name: term.display_name(idx),
            credits: plan.term_credits(term.id()).unwrap_or(0),
        })
        .collect();

    PlanReport {
        courses,
        pending,
        terms,
        total_credits: plan.total_credits(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::Credits;

    fn code(s: &str) -> CourseCode {
        CourseCode::new(s).unwrap()
    }

    fn req(s: &str) -> Requirement {
        crate::requirement::parse_requirement(s).unwrap()
    }

    /// Plan with `terms` terms; each `(code, term_index)` is registered and
    /// placed.
    fn plan_with(courses: Vec<(Course, usize)>, terms: usize) -> Plan {
        let mut plan = Plan::with_terms("t", terms);
        for (course, term_idx) in courses {
            let c = course.code.clone();
            plan.register_course(course);
            let term = plan.terms()[term_idx].id();
            plan.place_course(&c, term, None).unwrap();
        }
        plan
    }

    fn course(s: &str) -> Course {
        Course::new(code(s), s, Credits(1))
    }

    #[test]
    fn course_without_requirements_is_satisfied() {
        let plan = plan_with(vec![(course("A 1"), 0)], 1);
        let report =
            evaluate_course(&course("A 1"), &plan, plan.terms()[0].id(), &EvalOptions::default())
                .unwrap();
        assert!(report.satisfied);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn prerequisite_in_same_term_does_not_count() {
        let x = course("X 1").with_prerequisite(req("Y 1"));
        let plan = plan_with(vec![(course("Y 1"), 0), (x.clone(), 0)], 1);
        let report =
            evaluate_course(&x, &plan, plan.terms()[0].id(), &EvalOptions::default()).unwrap();
        assert!(!report.satisfied);
        assert!(!report.prerequisites_met());
    }

    #[test]
    fn taken_course_satisfies_prerequisite_and_triggers_antirequisite() {
        let x = course("X 1")
            .with_prerequisite(req("Y 1"))
            .with_antirequisite(req("W 1"));
        let mut plan = plan_with(vec![(x.clone(), 0)], 1);
        plan.mark_taken(&code("Y 1")).unwrap();

        let t = plan.terms()[0].id();
        let report = evaluate_course(&x, &plan, t, &EvalOptions::default()).unwrap();
        assert!(report.satisfied);

        plan.mark_taken(&code("W 1")).unwrap();
        let report = evaluate_course(&x, &plan, t, &EvalOptions::default()).unwrap();
        assert!(!report.satisfied);
        assert_eq!(report.conflicts, vec![req("W 1")]);
    }

    #[test]
    fn antirequisite_in_later_term_is_not_a_conflict() {
        let x = course("X 1").with_antirequisite(req("W 1"));
        let plan = plan_with(vec![(x.clone(), 0), (course("W 1"), 1)], 2);
        let report =
            evaluate_course(&x, &plan, plan.terms()[0].id(), &EvalOptions::default()).unwrap();
        assert!(report.satisfied);
    }

    #[test]
    fn course_never_conflicts_with_itself() {
        let x = course("X 1").with_antirequisite(req("X 1 | W 1"));
        let plan = plan_with(vec![(x.clone(), 0)], 1);
        let report =
            evaluate_course(&x, &plan, plan.terms()[0].id(), &EvalOptions::default()).unwrap();
        assert!(report.satisfied);
    }

    #[test]
    fn missing_codes_are_sorted_and_deduplicated() {
        let x = course("X 1")
            .with_prerequisite(req("B 1 | A 1"))
            .with_corequisite(req("A 1"));
        let plan = plan_with(vec![(x.clone(), 0)], 1);
        let report =
            evaluate_course(&x, &plan, plan.terms()[0].id(), &EvalOptions::default()).unwrap();
        assert_eq!(report.missing, vec![code("A 1"), code("B 1")]);
        assert!(!report.satisfied);
    }

    #[test]
    fn ignore_policy_only_covers_unregistered_codes() {
        let x = course("X 1").with_prerequisite(req("A 1 & B 1"));
        let mut plan = plan_with(vec![(x.clone(), 0)], 1);
        let t = plan.terms()[0].id();
        let ignore = EvalOptions {
            missing_courses: MissingCoursePolicy::Ignore,
        };

        let report = evaluate_course(&x, &plan, t, &ignore).unwrap();
        assert!(report.satisfied, "unknown codes should be ignored");
        assert_eq!(report.missing.len(), 2);

        // A registered but unplaced course is a real gap.
        plan.register_course(course("A 1"));
        let report = evaluate_course(&x, &plan, t, &ignore).unwrap();
        assert!(!report.satisfied);
    }

    #[test]
    fn unknown_term_is_an_error() {
        let plan = Plan::with_terms("t", 1);
        let err = evaluate_course(&course("X 1"), &plan, TermId::new(), &EvalOptions::default())
            .unwrap_err();
        assert!(matches!(err, PlannerError::TermNotFound(_)));
    }

    #[test]
    fn plan_report_lists_pending_and_credits() {
        let plan = plan_with(vec![(course("A 1"), 0)], 2);
        let mut snapshot = crate::plan::PlanToml::from_plan(&plan);
        snapshot.terms[1].courses.push(code("B 1"));
        let plan = snapshot.into_plan();

        let report = evaluate_plan(&plan, &EvalOptions::default());
        assert_eq!(report.courses.len(), 1);
        assert_eq!(report.pending, vec![code("B 1")]);
        assert_eq!(report.terms[0].credits, 1);
        assert_eq!(report.terms[1].name, "Term 2");
        assert_eq!(report.total_credits, 1);
        assert!(report.is_satisfied());
    }

    #[test]
    fn policy_parses() {
        assert_eq!(
            "ignore".parse::<MissingCoursePolicy>().unwrap(),
            MissingCoursePolicy::Ignore
        );
        assert!("skip".parse::<MissingCoursePolicy>().is_err());
    }
}
