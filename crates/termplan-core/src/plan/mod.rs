//! Plans: the ordered term sequence, the course registry, and the placement
//! operations that keep "each course in at most one term" true.
//!
//! Every mutating operation validates all of its inputs before touching any
//! state, so a rejected operation leaves the plan unchanged and no caller can
//! observe a course that is missing from every term or present in two.

pub mod parser;
pub mod service;
pub mod toml_format;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::course::{Course, CourseCode, CourseRegistry};
use crate::error::{PlannerError, Result};

pub use parser::{PlanParseError, parse_plan_toml};
pub use service::{Planner, RefreshSummary};
pub use toml_format::{PlanMeta, PlanToml, TermToml};

// ---------------------------------------------------------------------------
// Identifiers and policies
// ---------------------------------------------------------------------------

/// Stable identifier of a term. Display order is the term's position in the
/// plan, never its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(Uuid);

impl TermId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for TermId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TermId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// What happens when a term that still holds courses is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteTermPolicy {
    /// Refuse to delete a non-empty term.
    #[default]
    Reject,
    /// Un-place the term's courses (they stay in the registry) and delete it.
    Cascade,
}

impl fmt::Display for DeleteTermPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Reject => "reject",
            Self::Cascade => "cascade",
        };
        f.write_str(s)
    }
}

impl FromStr for DeleteTermPolicy {
    type Err = DeleteTermPolicyParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "reject" => Ok(Self::Reject),
            "cascade" => Ok(Self::Cascade),
            other => Err(DeleteTermPolicyParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`DeleteTermPolicy`] string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid delete-term policy: {0:?} (expected reject or cascade)")]
pub struct DeleteTermPolicyParseError(pub String);

// ---------------------------------------------------------------------------
// Term
// ---------------------------------------------------------------------------

/// One academic session: a named, ordered bucket of course codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term {
    id: TermId,
    name: Option<String>,
    courses: Vec<CourseCode>,
}

impl Term {
    pub fn new(name: Option<String>) -> Self {
        Self::with_id(TermId::new(), name)
    }

    pub fn with_id(id: TermId, name: Option<String>) -> Self {
        Self {
            id,
            name: name.filter(|n| !n.trim().is_empty()),
            courses: Vec::new(),
        }
    }

    pub fn id(&self) -> TermId {
        self.id
    }

    /// The explicit name, if one was set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The explicit name, or `Term N` for the 0-based `position`.
    pub fn display_name(&self, position: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("Term {}", position + 1),
        }
    }

    pub fn courses(&self) -> &[CourseCode] {
        &self.courses
    }

    pub fn contains(&self, code: &CourseCode) -> bool {
        self.courses.contains(code)
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub(crate) fn push_course(&mut self, code: CourseCode) {
        self.courses.push(code);
    }
}

/// Where a placed course sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub term: TermId,
    /// Position of the term in the plan.
    pub term_index: usize,
    /// Position of the course inside the term.
    pub position: usize,
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// A complete course plan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    name: String,
    terms: Vec<Term>,
    registry: CourseRegistry,
    taken: BTreeSet<CourseCode>,
}

impl Plan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A plan with `count` unnamed terms.
    pub fn with_terms(name: impl Into<String>, count: usize) -> Self {
        let mut plan = Self::new(name);
        for _ in 0..count {
            plan.add_term(None);
        }
        plan
    }

    pub(crate) fn from_parts(
        name: String,
        terms: Vec<Term>,
        registry: CourseRegistry,
        taken: BTreeSet<CourseCode>,
    ) -> Self {
        Self {
            name,
            terms,
            registry,
            taken,
        }
    }

    // -- queries -----------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn term(&self, id: TermId) -> Option<&Term> {
        self.terms.iter().find(|t| t.id == id)
    }

    pub fn term_index(&self, id: TermId) -> Option<usize> {
        self.terms.iter().position(|t| t.id == id)
    }

    pub fn term_display_name(&self, id: TermId) -> Option<String> {
        self.term_index(id)
            .map(|idx| self.terms[idx].display_name(idx))
    }

    pub fn registry(&self) -> &CourseRegistry {
        &self.registry
    }

    pub fn course(&self, code: &str) -> Option<&Course> {
        self.registry.get(code)
    }

    pub fn taken(&self) -> &BTreeSet<CourseCode> {
        &self.taken
    }

    pub fn is_taken(&self, code: &CourseCode) -> bool {
        self.taken.contains(code)
    }

    pub fn location(&self, code: &CourseCode) -> Option<Placement> {
        self.terms.iter().enumerate().find_map(|(term_index, term)| {
            term.courses
                .iter()
                .position(|c| c == code)
                .map(|position| Placement {
                    term: term.id,
                    term_index,
                    position,
                })
        })
    }

    pub fn term_of(&self, code: &CourseCode) -> Option<TermId> {
        self.location(code).map(|p| p.term)
    }

    pub fn is_placed(&self, code: &CourseCode) -> bool {
        self.terms.iter().any(|t| t.contains(code))
    }

    /// Every placed course in term order, with its term position.
    pub fn placed_courses(&self) -> impl Iterator<Item = (usize, &Term, &CourseCode)> {
        self.terms
            .iter()
            .enumerate()
            .flat_map(|(idx, term)| term.courses.iter().map(move |code| (idx, term, code)))
    }

    /// Placed codes with no registry entry (fetches that have not resolved).
    pub fn pending_courses(&self) -> Vec<&CourseCode> {
        self.placed_courses()
            .map(|(_, _, code)| code)
            .filter(|code| !self.registry.contains(code.as_str()))
            .collect()
    }

    /// Total counted credits in a term. Non-credit courses and courses
    /// without a registry entry contribute nothing.
    pub fn term_credits(&self, id: TermId) -> Result<u32> {
        let term = self.term(id).ok_or(PlannerError::TermNotFound(id))?;
        Ok(self.credits_of(term))
    }

    pub fn total_credits(&self) -> u32 {
        self.terms.iter().map(|t| self.credits_of(t)).sum()
    }

    fn credits_of(&self, term: &Term) -> u32 {
        term.courses
            .iter()
            .filter_map(|code| self.registry.get(code.as_str()))
            .map(|course| course.credits.counted())
            .sum()
    }

    // -- registry ------------------------------------------------------------

    /// Insert or replace course metadata. Placement is unaffected.
    pub fn register_course(&mut self, course: Course) -> Option<Course> {
        self.registry.insert(course)
    }

    // -- terms ---------------------------------------------------------------

    /// Append a new term and return its id.
    pub fn add_term(&mut self, name: Option<String>) -> TermId {
        let term = Term::new(name);
        let id = term.id;
        self.terms.push(term);
        id
    }

    /// Insert a new term at `index` (0 ..= number of terms).
    pub fn insert_term(&mut self, index: usize, name: Option<String>) -> Result<TermId> {
        check_index(index, self.terms.len())?;
        let term = Term::new(name);
        let id = term.id;
        self.terms.insert(index, term);
        Ok(id)
    }

    /// Set or clear a term's explicit name. Clearing restores `Term N`.
    pub fn rename_term(&mut self, id: TermId, name: Option<String>) -> Result<()> {
        let term = self.term_mut(id)?;
        term.name = name.filter(|n| !n.trim().is_empty());
        Ok(())
    }

    /// Move a term to `to_index` in the sequence. Course lists and
    /// memberships are untouched; only the meaning of "earlier" changes.
    ///
    /// Returns the term's previous position.
    pub fn reorder_term(&mut self, id: TermId, to_index: usize) -> Result<usize> {
        let from = self.term_index(id).ok_or(PlannerError::TermNotFound(id))?;
        check_index(to_index, self.terms.len() - 1)?;
        let term = self.terms.remove(from);
        self.terms.insert(to_index, term);
        Ok(from)
    }

    /// Delete a term.
    ///
    /// Under [`DeleteTermPolicy::Reject`] a term that still holds courses is
    /// refused. Under [`DeleteTermPolicy::Cascade`] its courses are
    /// un-placed and stay in the registry. The removed term (with the codes
    /// it held) is returned.
    pub fn delete_term(&mut self, id: TermId, policy: DeleteTermPolicy) -> Result<Term> {
        let idx = self.term_index(id).ok_or(PlannerError::TermNotFound(id))?;
        let term = &self.terms[idx];
        if !term.is_empty() && policy == DeleteTermPolicy::Reject {
            return Err(PlannerError::TermNotEmpty {
                term: id,
                courses: term.courses.len(),
            });
        }
        Ok(self.terms.remove(idx))
    }

    // -- placement -----------------------------------------------------------

    /// Place a registered course into a term at `index` (append when `None`).
    ///
    /// Returns the position the course now occupies.
    pub fn place_course(
        &mut self,
        code: &CourseCode,
        term: TermId,
        index: Option<usize>,
    ) -> Result<usize> {
        let target_idx = self.term_index(term).ok_or(PlannerError::TermNotFound(term))?;
        if let Some(existing) = self.term_of(code) {
            return Err(PlannerError::DuplicatePlacement {
                course: code.clone(),
                term: existing,
            });
        }
        if self.is_taken(code) {
            return Err(PlannerError::AlreadyTaken(code.clone()));
        }
        if !self.registry.contains(code.as_str()) {
            return Err(PlannerError::CourseNotFound(code.clone()));
        }

        let len = self.terms[target_idx].courses.len();
        let position = index.unwrap_or(len);
        check_index(position, len)?;

        self.terms[target_idx].courses.insert(position, code.clone());
        Ok(position)
    }

    /// Move a course from `from` to `to`, inserting at `index` (append when
    /// `None`). For a move within one term, `index` refers to the list after
    /// the course has been taken out.
    ///
    /// Returns the position the course now occupies.
    pub fn move_course(
        &mut self,
        code: &CourseCode,
        from: TermId,
        to: TermId,
        index: Option<usize>,
    ) -> Result<usize> {
        let from_idx = self.term_index(from).ok_or(PlannerError::TermNotFound(from))?;
        let to_idx = self.term_index(to).ok_or(PlannerError::TermNotFound(to))?;
        let source_pos = self.terms[from_idx]
            .courses
            .iter()
            .position(|c| c == code)
            .ok_or_else(|| PlannerError::CourseNotInTerm {
                course: code.clone(),
                term: from,
            })?;

        let target_len = if from_idx == to_idx {
            self.terms[to_idx].courses.len() - 1
        } else {
            self.terms[to_idx].courses.len()
        };
        let position = index.unwrap_or(target_len);
        check_index(position, target_len)?;

        let moved = self.terms[from_idx].courses.remove(source_pos);
        self.terms[to_idx].courses.insert(position, moved);
        Ok(position)
    }

    /// Un-place a course from a term. The registry entry is kept.
    ///
    /// Returns the position the course occupied.
    pub fn remove_course(&mut self, code: &CourseCode, term: TermId) -> Result<usize> {
        let t = self.term_mut(term)?;
        let position = t
            .courses
            .iter()
            .position(|c| c == code)
            .ok_or_else(|| PlannerError::CourseNotInTerm {
                course: code.clone(),
                term,
            })?;
        t.courses.remove(position);
        Ok(position)
    }

    // -- taken courses -------------------------------------------------------

    /// Record a course as completed before the first term.
    pub fn mark_taken(&mut self, code: &CourseCode) -> Result<()> {
        if let Some(term) = self.term_of(code) {
            return Err(PlannerError::AlreadyPlaced {
                course: code.clone(),
                term,
            });
        }
        if !self.taken.insert(code.clone()) {
            return Err(PlannerError::AlreadyTaken(code.clone()));
        }
        Ok(())
    }

    pub fn unmark_taken(&mut self, code: &CourseCode) -> Result<()> {
        if self.taken.remove(code) {
            Ok(())
        } else {
            Err(PlannerError::CourseNotFound(code.clone()))
        }
    }

    fn term_mut(&mut self, id: TermId) -> Result<&mut Term> {
        self.terms
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(PlannerError::TermNotFound(id))
    }
}

fn check_index(index: usize, max: usize) -> Result<()> {
    if index > max {
        return Err(PlannerError::InvalidIndex { index, max });
    }
    Ok(())
}
