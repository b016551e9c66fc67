//! Planner service: the add-course flow that needs a course lookup.
//!
//! The store itself is synchronous. Anything that may have to fetch course
//! metadata first goes through [`Planner`], which resolves the course and
//! then dispatches ordinary commands.

use tracing::{info, warn};

use crate::course::{Course, CourseCode};
use crate::error::{PlannerError, Result};
use crate::lookup::CourseLookup;
use crate::store::{Command, PlanEvent, Store, failure_message};

use super::TermId;

/// Outcome of [`Planner::refresh_missing`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    /// Codes whose metadata was fetched and registered.
    pub registered: Vec<CourseCode>,
    /// Codes the lookup could not resolve.
    pub unresolved: Vec<CourseCode>,
}

/// Couples a [`Store`] with a [`CourseLookup`].
pub struct Planner<'a> {
    store: &'a mut Store,
    lookup: &'a dyn CourseLookup,
}

impl<'a> Planner<'a> {
    pub fn new(store: &'a mut Store, lookup: &'a dyn CourseLookup) -> Self {
        Self { store, lookup }
    }

    pub fn store(&self) -> &Store {
        self.store
    }

    /// Add a course to a term, fetching its metadata if the plan does not
    /// know it yet.
    ///
    /// Duplicates are rejected before any fetch. A lookup error is logged
    /// and treated as "not found".
    pub async fn add_course(
        &mut self,
        code: &CourseCode,
        term: TermId,
        index: Option<usize>,
    ) -> Result<Vec<PlanEvent>> {
        self.precheck(code, term, index)?;

        let mut events = Vec::new();
        if self.store.plan().course(code.as_str()).is_none() {
            let Some(course) = self.fetch(code).await else {
                return Err(self.reject(PlannerError::CourseNotFound(code.clone())));
            };
            events.extend(self.store.dispatch(Command::RegisterCourse(course))?);
        }

        events.extend(self.store.dispatch(Command::PlaceCourse {
            code: code.clone(),
            term,
            index,
        })?);
        info!(course = %code, term = %term, "course added");
        Ok(events)
    }

    /// Place the course picked with [`Command::BeginAdd`] into `term`.
    ///
    /// The add mode ends before the fetch, so the store is idle again
    /// whether or not the course ends up placed.
    pub async fn confirm_add(
        &mut self,
        term: TermId,
        index: Option<usize>,
    ) -> Result<Vec<PlanEvent>> {
        let Some(code) = self.store.interaction().adding().cloned() else {
            return Err(self.reject(PlannerError::NoActiveAdd));
        };
        let mut events = self.store.dispatch(Command::CancelAdd)?;
        events.extend(self.add_course(&code, term, index).await?);
        Ok(events)
    }

    /// Fetch metadata for placed courses that have no registry entry.
    pub async fn refresh_missing(&mut self) -> Result<RefreshSummary> {
        let pending: Vec<CourseCode> = self
            .store
            .plan()
            .pending_courses()
            .into_iter()
            .cloned()
            .collect();

        let mut summary = RefreshSummary::default();
        for code in pending {
            match self.fetch(&code).await {
                Some(course) => {
                    self.store.dispatch(Command::RegisterCourse(course))?;
                    summary.registered.push(code);
                }
                None => summary.unresolved.push(code),
            }
        }

        info!(
            registered = summary.registered.len(),
            unresolved = summary.unresolved.len(),
            "refreshed pending courses"
        );
        Ok(summary)
    }

    /// Everything `PlaceCourse` would reject, checked before a fetch
    /// registers anything.
    fn precheck(&self, code: &CourseCode, term: TermId, index: Option<usize>) -> Result<()> {
        let plan = self.store.plan();
        let Some(target) = plan.term(term) else {
            return Err(self.reject(PlannerError::TermNotFound(term)));
        };
        let max = target.courses().len();
        let err = if let Some(existing) = plan.term_of(code) {
            PlannerError::DuplicatePlacement {
                course: code.clone(),
                term: existing,
            }
        } else if plan.is_taken(code) {
            PlannerError::AlreadyTaken(code.clone())
        } else if let Some(index) = index.filter(|i| *i > max) {
            PlannerError::InvalidIndex { index, max }
        } else {
            return Ok(());
        };
        Err(self.reject(err))
    }

    async fn fetch(&self, code: &CourseCode) -> Option<Course> {
        match self.lookup.fetch(code).await {
            Ok(Some(course)) if &course.code == code => Some(course),
            Ok(Some(course)) => {
                warn!(
                    course = %code,
                    returned = %course.code,
                    lookup = self.lookup.name(),
                    "lookup returned a different course"
                );
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(course = %code, lookup = self.lookup.name(), error = %e, "course lookup failed");
                None
            }
        }
    }

    fn reject(&self, err: PlannerError) -> PlannerError {
        warn!(error = %err, "add course rejected");
        let (kind, message) = failure_message(&err);
        self.store.notifier().notify(kind, &message);
        err
    }
}
