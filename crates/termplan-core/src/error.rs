//! Errors raised by plan mutations and interaction-mode transitions.
//!
//! Every variant is recoverable: a rejected command leaves the plan and the
//! interaction mode exactly as they were.

use thiserror::Error;

use crate::course::CourseCode;
use crate::interaction::ModeKind;
use crate::plan::TermId;

/// Errors produced by the placement manager, the interaction machine and
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlannerError {
    #[error("course {course} is already placed in term {term}")]
    DuplicatePlacement { course: CourseCode, term: TermId },

    #[error("course {0} is already marked as taken")]
    AlreadyTaken(CourseCode),

    #[error("course {course} is placed in term {term} and cannot be marked as taken")]
    AlreadyPlaced { course: CourseCode, term: TermId },

    #[error("course {0} not found")]
    CourseNotFound(CourseCode),

    #[error("course {course} is not in term {term}")]
    CourseNotInTerm { course: CourseCode, term: TermId },

    #[error("term {0} not found")]
    TermNotFound(TermId),

    #[error("term {term} still holds {courses} course(s)")]
    TermNotEmpty { term: TermId, courses: usize },

    #[error("index {index} is out of range (max {max})")]
    InvalidIndex { index: usize, max: usize },

    #[error("invalid mode transition: {from} -> {to}")]
    InvalidModeTransition { from: ModeKind, to: ModeKind },

    #[error("no drag in progress")]
    NoActiveDrag,

    #[error("no seek in progress")]
    NoActiveSeek,

    #[error("no course is waiting to be added")]
    NoActiveAdd,
}

/// Convenience alias used throughout the core crate.
pub type Result<T, E = PlannerError> = std::result::Result<T, E>;
