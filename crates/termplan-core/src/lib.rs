//! Core library for termplan: course metadata, requirement expressions,
//! the satisfaction evaluator, term/course placement, interaction modes,
//! and the command reducer that ties them together.

pub mod course;
pub mod error;
pub mod evaluate;
pub mod interaction;
pub mod lookup;
pub mod plan;
pub mod requirement;
pub mod store;

pub use course::{Course, CourseCode, CourseRegistry, Credits};
pub use error::PlannerError;
pub use evaluate::{EvalOptions, MissingCoursePolicy, PlanReport, SatisfactionReport};
pub use interaction::{InteractionMachine, InteractionMode, ModeKind};
pub use plan::{DeleteTermPolicy, Plan, Term, TermId};
pub use requirement::Requirement;
pub use store::{Command, PlanEvent, PlannerState, Store};
