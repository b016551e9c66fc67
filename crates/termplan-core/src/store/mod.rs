//! Command reducer and store.
//!
//! Every change to a plan or to the interaction mode is expressed as a
//! [`Command`]. [`reduce`] applies one command to a [`PlannerState`] and
//! reports what happened as [`PlanEvent`]s; the [`Store`] wraps it with
//! notifications and observers.

pub mod notify;

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::course::{Course, CourseCode};
use crate::error::{PlannerError, Result};
use crate::interaction::{DragSession, InteractionMachine, ModeKind};
use crate::plan::{DeleteTermPolicy, Plan, TermId};

pub use notify::{MemoryNotifier, Notification, NotificationKind, Notifier, TracingNotifier};

// ---------------------------------------------------------------------------
// Commands and events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddTerm {
        name: Option<String>,
    },
    InsertTerm {
        index: usize,
        name: Option<String>,
    },
    RenameTerm {
        term: TermId,
        name: Option<String>,
    },
    /// `policy: None` uses the store's configured policy (reject when
    /// reduced directly).
    DeleteTerm {
        term: TermId,
        policy: Option<DeleteTermPolicy>,
    },
    ReorderTerm {
        term: TermId,
        to_index: usize,
    },
    RegisterCourse(Course),
    PlaceCourse {
        code: CourseCode,
        term: TermId,
        index: Option<usize>,
    },
    MoveCourse {
        code: CourseCode,
        from: TermId,
        to: TermId,
        index: Option<usize>,
    },
    RemoveCourse {
        code: CourseCode,
        term: TermId,
    },
    MarkTaken(CourseCode),
    UnmarkTaken(CourseCode),

    BeginCourseDrag {
        code: CourseCode,
        from: TermId,
    },
    BeginTermDrag {
        term: TermId,
    },
    /// Drop the dragged course into `to` at `index` (append when `None`).
    DropCourse {
        to: TermId,
        index: Option<usize>,
    },
    /// Drop the dragged term at position `to_index`.
    DropTerm {
        to_index: usize,
    },
    CancelDrag,

    BeginSeek {
        course: CourseCode,
        origin: TermId,
    },
    SeekReady,
    /// End the seek, optionally placing the sought course into a term.
    ResolveSeek {
        place_in: Option<TermId>,
    },
    CancelSeek,

    BeginAdd(CourseCode),
    /// Place the course picked by [`Command::BeginAdd`].
    ConfirmAdd {
        term: TermId,
        index: Option<usize>,
    },
    CancelAdd,
}

impl Command {
    /// Short name used in log fields.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AddTerm { .. } => "add_term",
            Self::InsertTerm { .. } => "insert_term",
            Self::RenameTerm { .. } => "rename_term",
            Self::DeleteTerm { .. } => "delete_term",
            Self::ReorderTerm { .. } => "reorder_term",
            Self::RegisterCourse(_) => "register_course",
            Self::PlaceCourse { .. } => "place_course",
            Self::MoveCourse { .. } => "move_course",
            Self::RemoveCourse { .. } => "remove_course",
            Self::MarkTaken(_) => "mark_taken",
            Self::UnmarkTaken(_) => "unmark_taken",
            Self::BeginCourseDrag { .. } => "begin_course_drag",
            Self::BeginTermDrag { .. } => "begin_term_drag",
            Self::DropCourse { .. } => "drop_course",
            Self::DropTerm { .. } => "drop_term",
            Self::CancelDrag => "cancel_drag",
            Self::BeginSeek { .. } => "begin_seek",
            Self::SeekReady => "seek_ready",
            Self::ResolveSeek { .. } => "resolve_seek",
            Self::CancelSeek => "cancel_seek",
            Self::BeginAdd(_) => "begin_add",
            Self::ConfirmAdd { .. } => "confirm_add",
            Self::CancelAdd => "cancel_add",
        }
    }

    /// The mode this command finishes, if it ends a gesture.
    fn ends_mode(&self) -> Option<ModeKind> {
        match self {
            Self::DropCourse { .. } | Self::DropTerm { .. } => Some(ModeKind::Dragging),
            Self::ResolveSeek { .. } => Some(ModeKind::Seeking),
            Self::ConfirmAdd { .. } => Some(ModeKind::Adding),
            _ => None,
        }
    }
}

/// Something that changed as the result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEvent {
    TermAdded {
        term: TermId,
        index: usize,
    },
    TermRenamed {
        term: TermId,
    },
    TermDeleted {
        term: TermId,
        /// Display name the term had before deletion.
        name: String,
        /// Courses un-placed by a cascading delete.
        unplaced: Vec<CourseCode>,
    },
    TermMoved {
        term: TermId,
        from: usize,
        to: usize,
    },
    CourseRegistered {
        code: CourseCode,
        replaced: bool,
    },
    CoursePlaced {
        code: CourseCode,
        term: TermId,
        index: usize,
    },
    CourseMoved {
        code: CourseCode,
        from: TermId,
        to: TermId,
        index: usize,
    },
    CourseRemoved {
        code: CourseCode,
        term: TermId,
    },
    CourseTaken(CourseCode),
    CourseUntaken(CourseCode),
    ModeChanged {
        from: ModeKind,
        to: ModeKind,
    },
}

// ---------------------------------------------------------------------------
// State and reducer
// ---------------------------------------------------------------------------

/// Everything the reducer operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlannerState {
    pub plan: Plan,
    pub interaction: InteractionMachine,
}

impl PlannerState {
    pub fn new(plan: Plan) -> Self {
        Self {
            plan,
            interaction: InteractionMachine::new(),
        }
    }
}

/// Apply one command.
///
/// The command runs against a copy of the state, which replaces `state`
/// only on success, so an error leaves `state` untouched. The exception is
/// a rejected drop, seek resolution or add confirmation: the plan is
/// unchanged but the gesture still ends.
pub fn reduce(state: &mut PlannerState, command: Command) -> Result<Vec<PlanEvent>> {
    let ends_mode = command.ends_mode();
    let mut next = state.clone();
    match apply(&mut next, command) {
        Ok(events) => {
            *state = next;
            Ok(events)
        }
        Err(err) => {
            if let Some(kind) = ends_mode.filter(|k| *k == state.interaction.kind()) {
                state.interaction.reset();
                debug!(error = %err, mode = %kind, "gesture rejected, back to idle");
            }
            Err(err)
        }
    }
}

fn apply(state: &mut PlannerState, command: Command) -> Result<Vec<PlanEvent>> {
    let plan = &mut state.plan;
    let machine = &mut state.interaction;

    let events = match command {
        Command::AddTerm { name } => {
            let term = plan.add_term(name);
            vec![PlanEvent::TermAdded {
                term,
                index: plan.terms().len() - 1,
            }]
        }
        Command::InsertTerm { index, name } => {
            let term = plan.insert_term(index, name)?;
            vec![PlanEvent::TermAdded { term, index }]
        }
        Command::RenameTerm { term, name } => {
            plan.rename_term(term, name)?;
            vec![PlanEvent::TermRenamed { term }]
        }
        Command::DeleteTerm { term, policy } => {
            let name = plan
                .term_display_name(term)
                .ok_or(PlannerError::TermNotFound(term))?;
            let removed = plan.delete_term(term, policy.unwrap_or_default())?;
            let mut events = vec![PlanEvent::TermDeleted {
                term,
                name,
                unplaced: removed.courses().to_vec(),
            }];
            // A seek requested from a card in this term has nowhere to return.
            if machine.seek().is_some_and(|s| s.origin == term) {
                machine.reset();
                events.push(PlanEvent::ModeChanged {
                    from: ModeKind::Seeking,
                    to: ModeKind::Idle,
                });
            }
            events
        }
        Command::ReorderTerm { term, to_index } => {
            let from = plan.reorder_term(term, to_index)?;
            vec![PlanEvent::TermMoved {
                term,
                from,
                to: to_index,
            }]
        }
        Command::RegisterCourse(course) => {
            let code = course.code.clone();
            let replaced = plan.register_course(course).is_some();
            vec![PlanEvent::CourseRegistered { code, replaced }]
        }
        Command::PlaceCourse { code, term, index } => {
            let index = plan.place_course(&code, term, index)?;
            vec![PlanEvent::CoursePlaced { code, term, index }]
        }
        Command::MoveCourse {
            code,
            from,
            to,
            index,
        } => {
            let index = plan.move_course(&code, from, to, index)?;
            vec![PlanEvent::CourseMoved {
                code,
                from,
                to,
                index,
            }]
        }
        Command::RemoveCourse { code, term } => {
            plan.remove_course(&code, term)?;
            vec![PlanEvent::CourseRemoved { code, term }]
        }
        Command::MarkTaken(code) => {
            plan.mark_taken(&code)?;
            vec![PlanEvent::CourseTaken(code)]
        }
        Command::UnmarkTaken(code) => {
            plan.unmark_taken(&code)?;
            vec![PlanEvent::CourseUntaken(code)]
        }

        // -- drag --------------------------------------------------------------
        Command::BeginCourseDrag { code, from } => {
            let from_index = plan
                .term(from)
                .ok_or(PlannerError::TermNotFound(from))?
                .courses()
                .iter()
                .position(|c| c == &code)
                .ok_or_else(|| PlannerError::CourseNotInTerm {
                    course: code.clone(),
                    term: from,
                })?;
            machine.begin_drag(DragSession::Course {
                code,
                from_term: from,
                from_index,
            })?;
            vec![mode_changed(ModeKind::Idle, ModeKind::Dragging)]
        }
        Command::BeginTermDrag { term } => {
            let from_index = plan.term_index(term).ok_or(PlannerError::TermNotFound(term))?;
            machine.begin_drag(DragSession::Term {
                id: term,
                from_index,
            })?;
            vec![mode_changed(ModeKind::Idle, ModeKind::Dragging)]
        }
        Command::DropCourse { to, index } => {
            let (code, from_term) = match machine.end_drag()? {
                DragSession::Course {
                    code, from_term, ..
                } => (code, from_term),
                DragSession::Term { .. } => return Err(PlannerError::NoActiveDrag),
            };
            let index = plan.move_course(&code, from_term, to, index)?;
            vec![
                PlanEvent::CourseMoved {
                    code,
                    from: from_term,
                    to,
                    index,
                },
                mode_changed(ModeKind::Dragging, ModeKind::Idle),
            ]
        }
        Command::DropTerm { to_index } => {
            let term = match machine.end_drag()? {
                DragSession::Term { id, .. } => id,
                DragSession::Course { .. } => return Err(PlannerError::NoActiveDrag),
            };
            let from = plan.reorder_term(term, to_index)?;
            vec![
                PlanEvent::TermMoved {
                    term,
                    from,
                    to: to_index,
                },
                mode_changed(ModeKind::Dragging, ModeKind::Idle),
            ]
        }
        Command::CancelDrag => {
            machine.end_drag()?;
            vec![mode_changed(ModeKind::Dragging, ModeKind::Idle)]
        }

        // -- seek --------------------------------------------------------------
        Command::BeginSeek { course, origin } => {
            if plan.term(origin).is_none() {
                return Err(PlannerError::TermNotFound(origin));
            }
            machine.begin_seek(course, origin)?;
            vec![mode_changed(ModeKind::Idle, ModeKind::Seeking)]
        }
        Command::SeekReady => {
            machine.mark_seek_ready()?;
            Vec::new()
        }
        Command::ResolveSeek { place_in } => {
            let session = machine.end_seek()?;
            let mut events = Vec::new();
            if let Some(term) = place_in {
                let index = plan.place_course(&session.course, term, None)?;
                events.push(PlanEvent::CoursePlaced {
                    code: session.course,
                    term,
                    index,
                });
            }
            events.push(mode_changed(ModeKind::Seeking, ModeKind::Idle));
            events
        }
        Command::CancelSeek => {
            machine.end_seek()?;
            vec![mode_changed(ModeKind::Seeking, ModeKind::Idle)]
        }

        // -- add ---------------------------------------------------------------
        Command::BeginAdd(code) => {
            machine.begin_add(code)?;
            vec![mode_changed(ModeKind::Idle, ModeKind::Adding)]
        }
        Command::ConfirmAdd { term, index } => {
            let code = machine.end_add()?;
            let index = plan.place_course(&code, term, index)?;
            vec![
                PlanEvent::CoursePlaced { code, term, index },
                mode_changed(ModeKind::Adding, ModeKind::Idle),
            ]
        }
        Command::CancelAdd => {
            machine.end_add()?;
            vec![mode_changed(ModeKind::Adding, ModeKind::Idle)]
        }
    };

    Ok(events)
}

fn mode_changed(from: ModeKind, to: ModeKind) -> PlanEvent {
    PlanEvent::ModeChanged { from, to }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Receives every event the store commits, after the state has changed.
pub trait Observer: Send + Sync {
    fn on_event(&self, state: &PlannerState, event: &PlanEvent);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Policy for [`Command::DeleteTerm`] commands that do not name one.
    pub delete_policy: DeleteTermPolicy,
}

/// Owns the planner state and dispatches commands one at a time.
pub struct Store {
    state: PlannerState,
    notifier: Arc<dyn Notifier>,
    options: StoreOptions,
    observers: Vec<Box<dyn Observer>>,
}

impl Store {
    pub fn new(plan: Plan, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: PlannerState::new(plan),
            notifier,
            options: StoreOptions::default(),
            observers: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    pub fn subscribe(&mut self, observer: impl Observer + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn state(&self) -> &PlannerState {
        &self.state
    }

    pub fn plan(&self) -> &Plan {
        &self.state.plan
    }

    pub fn interaction(&self) -> &InteractionMachine {
        &self.state.interaction
    }

    pub fn options(&self) -> StoreOptions {
        self.options
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn into_plan(self) -> Plan {
        self.state.plan
    }

    /// Apply one command, then notify observers and the user.
    ///
    /// On failure the error is reported through the notifier and returned.
    pub fn dispatch(&mut self, mut command: Command) -> Result<Vec<PlanEvent>> {
        if let Command::DeleteTerm { policy, .. } = &mut command {
            policy.get_or_insert(self.options.delete_policy);
        }

        let name = command.name();
        debug!(command = name, "reducing command");

        match reduce(&mut self.state, command) {
            Ok(events) => {
                for event in &events {
                    info!(command = name, event = ?event, "plan updated");
                    for observer in &self.observers {
                        observer.on_event(&self.state, event);
                    }
                    if let Some(message) = success_message(&self.state, event) {
                        self.notifier.notify(NotificationKind::Success, &message);
                    }
                }
                Ok(events)
            }
            Err(err) => {
                warn!(command = name, error = %err, "command rejected");
                let (kind, message) = failure_message(&err);
                self.notifier.notify(kind, &message);
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state)
            .field("options", &self.options)
            .field("observers", &self.observers.len())
            .finish()
    }
}

fn success_message(state: &PlannerState, event: &PlanEvent) -> Option<String> {
    match event {
        PlanEvent::CoursePlaced { code, term, .. } => {
            let term_name = state.plan.term_display_name(*term)?;
            Some(format!("{code} added to {term_name}"))
        }
        PlanEvent::CourseRemoved { code, .. } => Some(format!("{code} removed")),
        PlanEvent::TermDeleted { name, .. } => Some(format!("{name} deleted")),
        _ => None,
    }
}

/// Duplicate placements and mode conflicts are warnings; everything else is
/// an error.
pub(crate) fn failure_message(err: &PlannerError) -> (NotificationKind, String) {
    match err {
        PlannerError::DuplicatePlacement { course, .. } => (
            NotificationKind::Warning,
            format!("Cannot add duplicate {course}"),
        ),
        PlannerError::CourseNotFound(_) => {
            (NotificationKind::Error, "Course not found".to_owned())
        }
        PlannerError::InvalidModeTransition { .. } => {
            (NotificationKind::Warning, err.to_string())
        }
        other => (NotificationKind::Error, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::course::Credits;
    use crate::interaction::InteractionMode;

    fn code(s: &str) -> CourseCode {
        CourseCode::new(s).unwrap()
    }

    fn state_with(courses: &[&str], terms: usize) -> PlannerState {
        let mut plan = Plan::with_terms("t", terms);
        for c in courses {
            plan.register_course(Course::new(code(c), *c, Credits(1)));
        }
        PlannerState::new(plan)
    }

    fn term(state: &PlannerState, idx: usize) -> TermId {
        state.plan.terms()[idx].id()
    }

    #[test]
    fn failed_command_leaves_state_unchanged() {
        let mut state = state_with(&["A 1"], 2);
        let (t0, t1) = (term(&state, 0), term(&state, 1));
        reduce(
            &mut state,
            Command::PlaceCourse {
                code: code("A 1"),
                term: t0,
                index: None,
            },
        )
        .unwrap();
        let before = state.clone();

        let err = reduce(
            &mut state,
            Command::PlaceCourse {
                code: code("A 1"),
                term: t1,
                index: None,
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            PlannerError::DuplicatePlacement {
                course: code("A 1"),
                term: t0,
            }
        );
        assert_eq!(state, before);
    }

    #[test]
    fn drop_commits_move_and_returns_to_idle() {
        let mut state = state_with(&["A 1"], 2);
        let (t0, t1) = (term(&state, 0), term(&state, 1));
        state.plan.place_course(&code("A 1"), t0, None).unwrap();

        reduce(&mut state, Command::BeginCourseDrag { code: code("A 1"), from: t0 }).unwrap();
        assert_eq!(state.interaction.kind(), ModeKind::Dragging);

        let events = reduce(&mut state, Command::DropCourse { to: t1, index: None }).unwrap();
        assert!(matches!(events[0], PlanEvent::CourseMoved { index: 0, .. }));
        assert_eq!(state.plan.term_of(&code("A 1")), Some(t1));
        assert!(state.interaction.is_idle());
    }

    #[test]
    fn rejected_drop_ends_drag_without_mutation() {
        let mut state = state_with(&["A 1"], 2);
        let (t0, t1) = (term(&state, 0), term(&state, 1));
        state.plan.place_course(&code("A 1"), t0, None).unwrap();
        reduce(&mut state, Command::BeginCourseDrag { code: code("A 1"), from: t0 }).unwrap();
        let plan_before = state.plan.clone();

        let err = reduce(&mut state, Command::DropCourse { to: t1, index: Some(5) }).unwrap_err();
        assert!(matches!(err, PlannerError::InvalidIndex { .. }));
        assert_eq!(state.plan, plan_before);
        assert!(state.interaction.is_idle());
    }

    #[test]
    fn cancel_drag_applies_no_mutation() {
        let mut state = state_with(&["A 1"], 1);
        let t0 = term(&state, 0);
        state.plan.place_course(&code("A 1"), t0, None).unwrap();
        let plan_before = state.plan.clone();

        reduce(&mut state, Command::BeginTermDrag { term: t0 }).unwrap();
        reduce(&mut state, Command::CancelDrag).unwrap();
        assert_eq!(state.plan, plan_before);
        assert!(state.interaction.is_idle());
    }

    #[test]
    fn deleting_seek_origin_clears_seek() {
        let mut state = state_with(&[], 2);
        let t1 = term(&state, 1);
        reduce(&mut state, Command::BeginSeek { course: code("B 1"), origin: t1 }).unwrap();

        let events = reduce(&mut state, Command::DeleteTerm { term: t1, policy: None }).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(state.interaction.mode(), &InteractionMode::Idle);
    }

    #[test]
    fn resolve_seek_places_sought_course() {
        let mut state = state_with(&["B 1"], 2);
        let (t0, t1) = (term(&state, 0), term(&state, 1));
        reduce(&mut state, Command::BeginSeek { course: code("B 1"), origin: t1 }).unwrap();
        reduce(&mut state, Command::SeekReady).unwrap();
        reduce(&mut state, Command::ResolveSeek { place_in: Some(t0) }).unwrap();

        assert_eq!(state.plan.term_of(&code("B 1")), Some(t0));
        assert!(state.interaction.is_idle());
    }

    #[test]
    fn confirm_add_places_picked_course() {
        let mut state = state_with(&["C 1"], 1);
        let t0 = term(&state, 0);
        reduce(&mut state, Command::BeginAdd(code("C 1"))).unwrap();

        let err = reduce(&mut state, Command::BeginSeek { course: code("C 1"), origin: t0 })
            .unwrap_err();
        assert!(matches!(err, PlannerError::InvalidModeTransition { .. }));

        reduce(&mut state, Command::ConfirmAdd { term: t0, index: None }).unwrap();
        assert_eq!(state.plan.term_of(&code("C 1")), Some(t0));
        assert!(state.interaction.is_idle());
    }

    #[test]
    fn rejected_confirm_add_returns_to_idle() {
        let mut state = state_with(&["C 1"], 2);
        let (t0, t1) = (term(&state, 0), term(&state, 1));
        state.plan.place_course(&code("C 1"), t0, None).unwrap();
        let plan_before = state.plan.clone();

        reduce(&mut state, Command::BeginAdd(code("C 1"))).unwrap();
        let err = reduce(&mut state, Command::ConfirmAdd { term: t1, index: None }).unwrap_err();
        assert!(matches!(err, PlannerError::DuplicatePlacement { .. }));
        assert_eq!(state.plan, plan_before);
        assert!(state.interaction.is_idle());

        reduce(&mut state, Command::BeginAdd(code("Z 9"))).unwrap();
        let err = reduce(&mut state, Command::ConfirmAdd { term: t1, index: None }).unwrap_err();
        assert_eq!(err, PlannerError::CourseNotFound(code("Z 9")));
        assert!(state.interaction.is_idle());
    }

    #[test]
    fn rejected_seek_resolution_returns_to_idle() {
        let mut state = state_with(&[], 1);
        let t0 = term(&state, 0);
        reduce(&mut state, Command::BeginSeek { course: code("B 1"), origin: t0 }).unwrap();

        let err = reduce(&mut state, Command::ResolveSeek { place_in: Some(t0) }).unwrap_err();
        assert_eq!(err, PlannerError::CourseNotFound(code("B 1")));
        assert!(state.plan.terms()[0].is_empty());
        assert!(state.interaction.is_idle());
    }

    #[test]
    fn confirm_add_without_pending_course_keeps_other_mode() {
        let mut state = state_with(&[], 1);
        let t0 = term(&state, 0);
        reduce(&mut state, Command::BeginTermDrag { term: t0 }).unwrap();

        let err = reduce(&mut state, Command::ConfirmAdd { term: t0, index: None }).unwrap_err();
        assert_eq!(err, PlannerError::NoActiveAdd);
        assert_eq!(state.interaction.kind(), ModeKind::Dragging);
    }

    #[test]
    fn failure_messages_match_kinds() {
        let (kind, msg) = failure_message(&PlannerError::CourseNotFound(code("X 1")));
        assert_eq!((kind, msg.as_str()), (NotificationKind::Error, "Course not found"));

        let (kind, msg) = failure_message(&PlannerError::DuplicatePlacement {
            course: code("X 1"),
            term: TermId::new(),
        });
        assert_eq!(kind, NotificationKind::Warning);
        assert_eq!(msg, "Cannot add duplicate X 1");
    }
}
