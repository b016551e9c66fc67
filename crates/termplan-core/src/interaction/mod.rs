//! Interaction mode state machine.
//!
//! At most one gesture is active at a time: a drag, a seek ("jump to the
//! course a requirement mentions"), or an add-course confirmation. Entering
//! a gesture while another is active is rejected, never queued.
//!
//! The machine only tracks modes. Committing a drop or a seek resolution
//! against the plan is the store's job.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::course::CourseCode;
use crate::error::{PlannerError, Result};
use crate::plan::TermId;

/// Discriminant of [`InteractionMode`], used in the transition table and in
/// errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    Idle,
    Dragging,
    Seeking,
    Adding,
}

impl fmt::Display for ModeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Dragging => "dragging",
            Self::Seeking => "seeking",
            Self::Adding => "adding",
        };
        f.write_str(s)
    }
}

/// What is being dragged, and where it came from so a cancel can put it
/// back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragSession {
    Course {
        code: CourseCode,
        from_term: TermId,
        from_index: usize,
    },
    Term {
        id: TermId,
        from_index: usize,
    },
}

/// A pending jump to `course`, requested from a card in `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekSession {
    pub course: CourseCode,
    pub origin: TermId,
    /// Set once the destination view is ready to be shown.
    pub ready: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum InteractionMode {
    #[default]
    Idle,
    Dragging(DragSession),
    Seeking(SeekSession),
    /// A course was picked and awaits placement into a term.
    AddingCourse(CourseCode),
}

impl InteractionMode {
    pub fn kind(&self) -> ModeKind {
        match self {
            Self::Idle => ModeKind::Idle,
            Self::Dragging(_) => ModeKind::Dragging,
            Self::Seeking(_) => ModeKind::Seeking,
            Self::AddingCourse(_) => ModeKind::Adding,
        }
    }
}

/// The interaction state machine.
///
/// Enforces the valid transition graph:
///
/// ```text
/// idle     -> dragging
/// idle     -> seeking
/// idle     -> adding
/// dragging -> idle     (drop or cancel)
/// seeking  -> seeking  (destination ready)
/// seeking  -> idle     (resolve or cancel)
/// adding   -> idle     (placed or cancel)
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InteractionMachine {
    mode: InteractionMode,
}

impl InteractionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a transition from `from` to `to` is a valid edge in
    /// the mode graph.
    pub fn is_valid_transition(from: ModeKind, to: ModeKind) -> bool {
        matches!(
            (from, to),
            (ModeKind::Idle, ModeKind::Dragging)
                | (ModeKind::Idle, ModeKind::Seeking)
                | (ModeKind::Idle, ModeKind::Adding)
                | (ModeKind::Dragging, ModeKind::Idle)
                | (ModeKind::Seeking, ModeKind::Seeking)
                | (ModeKind::Seeking, ModeKind::Idle)
                | (ModeKind::Adding, ModeKind::Idle)
        )
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn kind(&self) -> ModeKind {
        self.mode.kind()
    }

    pub fn is_idle(&self) -> bool {
        self.mode == InteractionMode::Idle
    }

    /// Page scrolling is locked while a seek is in flight.
    pub fn scroll_locked(&self) -> bool {
        self.kind() == ModeKind::Seeking
    }

    /// Terms cannot be picked up while a seek is in flight.
    pub fn term_drag_enabled(&self) -> bool {
        self.kind() != ModeKind::Seeking
    }

    pub fn drag(&self) -> Option<&DragSession> {
        match &self.mode {
            InteractionMode::Dragging(session) => Some(session),
            _ => None,
        }
    }

    pub fn seek(&self) -> Option<&SeekSession> {
        match &self.mode {
            InteractionMode::Seeking(session) => Some(session),
            _ => None,
        }
    }

    /// The course picked for adding, if one awaits placement.
    pub fn adding(&self) -> Option<&CourseCode> {
        match &self.mode {
            InteractionMode::AddingCourse(code) => Some(code),
            _ => None,
        }
    }

    // -- drag ----------------------------------------------------------------

    pub fn begin_drag(&mut self, session: DragSession) -> Result<()> {
        if matches!(session, DragSession::Term { .. }) && !self.term_drag_enabled() {
            return Err(self.rejected(ModeKind::Dragging));
        }
        self.enter(InteractionMode::Dragging(session))
    }

    /// Leave the drag, returning its session. Used by both drop and cancel.
    pub fn end_drag(&mut self) -> Result<DragSession> {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Dragging(session) => Ok(session),
            other => {
                self.mode = other;
                Err(PlannerError::NoActiveDrag)
            }
        }
    }

    // -- seek ----------------------------------------------------------------

    pub fn begin_seek(&mut self, course: CourseCode, origin: TermId) -> Result<()> {
        self.enter(InteractionMode::Seeking(SeekSession {
            course,
            origin,
            ready: false,
        }))
    }

    pub fn mark_seek_ready(&mut self) -> Result<()> {
        match &mut self.mode {
            InteractionMode::Seeking(session) => {
                session.ready = true;
                Ok(())
            }
            _ => Err(PlannerError::NoActiveSeek),
        }
    }

    pub fn end_seek(&mut self) -> Result<SeekSession> {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Seeking(session) => Ok(session),
            other => {
                self.mode = other;
                Err(PlannerError::NoActiveSeek)
            }
        }
    }

    // -- add -----------------------------------------------------------------

    pub fn begin_add(&mut self, code: CourseCode) -> Result<()> {
        self.enter(InteractionMode::AddingCourse(code))
    }

    pub fn end_add(&mut self) -> Result<CourseCode> {
        match std::mem::take(&mut self.mode) {
            InteractionMode::AddingCourse(code) => Ok(code),
            other => {
                self.mode = other;
                Err(PlannerError::NoActiveAdd)
            }
        }
    }

    /// Drop back to idle unconditionally, returning the abandoned mode.
    pub fn reset(&mut self) -> InteractionMode {
        std::mem::take(&mut self.mode)
    }

    fn enter(&mut self, next: InteractionMode) -> Result<()> {
        let to = next.kind();
        if !Self::is_valid_transition(self.kind(), to) {
            return Err(self.rejected(to));
        }
        self.mode = next;
        Ok(())
    }

    fn rejected(&self, to: ModeKind) -> PlannerError {
        PlannerError::InvalidModeTransition {
            from: self.kind(),
            to,
        }
    }
}
