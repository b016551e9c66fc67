//! CLI handlers for `termplan term` subcommands.
//!
//! Implements:
//! - `termplan term add [--name NAME] [--at POSITION]`
//! - `termplan term rename <term> [NAME]`
//! - `termplan term delete <term> [--cascade]`
//! - `termplan term move <term> <position>`

use anyhow::Result;

use termplan_core::{Command, DeleteTermPolicy, PlanEvent};

use crate::TermCommands;
use crate::config::TermplanConfig;
use crate::resolve::{position_to_index, resolve_term};
use crate::session::Session;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `TermCommands` variant and save the plan on success.
pub fn run_term_command(command: TermCommands, config: TermplanConfig) -> Result<()> {
    let mut session = Session::open(config)?;
    apply_term_command(&mut session, command)?;
    session.save()
}

pub fn apply_term_command(session: &mut Session, command: TermCommands) -> Result<()> {
    match command {
        TermCommands::Add { name, at } => cmd_add(session, name, at),
        TermCommands::Rename { term, name } => cmd_rename(session, &term, name),
        TermCommands::Delete { term, cascade } => cmd_delete(session, &term, cascade),
        TermCommands::Move { term, position } => cmd_move(session, &term, position),
    }
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

fn cmd_add(session: &mut Session, name: Option<String>, at: Option<usize>) -> Result<()> {
    let command = match at {
        Some(position) => Command::InsertTerm {
            index: position_to_index(position)?,
            name,
        },
        None => Command::AddTerm { name },
    };
    for event in session.dispatch(command)? {
        if let PlanEvent::TermAdded { term, index } = event {
            let label = session.plan().term_display_name(term).unwrap_or_default();
            println!("Added {label} at position {}", index + 1);
        }
    }
    Ok(())
}

fn cmd_rename(session: &mut Session, term: &str, name: Option<String>) -> Result<()> {
    let id = resolve_term(session.plan(), term)?;
    session.dispatch(Command::RenameTerm { term: id, name })?;
    let label = session.plan().term_display_name(id).unwrap_or_default();
    println!("Term renamed to {label}");
    Ok(())
}

/// Without `--cascade` the configured delete policy applies.
fn cmd_delete(session: &mut Session, term: &str, cascade: bool) -> Result<()> {
    let id = resolve_term(session.plan(), term)?;
    let policy = cascade.then_some(DeleteTermPolicy::Cascade);
    for event in session.dispatch(Command::DeleteTerm { term: id, policy })? {
        let PlanEvent::TermDeleted { unplaced, .. } = event else {
            continue;
        };
        if !unplaced.is_empty() {
            let codes: Vec<&str> = unplaced.iter().map(|c| c.as_str()).collect();
            println!("Unplaced: {}", codes.join(", "));
        }
    }
    Ok(())
}

fn cmd_move(session: &mut Session, term: &str, position: usize) -> Result<()> {
    let id = resolve_term(session.plan(), term)?;
    let to_index = position_to_index(position)?;
    for event in session.dispatch(Command::ReorderTerm { term: id, to_index })? {
        if let PlanEvent::TermMoved { from, to, .. } = event {
            println!("Moved term from position {} to {}", from + 1, to + 1);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use termplan_core::store::MemoryNotifier;
    use termplan_core::{Course, CourseCode, Credits, Plan, PlannerError};

    use crate::session::save_plan;

    struct Fixture {
        _dir: tempfile::TempDir,
        session: Session,
    }

    fn fixture(policy: DeleteTermPolicy) -> Fixture {
        let dir = tempfile::TempDir::new().unwrap();
        let mut plan = Plan::with_terms("terms", 3);
        let code = CourseCode::new("CS 135").unwrap();
        plan.register_course(Course::new(code.clone(), "Intro", Credits(1)));
        let t0 = plan.terms()[0].id();
        plan.place_course(&code, t0, None).unwrap();

        let config = TermplanConfig {
            plan_path: dir.path().join("plan.toml"),
            catalog_path: None,
            missing_courses: Default::default(),
            delete_policy: policy,
            lookup_interval: None,
        };
        save_plan(&config.plan_path, &plan).unwrap();
        let session = Session::open_with(config, Arc::new(MemoryNotifier::new())).unwrap();
        Fixture { _dir: dir, session }
    }

    #[test]
    fn add_appends_or_inserts_at_position() {
        let mut f = fixture(DeleteTermPolicy::Reject);
        apply_term_command(
            &mut f.session,
            TermCommands::Add {
                name: Some("Spring 2027".into()),
                at: None,
            },
        )
        .unwrap();
        apply_term_command(
            &mut f.session,
            TermCommands::Add {
                name: Some("Co-op".into()),
                at: Some(1),
            },
        )
        .unwrap();

        let names: Vec<String> = f
            .session
            .plan()
            .terms()
            .iter()
            .enumerate()
            .map(|(i, t)| t.display_name(i))
            .collect();
        assert_eq!(names, vec!["Co-op", "Term 2", "Term 3", "Term 4", "Spring 2027"]);
    }

    #[test]
    fn delete_non_empty_term_needs_cascade_under_reject_policy() {
        let mut f = fixture(DeleteTermPolicy::Reject);
        let err = apply_term_command(
            &mut f.session,
            TermCommands::Delete {
                term: "1".into(),
                cascade: false,
            },
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PlannerError>(),
            Some(PlannerError::TermNotEmpty { courses: 1, .. })
        ));

        apply_term_command(
            &mut f.session,
            TermCommands::Delete {
                term: "1".into(),
                cascade: true,
            },
        )
        .unwrap();
        assert_eq!(f.session.plan().terms().len(), 2);
    }

    #[test]
    fn cascade_policy_from_config_applies_without_flag() {
        let mut f = fixture(DeleteTermPolicy::Cascade);
        apply_term_command(
            &mut f.session,
            TermCommands::Delete {
                term: "Term 1".into(),
                cascade: false,
            },
        )
        .unwrap();
        assert!(f.session.plan().placed_courses().next().is_none());
    }

    #[test]
    fn move_and_rename_resolve_terms_by_name() {
        let mut f = fixture(DeleteTermPolicy::Reject);
        apply_term_command(
            &mut f.session,
            TermCommands::Rename {
                term: "3".into(),
                name: Some("Fall 2027".into()),
            },
        )
        .unwrap();
        apply_term_command(
            &mut f.session,
            TermCommands::Move {
                term: "fall 2027".into(),
                position: 1,
            },
        )
        .unwrap();
        assert_eq!(f.session.plan().terms()[0].name(), Some("Fall 2027"));
    }

    #[test]
    fn position_zero_is_rejected() {
        let mut f = fixture(DeleteTermPolicy::Reject);
        let err = apply_term_command(
            &mut f.session,
            TermCommands::Move {
                term: "1".into(),
                position: 0,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("start at 1"));
    }
}
