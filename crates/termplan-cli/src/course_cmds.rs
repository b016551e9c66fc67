//! CLI handlers for `termplan course` subcommands.
//!
//! Implements:
//! - `termplan course add <code> <term> [--index N]`  -- fetch metadata if needed, then place
//! - `termplan course move <code> <term> [--index N]`
//! - `termplan course remove <code>`
//! - `termplan course take <code>` / `untake <code>`
//! - `termplan course refresh`                        -- fetch metadata for pending courses
//! - `termplan course info <code>`

use anyhow::{Context, Result, bail};

use termplan_core::evaluate::evaluate_course;
use termplan_core::lookup::LookupRegistry;
use termplan_core::plan::Planner;
use termplan_core::{Command, Course, CourseCode, Plan, PlannerError, SatisfactionReport};

use crate::CourseCommands;
use crate::config::TermplanConfig;
use crate::resolve::{parse_code, position_to_index, resolve_term};
use crate::session::{Session, build_lookups, catalog_lookup, load_plan, lookup_course};

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `CourseCommands` variant. Mutating commands save the plan on
/// success.
pub async fn run_course_command(command: CourseCommands, config: TermplanConfig) -> Result<()> {
    let lookups = build_lookups(&config)?;

    if let CourseCommands::Info { code } = command {
        let plan = load_plan(&config.plan_path)?;
        let code = parse_code(&code)?;
        let course = match plan.course(code.as_str()) {
            Some(course) => Some(course.clone()),
            None => lookup_course(&lookups, &code).await?,
        };
        let Some(course) = course else {
            bail!("course {code} is not in the plan or the catalog");
        };
        print!("{}", render_info(&course, &plan, &config));
        return Ok(());
    }

    let has_catalog = config.catalog_path.is_some();
    let mut session = Session::open(config)?;
    match apply_course_command(&mut session, &lookups, command).await {
        Ok(()) => session.save(),
        Err(e) if !has_catalog && is_not_found(&e) => {
            Err(e.context("no catalog configured; pass --catalog or set TERMPLAN_CATALOG"))
        }
        Err(e) => Err(e),
    }
}

fn is_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<PlannerError>(),
        Some(PlannerError::CourseNotFound(_))
    )
}

pub async fn apply_course_command(
    session: &mut Session,
    lookups: &LookupRegistry,
    command: CourseCommands,
) -> Result<()> {
    match command {
        CourseCommands::Add { code, term, index } => {
            cmd_add(session, lookups, &code, &term, index).await
        }
        CourseCommands::Move { code, term, index } => cmd_move(session, &code, &term, index),
        CourseCommands::Remove { code } => cmd_remove(session, &code),
        CourseCommands::Take { code } => {
            let code = parse_code(&code)?;
            session.dispatch(Command::MarkTaken(code.clone()))?;
            println!("{code} marked as taken");
            Ok(())
        }
        CourseCommands::Untake { code } => {
            let code = parse_code(&code)?;
            session.dispatch(Command::UnmarkTaken(code.clone()))?;
            println!("{code} is no longer marked as taken");
            Ok(())
        }
        CourseCommands::Refresh => cmd_refresh(session, lookups).await,
        CourseCommands::Info { .. } => bail!("course info does not modify the plan"),
    }
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

async fn cmd_add(
    session: &mut Session,
    lookups: &LookupRegistry,
    code: &str,
    term: &str,
    index: Option<usize>,
) -> Result<()> {
    let code = parse_code(code)?;
    let term = resolve_term(session.plan(), term)?;
    let index = index.map(position_to_index).transpose()?;
    let Some(lookup) = catalog_lookup(lookups) else {
        bail!("no course lookup registered");
    };

    Planner::new(session.store_mut(), lookup)
        .add_course(&code, term, index)
        .await
        .with_context(|| format!("failed to add {code}"))?;
    Ok(())
}

fn cmd_move(session: &mut Session, code: &str, term: &str, index: Option<usize>) -> Result<()> {
    let code = parse_code(code)?;
    let to = resolve_term(session.plan(), term)?;
    let index = index.map(position_to_index).transpose()?;
    let Some(from) = session.plan().term_of(&code) else {
        bail!("{code} is not placed in any term");
    };
    session.dispatch(Command::MoveCourse {
        code: code.clone(),
        from,
        to,
        index,
    })?;
    let label = session.plan().term_display_name(to).unwrap_or_default();
    println!("{code} moved to {label}");
    Ok(())
}

fn cmd_remove(session: &mut Session, code: &str) -> Result<()> {
    let code = parse_code(code)?;
    let Some(term) = session.plan().term_of(&code) else {
        bail!("{code} is not placed in any term");
    };
    session.dispatch(Command::RemoveCourse { code, term })?;
    Ok(())
}

async fn cmd_refresh(session: &mut Session, lookups: &LookupRegistry) -> Result<()> {
    let Some(lookup) = catalog_lookup(lookups) else {
        bail!("no course lookup registered");
    };
    let summary = Planner::new(session.store_mut(), lookup)
        .refresh_missing()
        .await?;

    if summary.registered.is_empty() && summary.unresolved.is_empty() {
        println!("Every placed course already has metadata.");
        return Ok(());
    }
    for code in &summary.registered {
        println!("Fetched {code}");
    }
    for code in &summary.unresolved {
        println!("Not found: {code}");
    }
    Ok(())
}

// -----------------------------------------------------------------------
// course info
// -----------------------------------------------------------------------

fn status_line(plan: &Plan, code: &CourseCode) -> String {
    if plan.is_taken(code) {
        return "taken".to_owned();
    }
    match plan.term_of(code).and_then(|t| plan.term_display_name(t)) {
        Some(name) => format!("placed in {name}"),
        None => "not in plan".to_owned(),
    }
}

pub fn render_info(course: &Course, plan: &Plan, config: &TermplanConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}  {}\n", course.code, course.name));
    out.push_str(&format!("  Credits:  {}\n", course.credits));
    out.push_str(&format!("  Status:   {}\n", status_line(plan, &course.code)));

    let lists = [
        ("Prereqs", &course.prerequisites),
        ("Coreqs", &course.corequisites),
        ("Antireqs", &course.antirequisites),
    ];
    for (label, list) in lists {
        if list.is_empty() {
            continue;
        }
        let items: Vec<String> = list.iter().map(|r| r.to_string()).collect();
        out.push_str(&format!("  {:<9} {}\n", format!("{label}:"), items.join("; ")));
    }
    for note in &course.notes {
        out.push_str(&format!("  Note:     {note}\n"));
    }

    if let Some(report) = placed_report(course, plan, config) {
        let verdict = if report.satisfied {
            "satisfied"
        } else {
            "unsatisfied"
        };
        out.push_str(&format!("  Verdict:  {verdict}\n"));
    }
    out
}

fn placed_report(course: &Course, plan: &Plan, config: &TermplanConfig) -> Option<SatisfactionReport> {
    let term = plan.term_of(&course.code)?;
    evaluate_course(course, plan, term, &config.eval_options()).ok()
}
