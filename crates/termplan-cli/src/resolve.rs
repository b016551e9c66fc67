//! Term and course reference resolution.
//!
//! - [`resolve_term`] accepts a 1-based position, a term UUID, or a display
//!   name (case-insensitive) and returns the term's id.
//! - [`parse_code`] normalizes a course code typed on the command line.

use anyhow::{Context, Result, bail};

use termplan_core::{CourseCode, Plan, TermId};

/// Resolve a user-supplied term reference against `plan`.
///
/// Heuristic: a bare integer is a 1-based position; anything that parses as
/// a UUID is a term id; otherwise the input is matched against display
/// names ("Term 2", "Fall 2026", ...).
pub fn resolve_term(plan: &Plan, input: &str) -> Result<TermId> {
    let input = input.trim();

    if let Ok(position) = input.parse::<usize>() {
        let count = plan.terms().len();
        if position == 0 || position > count {
            bail!("term position {position} is out of range (plan has {count} term(s))");
        }
        return Ok(plan.terms()[position - 1].id());
    }

    if let Ok(id) = input.parse::<TermId>() {
        return match plan.term(id) {
            Some(_) => Ok(id),
            None => bail!("no term with id {id} in this plan"),
        };
    }

    let matches: Vec<TermId> = plan
        .terms()
        .iter()
        .enumerate()
        .filter(|(i, t)| t.display_name(*i).eq_ignore_ascii_case(input))
        .map(|(_, t)| t.id())
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => bail!("no term named {input:?}; use a position, id or exact name"),
        _ => bail!(
            "{} terms are named {input:?}; refer to one by position or id",
            matches.len()
        ),
    }
}

/// Parse a course code argument.
pub fn parse_code(input: &str) -> Result<CourseCode> {
    CourseCode::new(input).with_context(|| format!("invalid course code: {input:?}"))
}

/// Convert a 1-based position argument into a 0-based index.
pub fn position_to_index(position: usize) -> Result<usize> {
    match position.checked_sub(1) {
        Some(index) => Ok(index),
        None => bail!("positions start at 1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> Plan {
        let mut plan = Plan::with_terms("resolve", 3);
        let id = plan.terms()[2].id();
        plan.rename_term(id, Some("Fall 2026".into())).unwrap();
        plan
    }

    #[test]
    fn resolves_by_position() {
        let plan = plan();
        assert_eq!(resolve_term(&plan, "2").unwrap(), plan.terms()[1].id());
    }

    #[test]
    fn position_zero_and_past_end_are_errors() {
        let plan = plan();
        assert!(resolve_term(&plan, "0").is_err());
        let err = resolve_term(&plan, "4").unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
    }

    #[test]
    fn resolves_by_uuid() {
        let plan = plan();
        let id = plan.terms()[0].id();
        assert_eq!(resolve_term(&plan, &id.to_string()).unwrap(), id);
        assert!(resolve_term(&plan, &TermId::new().to_string()).is_err());
    }

    #[test]
    fn resolves_by_display_name() {
        let plan = plan();
        assert_eq!(resolve_term(&plan, "fall 2026").unwrap(), plan.terms()[2].id());
        assert_eq!(resolve_term(&plan, "Term 1").unwrap(), plan.terms()[0].id());
        assert!(resolve_term(&plan, "Winter 2027").is_err());
    }

    #[test]
    fn ambiguous_names_are_rejected() {
        let mut plan = plan();
        let id = plan.terms()[0].id();
        plan.rename_term(id, Some("Fall 2026".into())).unwrap();
        let err = resolve_term(&plan, "Fall 2026").unwrap_err();
        assert!(err.to_string().contains("2 terms"), "{err}");
    }

    #[test]
    fn parse_code_normalizes_and_rejects_reserved_chars() {
        assert_eq!(parse_code("  cs  136 ").unwrap().as_str(), "CS 136");
        assert!(parse_code("CS|136").is_err());
    }
}
