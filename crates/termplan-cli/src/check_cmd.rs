//! `termplan check`: requirement verdicts for every placed course.

use anyhow::{Context, Result, bail};

use termplan_core::evaluate::{RequirementKind, evaluate_plan};
use termplan_core::{PlanReport, SatisfactionReport};

use crate::config::TermplanConfig;
use crate::session::load_plan;

pub fn run_check(config: &TermplanConfig, strict: bool, json: bool) -> Result<()> {
    let plan = load_plan(&config.plan_path)?;
    let report = evaluate_plan(&plan, &config.eval_options());

    if json {
        let text = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{text}");
    } else {
        print!("{}", render_report(&report));
    }

    let unsatisfied = report.unsatisfied().count();
    if strict && unsatisfied > 0 {
        bail!("{unsatisfied} course(s) have unmet requirements");
    }
    Ok(())
}

fn term_name<'a>(report: &'a PlanReport, course: &SatisfactionReport) -> &'a str {
    report
        .terms
        .iter()
        .find(|t| t.term == course.term)
        .map(|t| t.name.as_str())
        .unwrap_or("?")
}

/// One line per course; failed requirements and missing codes are listed
/// beneath unsatisfied courses.
pub fn render_report(report: &PlanReport) -> String {
    let mut out = String::new();

    if report.courses.is_empty() && report.pending.is_empty() {
        out.push_str("No courses placed.\n");
        return out;
    }

    for course in &report.courses {
        let verdict = if course.satisfied { "ok" } else { "UNSATISFIED" };
        out.push_str(&format!(
            "{} ({}): {}\n",
            course.course,
            term_name(report, course),
            verdict
        ));
        if course.satisfied {
            continue;
        }
        for kind in [RequirementKind::Prerequisite, RequirementKind::Corequisite] {
            for outcome in course.failed(kind) {
                out.push_str(&format!("    {kind} not met: {}\n", outcome.requirement));
            }
        }
        for conflict in &course.conflicts {
            out.push_str(&format!("    antirequisite conflict: {conflict}\n"));
        }
        if !course.missing.is_empty() {
            let missing: Vec<&str> = course.missing.iter().map(|c| c.as_str()).collect();
            out.push_str(&format!("    not in plan: {}\n", missing.join(", ")));
        }
    }

    for code in &report.pending {
        out.push_str(&format!("{code}: no course metadata (not evaluated)\n"));
    }

    let unsatisfied = report.unsatisfied().count();
    out.push('\n');
    if unsatisfied == 0 {
        out.push_str(&format!("All {} course(s) satisfied.\n", report.courses.len()));
    } else {
        out.push_str(&format!(
            "{unsatisfied} of {} course(s) unsatisfied.\n",
            report.courses.len()
        ));
    }
    out
}
