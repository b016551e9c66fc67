//! `termplan show`: the plan laid out term by term.

use anyhow::Result;

use termplan_core::evaluate::evaluate_plan;
use termplan_core::{CourseCode, Plan, PlanReport};

use crate::config::TermplanConfig;
use crate::session::load_plan;

pub fn run_show(config: &TermplanConfig) -> Result<()> {
    let plan = load_plan(&config.plan_path)?;
    let report = evaluate_plan(&plan, &config.eval_options());
    print!("{}", render_plan(&plan, &report));
    Ok(())
}

/// Status marker for one placed course.
fn marker(report: &PlanReport, code: &CourseCode) -> &'static str {
    match report.get(code) {
        Some(r) if r.satisfied => "ok",
        Some(_) => "!!",
        None => "??",
    }
}

/// Render the plan as a table: one block per term, one row per course.
pub fn render_plan(plan: &Plan, report: &PlanReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Plan: {}\n", plan.name()));

    if !plan.taken().is_empty() {
        let taken: Vec<&str> = plan.taken().iter().map(|c| c.as_str()).collect();
        out.push_str(&format!("Taken: {}\n", taken.join(", ")));
    }

    if plan.terms().is_empty() {
        out.push('\n');
        out.push_str("No terms. Use `termplan term add` to create one.\n");
        return out;
    }

    let code_w = plan
        .placed_courses()
        .map(|(_, _, c)| c.as_str().len())
        .max()
        .unwrap_or(4)
        .max(4);

    for (i, (term, credits)) in plan.terms().iter().zip(&report.terms).enumerate() {
        out.push('\n');
        out.push_str(&format!(
            "{}. {}  ({} credit{})\n",
            i + 1,
            term.display_name(i),
            credits.credits,
            if credits.credits == 1 { "" } else { "s" }
        ));
        if term.is_empty() {
            out.push_str("   (empty)\n");
        }
        for code in term.courses() {
            let (name, course_credits) = match plan.course(code.as_str()) {
                Some(c) => (c.name.as_str(), c.credits.to_string()),
                None => ("(no metadata)", String::new()),
            };
            out.push_str(&format!(
                "   [{}] {:<code_w$}  {}  {}\n",
                marker(report, code),
                code.as_str(),
                name,
                course_credits
            ));
        }
    }

    out.push('\n');
    let unsatisfied = report.unsatisfied().count();
    out.push_str(&format!(
        "Total: {} credits, {} unsatisfied, {} without metadata\n",
        report.total_credits,
        unsatisfied,
        report.pending.len()
    ));
    out
}
