//! TOML format types for plan snapshot files.
//!
//! These types map directly to the `plan.toml` on-disk format and are
//! deserialized via `serde` + the `toml` crate. A snapshot carries everything
//! needed to rebuild a [`Plan`]: term order, term contents, the taken set and
//! the course registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::course::{Course, CourseCode};

use super::{Plan, Term, TermId};

/// Top-level structure of a `plan.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanToml {
    /// Courses completed before the first term.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub taken: Vec<CourseCode>,
    /// Plan metadata.
    pub plan: PlanMeta,
    /// Terms in display order.
    #[serde(default)]
    pub terms: Vec<TermToml>,
    /// Registry entries for every course the plan knows about.
    #[serde(default)]
    pub courses: Vec<Course>,
}

/// Plan-level metadata in `[plan]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanMeta {
    pub name: String,
    /// When the snapshot was last written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

/// A single `[[terms]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TermToml {
    pub id: TermId,
    /// Explicit display name. Absent means `Term N`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub courses: Vec<CourseCode>,
}

impl PlanToml {
    /// Snapshot a plan. `saved_at` is stamped with the current time.
    pub fn from_plan(plan: &Plan) -> Self {
        Self {
            taken: plan.taken().iter().cloned().collect(),
            plan: PlanMeta {
                name: plan.name().to_owned(),
                saved_at: Some(Utc::now()),
            },
            terms: plan
                .terms()
                .iter()
                .map(|t| TermToml {
                    id: t.id(),
                    name: t.name().map(str::to_owned),
                    courses: t.courses().to_vec(),
                })
                .collect(),
            courses: plan.registry().iter().cloned().collect(),
        }
    }

    /// Rebuild the plan without validation. Use
    /// [`parse_plan_toml`](super::parse_plan_toml) for untrusted input.
    pub fn into_plan(self) -> Plan {
        let terms = self
            .terms
            .into_iter()
            .map(|t| {
                let mut term = Term::with_id(t.id, t.name);
                for code in t.courses {
                    term.push_course(code);
                }
                term
            })
            .collect();

        Plan::from_parts(
            self.plan.name,
            terms,
            self.courses.into_iter().collect(),
            self.taken.into_iter().collect(),
        )
    }
}
