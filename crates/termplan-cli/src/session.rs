//! Plan file I/O and the per-invocation store.
//!
//! Every mutating command opens a [`Session`], dispatches one or more
//! commands, and saves the plan back to disk only if all of them succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::debug;

use termplan_core::course::catalog::{Catalog, parse_catalog_toml};
use termplan_core::lookup::{CatalogLookup, CourseLookup, LookupRegistry, RateLimitedLookup};
use termplan_core::plan::{PlanToml, parse_plan_toml};
use termplan_core::store::{NotificationKind, Notifier};
use termplan_core::{Command, Course, CourseCode, CourseRegistry, Plan, PlanEvent, Store};

use crate::config::TermplanConfig;

// -----------------------------------------------------------------------
// Files
// -----------------------------------------------------------------------

/// Read and validate a plan snapshot.
pub fn load_plan(path: &Path) -> Result<Plan> {
    let content = std::fs::read_to_string(path).with_context(|| {
        format!(
            "failed to read plan file: {} (run `termplan new` to create one)",
            path.display()
        )
    })?;
    parse_plan_toml(&content)
        .with_context(|| format!("failed to parse plan file: {}", path.display()))
}

/// Write a plan snapshot, creating parent dirs as needed.
pub fn save_plan(path: &Path, plan: &Plan) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    let contents =
        toml::to_string_pretty(&PlanToml::from_plan(plan)).context("failed to serialize plan")?;
    std::fs::write(path, contents)
        .with_context(|| format!("failed to write plan file: {}", path.display()))?;
    debug!(path = %path.display(), "plan saved");
    Ok(())
}

/// Read and validate a catalog file.
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog file: {}", path.display()))?;
    parse_catalog_toml(&content)
        .with_context(|| format!("failed to parse catalog file: {}", path.display()))
}

/// Build the lookup registry for this invocation.
///
/// Without a configured catalog the registry holds an empty catalog lookup,
/// so only courses already registered in the plan can be placed.
pub fn build_lookups(config: &TermplanConfig) -> Result<LookupRegistry> {
    let courses = match &config.catalog_path {
        Some(path) => load_catalog(path)?.courses,
        None => CourseRegistry::new(),
    };
    let catalog = CatalogLookup::new(courses);

    let mut registry = LookupRegistry::new();
    match config.lookup_interval {
        Some(interval) => registry.register(RateLimitedLookup::new(catalog, interval)),
        None => registry.register(catalog),
    };
    Ok(registry)
}

// -----------------------------------------------------------------------
// Console notifications
// -----------------------------------------------------------------------

/// Prints success and info messages to stdout.
///
/// Warnings and errors are not printed here: they surface through the
/// command's error result.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Success | NotificationKind::Info => println!("{message}"),
            NotificationKind::Warning | NotificationKind::Error => {
                debug!(kind = %kind, "{message}")
            }
        }
    }
}

// -----------------------------------------------------------------------
// Session
// -----------------------------------------------------------------------

pub struct Session {
    config: TermplanConfig,
    store: Store,
}

impl Session {
    /// Load the configured plan file into a store.
    pub fn open(config: TermplanConfig) -> Result<Self> {
        Self::open_with(config, Arc::new(ConsoleNotifier))
    }

    pub fn open_with(config: TermplanConfig, notifier: Arc<dyn Notifier>) -> Result<Self> {
        let plan = load_plan(&config.plan_path)?;
        let store = Store::new(plan, notifier).with_options(config.store_options());
        Ok(Self { config, store })
    }

    pub fn plan(&self) -> &Plan {
        self.store.plan()
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Vec<PlanEvent>> {
        let name = command.name();
        self.store
            .dispatch(command)
            .with_context(|| format!("{name} failed"))
    }

    pub fn save(&self) -> Result<()> {
        save_plan(&self.config.plan_path, self.store.plan())
    }
}

/// Create a new plan file, refusing to overwrite unless `force` is set.
pub fn create_plan(path: &Path, plan: &Plan, force: bool) -> Result<PathBuf> {
    if path.exists() && !force {
        bail!(
            "plan file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }
    save_plan(path, plan)?;
    Ok(path.to_path_buf())
}

/// Fetch one code through the registry's catalog lookup.
pub async fn lookup_course(registry: &LookupRegistry, code: &CourseCode) -> Result<Option<Course>> {
    match catalog_lookup(registry) {
        Some(lookup) => lookup.fetch(code).await,
        None => Ok(None),
    }
}

pub fn catalog_lookup(registry: &LookupRegistry) -> Option<&dyn CourseLookup> {
    registry.get(CatalogLookup::DEFAULT_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    use termplan_core::DeleteTermPolicy;
    use termplan_core::store::MemoryNotifier;

    fn config_for(dir: &Path) -> TermplanConfig {
        TermplanConfig {
            plan_path: dir.join("plan.toml"),
            catalog_path: None,
            missing_courses: Default::default(),
            delete_policy: DeleteTermPolicy::Reject,
            lookup_interval: None,
        }
    }

    #[test]
    fn save_then_load_restores_plan() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested/plan.toml");
        let plan = Plan::with_terms("io", 2);

        save_plan(&path, &plan).unwrap();
        assert_eq!(load_plan(&path).unwrap(), plan);
    }

    #[test]
    fn missing_plan_file_mentions_new_command() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = load_plan(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("termplan new"), "{err:#}");
    }

    #[test]
    fn create_plan_refuses_to_overwrite() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("plan.toml");
        create_plan(&path, &Plan::with_terms("a", 1), false).unwrap();

        let err = create_plan(&path, &Plan::with_terms("b", 1), false).unwrap_err();
        assert!(err.to_string().contains("--force"));
        create_plan(&path, &Plan::with_terms("b", 1), true).unwrap();
        assert_eq!(load_plan(&path).unwrap().name(), "b");
    }

    #[test]
    fn session_applies_configured_delete_policy() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = config_for(tmp.path());
        config.delete_policy = DeleteTermPolicy::Cascade;

        let mut plan = Plan::with_terms("s", 2);
        let course = Course::new("CS 135".parse().unwrap(), "Intro", termplan_core::Credits(1));
        let term = plan.terms()[0].id();
        plan.register_course(course);
        plan.place_course(&"CS 135".parse().unwrap(), term, None).unwrap();
        let path = config.plan_path.clone();
        save_plan(&path, &plan).unwrap();

        let mut session = Session::open_with(config, Arc::new(MemoryNotifier::new())).unwrap();
        session
            .dispatch(Command::DeleteTerm { term, policy: None })
            .unwrap();
        session.save().unwrap();

        let saved = load_plan(&path).unwrap();
        assert_eq!(saved.terms().len(), 1);
        assert!(saved.course("CS 135").is_some());
    }

    #[tokio::test]
    async fn lookups_without_catalog_find_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let registry = build_lookups(&config_for(tmp.path())).unwrap();
        assert_eq!(registry.list(), vec![CatalogLookup::DEFAULT_NAME]);

        let found = lookup_course(&registry, &"CS 135".parse().unwrap())
            .await
            .unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn rate_limited_lookup_keeps_the_catalog_name() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = config_for(tmp.path());
        config.lookup_interval = Some(std::time::Duration::from_millis(10));
        let registry = build_lookups(&config).unwrap();

        let lookup = catalog_lookup(&registry).unwrap();
        assert_eq!(lookup.name(), CatalogLookup::DEFAULT_NAME);
        assert!(format!("{registry:?}").contains("catalog"));
    }
}
