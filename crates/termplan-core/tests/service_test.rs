//! Integration tests for the planner service and course lookups.

use std::sync::Arc;
use std::time::Duration;

use termplan_core::lookup::{CatalogLookup, CourseLookup, LookupRegistry, RateLimitedLookup};
use termplan_core::plan::{Planner, PlanToml};
use termplan_core::store::MemoryNotifier;
use termplan_core::{Plan, PlannerError, Store};
use termplan_test_utils::{code, sample_catalog, term_codes, term_id};

fn empty_store(terms: usize) -> (Store, Arc<MemoryNotifier>) {
    let notifier = Arc::new(MemoryNotifier::new());
    (Store::new(Plan::with_terms("svc", terms), notifier.clone()), notifier)
}

#[tokio::test]
async fn add_course_from_catalog_registers_and_places() {
    let (mut store, _) = empty_store(2);
    let lookup = CatalogLookup::from(sample_catalog());
    let t1 = term_id(store.plan(), 1);

    let mut planner = Planner::new(&mut store, &lookup);
    planner.add_course(&code("cs 136"), t1, None).await.unwrap();

    assert!(store.plan().course("CS 136").is_some());
    assert_eq!(term_codes(store.plan(), 1), vec!["CS 136"]);
}

#[tokio::test]
async fn unknown_course_is_not_found_and_nothing_changes() {
    let (mut store, notifier) = empty_store(1);
    let lookup = CatalogLookup::from(sample_catalog());
    let t0 = term_id(store.plan(), 0);

    let err = Planner::new(&mut store, &lookup)
        .add_course(&code("ART 101"), t0, None)
        .await
        .unwrap_err();
    assert_eq!(err, PlannerError::CourseNotFound(code("ART 101")));
    assert!(store.plan().registry().is_empty());
    assert_eq!(notifier.last().unwrap().message, "Course not found");
}

#[tokio::test]
async fn taken_course_is_rejected_before_fetching() {
    let (mut store, _) = empty_store(1);
    let lookup = CatalogLookup::from(sample_catalog());
    let t0 = term_id(store.plan(), 0);
    store
        .dispatch(termplan_core::Command::MarkTaken(code("CS 135")))
        .unwrap();

    let err = Planner::new(&mut store, &lookup)
        .add_course(&code("CS 135"), t0, None)
        .await
        .unwrap_err();
    assert_eq!(err, PlannerError::AlreadyTaken(code("CS 135")));
}

#[tokio::test]
async fn refresh_missing_registers_pending_courses() {
    // A snapshot whose placements reference courses with no registry entry.
    let mut snapshot = PlanToml::from_plan(&Plan::with_terms("svc", 1));
    snapshot.terms[0].courses = vec![code("CS 135"), code("ART 101")];
    let notifier = Arc::new(MemoryNotifier::new());
    let mut store = Store::new(snapshot.into_plan(), notifier);
    let lookup = CatalogLookup::from(sample_catalog());

    let summary = Planner::new(&mut store, &lookup)
        .refresh_missing()
        .await
        .unwrap();
    assert_eq!(summary.registered, vec![code("CS 135")]);
    assert_eq!(summary.unresolved, vec![code("ART 101")]);
    assert_eq!(store.plan().pending_courses(), vec![&code("ART 101")]);
}

#[tokio::test(start_paused = true)]
async fn planner_works_through_a_rate_limited_lookup() {
    let (mut store, _) = empty_store(2);
    let lookup = RateLimitedLookup::new(
        CatalogLookup::from(sample_catalog()),
        Duration::from_millis(250),
    );
    let (t0, t1) = (term_id(store.plan(), 0), term_id(store.plan(), 1));

    let start = tokio::time::Instant::now();
    let mut planner = Planner::new(&mut store, &lookup);
    planner.add_course(&code("CS 135"), t0, None).await.unwrap();
    planner.add_course(&code("CS 136"), t1, None).await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(250));
    assert_eq!(store.plan().placed_courses().count(), 2);
}

#[tokio::test]
async fn registry_selects_lookup_by_name() {
    let mut registry = LookupRegistry::new();
    registry.register(CatalogLookup::from(sample_catalog()));

    let lookup = registry.get("catalog").expect("catalog lookup registered");
    let course = lookup.fetch(&code("MATH 239")).await.unwrap().unwrap();
    assert_eq!(course.name, "Introduction to Combinatorics");
}
