//! Course lookup: where course metadata comes from when a code is first
//! referenced.
//!
//! The [`CourseLookup`] trait is object-safe so lookups can be stored as
//! `Box<dyn CourseLookup>` in a [`LookupRegistry`] and picked by name.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::course::{Catalog, Course, CourseCode, CourseRegistry};

/// Source of course metadata.
///
/// `Ok(None)` means the source answered and does not know the course.
/// Callers treat an `Err` the same way after logging it.
#[async_trait]
pub trait CourseLookup: Send + Sync {
    /// Name used to select this lookup (e.g. "catalog").
    fn name(&self) -> &str;

    async fn fetch(&self, code: &CourseCode) -> Result<Option<Course>>;
}

// Compile-time assertion: CourseLookup must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn CourseLookup) {}
};

// ---------------------------------------------------------------------------
// CatalogLookup
// ---------------------------------------------------------------------------

/// Answers from an in-memory catalog.
#[derive(Debug, Clone)]
pub struct CatalogLookup {
    name: String,
    courses: CourseRegistry,
}

impl CatalogLookup {
    pub const DEFAULT_NAME: &'static str = "catalog";

    pub fn new(courses: CourseRegistry) -> Self {
        Self::named(Self::DEFAULT_NAME, courses)
    }

    pub fn named(name: impl Into<String>, courses: CourseRegistry) -> Self {
        Self {
            name: name.into(),
            courses,
        }
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl From<Catalog> for CatalogLookup {
    fn from(catalog: Catalog) -> Self {
        Self::new(catalog.courses)
    }
}

#[async_trait]
impl CourseLookup for CatalogLookup {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, code: &CourseCode) -> Result<Option<Course>> {
        Ok(self.courses.get(code.as_str()).cloned())
    }
}

// ---------------------------------------------------------------------------
// RateLimitedLookup
// ---------------------------------------------------------------------------

/// Wraps a lookup and spaces upstream fetches at least `min_interval`
/// apart. Concurrent callers are served one at a time.
pub struct RateLimitedLookup<L> {
    inner: L,
    min_interval: Duration,
    last_fetch: Mutex<Option<Instant>>,
}

impl<L: CourseLookup> RateLimitedLookup<L> {
    pub fn new(inner: L, min_interval: Duration) -> Self {
        Self {
            inner,
            min_interval,
            last_fetch: Mutex::new(None),
        }
    }

    pub fn into_inner(self) -> L {
        self.inner
    }
}

#[async_trait]
impl<L: CourseLookup> CourseLookup for RateLimitedLookup<L> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, code: &CourseCode) -> Result<Option<Course>> {
        let mut last = self.last_fetch.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            if ready_at > Instant::now() {
                let wait = ready_at - Instant::now();
                debug!(course = %code, wait_ms = wait.as_millis() as u64, "throttling lookup");
                tokio::time::sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
        self.inner.fetch(code).await
    }
}

impl<L> std::fmt::Debug for RateLimitedLookup<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitedLookup")
            .field("min_interval", &self.min_interval)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// LookupRegistry
// ---------------------------------------------------------------------------

/// A collection of registered [`CourseLookup`] implementations, keyed by
/// name.
#[derive(Default)]
pub struct LookupRegistry {
    lookups: HashMap<String, Box<dyn CourseLookup>>,
}

impl LookupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a lookup under [`CourseLookup::name`], replacing and
    /// returning any previous lookup with that name.
    pub fn register(&mut self, lookup: impl CourseLookup + 'static) -> Option<Box<dyn CourseLookup>> {
        let name = lookup.name().to_string();
        self.lookups.insert(name, Box::new(lookup))
    }

    pub fn get(&self, name: &str) -> Option<&dyn CourseLookup> {
        self.lookups.get(name).map(|b| b.as_ref())
    }

    /// Registered names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.lookups.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

impl std::fmt::Debug for LookupRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LookupRegistry")
            .field("lookups", &self.list())
            .finish()
    }
}
