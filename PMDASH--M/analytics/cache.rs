use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::metrics::ProjectMetrics;

/// Latest metrics per project id. Last write wins; entries never expire.
///
/// Reads and writes go through one mutex, so a shared engine stays consistent
/// when callers do use it from several threads.
#[derive(Debug, Default)]
pub struct MetricsCache {
    entries: Mutex<IndexMap<String, ProjectMetrics>>,
}

impl MetricsCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `metrics` under its project id, returning the entry it replaced.
    pub fn insert(&self, metrics: ProjectMetrics) -> Option<ProjectMetrics> {
        self.entries
            .lock()
            .insert(metrics.project_id.clone(), metrics)
    }

    /// Latest metrics for `project_id`, if any were computed.
    #[must_use]
    pub fn get(&self, project_id: &str) -> Option<ProjectMetrics> {
        self.entries.lock().get(project_id).cloned()
    }

    /// Whether `project_id` has an entry.
    #[must_use]
    pub fn contains(&self, project_id: &str) -> bool {
        self.entries.lock().contains_key(project_id)
    }

    /// Number of cached projects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Copy of all entries in first-computed order.
    #[must_use]
    pub fn snapshot(&self) -> IndexMap<String, ProjectMetrics> {
        self.entries.lock().clone()
    }
}
