//! In-memory report cache
//!
//! Reports are written once per successful run and read by any number of
//! concurrent lookups. The cache is unbounded and lives as long as the
//! process; there is no eviction and no persistence.
//!
//! # Example
//!
//! ```ignore
//! use dossier::report::ReportCache;
//!
//! let cache = ReportCache::new();
//! cache.put("flood-in-texas", report);
//! assert!(cache.get("flood-in-texas").is_some());
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::Report;

/// Slug-addressed store of validated reports
#[derive(Debug, Default)]
pub struct ReportCache {
    reports: RwLock<HashMap<String, Arc<Report>>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a report, replacing any earlier report with the same slug
    pub fn put(&self, slug: impl Into<String>, report: Report) -> Arc<Report> {
        let slug = slug.into();
        let report = Arc::new(report);
        let previous = self.reports.write().insert(slug.clone(), Arc::clone(&report));
        if previous.is_some() {
            tracing::warn!(slug = %slug, "Replacing cached report with the same slug");
        }
        report
    }

    pub fn get(&self, slug: &str) -> Option<Arc<Report>> {
        self.reports.read().get(slug).cloned()
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.reports.read().contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.read().is_empty()
    }

    /// Slugs currently cached, sorted
    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self.reports.read().keys().cloned().collect();
        slugs.sort();
        slugs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(title: &str) -> Report {
        let mut report = Report::default();
        report.article.title = title.to_string();
        report
    }

    #[test]
    fn test_get_missing_slug() {
        let cache = ReportCache::new();
        assert!(cache.get("nothing-here").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_overwrites_existing_slug() {
        let cache = ReportCache::new();
        cache.put("same-slug", report("A"));
        cache.put("same-slug", report("B"));

        let stored = cache.get("same-slug").unwrap();
        assert_eq!(stored.article.title, "B");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_slugs_are_sorted() {
        let cache = ReportCache::new();
        cache.put("b", report("B"));
        cache.put("a", report("A"));
        assert_eq!(cache.slugs(), vec!["a".to_string(), "b".to_string()]);
        assert!(cache.contains("a"));
    }

    #[tokio::test]
    async fn test_concurrent_readers_see_inserted_report() {
        let cache = Arc::new(ReportCache::new());
        cache.put("shared", report("Shared"));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.get("shared").is_some() }));
        }

        for handle in handles {
            assert!(handle.await.unwrap());
        }
    }
}
