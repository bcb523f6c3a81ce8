use std::sync::Arc;

use dashmap::{mapref::entry::Entry as MapEntry, DashMap};

use crate::pipeline::AnalysisResult;

/// The latest analysis of each open document, keyed by document identity
/// (e.g. its URI).
///
/// Results are replaced whole, never merged. A missing entry means the
/// document wasn't analyzed yet, and readers should analyze on demand.
#[derive(Default)]
pub struct AnalysisCache {
    entries: DashMap<Box<str>, Entry>,
}

struct Entry {
    version: i32,
    result: Arc<AnalysisResult>,
}

impl AnalysisCache {
    pub fn new() -> AnalysisCache {
        AnalysisCache::default()
    }

    /// Stores `result` as the analysis of `version` of the document. Results
    /// for versions older than the stored one are dropped, returning `false`.
    pub fn publish(&self, id: &str, version: i32, result: AnalysisResult) -> bool {
        let result = Arc::new(result);
        match self.entries.entry(id.into()) {
            MapEntry::Occupied(mut occupied) => {
                if occupied.get().version > version {
                    tracing::debug!(id, version, stored = occupied.get().version, "stale analysis");
                    return false;
                }
                occupied.insert(Entry { version, result });
            }
            MapEntry::Vacant(vacant) => {
                vacant.insert(Entry { version, result });
            }
        }
        true
    }

    pub fn get(&self, id: &str) -> Option<Arc<AnalysisResult>> {
        self.entries.get(id).map(|entry| Arc::clone(&entry.result))
    }

    pub fn version(&self, id: &str) -> Option<i32> {
        self.entries.get(id).map(|entry| entry.version)
    }

    /// Forgets a closed document.
    pub fn remove(&self, id: &str) -> Option<Arc<AnalysisResult>> {
        self.entries.remove(id).map(|(_, entry)| entry.result)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::{config::AnalyzerConfig, pipeline::analyze_document};

    fn analysis(text: &str) -> AnalysisResult {
        analyze_document(text, &AnalyzerConfig::default(), &|_: &Path| false)
    }

    #[test]
    fn test_publish_replaces_and_rejects_stale() {
        let cache = AnalysisCache::new();
        assert!(cache.get("a.uc").is_none());

        assert!(cache.publish("a.uc", 2, analysis("let x;")));
        let held = cache.get("a.uc").unwrap();
        assert_eq!(held.diagnostics.len(), 1);

        assert!(!cache.publish("a.uc", 1, analysis("")));
        assert_eq!(cache.version("a.uc"), Some(2));

        assert!(cache.publish("a.uc", 3, analysis("")));
        assert!(cache.get("a.uc").unwrap().diagnostics.is_empty());
        // Readers keep the result they already hold.
        assert_eq!(held.diagnostics.len(), 1);

        assert!(cache.remove("a.uc").is_some());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_documents() {
        let cache = AnalysisCache::new();
        std::thread::scope(|s| {
            for i in 0..8 {
                let cache = &cache;
                s.spawn(move || {
                    let id = format!("doc{i}.uc");
                    for version in 0..4 {
                        assert!(cache.publish(&id, version, analysis("print(1);")));
                    }
                });
            }
        });
        assert_eq!(cache.len(), 8);
        assert!((0..8).all(|i| cache.version(&format!("doc{i}.uc")) == Some(3)));
    }
}
