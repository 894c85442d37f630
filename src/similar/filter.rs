//! Caller filter expressions combined into one candidate restriction.

use std::sync::Arc;

use crate::document::DocId;
use crate::index::{DocPredicate, SimilarityIndex};
use crate::similar::observer::PipelineObserver;

/// Conjunction of parsed filter predicates.
///
/// A document passes when every predicate matches it. Both retrievers of a
/// request receive the same combined filter.
#[derive(Debug, Clone, Default)]
pub struct CombinedFilter {
    predicates: Vec<Arc<dyn DocPredicate>>,
}

impl CombinedFilter {
    /// Create a filter from parsed predicates.
    pub fn new(predicates: Vec<Arc<dyn DocPredicate>>) -> Self {
        Self { predicates }
    }

    /// Whether the document passes every predicate.
    pub fn matches(&self, doc_id: DocId) -> bool {
        self.predicates.iter().all(|p| p.matches(doc_id))
    }

    /// Number of predicates.
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Whether the filter has no predicate.
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Builds a [`CombinedFilter`] from filter expressions.
pub struct FilterBuilder;

impl FilterBuilder {
    /// Parse each expression with the index's filter parser and AND the results.
    ///
    /// An expression that fails to parse is reported to the observer and
    /// skipped; it does not fail the request. Returns `None` when nothing
    /// parsed, meaning no restriction.
    pub fn build<I, S>(
        index: &I,
        expressions: &[S],
        observer: &dyn PipelineObserver,
    ) -> Option<CombinedFilter>
    where
        I: SimilarityIndex + ?Sized,
        S: AsRef<str>,
    {
        let predicates: Vec<Arc<dyn DocPredicate>> = expressions
            .iter()
            .map(AsRef::as_ref)
            .filter_map(|expression| match index.parse_filter(expression) {
                Ok(predicate) => Some(predicate),
                Err(error) => {
                    observer.filter_rejected(expression, &error);
                    None
                }
            })
            .collect();

        if predicates.is_empty() {
            None
        } else {
            Some(CombinedFilter::new(predicates))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::StoredDocument;
    use crate::index::memory::MemoryIndex;
    use crate::similar::observer::NoopObserver;

    #[derive(Debug)]
    struct Even;

    impl DocPredicate for Even {
        fn matches(&self, doc_id: DocId) -> bool {
            doc_id % 2 == 0
        }
    }

    #[derive(Debug)]
    struct Below(DocId);

    impl DocPredicate for Below {
        fn matches(&self, doc_id: DocId) -> bool {
            doc_id < self.0
        }
    }

    #[test]
    fn test_combined_filter_is_conjunction() {
        let filter = CombinedFilter::new(vec![Arc::new(Even), Arc::new(Below(4))]);

        assert_eq!(filter.len(), 2);
        assert!(filter.matches(0));
        assert!(filter.matches(2));
        assert!(!filter.matches(3));
        assert!(!filter.matches(4));
        assert!(CombinedFilter::default().matches(7));
    }

    #[test]
    fn test_build_skips_invalid_expressions() {
        let index = MemoryIndex::default();
        for (id, category) in [("a", "tech"), ("b", "home"), ("c", "tech")] {
            index
                .add_document(
                    StoredDocument::builder(id)
                        .add_text("category", category)
                        .build(),
                )
                .unwrap();
        }
        index.commit().unwrap();
        let snapshot = index.snapshot();

        let filter =
            FilterBuilder::build(&snapshot, &["category:tech", "category:"], &NoopObserver)
                .unwrap();
        assert_eq!(filter.len(), 1);
        assert!(filter.matches(0));
        assert!(!filter.matches(1));

        assert!(FilterBuilder::build(&snapshot, &["OR OR"], &NoopObserver).is_none());
        assert!(FilterBuilder::build::<_, &str>(&snapshot, &[], &NoopObserver).is_none());
    }
}
