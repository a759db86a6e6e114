//! Similarity filtering and ranking of raw search hits.

use crate::retrieval::passage::{Passage, RetrievalQuery, SearchHit};
use crate::retrieval::similarity::SimilarityTransform;
use std::cmp::Ordering;

/// Score, filter, sort and truncate vector-store hits.
///
/// Output holds at most `query.k` passages, each with
/// `similarity >= query.min_similarity`, sorted by similarity descending.
/// Ties keep the vector store's original order.
pub fn rank_hits(
    hits: Vec<SearchHit>,
    query: &RetrievalQuery,
    transform: SimilarityTransform,
) -> Vec<Passage> {
    let mut passages: Vec<Passage> = hits
        .into_iter()
        .enumerate()
        .map(|(rank, hit)| Passage {
            similarity: transform.similarity(hit.distance),
            source_id: hit.source_id,
            locator: hit.locator,
            text: hit.text,
            distance: hit.distance,
            rank,
        })
        .filter(|p| p.similarity >= query.min_similarity)
        .collect();

    // sort_by is stable
    passages.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    passages.truncate(query.k);
    passages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::passage::SourceLocator;

    fn hit(id: &str, distance: f64) -> SearchHit {
        SearchHit {
            source_id: id.to_string(),
            locator: SourceLocator::new(format!("doc-{}", id)),
            text: format!("text {}", id),
            distance,
        }
    }

    fn distance_for(similarity: f64) -> f64 {
        1.0 / similarity - 1.0
    }

    #[test]
    fn test_threshold_filters_and_orders() {
        let query = RetrievalQuery::new("explain the cost of capital", 5, 0.5).unwrap();
        let hits = vec![
            hit("a", distance_for(0.72)),
            hit("b", distance_for(0.61)),
            hit("c", distance_for(0.30)),
        ];
        let passages = rank_hits(hits, &query, SimilarityTransform::InverseDistance);

        assert_eq!(passages.len(), 2);
        assert!((passages[0].similarity - 0.72).abs() < 1e-9);
        assert!((passages[1].similarity - 0.61).abs() < 1e-9);
        assert_eq!(passages[0].source_id, "a");
    }

    #[test]
    fn test_truncates_to_k() {
        let query = RetrievalQuery::new("duration", 2, 0.0).unwrap();
        let hits = (0..6).map(|i| hit(&i.to_string(), i as f64 * 0.1)).collect();
        let passages = rank_hits(hits, &query, SimilarityTransform::InverseDistance);
        assert_eq!(passages.len(), 2);
        assert_eq!(passages[0].source_id, "0");
        assert_eq!(passages[1].source_id, "1");
    }

    #[test]
    fn test_ties_keep_store_rank() {
        let query = RetrievalQuery::new("beta", 3, 0.0).unwrap();
        let hits = vec![hit("first", 0.4), hit("second", 0.4), hit("best", 0.1)];
        let passages = rank_hits(hits, &query, SimilarityTransform::InverseDistance);
        let ids: Vec<_> = passages.iter().map(|p| p.source_id.as_str()).collect();
        assert_eq!(ids, ["best", "first", "second"]);
        assert_eq!(passages[1].rank, 0);
        assert_eq!(passages[2].rank, 1);
    }

    #[test]
    fn test_unordered_store_output_is_sorted() {
        let query = RetrievalQuery::new("convexity", 4, 0.2).unwrap();
        let hits = vec![hit("x", 0.9), hit("y", 0.2), hit("z", 3.5), hit("w", 0.5)];
        let passages = rank_hits(hits, &query, SimilarityTransform::InverseDistance);

        for pair in passages.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
        assert!(passages.iter().all(|p| p.similarity >= 0.2));
        assert!(passages.iter().all(|p| p.source_id != "z"));
    }

    #[test]
    fn test_empty_result_is_valid() {
        let query = RetrievalQuery::new("obscure", 3, 0.9).unwrap();
        let passages = rank_hits(vec![hit("a", 2.0)], &query, SimilarityTransform::InverseDistance);
        assert!(passages.is_empty());
    }
}
