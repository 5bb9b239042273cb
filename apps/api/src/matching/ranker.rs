//! Similarity Ranker: orders candidate profiles by cosine similarity to a query.
//!
//! `similarity_score` is the raw cosine in [-1, 1]. Any percentage display is the
//! client's business. Equal scores fall back to catalog order (`JobProfile::id`).

use serde::Serialize;
use tracing::debug;

use crate::embedding::{cosine_similarity, EmbeddingError, EmbeddingProvider};
use crate::models::{Graded, JobProfile};

/// One ranked candidate. Borrows the profile from the catalog snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct MatchResult<'a> {
    /// 1-based position in the returned list.
    pub rank: usize,
    pub similarity_score: f32,
    pub profile: &'a JobProfile,
}

impl Graded for MatchResult<'_> {
    fn grade(&self) -> Option<i32> {
        self.profile.grade
    }
}

/// Ranks `candidates` against `query_text`.
///
/// Candidates without any descriptive text are left out. An empty candidate list
/// returns an empty result without touching the provider. Provider failures
/// propagate; nothing is ever scored as zero in their place.
pub async fn rank<'a>(
    query_text: &str,
    candidates: &[&'a JobProfile],
    provider: &dyn EmbeddingProvider,
) -> Result<Vec<MatchResult<'a>>, EmbeddingError> {
    let (profiles, texts): (Vec<&'a JobProfile>, Vec<String>) = candidates
        .iter()
        .filter_map(|p| p.merged_text().map(|text| (*p, text)))
        .unzip();

    if profiles.is_empty() {
        return Ok(Vec::new());
    }

    let candidate_vectors = provider.embed_batch(&texts).await?;
    if candidate_vectors.len() != profiles.len() {
        return Err(EmbeddingError::CountMismatch {
            expected: profiles.len(),
            got: candidate_vectors.len(),
        });
    }
    let query_vector = provider.embed_one(query_text).await?;

    let mut scored = profiles
        .into_iter()
        .zip(&candidate_vectors)
        .map(|(profile, vector)| {
            cosine_similarity(&query_vector, vector).map(|score| (profile, score))
        })
        .collect::<Result<Vec<_>, _>>()?;

    scored.sort_by(|(pa, a), (pb, b)| b.total_cmp(a).then_with(|| pa.id.cmp(&pb.id)));

    debug!(
        "Ranked {} candidates with {} (top score {:?})",
        scored.len(),
        provider.model_id(),
        scored.first().map(|(_, s)| *s)
    );

    Ok(scored
        .into_iter()
        .enumerate()
        .map(|(i, (profile, similarity_score))| MatchResult {
            rank: i + 1,
            similarity_score,
            profile,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::testing::ScriptedEmbedder;
    use crate::embedding::HashEmbedder;

    fn profile(id: usize, title: &str) -> JobProfile {
        JobProfile {
            id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn text(title: &str) -> String {
        format!("Job Title: {title}")
    }

    const QUERY: &str = "close the books every month";

    // Unit vectors at chosen angles to the query vector [1, 0].
    fn at_cosine(c: f32) -> Vec<f32> {
        vec![c, (1.0 - c * c).sqrt()]
    }

    #[tokio::test]
    async fn test_rank_orders_by_descending_similarity() {
        let (a, b, c) = (profile(0, "A"), profile(1, "B"), profile(2, "C"));
        let embedder = ScriptedEmbedder::new(
            vec![
                (QUERY, vec![1.0, 0.0]),
                (text("A").as_str(), at_cosine(0.9)),
                (text("B").as_str(), at_cosine(0.95)),
                (text("C").as_str(), at_cosine(0.2)),
            ],
            vec![0.0, 0.0],
        );

        let results = rank(QUERY, &[&a, &b, &c], &embedder).await.unwrap();
        let titles: Vec<_> = results.iter().map(|r| r.profile.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "A", "C"]);
        assert!((results[0].similarity_score - 0.95).abs() < 1e-5);
        assert!((results[1].similarity_score - 0.9).abs() < 1e-5);
        assert!((results[2].similarity_score - 0.2).abs() < 1e-5);
        assert_eq!(
            results.iter().map(|r| r.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[tokio::test]
    async fn test_rank_ties_keep_catalog_order() {
        let (a, b, c) = (profile(0, "A"), profile(1, "B"), profile(2, "C"));
        let embedder = ScriptedEmbedder::new(vec![(QUERY, vec![1.0, 0.0])], at_cosine(0.5));

        // Deliberately pass candidates out of catalog order.
        let results = rank(QUERY, &[&c, &a, &b], &embedder).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.profile.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_rank_empty_candidates_skips_provider() {
        let embedder = ScriptedEmbedder::new(vec![], vec![1.0]);
        let results = rank(QUERY, &[], &embedder).await.unwrap();
        assert!(results.is_empty());
        assert_eq!(embedder.batch_calls(), 0);
    }

    #[tokio::test]
    async fn test_rank_skips_profiles_without_text() {
        let blank = JobProfile::default();
        let named = profile(1, "Named");
        let embedder = ScriptedEmbedder::new(vec![], vec![1.0]);

        let results = rank(QUERY, &[&blank, &named], &embedder).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].profile.title, "Named");
    }

    #[tokio::test]
    async fn test_rank_batches_candidates_in_one_call() {
        let profiles: Vec<_> = (0..5).map(|i| profile(i, &format!("P{i}"))).collect();
        let refs: Vec<_> = profiles.iter().collect();
        let embedder = ScriptedEmbedder::new(vec![], vec![1.0]);

        rank(QUERY, &refs, &embedder).await.unwrap();
        // one batch for candidates, one for the query
        assert_eq!(embedder.batch_calls(), 2);
        assert_eq!(embedder.texts_embedded(), 6);
    }

    #[tokio::test]
    async fn test_rank_propagates_embedding_failure() {
        let a = profile(0, "A");
        let result = rank(QUERY, &[&a], &ScriptedEmbedder::failing()).await;
        assert!(matches!(result, Err(EmbeddingError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_rank_is_deterministic_with_hash_embedder() {
        let profiles = vec![
            profile(0, "Accountant reconciles ledgers"),
            profile(1, "Recruiter interviews candidates"),
            profile(2, "Accountant prepares closing"),
        ];
        let refs: Vec<_> = profiles.iter().collect();
        let embedder = HashEmbedder::default();
        let query = "reconcile ledgers and prepare the closing";

        let first: Vec<_> = rank(query, &refs, &embedder)
            .await
            .unwrap()
            .iter()
            .map(|r| (r.profile.id, r.similarity_score))
            .collect();
        let second: Vec<_> = rank(query, &refs, &embedder)
            .await
            .unwrap()
            .iter()
            .map(|r| (r.profile.id, r.similarity_score))
            .collect();
        assert_eq!(first, second);
    }
}
