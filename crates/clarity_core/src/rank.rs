//! Candidate Ranker: score evidence texts against the claim and keep the
//! top-K.
//!
//! Scoring goes through the `SimilarityBackend` strategy so the degraded
//! path is a swapped implementation, not a nested error handler. The
//! embedding backend fans candidate calls out per item; one slow or broken
//! candidate scores 0.0 instead of stalling the batch.

use crate::embedding::EmbeddingClient;
use crate::error::ModelError;
use crate::evidence::{CandidateScore, EvidenceItem, SimilarityMethod};
use crate::similarity::{cosine, lexical_similarity};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Similarity scoring strategy, selected once at engine construction.
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    /// Which path this backend implements, recorded on every score.
    fn method(&self) -> SimilarityMethod;

    /// Score one text against the claim.
    async fn score_one(&self, claim: &str, text: &str) -> Result<f32, ModelError>;

    /// Score every text against the claim, in input order.
    /// Err means the whole batch is unusable (e.g. the claim itself failed
    /// to embed), not that one candidate did.
    async fn score_batch(&self, claim: &str, texts: &[String]) -> Result<Vec<f32>, ModelError>;
}

/// Primary path: shared-space sentence embeddings, cosine similarity.
pub struct EmbeddingSimilarity {
    client: Arc<EmbeddingClient>,
    timeout_secs: u64,
}

impl EmbeddingSimilarity {
    pub fn new(client: Arc<EmbeddingClient>, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
        }
    }
}

#[async_trait]
impl SimilarityBackend for EmbeddingSimilarity {
    fn method(&self) -> SimilarityMethod {
        SimilarityMethod::Semantic
    }

    async fn score_one(&self, claim: &str, text: &str) -> Result<f32, ModelError> {
        if text.is_empty() {
            return Ok(0.0);
        }
        let claim_vec = self.client.embed(claim).await?;
        let text_vec = self.client.embed(text).await?;
        Ok(cosine(&claim_vec, &text_vec))
    }

    async fn score_batch(&self, claim: &str, texts: &[String]) -> Result<Vec<f32>, ModelError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        // The claim embedding is the one call the batch cannot survive
        // without; candidates degrade individually.
        let claim_vec = self.client.embed(claim).await?;

        let mut join_set = tokio::task::JoinSet::new();
        for (idx, text) in texts.iter().enumerate() {
            if text.is_empty() {
                continue;
            }
            let client = Arc::clone(&self.client);
            let text = text.clone();
            let timeout = Duration::from_secs(self.timeout_secs);
            join_set.spawn(async move {
                let result = match tokio::time::timeout(timeout, client.embed(&text)).await {
                    Ok(inner) => inner,
                    Err(_) => Err(ModelError::Timeout(timeout.as_secs())),
                };
                (idx, result)
            });
        }

        let mut scores = vec![0.0f32; texts.len()];
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, Ok(vec))) => scores[idx] = cosine(&claim_vec, &vec),
                Ok((idx, Err(e))) => {
                    warn!("candidate {} embedding failed, scoring 0.0: {}", idx, e);
                }
                Err(e) => {
                    warn!("candidate embedding task failed, scoring 0.0: {}", e);
                }
            }
        }

        Ok(scores)
    }
}

/// Degraded path: max of character edit ratio and token-set overlap.
/// Pure CPU, infallible, absolute values not comparable with cosine.
pub struct LexicalSimilarity;

#[async_trait]
impl SimilarityBackend for LexicalSimilarity {
    fn method(&self) -> SimilarityMethod {
        SimilarityMethod::Lexical
    }

    async fn score_one(&self, claim: &str, text: &str) -> Result<f32, ModelError> {
        if text.is_empty() {
            return Ok(0.0);
        }
        Ok(lexical_similarity(claim, text))
    }

    async fn score_batch(&self, claim: &str, texts: &[String]) -> Result<Vec<f32>, ModelError> {
        Ok(texts
            .iter()
            .map(|t| if t.is_empty() { 0.0 } else { lexical_similarity(claim, t) })
            .collect())
    }
}

/// Stable top-K selection: similarity descending, ties keep input order.
pub fn top_k_candidates(
    items: &[EvidenceItem],
    scores: &[f32],
    method: SimilarityMethod,
    k: usize,
) -> Vec<CandidateScore> {
    let mut scored: Vec<CandidateScore> = items
        .iter()
        .zip(scores.iter())
        .map(|(item, &similarity)| CandidateScore {
            item: item.clone(),
            similarity,
            method,
        })
        .collect();
    scored.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(k);
    scored
}

/// Scripted similarity backend for tests and offline simulation.
pub struct FakeSimilarity {
    batches: std::sync::Mutex<Vec<Vec<f32>>>,
    default_score: f32,
    fail: bool,
    method: SimilarityMethod,
    call_count: std::sync::Mutex<usize>,
}

impl FakeSimilarity {
    /// Serve queued per-batch scores, then the default.
    pub fn with_batches(batches: Vec<Vec<f32>>) -> Self {
        Self {
            batches: std::sync::Mutex::new(batches),
            default_score: 0.0,
            fail: false,
            method: SimilarityMethod::Lexical,
            call_count: std::sync::Mutex::new(0),
        }
    }

    /// Score everything identically.
    pub fn always(score: f32) -> Self {
        let mut fake = Self::with_batches(Vec::new());
        fake.default_score = score;
        fake
    }

    /// Fail every call, as if the whole subsystem were down.
    pub fn always_failing() -> Self {
        let mut fake = Self::with_batches(Vec::new());
        fake.fail = true;
        fake
    }

    pub fn with_method(mut self, method: SimilarityMethod) -> Self {
        self.method = method;
        self
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    fn bump(&self) {
        *self.call_count.lock().unwrap() += 1;
    }
}

#[async_trait]
impl SimilarityBackend for FakeSimilarity {
    fn method(&self) -> SimilarityMethod {
        self.method
    }

    async fn score_one(&self, _claim: &str, _text: &str) -> Result<f32, ModelError> {
        self.bump();
        if self.fail {
            return Err(ModelError::Http("fake similarity failure".to_string()));
        }
        Ok(self.default_score)
    }

    async fn score_batch(&self, _claim: &str, texts: &[String]) -> Result<Vec<f32>, ModelError> {
        self.bump();
        if self.fail {
            return Err(ModelError::Http("fake similarity failure".to_string()));
        }
        let mut batches = self.batches.lock().unwrap();
        if batches.is_empty() {
            return Ok(vec![self.default_score; texts.len()]);
        }
        let mut batch = batches.remove(0);
        batch.resize(texts.len(), self.default_score);
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::EvidenceKind;
    use approx::assert_relative_eq;

    fn item(url: &str, title: &str) -> EvidenceItem {
        EvidenceItem {
            source: None,
            url: url.to_string(),
            title: title.to_string(),
            snippet: String::new(),
            structured_verdict: None,
            kind: EvidenceKind::News,
        }
    }

    #[tokio::test]
    async fn lexical_backend_scores_match_the_measure() {
        let backend = LexicalSimilarity;
        let claim = "government declares free electricity";
        let texts = vec![
            "government declares free electricity".to_string(),
            "rainfall forecast for tuesday".to_string(),
            String::new(),
        ];
        let scores = backend.score_batch(claim, &texts).await.unwrap();
        assert_relative_eq!(scores[0], 1.0);
        assert!(scores[1] < 0.4);
        assert_eq!(scores[2], 0.0);
        assert_eq!(backend.method(), SimilarityMethod::Lexical);
    }

    #[test]
    fn top_k_orders_descending_and_truncates() {
        let items = vec![item("a", "A"), item("b", "B"), item("c", "C")];
        let scores = [0.2, 0.9, 0.5];
        let top = top_k_candidates(&items, &scores, SimilarityMethod::Lexical, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].item.url, "b");
        assert_eq!(top[1].item.url, "c");
    }

    #[test]
    fn top_k_ties_preserve_input_order() {
        let items = vec![item("first", "A"), item("second", "B"), item("third", "C")];
        let scores = [0.5, 0.5, 0.5];
        let top = top_k_candidates(&items, &scores, SimilarityMethod::Semantic, 3);
        let urls: Vec<_> = top.iter().map(|c| c.item.url.as_str()).collect();
        assert_eq!(urls, vec!["first", "second", "third"]);
    }

    #[test]
    fn top_k_of_empty_input_is_empty() {
        let top = top_k_candidates(&[], &[], SimilarityMethod::Lexical, 5);
        assert!(top.is_empty());
    }

    #[tokio::test]
    async fn fake_serves_queued_batches_then_default() {
        let fake = FakeSimilarity::with_batches(vec![vec![0.9, 0.1]]);
        let texts = vec!["a".to_string(), "b".to_string()];
        let first = fake.score_batch("claim", &texts).await.unwrap();
        assert_eq!(first, vec![0.9, 0.1]);
        let second = fake.score_batch("claim", &texts).await.unwrap();
        assert_eq!(second, vec![0.0, 0.0]);
        assert_eq!(fake.call_count(), 2);
    }

    #[tokio::test]
    async fn fake_failure_mode_errors() {
        let fake = FakeSimilarity::always_failing();
        assert!(fake.score_batch("claim", &[]).await.is_err());
        assert!(fake.score_one("claim", "text").await.is_err());
    }

    #[tokio::test]
    async fn fake_pads_short_batches() {
        let fake = FakeSimilarity::with_batches(vec![vec![0.7]]);
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let scores = fake.score_batch("claim", &texts).await.unwrap();
        assert_eq!(scores, vec![0.7, 0.0, 0.0]);
    }
}
