//! The verdict engine: public aggregation surface and pipeline
//! orchestration.
//!
//! Construction probes the model servers once and fixes the scoring
//! strategies for the life of the process. Aggregation itself is
//! per-candidate parallel with bounded calls; a full `VerdictResult` always
//! comes back, whatever fails underneath.

use crate::aggregate;
use crate::config::Config;
use crate::dedup::dedup_records;
use crate::embedding::EmbeddingClient;
use crate::error::ModelError;
use crate::evidence::{
    CandidateScore, EvidenceBundle, EvidenceItem, PriorVerdict, SimilarityMethod, StanceResult,
    VerdictResult,
};
use crate::nli::NliClient;
use crate::normalize::normalize_records;
use crate::rank::{top_k_candidates, EmbeddingSimilarity, LexicalSimilarity, SimilarityBackend};
use crate::stance::{HeuristicStance, NliStance, StanceBackend};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

pub struct VerdictEngine {
    config: Config,
    similarity: Arc<dyn SimilarityBackend>,
    stance: Arc<dyn StanceBackend>,
}

impl VerdictEngine {
    /// Build with explicit backends. The test and simulation entry point.
    pub fn with_backends(
        config: Config,
        similarity: Arc<dyn SimilarityBackend>,
        stance: Arc<dyn StanceBackend>,
    ) -> Self {
        Self {
            config,
            similarity,
            stance,
        }
    }

    /// Probe the model servers and pick strategies: embeddings when the
    /// embedding server answers, lexical otherwise; NLI when the stance
    /// server answers, similarity heuristic otherwise.
    pub async fn detect(config: Config) -> Self {
        let similarity: Arc<dyn SimilarityBackend> = if config.embedding.enabled {
            match EmbeddingClient::new(&config.embedding) {
                Ok(client) => {
                    let client = Arc::new(client);
                    if client.is_available().await {
                        info!(
                            "embedding server up at {}, semantic similarity selected",
                            config.embedding.endpoint
                        );
                        Arc::new(EmbeddingSimilarity::new(
                            client,
                            config.embedding.timeout_secs,
                        ))
                    } else {
                        warn!(
                            "embedding server unreachable at {}, lexical similarity selected",
                            config.embedding.endpoint
                        );
                        Arc::new(LexicalSimilarity)
                    }
                }
                Err(e) => {
                    warn!("embedding client init failed ({}), lexical similarity selected", e);
                    Arc::new(LexicalSimilarity)
                }
            }
        } else {
            info!("embedding disabled, lexical similarity selected");
            Arc::new(LexicalSimilarity)
        };

        let stance: Arc<dyn StanceBackend> = if config.stance.enabled {
            match NliClient::new(&config.stance) {
                Ok(client) => {
                    let client = Arc::new(client);
                    if client.is_available().await {
                        info!(
                            "stance server up at {}, NLI scoring selected",
                            config.stance.endpoint
                        );
                        Arc::new(NliStance::new(client))
                    } else {
                        warn!(
                            "stance server unreachable at {}, similarity heuristic selected",
                            config.stance.endpoint
                        );
                        Arc::new(HeuristicStance::new(Arc::clone(&similarity)))
                    }
                }
                Err(e) => {
                    warn!("stance client init failed ({}), similarity heuristic selected", e);
                    Arc::new(HeuristicStance::new(Arc::clone(&similarity)))
                }
            }
        } else {
            info!("stance model disabled, similarity heuristic selected");
            Arc::new(HeuristicStance::new(Arc::clone(&similarity)))
        };

        Self::with_backends(config, similarity, stance)
    }

    /// Fuse everything known about a claim into one verdict.
    ///
    /// Never errors: malformed input and scoring failures degrade per the
    /// rule protocol, and the caller always gets a well-formed result.
    pub async fn aggregate_verdict(
        &self,
        claim: &str,
        prior: Option<PriorVerdict>,
        bundle: EvidenceBundle,
    ) -> VerdictResult {
        let claim = claim.trim();
        if claim.is_empty() {
            warn!("empty claim, nothing to verify");
            return VerdictResult::unknown();
        }

        let records = dedup_records(bundle.into_ordered());
        let items = normalize_records(records);
        info!(
            "aggregating: {} evidence items, prior {}",
            items.len(),
            prior.map(|p| p.verdict.to_string()).unwrap_or_else(|| "none".to_string())
        );

        // Rule 1 consults ratings only; no scoring cost.
        if let Some(result) = aggregate::structured_override(&items, &self.config.engine) {
            return result;
        }

        if items.is_empty() {
            return aggregate::no_evidence(prior);
        }

        let texts: Vec<String> = items.iter().map(|i| i.candidate_text()).collect();
        let (scores, method) = self.score_all(claim, &texts).await;

        if let Some(result) = aggregate::fact_check_override(&items, &scores, &self.config.engine)
        {
            return result;
        }

        let candidates = top_k_candidates(&items, &scores, method, self.config.engine.top_k);
        let stances = self.stance_for_candidates(claim, &candidates).await;
        if let Some(result) = aggregate::stance_vote(&candidates, &stances, &self.config.engine) {
            return result;
        }

        aggregate::no_evidence(prior)
    }

    /// Top-K candidates for a claim, independently callable.
    pub async fn rank_candidates(
        &self,
        claim: &str,
        items: &[EvidenceItem],
    ) -> Vec<CandidateScore> {
        let claim = claim.trim();
        if claim.is_empty() || items.is_empty() {
            return Vec::new();
        }
        let texts: Vec<String> = items.iter().map(|i| i.candidate_text()).collect();
        let (scores, method) = self.score_all(claim, &texts).await;
        top_k_candidates(items, &scores, method, self.config.engine.top_k)
    }

    /// Stance for one (claim, evidence text) pair, independently callable.
    /// Failures collapse to the uninformative default instead of erroring.
    pub async fn score_stance(&self, claim: &str, text: &str) -> StanceResult {
        match self.stance.score(claim, text).await {
            Ok(stance) => stance,
            Err(e) => {
                warn!("stance scoring failed, returning uninformative: {}", e);
                StanceResult::uninformative()
            }
        }
    }

    /// Score every candidate text. A whole-batch failure (the claim itself
    /// would not score) degrades the call to the lexical backend.
    async fn score_all(&self, claim: &str, texts: &[String]) -> (Vec<f32>, SimilarityMethod) {
        match self.similarity.score_batch(claim, texts).await {
            Ok(scores) => (scores, self.similarity.method()),
            Err(e) => {
                warn!("similarity backend failed ({}), degrading to lexical", e);
                let scores = LexicalSimilarity
                    .score_batch(claim, texts)
                    .await
                    .unwrap_or_else(|_| vec![0.0; texts.len()]);
                (scores, SimilarityMethod::Lexical)
            }
        }
    }

    /// Fan stance scoring out per candidate, bounded by the stance timeout.
    /// `None` marks a candidate whose computation failed; the vote excludes
    /// it rather than failing the claim.
    async fn stance_for_candidates(
        &self,
        claim: &str,
        candidates: &[CandidateScore],
    ) -> Vec<Option<StanceResult>> {
        let mut results: Vec<Option<StanceResult>> = vec![None; candidates.len()];
        if candidates.is_empty() {
            return results;
        }

        let timeout = Duration::from_secs(self.config.stance.timeout_secs);
        let mut join_set = tokio::task::JoinSet::new();
        for (idx, candidate) in candidates.iter().enumerate() {
            let text = candidate.item.candidate_text();
            if text.is_empty() {
                continue;
            }
            let claim = claim.to_string();
            let stance = Arc::clone(&self.stance);
            join_set.spawn(async move {
                let result = match tokio::time::timeout(timeout, stance.score(&claim, &text)).await
                {
                    Ok(inner) => inner,
                    Err(_) => Err(ModelError::Timeout(timeout.as_secs())),
                };
                (idx, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, Ok(stance))) => results[idx] = Some(stance),
                Ok((idx, Err(e))) => {
                    warn!("stance failed for candidate {}, excluding: {}", idx, e);
                }
                Err(e) => {
                    warn!("stance task failed, excluding candidate: {}", e);
                }
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::EvidenceKind;
    use crate::rank::FakeSimilarity;
    use crate::stance::FakeStance;

    fn engine_with(similarity: FakeSimilarity, stance: FakeStance) -> VerdictEngine {
        VerdictEngine::with_backends(
            Config::default(),
            Arc::new(similarity),
            Arc::new(stance),
        )
    }

    fn news_item(url: &str, title: &str) -> EvidenceItem {
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
    async fn empty_claim_is_unknown_even_with_evidence() {
        let engine = engine_with(FakeSimilarity::always(0.9), FakeStance::always_failing());
        let bundle = EvidenceBundle {
            news: vec![crate::evidence::RawNews {
                url: Some("https://a.test".to_string()),
                title: Some("anything".to_string()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let result = engine.aggregate_verdict("   ", None, bundle).await;
        assert_eq!(result.verdict, crate::evidence::Verdict::Unknown);
        assert_eq!(result.confidence, 0.0);
        assert!(result.evidence_trail.is_empty());
    }

    #[tokio::test]
    async fn rank_candidates_is_empty_for_empty_inputs() {
        let engine = engine_with(FakeSimilarity::always(0.5), FakeStance::always_failing());
        assert!(engine.rank_candidates("claim", &[]).await.is_empty());
        let items = vec![news_item("https://a.test", "title")];
        assert!(engine.rank_candidates("", &items).await.is_empty());
    }

    #[tokio::test]
    async fn rank_candidates_orders_and_tags_method() {
        let engine = engine_with(
            FakeSimilarity::with_batches(vec![vec![0.2, 0.8]]),
            FakeStance::always_failing(),
        );
        let items = vec![
            news_item("https://a.test", "first"),
            news_item("https://b.test", "second"),
        ];
        let ranked = engine.rank_candidates("claim", &items).await;
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].item.url, "https://b.test");
        assert_eq!(ranked[0].method, SimilarityMethod::Lexical);
    }

    #[tokio::test]
    async fn score_stance_defaults_on_failure() {
        let engine = engine_with(FakeSimilarity::always(0.5), FakeStance::always_failing());
        let stance = engine.score_stance("claim", "evidence").await;
        assert_eq!(stance, StanceResult::uninformative());
    }
}
