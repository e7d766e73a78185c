//! Stance Scorer: does the evidence entail, contradict, or ignore the
//! claim.
//!
//! Premise is always the evidence text, hypothesis the claim. The NLI
//! backend asks the model server; the heuristic backend derives a crude
//! stance from whatever similarity path is active. Both sit behind the
//! `StanceBackend` strategy picked at engine construction.

use crate::error::ModelError;
use crate::evidence::StanceResult;
use crate::nli::NliClient;
use crate::rank::SimilarityBackend;
use async_trait::async_trait;
use std::sync::Arc;

/// Stance scoring strategy.
#[async_trait]
pub trait StanceBackend: Send + Sync {
    /// Score one (claim, evidence text) pair.
    async fn score(&self, claim: &str, evidence_text: &str) -> Result<StanceResult, ModelError>;
}

/// Primary path: calibrated NLI model probabilities.
pub struct NliStance {
    client: Arc<NliClient>,
}

impl NliStance {
    pub fn new(client: Arc<NliClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StanceBackend for NliStance {
    async fn score(&self, claim: &str, evidence_text: &str) -> Result<StanceResult, ModelError> {
        self.client.classify(evidence_text, claim).await
    }
}

/// Degraded path: entailment = similarity, contradiction = 1 - similarity,
/// neutral = 0. A lower-confidence approximation, marked as such on the
/// result.
pub struct HeuristicStance {
    similarity: Arc<dyn SimilarityBackend>,
}

impl HeuristicStance {
    pub fn new(similarity: Arc<dyn SimilarityBackend>) -> Self {
        Self { similarity }
    }
}

#[async_trait]
impl StanceBackend for HeuristicStance {
    async fn score(&self, claim: &str, evidence_text: &str) -> Result<StanceResult, ModelError> {
        let sim = self.similarity.score_one(claim, evidence_text).await?;
        Ok(StanceResult::from_similarity(sim))
    }
}

/// Scripted stance backend for tests and offline simulation.
/// One queued result repeats forever; several pop in order; none errors.
pub struct FakeStance {
    results: std::sync::Mutex<Vec<Result<StanceResult, ModelError>>>,
    call_count: std::sync::Mutex<usize>,
}

impl FakeStance {
    pub fn new(results: Vec<Result<StanceResult, ModelError>>) -> Self {
        Self {
            results: std::sync::Mutex::new(results),
            call_count: std::sync::Mutex::new(0),
        }
    }

    /// Always return the same stance.
    pub fn always(result: StanceResult) -> Self {
        Self::new(vec![Ok(result)])
    }

    /// Fail every call.
    pub fn always_failing() -> Self {
        Self::new(vec![Err(ModelError::Http("fake stance failure".to_string()))])
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl StanceBackend for FakeStance {
    async fn score(&self, _claim: &str, _evidence_text: &str) -> Result<StanceResult, ModelError> {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;

        let mut results = self.results.lock().unwrap();
        if results.is_empty() {
            return Err(ModelError::InvalidResponse(
                "fake stance exhausted".to_string(),
            ));
        }

        if results.len() == 1 {
            results[0].clone()
        } else {
            results.remove(0)
        }
    }
}
