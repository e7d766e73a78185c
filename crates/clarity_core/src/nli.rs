//! NLI stance model client.
//!
//! The stance server wraps a natural-language-inference classifier behind a
//! small HTTP API: one (premise, hypothesis) call returns label/score pairs
//! in the usual classifier-pipeline shape. Labels are matched loosely since
//! model checkpoints disagree on casing ("ENTAILMENT" vs "entailment").

use crate::config::StanceConfig;
use crate::error::ModelError;
use crate::evidence::{StanceMethod, StanceResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct NliRequest<'a> {
    model: &'a str,
    premise: &'a str,
    hypothesis: &'a str,
}

#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

fn stance_from_labels(labels: &[LabelScore]) -> Result<StanceResult, ModelError> {
    let mut entailment = None;
    let mut contradiction = None;
    let mut neutral = None;

    for ls in labels {
        let label = ls.label.to_lowercase();
        let score = ls.score.clamp(0.0, 1.0);
        if label.contains("entail") {
            entailment = Some(score);
        } else if label.contains("contra") {
            contradiction = Some(score);
        } else if label.contains("neutral") {
            neutral = Some(score);
        }
    }

    if entailment.is_none() && contradiction.is_none() && neutral.is_none() {
        return Err(ModelError::InvalidResponse(
            "no recognizable stance labels".to_string(),
        ));
    }

    Ok(StanceResult {
        entailment: entailment.unwrap_or(0.0),
        contradiction: contradiction.unwrap_or(0.0),
        neutral: neutral.unwrap_or(0.0),
        method: StanceMethod::Nli,
    })
}

/// HTTP client for the stance classification server.
pub struct NliClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    timeout_secs: u64,
}

impl NliClient {
    pub fn new(config: &StanceConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout_secs: config.timeout_secs,
        })
    }

    /// Probe the server once at startup.
    pub async fn is_available(&self) -> bool {
        self.client
            .get(format!("{}/health", self.endpoint))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Score one (premise = evidence, hypothesis = claim) pair.
    pub async fn classify(
        &self,
        premise: &str,
        hypothesis: &str,
    ) -> Result<StanceResult, ModelError> {
        let body = NliRequest {
            model: &self.model,
            premise,
            hypothesis,
        };
        let response = self
            .client
            .post(format!("{}/predict", self.endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::from_reqwest(e, self.timeout_secs))?;

        if !response.status().is_success() {
            return Err(ModelError::Http(format!(
                "HTTP {} from stance server",
                response.status()
            )));
        }

        let labels: Vec<LabelScore> = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        stance_from_labels(&labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ls(label: &str, score: f32) -> LabelScore {
        LabelScore {
            label: label.to_string(),
            score,
        }
    }

    #[test]
    fn maps_transformer_style_labels() {
        let st = stance_from_labels(&[
            ls("ENTAILMENT", 0.81),
            ls("CONTRADICTION", 0.07),
            ls("NEUTRAL", 0.12),
        ])
        .unwrap();
        assert_eq!(st.entailment, 0.81);
        assert_eq!(st.contradiction, 0.07);
        assert_eq!(st.neutral, 0.12);
        assert_eq!(st.method, StanceMethod::Nli);
    }

    #[test]
    fn missing_labels_default_to_zero() {
        let st = stance_from_labels(&[ls("entailment", 0.6)]).unwrap();
        assert_eq!(st.entailment, 0.6);
        assert_eq!(st.contradiction, 0.0);
        assert_eq!(st.neutral, 0.0);
    }

    #[test]
    fn scores_are_clamped_to_unit_interval() {
        let st = stance_from_labels(&[ls("entailment", 1.3), ls("contradiction", -0.2)]).unwrap();
        assert_eq!(st.entailment, 1.0);
        assert_eq!(st.contradiction, 0.0);
    }

    #[test]
    fn unrecognizable_labels_are_an_error() {
        assert!(stance_from_labels(&[ls("positive", 0.9)]).is_err());
        assert!(stance_from_labels(&[]).is_err());
    }

    #[test]
    fn wire_shape_parses() {
        let labels: Vec<LabelScore> =
            serde_json::from_str(r#"[{"label": "entailment", "score": 0.9}]"#).unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].label, "entailment");
    }
}
