//! Verdict Aggregator: the decision rules, pure and synchronous.
//!
//! The engine feeds pre-computed similarities and stances in; each rule
//! either produces a final `VerdictResult` or defers to the next. Strict
//! priority order: structured override, fact-check override, stance vote,
//! no evidence. First match wins.

use crate::config::EngineConfig;
use crate::evidence::{
    CandidateScore, EvidenceItem, EvidenceKind, PriorVerdict, StanceResult, TrailEntry, Verdict,
    VerdictResult,
};
use tracing::debug;

/// Vote weight for one item: fact-check family and self-described
/// fact-checkers count double news.
pub fn trust_weight(item: &EvidenceItem, config: &EngineConfig) -> f32 {
    if item.kind.is_fact_check_family() || item.source_mentions_fact() {
        config.fact_check_weight
    } else {
        config.news_weight
    }
}

/// Rule 1: an explicit structured rating is authoritative. Fake is scanned
/// before True so a conflicting pair of ratings resolves to the safe side.
/// Ignores similarity and stance entirely.
pub fn structured_override(
    items: &[EvidenceItem],
    config: &EngineConfig,
) -> Option<VerdictResult> {
    for target in [Verdict::Fake, Verdict::True] {
        if let Some(item) = items.iter().find(|i| {
            i.kind == EvidenceKind::StructuredFactCheck && i.structured_verdict == Some(target)
        }) {
            debug!("structured override: {} from {:?}", target, item.source);
            return Some(VerdictResult::new(
                target,
                config.structured_confidence,
                vec![TrailEntry {
                    item: item.clone(),
                    similarity: None,
                    stance: None,
                }],
            ));
        }
    }
    None
}

/// Rule 2: a scraped fact-check with a derived Fake/True rating wins when
/// it actually matches the claim. `scores` is aligned with `items`, one
/// similarity per item; the best-matching qualifying item is taken.
pub fn fact_check_override(
    items: &[EvidenceItem],
    scores: &[f32],
    config: &EngineConfig,
) -> Option<VerdictResult> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, (item, &similarity)) in items.iter().zip(scores.iter()).enumerate() {
        if item.kind != EvidenceKind::FactCheck {
            continue;
        }
        let verdict = match item.structured_verdict {
            Some(Verdict::Fake) | Some(Verdict::True) => item.structured_verdict,
            _ => None,
        };
        if verdict.is_none() || similarity < config.match_threshold {
            continue;
        }
        match best {
            Some((_, s)) if s >= similarity => {}
            _ => best = Some((idx, similarity)),
        }
    }

    let (idx, similarity) = best?;
    let item = &items[idx];
    let verdict = item.structured_verdict?;
    let confidence = (config.override_base_confidence
        + config.override_similarity_gain * similarity)
        .min(config.max_confidence);
    debug!(
        "fact-check override: {} at similarity {:.2} from {:?}",
        verdict, similarity, item.source
    );
    Some(VerdictResult::new(
        verdict,
        confidence,
        vec![TrailEntry {
            item: item.clone(),
            similarity: Some(similarity),
            stance: None,
        }],
    ))
}

/// Rule 3: trust-weighted stance vote over the scored top-K candidates.
/// `stances` is aligned with `candidates`; `None` marks a candidate whose
/// stance computation failed, excluded as weight 0. Defers (returns None)
/// when nothing carried any weight.
pub fn stance_vote(
    candidates: &[CandidateScore],
    stances: &[Option<StanceResult>],
    config: &EngineConfig,
) -> Option<VerdictResult> {
    let mut total_weight = 0.0f32;
    let mut entail_sum = 0.0f32;
    let mut contra_sum = 0.0f32;
    let mut trail = Vec::new();

    for (candidate, stance) in candidates.iter().zip(stances.iter()) {
        let Some(stance) = stance else {
            continue;
        };
        let weight = trust_weight(&candidate.item, config);
        total_weight += weight;
        entail_sum += weight * stance.entailment;
        contra_sum += weight * stance.contradiction;
        trail.push(TrailEntry {
            item: candidate.item.clone(),
            similarity: Some(candidate.similarity),
            stance: Some(*stance),
        });
    }

    if total_weight == 0.0 {
        return None;
    }

    let avg_entail = entail_sum / total_weight;
    let avg_contra = contra_sum / total_weight;
    debug!(
        "stance vote: avg_entail {:.3}, avg_contra {:.3}, weight {:.1}",
        avg_entail, avg_contra, total_weight
    );

    if avg_contra - avg_entail > config.stance_margin && avg_contra > config.stance_floor {
        return Some(VerdictResult::new(
            Verdict::Fake,
            avg_contra.min(config.max_confidence),
            trail,
        ));
    }
    if avg_entail - avg_contra > config.stance_margin && avg_entail > config.stance_floor {
        return Some(VerdictResult::new(
            Verdict::True,
            avg_entail.min(config.max_confidence),
            trail,
        ));
    }
    Some(VerdictResult::new(
        Verdict::Unverified,
        avg_entail.max(avg_contra),
        trail,
    ))
}

/// Rule 4: nothing to aggregate. A prior from the upstream classifier
/// passes through unchanged; otherwise the engine knows nothing.
pub fn no_evidence(prior: Option<PriorVerdict>) -> VerdictResult {
    match prior {
        Some(prior) => VerdictResult::new(prior.verdict, prior.confidence, Vec::new()),
        None => VerdictResult::unknown(),
    }
}
