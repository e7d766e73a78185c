//! Fusion Simulator - deterministic verdict aggregation scenarios, offline
//!
//! Usage:
//!   fusion_sim --scenario structured-override
//!   fusion_sim --scenario stance-consensus
//!   fusion_sim --scenario no-evidence
//!
//! Runs the real engine against scripted model backends, so every rule in
//! the aggregation protocol is exercised without a model server running.
//! Outputs machine-readable JSON reports to ./artifacts/simulations/

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, Level};

use clarity_core::factcard::FactCard;
use clarity_core::rank::{FakeSimilarity, SimilarityBackend};
use clarity_core::stance::{FakeStance, StanceBackend};
use clarity_core::{
    Config, EvidenceBundle, PriorVerdict, RawFactCheck, RawNews, RawStructured, StanceMethod,
    StanceResult, Verdict, VerdictEngine,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimulationReport {
    scenario: String,
    claim: String,
    evidence_items: usize,
    verdict: String,
    confidence: f32,
    trail_entries: usize,
    expected_verdict: String,
    success: bool,
    notes: String,
    summary_card: String,
}

struct Scenario {
    name: &'static str,
    claim: &'static str,
    prior: Option<PriorVerdict>,
    bundle: EvidenceBundle,
    similarity: Arc<dyn SimilarityBackend>,
    stances: Arc<dyn StanceBackend>,
    expected: Verdict,
    notes: &'static str,
}

fn stance(entailment: f32, contradiction: f32) -> StanceResult {
    StanceResult {
        entailment,
        contradiction,
        neutral: (1.0 - entailment - contradiction).max(0.0),
        method: StanceMethod::Nli,
    }
}

fn structured(publisher: &str, url: &str, rating: &str) -> RawStructured {
    RawStructured {
        publisher: Some(publisher.to_string()),
        url: Some(url.to_string()),
        title: None,
        text: None,
        rating: Some(rating.to_string()),
    }
}

fn fact_check(source: &str, url: &str, title: &str, verdict: &str) -> RawFactCheck {
    RawFactCheck {
        source: Some(source.to_string()),
        url: Some(url.to_string()),
        title: Some(title.to_string()),
        excerpt: None,
        verdict: Some(verdict.to_string()),
        provider: None,
    }
}

fn news(source: &str, url: &str, title: &str) -> RawNews {
    RawNews {
        source: Some(source.to_string()),
        url: Some(url.to_string()),
        title: Some(title.to_string()),
        description: None,
        published_at: None,
        provider: None,
    }
}

async fn run(scenario: Scenario) -> SimulationReport {
    let evidence_items = scenario.bundle.len();
    let engine =
        VerdictEngine::with_backends(Config::default(), scenario.similarity, scenario.stances);
    let result = engine
        .aggregate_verdict(scenario.claim, scenario.prior, scenario.bundle)
        .await;
    let card = FactCard::from_result(scenario.claim, &result);

    SimulationReport {
        scenario: scenario.name.to_string(),
        claim: scenario.claim.to_string(),
        evidence_items,
        verdict: result.verdict.to_string(),
        confidence: result.confidence,
        trail_entries: result.evidence_trail.len(),
        expected_verdict: scenario.expected.to_string(),
        success: result.verdict == scenario.expected,
        notes: scenario.notes.to_string(),
        summary_card: card.summary_text(),
    }
}

async fn simulate_structured_override() -> SimulationReport {
    let bundle = EvidenceBundle {
        structured: vec![structured(
            "PIB Fact Check",
            "https://pib.gov.in/factcheck/4821",
            "False",
        )],
        news: vec![
            news("Site A", "https://a.example/story", "Free electricity scheme goes viral"),
            news("Site B", "https://b.example/story", "Users share electricity claim widely"),
        ],
        ..Default::default()
    };

    run(Scenario {
        name: "structured-override",
        claim: "Government will give every citizen free electricity from next month",
        prior: None,
        bundle,
        similarity: Arc::new(FakeSimilarity::always(0.9)),
        stances: Arc::new(FakeStance::always(stance(0.9, 0.0))),
        expected: Verdict::Fake,
        notes: "Explicit structured rating decides alone; scoring never runs.",
    })
    .await
}

async fn simulate_scraper_override() -> SimulationReport {
    let bundle = EvidenceBundle {
        fact_checks: vec![fact_check(
            "AltNews",
            "https://altnews.example/electricity-debunk",
            "No, the government is not giving away free electricity",
            "False",
        )],
        news: vec![news(
            "Express",
            "https://express.example/power",
            "Electricity claim spreads on social media",
        )],
        ..Default::default()
    };

    run(Scenario {
        name: "scraper-override",
        claim: "government giving away free electricity to every citizen",
        prior: None,
        bundle,
        similarity: Arc::new(FakeSimilarity::with_batches(vec![vec![0.82, 0.30]])),
        stances: Arc::new(FakeStance::always(stance(0.9, 0.0))),
        expected: Verdict::Fake,
        notes: "Scraped verdict with similarity 0.82 overrides; confidence scales with the match.",
    })
    .await
}

async fn simulate_stance_consensus() -> SimulationReport {
    let bundle = EvidenceBundle {
        news: vec![
            news(
                "Reuters",
                "https://reuters.example/metro",
                "City metro extension opens to the public",
            ),
            news(
                "The Hindu",
                "https://thehindu.example/metro",
                "Metro line extension begins service",
            ),
            news(
                "PTI",
                "https://pti.example/metro",
                "Commuters board first train on extended line",
            ),
        ],
        ..Default::default()
    };

    run(Scenario {
        name: "stance-consensus",
        claim: "the metro extension has opened to the public",
        prior: None,
        bundle,
        similarity: Arc::new(FakeSimilarity::with_batches(vec![vec![0.7, 0.6, 0.5]])),
        stances: Arc::new(FakeStance::always(stance(0.75, 0.05))),
        expected: Verdict::True,
        notes: "No rating anywhere; a clear entailment majority carries the verdict.",
    })
    .await
}

async fn simulate_conflicting() -> SimulationReport {
    let bundle = EvidenceBundle {
        fact_checks: vec![fact_check(
            "Factly",
            "https://factly.example/water",
            "Examining the city water shutdown claim",
            "unproven",
        )],
        news: vec![news(
            "Tribune",
            "https://tribune.example/water",
            "Confusion over water supply announcement",
        )],
        ..Default::default()
    };

    run(Scenario {
        name: "conflicting",
        claim: "city water supply shut down for a week",
        prior: None,
        bundle,
        similarity: Arc::new(FakeSimilarity::with_batches(vec![vec![0.40, 0.35]])),
        stances: Arc::new(FakeStance::always(stance(0.45, 0.40))),
        expected: Verdict::Unverified,
        notes: "Entailment and contradiction nearly tie; the margin rule refuses to decide.",
    })
    .await
}

async fn simulate_no_evidence() -> SimulationReport {
    run(Scenario {
        name: "no-evidence",
        claim: "a claim nobody has covered anywhere",
        prior: None,
        bundle: EvidenceBundle::default(),
        similarity: Arc::new(FakeSimilarity::always(0.0)),
        stances: Arc::new(FakeStance::always_failing()),
        expected: Verdict::Unknown,
        notes: "Empty bundle and no prior; the engine declines rather than guesses.",
    })
    .await
}

async fn simulate_prior_passthrough() -> SimulationReport {
    run(Scenario {
        name: "prior-passthrough",
        claim: "an old rumor resurfacing without fresh coverage",
        prior: Some(PriorVerdict {
            verdict: Verdict::Misleading,
            confidence: 0.55,
        }),
        bundle: EvidenceBundle::default(),
        similarity: Arc::new(FakeSimilarity::always(0.0)),
        stances: Arc::new(FakeStance::always_failing()),
        expected: Verdict::Misleading,
        notes: "Empty bundle but an upstream prior exists; it passes through untouched.",
    })
    .await
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut scenario = "structured-override".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--scenario" => {
                if i + 1 < args.len() {
                    scenario = args[i + 1].clone();
                    i += 2;
                } else {
                    eprintln!("Error: --scenario requires a value");
                    std::process::exit(1);
                }
            }
            "--help" | "-h" => {
                println!("Fusion Simulator - offline aggregation scenarios");
                println!();
                println!("Usage:");
                println!("  fusion_sim --scenario <scenario>");
                println!();
                println!("Scenarios:");
                println!("  structured-override   Explicit rating wins before any scoring");
                println!("  scraper-override      High-similarity scraped verdict wins");
                println!("  stance-consensus      Entailment majority across news");
                println!("  conflicting           Near-tie stances stay unverified");
                println!("  no-evidence           Empty bundle, no prior");
                println!("  prior-passthrough     Empty bundle, upstream prior kept");
                std::process::exit(0);
            }
            _ => {
                eprintln!("Error: Unknown argument: {}", args[i]);
                eprintln!("Run with --help for usage");
                std::process::exit(1);
            }
        }
    }

    info!("fusion_sim v{} starting", env!("CARGO_PKG_VERSION"));

    let report = match scenario.as_str() {
        "structured-override" => simulate_structured_override().await,
        "scraper-override" => simulate_scraper_override().await,
        "stance-consensus" => simulate_stance_consensus().await,
        "conflicting" => simulate_conflicting().await,
        "no-evidence" => simulate_no_evidence().await,
        "prior-passthrough" => simulate_prior_passthrough().await,
        _ => {
            eprintln!("Error: Unknown scenario: {}", scenario);
            eprintln!(
                "Valid scenarios: structured-override, scraper-override, stance-consensus, \
                 conflicting, no-evidence, prior-passthrough"
            );
            std::process::exit(1);
        }
    };

    let output_dir = PathBuf::from("./artifacts/simulations");
    fs::create_dir_all(&output_dir).unwrap();

    let output_file = output_dir.join(format!("{}.json", scenario));
    let json = serde_json::to_string_pretty(&report).unwrap();
    fs::write(&output_file, json).unwrap();

    println!("\n=== Fusion Simulation: {} ===\n", scenario);
    println!("Claim:            {}", report.claim);
    println!("Evidence Items:   {}", report.evidence_items);
    println!("Verdict:          {}", report.verdict);
    println!("Confidence:       {:.3}", report.confidence);
    println!("Trail Entries:    {}", report.trail_entries);
    println!("Expected:         {}", report.expected_verdict);
    println!("Success:          {}", report.success);

    println!("\nNotes: {}", report.notes);
    println!("\n{}", report.summary_card);
    println!("\nReport saved to: {}\n", output_file.display());

    if report.success {
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}
