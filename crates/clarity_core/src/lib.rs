//! Clarity core - evidence fusion and verdict aggregation.
//!
//! Takes a natural-language claim plus a pool of heterogeneous evidence
//! records (scraped fact-checks, news hits, structured fact-check ratings)
//! and produces one verdict, a confidence score, and the evidence trail.
//! Model-backed scoring degrades to lexical heuristics when the embedding
//! or NLI server is unavailable; the engine never fails a request over a
//! single bad evidence item.

pub mod aggregate;
pub mod config;
pub mod dedup;
pub mod embedding;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod factcard;
pub mod nli;
pub mod normalize;
pub mod rank;
pub mod similarity;
pub mod stance;

pub use config::Config;
pub use engine::VerdictEngine;
pub use evidence::*;
