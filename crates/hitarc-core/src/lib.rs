//! hitarc-core — Deterministic test-plan generation and response grading.
//!
//! This crate defines the seeded random stream, the item model, one generator
//! per assessment section, the plan assembler and the grader that scores
//! submitted responses against the stored answer keys.

pub mod banks;
pub mod coherence;
pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod grader;
pub mod model;
pub mod parser;
pub mod plan;
pub mod report;
pub mod results;
pub mod rng;
pub mod sections;
pub mod statistics;
pub mod traits;
