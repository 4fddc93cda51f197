//! pillarscore-core — Pillar scoring engine, data model, and response recording.
//!
//! This crate defines the forms, pillars and questions a diagnostic is built
//! from, the pure scoring engine that turns an answer set into per-pillar
//! percentages and a bottleneck, and the recorder that persists results
//! behind a share token.

pub mod error;
pub mod level;
pub mod model;
pub mod parser;
pub mod presets;
pub mod record;
pub mod recorder;
pub mod registry;
pub mod report;
pub mod scoring;
pub mod statistics;
pub mod traits;

pub use error::{RecordError, ScoringError, StoreError};
pub use model::{AnswerSet, Form, Pillar, PillarScores, Question, QuestionOption};
pub use registry::PillarRegistry;
pub use scoring::{compute_result, ScoreResult};
