//! Symptom-to-failure prediction engine for diesel generator sets.
//!
//! This module provides a TOML-driven rule engine that turns an operator's
//! partial symptom observations into ranked failure predictions with cost
//! estimates.
//!
//! # Architecture
//!
//! - **Catalog**: Loaded from TOML at startup (or the embedded default), validated, immutable
//! - **Observation**: Sparse record; unanswered fields are unknown, never "normal"
//! - **Evaluation**: Three-valued logic; only definitely triggered rules are reported
//! - **Scoring**: Probability and risk scaled by how severe the matching readings are
//!
//! # Example
//!
//! ```ignore
//! use maintenance_companion::predictor::{
//!     default_catalog, PredictiveEngine, SmokeColor, SmokeTiming, SymptomObservation,
//! };
//!
//! let engine = PredictiveEngine::new(default_catalog());
//!
//! let observation = SymptomObservation {
//!     exhaust_smoke_color: Some(SmokeColor::Blue),
//!     exhaust_smoke_timing: Some(SmokeTiming::Constant),
//!     ..Default::default()
//! };
//!
//! for prediction in engine.analyze(&observation) {
//!     println!("{:?} {} ({}%, risk {:.0})",
//!         prediction.urgency, prediction.title, prediction.probability, prediction.risk_score);
//! }
//! ```

mod catalog;
mod engine;
mod logic;
mod observation;
mod rules;
mod types;

pub use catalog::RuleCatalog;
pub use engine::{analyze_symptoms, PredictiveEngine};
pub use logic::Truth;
pub use observation::*;
pub use rules::{default_catalog, load_catalog, load_catalog_or_default, parse_catalog};
pub use types::*;
