mod error;
pub mod predictor;

pub use error::CatalogError;
pub use predictor::{
    analyze_symptoms, default_catalog, PredictionResult, PredictiveEngine, RuleCatalog,
    SymptomObservation,
};

/// Install the fmt subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Returns quietly if a global subscriber is already set.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();
}
