//! Rule evaluation engine for symptom-to-failure prediction.
//!
//! The `PredictiveEngine` evaluates a symptom observation against every
//! catalog rule using three-valued logic, scores the rules that definitely
//! fire, and returns them ranked for display.

use tracing::debug;

use super::catalog::RuleCatalog;
use super::logic::Truth;
use super::observation::{Reading, SymptomObservation};
use super::types::*;

/// Intensity of a condition met only in its mild region.
const MILD_INTENSITY: f32 = 0.7;

const FULL_INTENSITY: f32 = 1.0;

/// Share of the risk score driven by probability (the rest is urgency).
const PROBABILITY_RISK_FACTOR: f32 = 0.6;

/// The prediction engine.
///
/// Owns an immutable catalog; wrap it in an `Arc` to share between
/// request handlers.
#[derive(Debug, Clone)]
pub struct PredictiveEngine {
    catalog: RuleCatalog,
}

impl PredictiveEngine {
    /// Create a new engine over the given catalog.
    ///
    /// # Arguments
    /// * `catalog` - Rule catalog (typically from `default_catalog()` or `load_catalog()`)
    pub fn new(catalog: RuleCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    /// Ranked predictions for `observation`. See [`analyze_symptoms`].
    pub fn analyze(&self, observation: &SymptomObservation) -> Vec<PredictionResult> {
        analyze_symptoms(&self.catalog, observation)
    }

    /// Ranked predictions plus totals for the UI header.
    pub fn report(&self, observation: &SymptomObservation) -> AnalysisReport {
        let predictions = self.analyze(observation);
        let summary = AnalysisSummary::from_predictions(&predictions);
        AnalysisReport {
            predictions,
            summary,
        }
    }

    /// Three-valued status of one rule's trigger, or `None` for an unknown id.
    pub fn rule_status(&self, rule_id: &str, observation: &SymptomObservation) -> Option<Truth> {
        self.catalog
            .get(rule_id)
            .map(|rule| evaluate(&rule.trigger, observation).truth)
    }
}

/// Evaluate `observation` against every rule in `catalog`.
///
/// Only rules whose trigger is definitely true are returned, sorted by
/// urgency (highest first), then risk score (highest first), then catalog
/// order. Never fails; an empty observation or catalog yields no
/// predictions.
pub fn analyze_symptoms(
    catalog: &RuleCatalog,
    observation: &SymptomObservation,
) -> Vec<PredictionResult> {
    let mut results: Vec<PredictionResult> = catalog
        .rules()
        .iter()
        .filter_map(|rule| {
            let verdict = evaluate(&rule.trigger, observation);
            verdict
                .truth
                .is_true()
                .then(|| score(rule, verdict.intensity))
        })
        .collect();

    // Stable sort keeps catalog order for ties
    results.sort_by(|a, b| {
        b.urgency
            .cmp(&a.urgency)
            .then_with(|| b.risk_score.total_cmp(&a.risk_score))
    });

    debug!(
        "Matched {} of {} rules from {} observed fields",
        results.len(),
        catalog.len(),
        observation.observed_count()
    );

    results
}

/// Result of evaluating a predicate node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Verdict {
    truth: Truth,
    /// How severe the satisfying readings were (0.7-1.0). Only meaningful
    /// when `truth` is `True`; nodes with no severity signal (`not`) count
    /// as full strength.
    intensity: f32,
}

impl Verdict {
    fn full(truth: Truth) -> Self {
        Self {
            truth,
            intensity: FULL_INTENSITY,
        }
    }
}

fn evaluate(predicate: &Predicate, observation: &SymptomObservation) -> Verdict {
    match predicate {
        Predicate::All { all } => {
            let verdicts: Vec<Verdict> = all.iter().map(|p| evaluate(p, observation)).collect();
            let truth = Truth::all(verdicts.iter().map(|v| v.truth));
            if !truth.is_true() {
                return Verdict::full(truth);
            }
            let intensity =
                verdicts.iter().map(|v| v.intensity).sum::<f32>() / verdicts.len() as f32;
            Verdict { truth, intensity }
        }
        Predicate::Any { any } => {
            let verdicts: Vec<Verdict> = any.iter().map(|p| evaluate(p, observation)).collect();
            let truth = Truth::any(verdicts.iter().map(|v| v.truth));
            if !truth.is_true() {
                return Verdict::full(truth);
            }
            // A branch turning true can only raise the max
            let intensity = verdicts
                .iter()
                .filter(|v| v.truth.is_true())
                .map(|v| v.intensity)
                .fold(MILD_INTENSITY, f32::max);
            Verdict { truth, intensity }
        }
        Predicate::Not { not } => Verdict::full(!evaluate(not, observation).truth),
        Predicate::Condition(condition) => evaluate_condition(condition, observation),
    }
}

fn evaluate_condition(condition: &Condition, observation: &SymptomObservation) -> Verdict {
    let Some(reading) = observation.reading(condition.field) else {
        return Verdict::full(Truth::Unknown);
    };

    match (reading, &condition.is) {
        (Reading::Graded { label, rank }, Test::OneOf(accepted)) => {
            if !accepted.iter().any(|l| l == label) {
                return Verdict::full(Truth::False);
            }
            let ranks = accepted.iter().filter_map(|l| condition.field.rank_of(l));
            let (lo, hi) = ranks.fold((u8::MAX, u8::MIN), |(lo, hi), r| (lo.min(r), hi.max(r)));
            let intensity = if hi > lo {
                MILD_INTENSITY
                    + (FULL_INTENSITY - MILD_INTENSITY) * f32::from(rank - lo) / f32::from(hi - lo)
            } else {
                FULL_INTENSITY
            };
            Verdict {
                truth: Truth::True,
                intensity,
            }
        }
        (Reading::Measured(value), test) => match test.threshold() {
            Some(threshold) if test.holds(value, threshold) => {
                let intensity = match condition.critical {
                    Some(critical) if !test.holds(value, critical) => MILD_INTENSITY,
                    _ => FULL_INTENSITY,
                };
                Verdict {
                    truth: Truth::True,
                    intensity,
                }
            }
            Some(_) => Verdict::full(Truth::False),
            // Kind mismatches are rejected when the catalog is built
            None => Verdict::full(Truth::Unknown),
        },
        _ => Verdict::full(Truth::Unknown),
    }
}

fn score(rule: &PredictionRule, intensity: f32) -> PredictionResult {
    let probability = (rule.base_probability * intensity).round().clamp(0.0, 100.0) as u8;
    let risk_score = rule.urgency.risk_weight() + f32::from(probability) * PROBABILITY_RISK_FACTOR;

    PredictionResult {
        rule_id: rule.id.clone(),
        title: rule.title.clone(),
        category: rule.category,
        symptom: rule.symptom.clone(),
        urgency: rule.urgency,
        probability,
        risk_score,
        consequence: rule.consequence.clone(),
        recommended_action: rule.recommended_action.clone(),
        repair_cost: rule.repair_cost,
        downtime_cost: rule.downtime_cost,
        savings_if_fixed_now: savings_if_fixed_now(rule, intensity),
        links: rule.links.clone(),
    }
}

/// Ignoring a fault multiplies the repair bill by 2-3x (scaled by
/// intensity) and adds an unplanned outage.
fn savings_if_fixed_now(rule: &PredictionRule, intensity: f32) -> u64 {
    let intensity = f64::from(intensity);
    let repair_now = rule.repair_cost.midpoint();
    let repair_later = repair_now * (2.0 + intensity);
    let downtime_avoided = rule.downtime_cost as f64 * intensity;
    (repair_later - repair_now + downtime_avoided).round().max(0.0) as u64
}

impl AnalysisSummary {
    /// Totals over `predictions`. An empty list yields all zeros.
    pub fn from_predictions(predictions: &[PredictionResult]) -> Self {
        let mut summary = AnalysisSummary {
            total: predictions.len(),
            ..Default::default()
        };
        for p in predictions {
            summary.by_urgency.increment(p.urgency);
            summary.highest_urgency = summary.highest_urgency.max(Some(p.urgency));
            let budget = &mut summary.repair_budget;
            budget.min = budget.min.saturating_add(p.repair_cost.min);
            budget.max = budget.max.saturating_add(p.repair_cost.max);
            summary.total_savings_if_fixed_now = summary
                .total_savings_if_fixed_now
                .saturating_add(p.savings_if_fixed_now);
        }
        summary
    }
}
