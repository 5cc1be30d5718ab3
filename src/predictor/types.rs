//! Type definitions for the failure prediction engine.
//!
//! These types support both TOML deserialization (for loading the rule
//! catalog) and JSON serialization (for the UI layer).

use serde::{Deserialize, Serialize};

use super::observation::SymptomField;

// =============================================================================
// CONFIGURATION TYPES (loaded from TOML)
// =============================================================================

/// Root document of prediction_rules.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Content version, bumped whenever rule text or thresholds change
    pub version: u32,
    /// Rules in display/tie-break order
    #[serde(default)]
    pub rules: Vec<PredictionRule>,
}

/// A catalog entry pairing a trigger condition with a failure diagnosis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRule {
    /// Stable identifier (e.g., "milky-oil")
    pub id: String,
    /// Name of the predicted failure
    pub title: String,
    pub category: Category,
    /// What the operator typically sees
    #[serde(default)]
    pub symptom: String,
    /// Conditions that must definitely hold for the rule to fire
    pub trigger: Predicate,
    pub urgency: Urgency,
    /// Probability (0-100) when every condition is met at its most severe
    pub base_probability: f32,
    /// What happens if the fault is ignored
    #[serde(default)]
    pub consequence: String,
    #[serde(default)]
    pub recommended_action: String,
    /// Repair cost range in whole currency units
    #[serde(default)]
    pub repair_cost: CostRange,
    /// Cost of an unplanned outage caused by this failure
    #[serde(default)]
    pub downtime_cost: u64,
    #[serde(default)]
    pub links: CrossReferences,
}

/// Subsystem a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Oil,
    Exhaust,
    Temperature,
    Power,
    Starting,
    Noise,
    Vibration,
    Fuel,
    Service,
}

/// Ordered urgency tiers. Sorting puts `Emergency` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Info,
    Warning,
    Critical,
    Emergency,
}

impl Urgency {
    pub const ALL: [Urgency; 4] = [
        Urgency::Info,
        Urgency::Warning,
        Urgency::Critical,
        Urgency::Emergency,
    ];

    /// Fixed part of the risk score contributed by the tier.
    pub fn risk_weight(self) -> f32 {
        match self {
            Urgency::Info => 10.0,
            Urgency::Warning => 20.0,
            Urgency::Critical => 30.0,
            Urgency::Emergency => 40.0,
        }
    }

    /// When the operator should act on a prediction of this tier.
    pub fn action_window(self) -> &'static str {
        match self {
            Urgency::Info => "Add to scheduled maintenance",
            Urgency::Warning => "Schedule within one month",
            Urgency::Critical => "Address within one week",
            Urgency::Emergency => "Immediate action required",
        }
    }
}

/// Inclusive currency range. Missing bounds default to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRange {
    #[serde(default)]
    pub min: u64,
    #[serde(default)]
    pub max: u64,
}

impl CostRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min as f64 + self.max as f64) / 2.0
    }
}

/// Opaque identifiers resolved by the fault-code database and parts UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReferences {
    #[serde(default)]
    pub fault_codes: Vec<String>,
    #[serde(default)]
    pub guides: Vec<String>,
    #[serde(default)]
    pub parts: Vec<String>,
}

/// Trigger tree over symptom conditions.
///
/// In TOML a group is written as `{ all = [...] }`, `{ any = [...] }` or
/// `{ not = {...} }`; a leaf as `{ field = "...", is = { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Predicate {
    All { all: Vec<Predicate> },
    Any { any: Vec<Predicate> },
    Not { not: Box<Predicate> },
    Condition(Condition),
}

impl Predicate {
    pub fn all(children: Vec<Predicate>) -> Self {
        Predicate::All { all: children }
    }

    pub fn any(children: Vec<Predicate>) -> Self {
        Predicate::Any { any: children }
    }

    pub fn negate(child: Predicate) -> Self {
        Predicate::Not {
            not: Box::new(child),
        }
    }

    /// Leaf matching any of the given labels exactly.
    pub fn one_of(field: SymptomField, labels: &[&str]) -> Self {
        Predicate::Condition(Condition::new(
            field,
            Test::OneOf(labels.iter().map(|l| l.to_string()).collect()),
        ))
    }

    pub fn test(field: SymptomField, test: Test) -> Self {
        Predicate::Condition(Condition::new(field, test))
    }

    /// Every leaf condition in the tree, depth first.
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        match self {
            Predicate::All { all: children } | Predicate::Any { any: children } => {
                for child in children {
                    child.collect_conditions(out);
                }
            }
            Predicate::Not { not } => not.collect_conditions(out),
            Predicate::Condition(c) => out.push(c),
        }
    }
}

/// A single `(field, test)` leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: SymptomField,
    pub is: Test,
    /// Numeric threshold, in the same direction as `is`, beyond which the
    /// reading counts as severe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical: Option<f64>,
}

impl Condition {
    pub fn new(field: SymptomField, is: Test) -> Self {
        Self {
            field,
            is,
            critical: None,
        }
    }

    pub fn with_critical(mut self, threshold: f64) -> Self {
        self.critical = Some(threshold);
        self
    }
}

/// Comparison applied to a field's reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Test {
    /// Graded field equals one of these labels exactly
    OneOf(Vec<String>),
    /// Strictly less than
    Below(f64),
    AtMost(f64),
    AtLeast(f64),
    /// Strictly greater than
    Above(f64),
}

impl Test {
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Test::OneOf(_))
    }

    /// The numeric bound of the test, `None` for `one_of`.
    pub fn threshold(&self) -> Option<f64> {
        match self {
            Test::Below(t) | Test::AtMost(t) | Test::AtLeast(t) | Test::Above(t) => Some(*t),
            Test::OneOf(_) => None,
        }
    }

    /// Apply this test's comparison against an explicit bound, so the same
    /// direction serves both the threshold and the `critical` bound. Any
    /// comparison with NaN is false.
    pub fn holds(&self, value: f64, bound: f64) -> bool {
        match self {
            Test::Below(_) => value < bound,
            Test::AtMost(_) => value <= bound,
            Test::AtLeast(_) => value >= bound,
            Test::Above(_) => value > bound,
            Test::OneOf(_) => false,
        }
    }
}

// =============================================================================
// OUTPUT TYPES (serialized to the UI)
// =============================================================================

/// A triggered rule with scores specific to one observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub rule_id: String,
    pub title: String,
    pub category: Category,
    pub symptom: String,
    pub urgency: Urgency,
    /// Likelihood (0-100) adjusted for how severe the matching readings were
    pub probability: u8,
    /// 0-100, ranks predictions within a tier
    pub risk_score: f32,
    pub consequence: String,
    pub recommended_action: String,
    pub repair_cost: CostRange,
    pub downtime_cost: u64,
    /// Avoided repair escalation plus avoided downtime when acting now
    pub savings_if_fixed_now: u64,
    pub links: CrossReferences,
}

/// Number of predictions per urgency tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UrgencyCounts {
    pub info: usize,
    pub warning: usize,
    pub critical: usize,
    pub emergency: usize,
}

impl UrgencyCounts {
    pub fn get(&self, urgency: Urgency) -> usize {
        match urgency {
            Urgency::Info => self.info,
            Urgency::Warning => self.warning,
            Urgency::Critical => self.critical,
            Urgency::Emergency => self.emergency,
        }
    }

    pub(crate) fn increment(&mut self, urgency: Urgency) {
        match urgency {
            Urgency::Info => self.info += 1,
            Urgency::Warning => self.warning += 1,
            Urgency::Critical => self.critical += 1,
            Urgency::Emergency => self.emergency += 1,
        }
    }
}

/// Totals over a list of predictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub total: usize,
    pub by_urgency: UrgencyCounts,
    /// `None` when nothing matched
    pub highest_urgency: Option<Urgency>,
    /// Sum of all repair cost ranges
    pub repair_budget: CostRange,
    pub total_savings_if_fixed_now: u64,
}

/// Complete result of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// Sorted: urgency desc, risk score desc, catalog order
    pub predictions: Vec<PredictionResult>,
    pub summary: AnalysisSummary,
}

impl AnalysisReport {
    /// Pretty-printed JSON for the UI layer.
    pub fn to_json(&self) -> anyhow::Result<String> {
        let mut s = serde_json::to_string_pretty(self)?;
        if !s.ends_with('\n') {
            s.push('\n');
        }
        Ok(s)
    }
}
