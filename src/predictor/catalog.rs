//! The immutable rule catalog shared by every analysis.

use std::collections::HashSet;

use crate::error::CatalogError;

use super::observation::FieldKind;
use super::types::{Category, CatalogConfig, Predicate, PredictionRule, Test};

/// Validated, read-only set of prediction rules in insertion order.
///
/// Built once at startup and passed by reference into the engine. Safe to
/// share across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleCatalog {
    version: u32,
    rules: Vec<PredictionRule>,
}

impl RuleCatalog {
    /// Validate `rules` and wrap them in a catalog.
    pub fn new(version: u32, rules: Vec<PredictionRule>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        for rule in &rules {
            validate_rule(rule)?;
            if !seen.insert(rule.id.as_str()) {
                return Err(CatalogError::DuplicateId(rule.id.clone()));
            }
        }
        Ok(Self { version, rules })
    }

    pub fn from_config(config: CatalogConfig) -> Result<Self, CatalogError> {
        Self::new(config.version, config.rules)
    }

    /// A catalog with no rules. Every analysis against it is empty.
    pub fn empty() -> Self {
        Self {
            version: 0,
            rules: Vec::new(),
        }
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    /// All rules in insertion order.
    pub fn rules(&self) -> &[PredictionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PredictionRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &PredictionRule> {
        self.rules.iter().filter(move |r| r.category == category)
    }

    /// Rules that list `code` among their linked fault codes.
    pub fn linked_to_fault_code<'a>(
        &'a self,
        code: &'a str,
    ) -> impl Iterator<Item = &'a PredictionRule> + 'a {
        self.rules
            .iter()
            .filter(move |r| r.links.fault_codes.iter().any(|c| c.eq_ignore_ascii_case(code)))
    }
}

fn validate_rule(rule: &PredictionRule) -> Result<(), CatalogError> {
    if rule.id.trim().is_empty() {
        return Err(CatalogError::EmptyId {
            title: rule.title.clone(),
        });
    }

    if !(0.0..=100.0).contains(&rule.base_probability) {
        return Err(CatalogError::ProbabilityOutOfRange {
            rule: rule.id.clone(),
            value: rule.base_probability,
        });
    }

    if rule.repair_cost.min > rule.repair_cost.max {
        return Err(CatalogError::InvertedCostRange {
            rule: rule.id.clone(),
            min: rule.repair_cost.min,
            max: rule.repair_cost.max,
        });
    }

    validate_predicate(&rule.id, &rule.trigger)
}

fn validate_predicate(rule_id: &str, predicate: &Predicate) -> Result<(), CatalogError> {
    match predicate {
        Predicate::All { all: children } | Predicate::Any { any: children } => {
            if children.is_empty() {
                let group = if matches!(predicate, Predicate::All { .. }) {
                    "all"
                } else {
                    "any"
                };
                return Err(CatalogError::EmptyGroup {
                    rule: rule_id.to_string(),
                    group,
                });
            }
            children
                .iter()
                .try_for_each(|child| validate_predicate(rule_id, child))
        }
        Predicate::Not { not } => validate_predicate(rule_id, not),
        Predicate::Condition(condition) => {
            let field = condition.field;
            match (field.kind(), &condition.is) {
                (FieldKind::Graded(_), Test::OneOf(labels)) => {
                    if labels.is_empty() {
                        return Err(CatalogError::EmptyLabelList {
                            rule: rule_id.to_string(),
                            field,
                        });
                    }
                    if let Some(critical) = condition.critical {
                        return Err(CatalogError::MisplacedCritical {
                            rule: rule_id.to_string(),
                            field,
                            critical,
                        });
                    }
                    if let Some(bad) = labels.iter().find(|l| field.rank_of(l).is_none()) {
                        return Err(CatalogError::UnknownLabel {
                            rule: rule_id.to_string(),
                            field,
                            label: bad.clone(),
                        });
                    }
                    Ok(())
                }
                (FieldKind::Numeric, test) if test.is_numeric() => {
                    match (condition.critical, test.threshold()) {
                        // A severe reading must also pass the test itself
                        (Some(critical), Some(threshold)) if !test.holds(critical, threshold) => {
                            Err(CatalogError::MisplacedCritical {
                                rule: rule_id.to_string(),
                                field,
                                critical,
                            })
                        }
                        _ => Ok(()),
                    }
                }
                (FieldKind::Graded(_), _) => Err(CatalogError::FieldKindMismatch {
                    rule: rule_id.to_string(),
                    field,
                    expected: "graded",
                }),
                (FieldKind::Numeric, _) => Err(CatalogError::FieldKindMismatch {
                    rule: rule_id.to_string(),
                    field,
                    expected: "numeric",
                }),
            }
        }
    }
}
