use std::path::PathBuf;

use maintenance_companion::predictor::*;
use maintenance_companion::{init_tracing, CatalogError};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn ids(predictions: &[PredictionResult]) -> Vec<&str> {
    predictions.iter().map(|p| p.rule_id.as_str()).collect()
}

fn find<'a>(predictions: &'a [PredictionResult], id: &str) -> Option<&'a PredictionResult> {
    predictions.iter().find(|p| p.rule_id == id)
}

/// Many symptoms at once, enough to fire rules in every urgency tier.
fn troubled_generator() -> SymptomObservation {
    SymptomObservation {
        oil_pressure: Some(2.2),
        oil_condition: Some(OilCondition::Milky),
        exhaust_smoke_color: Some(SmokeColor::Blue),
        exhaust_smoke_timing: Some(SmokeTiming::Load),
        coolant_temp: Some(96.0),
        ambient_temp: Some(28.0),
        voltage_stability: Some(VoltageStability::Fluctuating),
        vibration_level: Some(Level::Excessive),
        vibration_source: Some(VibrationSource::Coupling),
        fuel_consumption: Some(12.0),
        rated_fuel_consumption: Some(10.0),
        engine_hours: Some(16_500.0),
        last_service_hours: Some(16_000.0),
        generator_age: Some(14.0),
        ..Default::default()
    }
}

#[test]
fn test_milky_oil_alone() {
    let engine = PredictiveEngine::new(default_catalog());
    let observation = SymptomObservation {
        oil_condition: Some(OilCondition::Milky),
        ..Default::default()
    };

    let predictions = engine.analyze(&observation);
    assert_eq!(ids(&predictions), vec!["milky-oil"]);

    let milky = &predictions[0];
    assert_eq!(milky.urgency, Urgency::Emergency);
    assert_eq!(milky.probability, 90);
    assert!(milky.links.fault_codes.iter().any(|c| c.starts_with("DSE")));

    // Oil pressure was never measured, so its rule is undecided, not false
    assert_eq!(
        engine.rule_status("low-oil-pressure", &observation),
        Some(Truth::Unknown)
    );
}

#[test]
fn test_blue_smoke_under_constant_outranks_load() {
    let engine = PredictiveEngine::new(default_catalog());
    let constant = SymptomObservation {
        exhaust_smoke_color: Some(SmokeColor::Blue),
        exhaust_smoke_timing: Some(SmokeTiming::Constant),
        ..Default::default()
    };
    let load = SymptomObservation {
        exhaust_smoke_timing: Some(SmokeTiming::Load),
        ..constant.clone()
    };

    let constant_hit = engine.analyze(&constant);
    let load_hit = engine.analyze(&load);

    let a = find(&constant_hit, "blue-smoke-constant").expect("rule should fire");
    let b = find(&load_hit, "blue-smoke-constant").expect("rule should fire");
    assert_eq!(a.urgency, Urgency::Critical);
    assert_eq!(a.probability, 85);
    assert_eq!(b.probability, 72);
    assert!(a.risk_score > b.risk_score);

    assert!(find(&constant_hit, "blue-smoke-startup").is_none());
}

#[test]
fn test_no_start_with_very_slow_cranking() {
    let engine = PredictiveEngine::new(default_catalog());
    let observation = SymptomObservation {
        starting_behavior: Some(StartingBehavior::NoStart),
        cranking_speed: Some(CrankingSpeed::VerySlow),
        ..Default::default()
    };

    let predictions = engine.analyze(&observation);
    let battery = find(&predictions, "battery-starting-circuit").expect("battery rule");
    assert_eq!(battery.probability, 75);

    assert!(find(&predictions, "fuel-injection-fault").is_none());
    assert!(find(&predictions, "fuel-supply-starting").is_none());
    assert_eq!(
        engine.rule_status("fuel-supply-starting", &observation),
        Some(Truth::False)
    );
}

#[test]
fn test_empty_observation_predicts_nothing() {
    let engine = PredictiveEngine::new(default_catalog());
    let report = engine.report(&SymptomObservation::new());

    assert!(report.predictions.is_empty());
    assert_eq!(report.summary.total, 0);
    assert_eq!(report.summary.highest_urgency, None);
    assert_eq!(report.summary.total_savings_if_fixed_now, 0);
}

#[test]
fn test_analysis_is_repeatable() {
    let catalog = default_catalog();
    let observation = troubled_generator();

    let first = serde_json::to_string(&analyze_symptoms(&catalog, &observation)).unwrap();
    let second = serde_json::to_string(&analyze_symptoms(&catalog, &observation)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_results_are_ranked() {
    let engine = PredictiveEngine::new(default_catalog());
    let predictions = engine.analyze(&troubled_generator());
    assert!(predictions.len() >= 8, "got {:?}", ids(&predictions));

    for pair in predictions.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        assert!(
            a.urgency > b.urgency || (a.urgency == b.urgency && a.risk_score >= b.risk_score),
            "{} ({:?}, {}) ranked above {} ({:?}, {})",
            a.rule_id,
            a.urgency,
            a.risk_score,
            b.rule_id,
            b.urgency,
            b.risk_score
        );
    }

    assert_eq!(predictions[0].urgency, Urgency::Emergency);
    assert_eq!(predictions.last().map(|p| p.urgency), Some(Urgency::Info));
}

#[test]
fn test_every_result_is_well_formed() {
    let catalog = default_catalog();
    for prediction in analyze_symptoms(&catalog, &troubled_generator()) {
        assert!(prediction.probability <= 100, "{}", prediction.rule_id);
        assert!(
            (0.0..=100.0).contains(&prediction.risk_score),
            "{} risk {}",
            prediction.rule_id,
            prediction.risk_score
        );

        let rule = catalog.get(&prediction.rule_id).expect("result from catalog");
        assert_eq!(rule.urgency, prediction.urgency);
        assert!(f32::from(prediction.probability) <= rule.base_probability.round());
        assert!(prediction.savings_if_fixed_now as f64 >= rule.repair_cost.midpoint());
    }
}

#[test]
fn test_summary_matches_predictions() {
    let engine = PredictiveEngine::new(default_catalog());
    let report = engine.report(&troubled_generator());
    let summary = &report.summary;

    assert_eq!(summary.total, report.predictions.len());
    let counted: usize = Urgency::ALL.iter().map(|u| summary.by_urgency.get(*u)).sum();
    assert_eq!(counted, summary.total);
    assert_eq!(summary.highest_urgency, Some(Urgency::Emergency));

    let savings: u64 = report.predictions.iter().map(|p| p.savings_if_fixed_now).sum();
    assert_eq!(summary.total_savings_if_fixed_now, savings);
    assert!(summary.repair_budget.min <= summary.repair_budget.max);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["summary"]["highest_urgency"], "emergency");
    assert_eq!(json["predictions"][0]["urgency"], "emergency");
    assert_eq!(
        json["predictions"].as_array().map(|p| p.len()),
        Some(report.predictions.len())
    );
}

// ---------------------------------------------------------------------------
// Severity monotonicity
// ---------------------------------------------------------------------------

/// Least and most severe values that still satisfy a numeric test.
fn numeric_extremes(condition: &Condition) -> (f64, f64) {
    const STEP: f64 = 0.001;
    match condition.is {
        Test::AtLeast(t) => (t, condition.critical.unwrap_or(t)),
        Test::AtMost(t) => (t, condition.critical.unwrap_or(t)),
        Test::Above(t) => (t + STEP, condition.critical.map_or(t + STEP, |c| c + STEP)),
        Test::Below(t) => (t - STEP, condition.critical.map_or(t - STEP, |c| c - STEP)),
        Test::OneOf(_) => unreachable!("graded condition"),
    }
}

fn put_numeric(observation: &mut SymptomObservation, field: SymptomField, value: f64) {
    match field {
        SymptomField::FuelConsumptionRatio => {
            observation.fuel_consumption = Some(value);
            observation.rated_fuel_consumption = Some(1.0);
        }
        SymptomField::HoursSinceService => {
            observation.engine_hours = Some(value);
            observation.last_service_hours = Some(0.0);
        }
        _ => assert!(observation.set_measured(field, value), "{field} not numeric"),
    }
}

#[derive(Debug, Clone, Copy)]
enum Value<'a> {
    Label(&'a str),
    Number(f64),
}

/// One leaf of a trigger with the readings that satisfy it at its mildest
/// and at its most severe. Leaves under `not` get a single value that
/// makes them false, so the negation holds.
#[derive(Debug)]
struct Leaf<'a> {
    field: SymptomField,
    mild: Value<'a>,
    severe: Value<'a>,
}

fn collect_leaves<'a>(predicate: &'a Predicate, negated: bool, out: &mut Vec<Leaf<'a>>) {
    match predicate {
        Predicate::All { all: children } | Predicate::Any { any: children } => {
            for child in children {
                collect_leaves(child, negated, out);
            }
        }
        Predicate::Not { not } => collect_leaves(not, !negated, out),
        Predicate::Condition(condition) => out.push(leaf_for(condition, negated)),
    }
}

fn leaf_for(condition: &Condition, negated: bool) -> Leaf<'_> {
    let field = condition.field;
    match (&condition.is, negated) {
        (Test::OneOf(labels), false) => {
            let by_rank = |label: &&String| field.rank_of(label);
            let low = labels.iter().min_by_key(by_rank).expect("non-empty");
            let high = labels.iter().max_by_key(by_rank).expect("non-empty");
            Leaf {
                field,
                mild: Value::Label(low),
                severe: Value::Label(high),
            }
        }
        (Test::OneOf(labels), true) => {
            let FieldKind::Graded(scale) = field.kind() else {
                panic!("{field} is not graded");
            };
            let other = scale
                .iter()
                .copied()
                .find(|l| !labels.iter().any(|x| x.as_str() == *l))
                .unwrap_or_else(|| panic!("every {field} label is excluded"));
            Leaf {
                field,
                mild: Value::Label(other),
                severe: Value::Label(other),
            }
        }
        (_, false) => {
            let (low, high) = numeric_extremes(condition);
            Leaf {
                field,
                mild: Value::Number(low),
                severe: Value::Number(high),
            }
        }
        (test, true) => {
            let t = test.threshold().expect("numeric test");
            let failing = match test {
                Test::AtLeast(_) | Test::Above(_) => t - 1.0,
                _ => t + 1.0,
            };
            Leaf {
                field,
                mild: Value::Number(failing),
                severe: Value::Number(failing),
            }
        }
    }
}

fn put(observation: &mut SymptomObservation, field: SymptomField, value: Value<'_>) {
    match value {
        Value::Label(label) => assert!(observation.set_graded(field, label), "{field}={label}"),
        Value::Number(n) => put_numeric(observation, field, n),
    }
}

#[test]
fn test_more_severe_readings_never_score_lower() {
    let catalog = default_catalog();
    let mut checked = 0;

    for rule in catalog.rules() {
        let mut leaves = Vec::new();
        collect_leaves(&rule.trigger, false, &mut leaves);

        let mut observation = SymptomObservation::new();
        for leaf in &leaves {
            put(&mut observation, leaf.field, leaf.mild);
        }
        let mild_hit = analyze_symptoms(&catalog, &observation);
        let mut previous = find(&mild_hit, &rule.id)
            .unwrap_or_else(|| panic!("{} should fire on mild readings", rule.id))
            .clone();

        // Worsen one leaf at a time; the score may only go up
        for leaf in &leaves {
            put(&mut observation, leaf.field, leaf.severe);
            let hit = analyze_symptoms(&catalog, &observation);
            let current = find(&hit, &rule.id)
                .unwrap_or_else(|| panic!("{} stopped firing at {:?}", rule.id, leaf))
                .clone();
            assert!(
                current.probability >= previous.probability,
                "{}: {} -> {} after {:?}",
                rule.id,
                previous.probability,
                current.probability,
                leaf
            );
            assert!(current.risk_score >= previous.risk_score, "{}", rule.id);
            previous = current;
        }

        assert_eq!(
            f32::from(previous.probability),
            rule.base_probability.round(),
            "{}",
            rule.id
        );
        checked += 1;
    }

    assert_eq!(checked, catalog.len());
}

#[test]
fn test_grinding_noise_needs_location_ruled_out() {
    let engine = PredictiveEngine::new(default_catalog());
    let mut observation = SymptomObservation::new();
    assert!(observation.set_graded(SymptomField::NoiseType, "grinding"));
    assert!(find(&engine.analyze(&observation), "grinding-noise").is_none());

    assert!(observation.set_graded(SymptomField::NoiseLocation, "alternator"));
    assert!(find(&engine.analyze(&observation), "grinding-noise").is_some());

    assert!(observation.set_graded(SymptomField::NoiseLocation, "turbo"));
    assert!(find(&engine.analyze(&observation), "grinding-noise").is_none());
}

// ---------------------------------------------------------------------------
// Observation JSON and catalog files
// ---------------------------------------------------------------------------

#[test]
fn test_observation_from_ui_json() {
    let json = r#"{
        "oil_condition": "milky",
        "exhaust_smoke_color": "white",
        "starting_behavior": "no-start",
        "start_attempts": 6,
        "coolant_temp": 101.5
    }"#;
    let observation = SymptomObservation::from_json(json).unwrap();
    assert_eq!(observation.observed_count(), 5);
    assert_eq!(observation.starting_behavior, Some(StartingBehavior::NoStart));

    // Unanswered fields are left out when echoed back
    let echoed = serde_json::to_value(&observation).unwrap();
    assert_eq!(echoed.as_object().map(|o| o.len()), Some(5));
    assert_eq!(echoed["exhaust_smoke_color"], "white");

    let bad = r#"{ "oil_condition": "sludgy" }"#;
    assert!(SymptomObservation::from_json(bad).is_err());
}

#[test]
fn test_load_fixture_catalog() {
    init_tracing();

    let catalog = load_catalog(&fixture_path("minimal_rules.toml")).expect("Failed to load fixture");
    assert_eq!(catalog.version(), 1);
    assert_eq!(catalog.len(), 3);
    assert_eq!(
        catalog.linked_to_fault_code("dse-1411").map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["low-oil-pressure"]
    );

    let observation = SymptomObservation {
        oil_pressure: Some(2.5),
        frequency_stability: Some(FrequencyStability::Hunting),
        coolant_temp: Some(99.0),
        noise_level: Some(Level::Normal),
        ..Default::default()
    };
    let predictions = analyze_symptoms(&catalog, &observation);

    // 2.5 is not strictly below 2.5
    assert_eq!(ids(&predictions), vec!["quiet-overheat", "rough-running"]);
}

#[test]
fn test_load_catalog_from_temp_dir() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("rules.toml");

    let source = std::fs::read_to_string(fixture_path("minimal_rules.toml")).unwrap();
    std::fs::write(&path, source.replace("version = 1", "version = 7")).unwrap();
    assert_eq!(load_catalog(&path).unwrap().version(), 7);

    // Two rules sharing an id
    let duplicated = format!("{source}\n{}", &source[source.find("[[rules]]").unwrap()..]);
    std::fs::write(&path, duplicated).unwrap();
    let err = load_catalog(&path).unwrap_err();
    assert_eq!(
        err.downcast_ref::<CatalogError>(),
        Some(&CatalogError::DuplicateId("low-oil-pressure".to_string()))
    );

    // Unreadable and broken catalogs fall back to the embedded one
    let embedded = default_catalog().len();
    assert_eq!(load_catalog_or_default(Some(path.as_path())).len(), embedded);
    let missing = dir.path().join("missing.toml");
    assert_eq!(load_catalog_or_default(Some(missing.as_path())).len(), embedded);
    assert_eq!(load_catalog_or_default(None).len(), embedded);
}
