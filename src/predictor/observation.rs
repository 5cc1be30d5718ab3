//! Operator symptom observations.
//!
//! A `SymptomObservation` is built up section by section as the operator
//! answers questions about the generator. Every field is optional and an
//! absent field means "not observed yet", never "normal".

use std::fmt;

use serde::{Deserialize, Serialize};

/// Declares a graded symptom scale: kebab-case labels for serde plus a
/// severity rank (higher = worse) used when amplifying scores.
macro_rules! symptom_scale {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => ($label:literal, $rank:literal)),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every label on this scale, in declaration order.
            pub const LABELS: &'static [&'static str] = &[$($label),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }

            pub fn rank(self) -> u8 {
                match self {
                    $($name::$variant => $rank,)+
                }
            }

            pub fn from_label(label: &str) -> Option<Self> {
                match label {
                    $($label => Some($name::$variant),)+
                    _ => None,
                }
            }

            pub fn rank_of(label: &str) -> Option<u8> {
                match label {
                    $($label => Some($rank),)+
                    _ => None,
                }
            }

            fn reading(self) -> Reading {
                Reading::Graded {
                    label: self.as_str(),
                    rank: self.rank(),
                }
            }
        }
    };
}

symptom_scale!(
    /// Visual condition of the engine oil on the dipstick.
    OilCondition {
        Clean => ("clean", 0),
        Dark => ("dark", 1),
        Milky => ("milky", 2),
        Metallic => ("metallic", 3),
    }
);

symptom_scale!(
    SmokeColor {
        None => ("none", 0),
        Grey => ("grey", 1),
        White => ("white", 2),
        Blue => ("blue", 2),
        Black => ("black", 2),
    }
);

symptom_scale!(
    /// When the smoke shows up. Smoke that never clears is the worst case.
    SmokeTiming {
        Startup => ("startup", 1),
        Idle => ("idle", 2),
        Load => ("load", 3),
        Constant => ("constant", 4),
    }
);

symptom_scale!(
    SmokeAmount {
        None => ("none", 0),
        Light => ("light", 1),
        Moderate => ("moderate", 2),
        Heavy => ("heavy", 3),
    }
);

symptom_scale!(
    TempRiseRate {
        Normal => ("normal", 0),
        Fast => ("fast", 1),
        VeryFast => ("very-fast", 2),
    }
);

symptom_scale!(
    VoltageStability {
        Stable => ("stable", 0),
        Fluctuating => ("fluctuating", 1),
        Dropping => ("dropping", 2),
    }
);

symptom_scale!(
    FrequencyStability {
        Stable => ("stable", 0),
        Fluctuating => ("fluctuating", 1),
        Hunting => ("hunting", 2),
    }
);

symptom_scale!(
    StartingBehavior {
        Instant => ("instant", 0),
        Slow => ("slow", 1),
        Difficult => ("difficult", 2),
        NoStart => ("no-start", 3),
    }
);

symptom_scale!(
    CrankingSpeed {
        Normal => ("normal", 0),
        Slow => ("slow", 1),
        VerySlow => ("very-slow", 2),
    }
);

symptom_scale!(
    NoiseType {
        None => ("none", 0),
        Whistling => ("whistling", 1),
        Rattling => ("rattling", 1),
        Grinding => ("grinding", 2),
        Knocking => ("knocking", 3),
    }
);

symptom_scale!(
    /// Where the noise seems to come from. Purely nominal.
    NoiseLocation {
        Engine => ("engine", 0),
        Turbo => ("turbo", 0),
        Alternator => ("alternator", 0),
        Exhaust => ("exhaust", 0),
        Unknown => ("unknown", 0),
    }
);

symptom_scale!(
    /// Shared scale for noise level and vibration level.
    Level {
        Normal => ("normal", 0),
        Increased => ("increased", 1),
        Excessive => ("excessive", 2),
    }
);

symptom_scale!(
    VibrationSource {
        Engine => ("engine", 0),
        Alternator => ("alternator", 0),
        Coupling => ("coupling", 0),
        Unknown => ("unknown", 0),
    }
);

/// A single observed value as seen by rule conditions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// A numeric measurement (bar, °C, L/hour, %, hours...)
    Measured(f64),
    /// A point on a graded scale
    Graded { label: &'static str, rank: u8 },
}

/// Whether a field holds a number or a graded label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Graded(&'static [&'static str]),
}

/// Identifies a field a rule condition can test.
///
/// Includes two derived readings (`fuel_consumption_ratio`,
/// `hours_since_service`) computed from pairs of observed fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomField {
    OilConsumptionRate,
    OilPressure,
    OilCondition,
    ExhaustSmokeColor,
    ExhaustSmokeTiming,
    ExhaustSmokeAmount,
    CoolantTemp,
    TempRiseRate,
    AmbientTemp,
    MaxLoadCapacity,
    VoltageStability,
    FrequencyStability,
    StartingBehavior,
    CrankingSpeed,
    StartAttempts,
    NoiseType,
    NoiseLocation,
    NoiseLevel,
    VibrationLevel,
    VibrationSource,
    FuelConsumption,
    RatedFuelConsumption,
    FuelLoadPercentage,
    EngineHours,
    LastServiceHours,
    GeneratorAge,
    FuelConsumptionRatio,
    HoursSinceService,
}

impl SymptomField {
    /// Fields the operator enters directly (excludes derived readings).
    pub const OBSERVED: &'static [SymptomField] = &[
        SymptomField::OilConsumptionRate,
        SymptomField::OilPressure,
        SymptomField::OilCondition,
        SymptomField::ExhaustSmokeColor,
        SymptomField::ExhaustSmokeTiming,
        SymptomField::ExhaustSmokeAmount,
        SymptomField::CoolantTemp,
        SymptomField::TempRiseRate,
        SymptomField::AmbientTemp,
        SymptomField::MaxLoadCapacity,
        SymptomField::VoltageStability,
        SymptomField::FrequencyStability,
        SymptomField::StartingBehavior,
        SymptomField::CrankingSpeed,
        SymptomField::StartAttempts,
        SymptomField::NoiseType,
        SymptomField::NoiseLocation,
        SymptomField::NoiseLevel,
        SymptomField::VibrationLevel,
        SymptomField::VibrationSource,
        SymptomField::FuelConsumption,
        SymptomField::RatedFuelConsumption,
        SymptomField::FuelLoadPercentage,
        SymptomField::EngineHours,
        SymptomField::LastServiceHours,
        SymptomField::GeneratorAge,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SymptomField::OilConsumptionRate => "oil_consumption_rate",
            SymptomField::OilPressure => "oil_pressure",
            SymptomField::OilCondition => "oil_condition",
            SymptomField::ExhaustSmokeColor => "exhaust_smoke_color",
            SymptomField::ExhaustSmokeTiming => "exhaust_smoke_timing",
            SymptomField::ExhaustSmokeAmount => "exhaust_smoke_amount",
            SymptomField::CoolantTemp => "coolant_temp",
            SymptomField::TempRiseRate => "temp_rise_rate",
            SymptomField::AmbientTemp => "ambient_temp",
            SymptomField::MaxLoadCapacity => "max_load_capacity",
            SymptomField::VoltageStability => "voltage_stability",
            SymptomField::FrequencyStability => "frequency_stability",
            SymptomField::StartingBehavior => "starting_behavior",
            SymptomField::CrankingSpeed => "cranking_speed",
            SymptomField::StartAttempts => "start_attempts",
            SymptomField::NoiseType => "noise_type",
            SymptomField::NoiseLocation => "noise_location",
            SymptomField::NoiseLevel => "noise_level",
            SymptomField::VibrationLevel => "vibration_level",
            SymptomField::VibrationSource => "vibration_source",
            SymptomField::FuelConsumption => "fuel_consumption",
            SymptomField::RatedFuelConsumption => "rated_fuel_consumption",
            SymptomField::FuelLoadPercentage => "fuel_load_percentage",
            SymptomField::EngineHours => "engine_hours",
            SymptomField::LastServiceHours => "last_service_hours",
            SymptomField::GeneratorAge => "generator_age",
            SymptomField::FuelConsumptionRatio => "fuel_consumption_ratio",
            SymptomField::HoursSinceService => "hours_since_service",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            SymptomField::OilCondition => FieldKind::Graded(OilCondition::LABELS),
            SymptomField::ExhaustSmokeColor => FieldKind::Graded(SmokeColor::LABELS),
            SymptomField::ExhaustSmokeTiming => FieldKind::Graded(SmokeTiming::LABELS),
            SymptomField::ExhaustSmokeAmount => FieldKind::Graded(SmokeAmount::LABELS),
            SymptomField::TempRiseRate => FieldKind::Graded(TempRiseRate::LABELS),
            SymptomField::VoltageStability => FieldKind::Graded(VoltageStability::LABELS),
            SymptomField::FrequencyStability => FieldKind::Graded(FrequencyStability::LABELS),
            SymptomField::StartingBehavior => FieldKind::Graded(StartingBehavior::LABELS),
            SymptomField::CrankingSpeed => FieldKind::Graded(CrankingSpeed::LABELS),
            SymptomField::NoiseType => FieldKind::Graded(NoiseType::LABELS),
            SymptomField::NoiseLocation => FieldKind::Graded(NoiseLocation::LABELS),
            SymptomField::NoiseLevel | SymptomField::VibrationLevel => {
                FieldKind::Graded(Level::LABELS)
            }
            SymptomField::VibrationSource => FieldKind::Graded(VibrationSource::LABELS),
            _ => FieldKind::Numeric,
        }
    }

    /// Severity rank of `label` on this field's scale, if it is one.
    pub fn rank_of(self, label: &str) -> Option<u8> {
        match self {
            SymptomField::OilCondition => OilCondition::rank_of(label),
            SymptomField::ExhaustSmokeColor => SmokeColor::rank_of(label),
            SymptomField::ExhaustSmokeTiming => SmokeTiming::rank_of(label),
            SymptomField::ExhaustSmokeAmount => SmokeAmount::rank_of(label),
            SymptomField::TempRiseRate => TempRiseRate::rank_of(label),
            SymptomField::VoltageStability => VoltageStability::rank_of(label),
            SymptomField::FrequencyStability => FrequencyStability::rank_of(label),
            SymptomField::StartingBehavior => StartingBehavior::rank_of(label),
            SymptomField::CrankingSpeed => CrankingSpeed::rank_of(label),
            SymptomField::NoiseType => NoiseType::rank_of(label),
            SymptomField::NoiseLocation => NoiseLocation::rank_of(label),
            SymptomField::NoiseLevel | SymptomField::VibrationLevel => Level::rank_of(label),
            SymptomField::VibrationSource => VibrationSource::rank_of(label),
            _ => None,
        }
    }
}

impl fmt::Display for SymptomField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sparse record of what the operator has observed so far.
///
/// Units: pressures in bar, temperatures in °C, consumption in L/hour,
/// load capacity in % of rated, hours in engine running hours.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymptomObservation {
    // === Oil ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oil_consumption_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oil_pressure: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oil_condition: Option<OilCondition>,

    // === Exhaust ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhaust_smoke_color: Option<SmokeColor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhaust_smoke_timing: Option<SmokeTiming>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhaust_smoke_amount: Option<SmokeAmount>,

    // === Temperature ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coolant_temp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_rise_rate: Option<TempRiseRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient_temp: Option<f64>,

    // === Power ===
    /// Highest load the set can hold, as % of rated (0-120)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_load_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage_stability: Option<VoltageStability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_stability: Option<FrequencyStability>,

    // === Starting ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub starting_behavior: Option<StartingBehavior>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cranking_speed: Option<CrankingSpeed>,
    /// Attempts needed before the engine fires
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_attempts: Option<u32>,

    // === Noise ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_type: Option<NoiseType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_location: Option<NoiseLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise_level: Option<Level>,

    // === Vibration ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibration_level: Option<Level>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibration_source: Option<VibrationSource>,

    // === Fuel ===
    /// Measured consumption at `fuel_load_percentage` load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_consumption: Option<f64>,
    /// Datasheet consumption at the same load
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rated_fuel_consumption: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_load_percentage: Option<f64>,

    // === Service history ===
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_service_hours: Option<f64>,
    /// Years since commissioning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generator_age: Option<f64>,
}

impl SymptomObservation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current reading for `field`, or `None` if it has not been observed.
    ///
    /// Derived readings are `None` whenever one of their inputs is missing.
    pub fn reading(&self, field: SymptomField) -> Option<Reading> {
        match field {
            SymptomField::OilConsumptionRate => self.oil_consumption_rate.map(Reading::Measured),
            SymptomField::OilPressure => self.oil_pressure.map(Reading::Measured),
            SymptomField::OilCondition => self.oil_condition.map(OilCondition::reading),
            SymptomField::ExhaustSmokeColor => self.exhaust_smoke_color.map(SmokeColor::reading),
            SymptomField::ExhaustSmokeTiming => {
                self.exhaust_smoke_timing.map(SmokeTiming::reading)
            }
            SymptomField::ExhaustSmokeAmount => {
                self.exhaust_smoke_amount.map(SmokeAmount::reading)
            }
            SymptomField::CoolantTemp => self.coolant_temp.map(Reading::Measured),
            SymptomField::TempRiseRate => self.temp_rise_rate.map(TempRiseRate::reading),
            SymptomField::AmbientTemp => self.ambient_temp.map(Reading::Measured),
            SymptomField::MaxLoadCapacity => self.max_load_capacity.map(Reading::Measured),
            SymptomField::VoltageStability => {
                self.voltage_stability.map(VoltageStability::reading)
            }
            SymptomField::FrequencyStability => {
                self.frequency_stability.map(FrequencyStability::reading)
            }
            SymptomField::StartingBehavior => {
                self.starting_behavior.map(StartingBehavior::reading)
            }
            SymptomField::CrankingSpeed => self.cranking_speed.map(CrankingSpeed::reading),
            SymptomField::StartAttempts => self
                .start_attempts
                .map(|n| Reading::Measured(f64::from(n))),
            SymptomField::NoiseType => self.noise_type.map(NoiseType::reading),
            SymptomField::NoiseLocation => self.noise_location.map(NoiseLocation::reading),
            SymptomField::NoiseLevel => self.noise_level.map(Level::reading),
            SymptomField::VibrationLevel => self.vibration_level.map(Level::reading),
            SymptomField::VibrationSource => self.vibration_source.map(VibrationSource::reading),
            SymptomField::FuelConsumption => self.fuel_consumption.map(Reading::Measured),
            SymptomField::RatedFuelConsumption => {
                self.rated_fuel_consumption.map(Reading::Measured)
            }
            SymptomField::FuelLoadPercentage => self.fuel_load_percentage.map(Reading::Measured),
            SymptomField::EngineHours => self.engine_hours.map(Reading::Measured),
            SymptomField::LastServiceHours => self.last_service_hours.map(Reading::Measured),
            SymptomField::GeneratorAge => self.generator_age.map(Reading::Measured),
            SymptomField::FuelConsumptionRatio => {
                self.fuel_consumption_ratio().map(Reading::Measured)
            }
            SymptomField::HoursSinceService => self.hours_since_service().map(Reading::Measured),
        }
    }

    /// Measured over rated fuel consumption. A non-positive rated value
    /// cannot form a ratio and counts as unobserved.
    pub fn fuel_consumption_ratio(&self) -> Option<f64> {
        let measured = self.fuel_consumption?;
        let rated = self.rated_fuel_consumption?;
        (rated > 0.0).then(|| measured / rated)
    }

    pub fn hours_since_service(&self) -> Option<f64> {
        Some(self.engine_hours? - self.last_service_hours?)
    }

    /// Parse an observation posted by the UI.
    ///
    /// Unknown labels are rejected; unknown keys and `null`s are ignored.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let observation = serde_json::from_str(json)?;
        Ok(observation)
    }

    /// Record a graded answer, e.g. `set_graded(SymptomField::OilCondition, "milky")`.
    ///
    /// Returns `false` and leaves the observation untouched if the field is
    /// not graded or the label is not on its scale.
    pub fn set_graded(&mut self, field: SymptomField, label: &str) -> bool {
        fn put<T>(slot: &mut Option<T>, value: Option<T>) -> bool {
            match value {
                Some(v) => {
                    *slot = Some(v);
                    true
                }
                None => false,
            }
        }

        match field {
            SymptomField::OilCondition => {
                put(&mut self.oil_condition, OilCondition::from_label(label))
            }
            SymptomField::ExhaustSmokeColor => {
                put(&mut self.exhaust_smoke_color, SmokeColor::from_label(label))
            }
            SymptomField::ExhaustSmokeTiming => {
                put(&mut self.exhaust_smoke_timing, SmokeTiming::from_label(label))
            }
            SymptomField::ExhaustSmokeAmount => {
                put(&mut self.exhaust_smoke_amount, SmokeAmount::from_label(label))
            }
            SymptomField::TempRiseRate => {
                put(&mut self.temp_rise_rate, TempRiseRate::from_label(label))
            }
            SymptomField::VoltageStability => {
                put(&mut self.voltage_stability, VoltageStability::from_label(label))
            }
            SymptomField::FrequencyStability => {
                put(&mut self.frequency_stability, FrequencyStability::from_label(label))
            }
            SymptomField::StartingBehavior => {
                put(&mut self.starting_behavior, StartingBehavior::from_label(label))
            }
            SymptomField::CrankingSpeed => {
                put(&mut self.cranking_speed, CrankingSpeed::from_label(label))
            }
            SymptomField::NoiseType => put(&mut self.noise_type, NoiseType::from_label(label)),
            SymptomField::NoiseLocation => {
                put(&mut self.noise_location, NoiseLocation::from_label(label))
            }
            SymptomField::NoiseLevel => put(&mut self.noise_level, Level::from_label(label)),
            SymptomField::VibrationLevel => {
                put(&mut self.vibration_level, Level::from_label(label))
            }
            SymptomField::VibrationSource => {
                put(&mut self.vibration_source, VibrationSource::from_label(label))
            }
            _ => false,
        }
    }

    /// Record a numeric measurement. Values are stored as given, without
    /// range checks. Returns `false` for graded and derived fields.
    pub fn set_measured(&mut self, field: SymptomField, value: f64) -> bool {
        let slot = match field {
            SymptomField::OilConsumptionRate => &mut self.oil_consumption_rate,
            SymptomField::OilPressure => &mut self.oil_pressure,
            SymptomField::CoolantTemp => &mut self.coolant_temp,
            SymptomField::AmbientTemp => &mut self.ambient_temp,
            SymptomField::MaxLoadCapacity => &mut self.max_load_capacity,
            SymptomField::FuelConsumption => &mut self.fuel_consumption,
            SymptomField::RatedFuelConsumption => &mut self.rated_fuel_consumption,
            SymptomField::FuelLoadPercentage => &mut self.fuel_load_percentage,
            SymptomField::EngineHours => &mut self.engine_hours,
            SymptomField::LastServiceHours => &mut self.last_service_hours,
            SymptomField::GeneratorAge => &mut self.generator_age,
            SymptomField::StartAttempts => {
                // Saturating cast: negative or NaN counts become 0
                self.start_attempts = Some(value.round() as u32);
                return true;
            }
            _ => return false,
        };
        *slot = Some(value);
        true
    }

    /// Forget an answer. Derived fields are cleared by clearing an input.
    pub fn clear(&mut self, field: SymptomField) {
        match field {
            SymptomField::OilConsumptionRate => self.oil_consumption_rate = None,
            SymptomField::OilPressure => self.oil_pressure = None,
            SymptomField::OilCondition => self.oil_condition = None,
            SymptomField::ExhaustSmokeColor => self.exhaust_smoke_color = None,
            SymptomField::ExhaustSmokeTiming => self.exhaust_smoke_timing = None,
            SymptomField::ExhaustSmokeAmount => self.exhaust_smoke_amount = None,
            SymptomField::CoolantTemp => self.coolant_temp = None,
            SymptomField::TempRiseRate => self.temp_rise_rate = None,
            SymptomField::AmbientTemp => self.ambient_temp = None,
            SymptomField::MaxLoadCapacity => self.max_load_capacity = None,
            SymptomField::VoltageStability => self.voltage_stability = None,
            SymptomField::FrequencyStability => self.frequency_stability = None,
            SymptomField::StartingBehavior => self.starting_behavior = None,
            SymptomField::CrankingSpeed => self.cranking_speed = None,
            SymptomField::StartAttempts => self.start_attempts = None,
            SymptomField::NoiseType => self.noise_type = None,
            SymptomField::NoiseLocation => self.noise_location = None,
            SymptomField::NoiseLevel => self.noise_level = None,
            SymptomField::VibrationLevel => self.vibration_level = None,
            SymptomField::VibrationSource => self.vibration_source = None,
            SymptomField::FuelConsumption => self.fuel_consumption = None,
            SymptomField::RatedFuelConsumption => self.rated_fuel_consumption = None,
            SymptomField::FuelLoadPercentage => self.fuel_load_percentage = None,
            SymptomField::EngineHours => self.engine_hours = None,
            SymptomField::LastServiceHours => self.last_service_hours = None,
            SymptomField::GeneratorAge => self.generator_age = None,
            SymptomField::FuelConsumptionRatio | SymptomField::HoursSinceService => {}
        }
    }

    /// Number of directly observed fields that have a value.
    pub fn observed_count(&self) -> usize {
        SymptomField::OBSERVED
            .iter()
            .filter(|field| self.reading(**field).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.observed_count() == 0
    }
}
