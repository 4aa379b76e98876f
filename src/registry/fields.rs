use super::ranges::{self, BandedRange, ReferenceRange};
use crate::model::ConditionValue;
use serde::{Deserialize, Serialize};

/// A laboratory test known to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabDefinition {
    pub id: String,
    pub display: String,
    /// LOINC code of the test.
    pub loinc: String,
    pub unit: String,
    pub range: Option<ReferenceRange>,
    /// Relative ordering frequency, used to rank catalog search results.
    #[serde(default)]
    pub frequency: u32,
}

impl LabDefinition {
    pub fn new(
        id: impl Into<String>,
        display: impl Into<String>,
        loinc: impl Into<String>,
        unit: impl Into<String>,
        range: Option<ReferenceRange>,
    ) -> Self {
        Self {
            id: id.into(),
            display: display.into(),
            loinc: loinc.into(),
            unit: unit.into(),
            range,
            frequency: 0,
        }
    }

    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }
}

/// A part of a multi-part vital sign, e.g. systolic within blood pressure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalComponent {
    pub name: String,
    pub ranges: Option<BandedRange>,
}

/// A vital-sign type known to the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalDefinition {
    pub id: String,
    pub display: String,
    pub unit: String,
    pub ranges: Option<BandedRange>,
    /// Non-empty for multi-part measurements; the first component is the default.
    #[serde(default)]
    pub components: Vec<VitalComponent>,
    #[serde(default)]
    pub frequency: u32,
}

impl VitalDefinition {
    fn simple(id: &str, display: &str, unit: &str, ranges: Option<BandedRange>, frequency: u32) -> Self {
        Self {
            id: id.to_string(),
            display: display.to_string(),
            unit: unit.to_string(),
            ranges,
            components: Vec::new(),
            frequency,
        }
    }

    pub fn component(&self, name: &str) -> Option<&VitalComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn default_component(&self) -> Option<&VitalComponent> {
        self.components.first()
    }

    /// Every banded range this vital can report, across components.
    pub(crate) fn all_ranges(&self) -> Vec<BandedRange> {
        self.ranges
            .iter()
            .copied()
            .chain(self.components.iter().filter_map(|c| c.ranges))
            .collect()
    }
}

/// Patient attributes addressable by demographic leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemographicField {
    Age,
    Gender,
}

impl DemographicField {
    pub const ALL: [DemographicField; 2] = [DemographicField::Age, DemographicField::Gender];

    pub fn as_str(&self) -> &'static str {
        match self {
            DemographicField::Age => "age",
            DemographicField::Gender => "gender",
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            DemographicField::Age => "Age (years)",
            DemographicField::Gender => "Gender",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == id)
    }
}

/// Whether a field's values are numbers or free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Numeric,
    Text,
}

impl ValueKind {
    pub fn accepts(&self, value: &ConditionValue) -> bool {
        match self {
            ValueKind::Numeric => value.as_number().is_some_and(f64::is_finite),
            ValueKind::Text => value.as_text().is_some_and(|t| !t.trim().is_empty()),
        }
    }

    pub fn expected(&self) -> &'static str {
        match self {
            ValueKind::Numeric => "a finite number",
            ValueKind::Text => "non-empty text",
        }
    }
}

fn lab(
    id: &str,
    display: &str,
    loinc: &str,
    unit: &str,
    range: Option<ReferenceRange>,
    frequency: u32,
) -> LabDefinition {
    LabDefinition::new(id, display, loinc, unit, range).with_frequency(frequency)
}

pub(crate) fn builtin_labs() -> Vec<LabDefinition> {
    let rr = ReferenceRange::new;
    vec![
        lab("HbA1c", "Hemoglobin A1c", "4548-4", "%", Some(rr(4.0, 5.6, None, None)), 870),
        lab("glucose", "Glucose", "2345-7", "mg/dL", Some(rr(70.0, 99.0, Some(40.0), Some(500.0))), 990),
        lab("potassium", "Potassium", "2823-3", "mmol/L", Some(rr(3.5, 5.0, Some(2.5), Some(6.5))), 960),
        lab("sodium", "Sodium", "2951-2", "mmol/L", Some(rr(135.0, 145.0, Some(120.0), Some(160.0))), 955),
        lab("creatinine", "Creatinine", "2160-0", "mg/dL", Some(rr(0.6, 1.3, None, Some(10.0))), 940),
        lab("egfr", "eGFR", "33914-3", "mL/min/1.73m2", Some(rr(90.0, 120.0, Some(15.0), None)), 720),
        lab("hemoglobin", "Hemoglobin", "718-7", "g/dL", Some(rr(12.0, 17.5, Some(7.0), Some(20.0))), 930),
        lab("wbc", "White blood cell count", "6690-2", "10*3/uL", Some(rr(4.0, 11.0, Some(2.0), Some(30.0))), 925),
        lab("platelets", "Platelet count", "777-3", "10*3/uL", Some(rr(150.0, 400.0, Some(20.0), Some(1000.0))), 900),
        lab("inr", "INR", "6301-6", "{INR}", Some(rr(0.8, 1.2, None, Some(5.0))), 610),
        lab("ldl", "LDL cholesterol", "13457-7", "mg/dL", Some(rr(0.0, 99.0, None, None)), 680),
        lab("tsh", "Thyrotropin", "3016-3", "m[IU]/L", Some(rr(0.4, 4.0, None, None)), 640),
        lab("lactate", "Lactate", "2524-7", "mmol/L", Some(rr(0.5, 2.0, None, Some(4.0))), 380),
        lab("troponin", "Troponin I", "10839-9", "ng/mL", None, 420),
    ]
}

pub(crate) fn builtin_vitals() -> Vec<VitalDefinition> {
    vec![
        VitalDefinition {
            id: "blood-pressure".to_string(),
            display: "Blood pressure".to_string(),
            unit: "mm[Hg]".to_string(),
            ranges: None,
            components: vec![
                VitalComponent {
                    name: "systolic".to_string(),
                    ranges: Some(ranges::SYSTOLIC),
                },
                VitalComponent {
                    name: "diastolic".to_string(),
                    ranges: Some(ranges::DIASTOLIC),
                },
            ],
            frequency: 1000,
        },
        VitalDefinition::simple(
            "blood-pressure-systolic",
            "Systolic blood pressure",
            "mm[Hg]",
            Some(ranges::SYSTOLIC),
            800,
        ),
        VitalDefinition::simple(
            "blood-pressure-diastolic",
            "Diastolic blood pressure",
            "mm[Hg]",
            Some(ranges::DIASTOLIC),
            780,
        ),
        VitalDefinition::simple("heart-rate", "Heart rate", "/min", Some(ranges::HEART_RATE), 990),
        VitalDefinition::simple(
            "respiratory-rate",
            "Respiratory rate",
            "/min",
            Some(ranges::RESPIRATORY_RATE),
            900,
        ),
        VitalDefinition::simple("temperature", "Body temperature", "Cel", Some(ranges::TEMPERATURE), 950),
        VitalDefinition::simple(
            "oxygen-saturation",
            "Oxygen saturation",
            "%",
            Some(ranges::OXYGEN_SATURATION),
            940,
        ),
        VitalDefinition::simple("bmi", "Body mass index", "kg/m2", Some(ranges::BMI), 700),
        VitalDefinition::simple("weight", "Body weight", "kg", None, 850),
    ]
}
