//! Per-domain operator catalogs, value arity and reference-range metadata.
//!
//! The registry is the single authority on which operators a condition leaf may use for a
//! given `(domain, field)` pair. The editor consults it when a leaf is created or patched and
//! the compiler consults it again before emitting a hook definition.

use crate::error::RegistryError;
use crate::model::{TimeUnit, Timeframe};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

mod fields;
mod operators;
mod ranges;
pub mod vocabulary;

pub use fields::{DemographicField, LabDefinition, ValueKind, VitalComponent, VitalDefinition};
pub use operators::{Arity, Operator, arity_of};
pub use ranges::{AgeBand, BandedRange, ReferenceRange};

use operators::{CONDITION_OPERATORS, MEDICATION_OPERATORS, NUMERIC_COMPARISON, TEXT_COMPARISON};

/// The clinical area a condition leaf tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Domain {
    Demographic,
    MedicalCondition,
    LabValue,
    VitalSign,
    Medication,
}

impl Domain {
    pub const ALL: [Domain; 5] = [
        Domain::Demographic,
        Domain::MedicalCondition,
        Domain::LabValue,
        Domain::VitalSign,
        Domain::Medication,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Demographic => "demographic",
            Domain::MedicalCondition => "medical-condition",
            Domain::LabValue => "lab-value",
            Domain::VitalSign => "vital-sign",
            Domain::Medication => "medication",
        }
    }

    /// Lookback window applied when a leaf needs one and the author has not set it.
    pub fn default_timeframe(&self) -> Option<Timeframe> {
        match self {
            Domain::Demographic => None,
            Domain::MedicalCondition => Some(Timeframe::new(30, TimeUnit::Days)),
            Domain::LabValue => Some(Timeframe::new(90, TimeUnit::Days)),
            Domain::VitalSign => Some(Timeframe::new(7, TimeUnit::Days)),
            Domain::Medication => Some(Timeframe::new(30, TimeUnit::Days)),
        }
    }

    /// Only vital-sign trends carry a percentage threshold.
    pub fn supports_trend_threshold(&self) -> bool {
        matches!(self, Domain::VitalSign)
    }

    /// Whether fields in this domain come from a closed catalog.
    pub fn has_closed_vocabulary(&self) -> bool {
        matches!(self, Domain::Demographic | Domain::LabValue | Domain::VitalSign)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Catalog of fields, operators and reference ranges for every condition domain.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    labs: AHashMap<String, LabDefinition>,
    vitals: AHashMap<String, VitalDefinition>,
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OperatorRegistry {
    /// Creates a registry loaded with the built-in lab and vital-sign catalogs.
    pub fn new() -> Self {
        let labs = fields::builtin_labs()
            .into_iter()
            .map(|lab| (lab.id.clone(), lab))
            .collect();
        let vitals = fields::builtin_vitals()
            .into_iter()
            .map(|vital| (vital.id.clone(), vital))
            .collect();
        Self { labs, vitals }
    }

    /// Registers (or replaces) a lab test definition.
    pub fn with_lab(mut self, lab: LabDefinition) -> Self {
        self.labs.insert(lab.id.clone(), lab);
        self
    }

    /// Registers (or replaces) a vital-sign definition.
    pub fn with_vital(mut self, vital: VitalDefinition) -> Self {
        self.vitals.insert(vital.id.clone(), vital);
        self
    }

    pub fn lab(&self, id: &str) -> Option<&LabDefinition> {
        self.labs.get(id)
    }

    pub fn vital(&self, id: &str) -> Option<&VitalDefinition> {
        self.vitals.get(id)
    }

    pub fn labs(&self) -> impl Iterator<Item = &LabDefinition> {
        self.labs.values()
    }

    pub fn vitals(&self) -> impl Iterator<Item = &VitalDefinition> {
        self.vitals.values()
    }

    pub fn is_known_field(&self, domain: Domain, field: &str) -> bool {
        match domain {
            Domain::Demographic => DemographicField::from_id(field).is_some(),
            Domain::LabValue => self.labs.contains_key(field),
            Domain::VitalSign => self.vitals.contains_key(field),
            Domain::MedicalCondition | Domain::Medication => !field.trim().is_empty(),
        }
    }

    fn unknown(domain: Domain, field: &str) -> RegistryError {
        RegistryError::UnknownField {
            domain,
            field: field.to_string(),
        }
    }

    /// Ordered operators valid for `(domain, field)`. An unset field yields the domain's
    /// broadest operator set. The first operator never has arity two.
    pub fn operators_for(
        &self,
        domain: Domain,
        field: Option<&str>,
    ) -> Result<Vec<Operator>, RegistryError> {
        match domain {
            Domain::Demographic => match field.map(|id| (id, DemographicField::from_id(id))) {
                None | Some((_, Some(DemographicField::Age))) => Ok(NUMERIC_COMPARISON.to_vec()),
                Some((_, Some(DemographicField::Gender))) => Ok(TEXT_COMPARISON.to_vec()),
                Some((id, None)) => Err(Self::unknown(domain, id)),
            },
            Domain::LabValue => {
                let (has_range, has_critical) = match field {
                    None => (true, true),
                    Some(id) => {
                        let lab = self.labs.get(id).ok_or_else(|| Self::unknown(domain, id))?;
                        (
                            lab.range.is_some(),
                            lab.range.is_some_and(|r| r.has_critical_bounds()),
                        )
                    }
                };
                let mut ops = NUMERIC_COMPARISON.to_vec();
                if has_range {
                    ops.push(Operator::Abnormal);
                }
                if has_critical {
                    ops.push(Operator::Critical);
                }
                ops.extend(trend_and_presence());
                Ok(ops)
            }
            Domain::VitalSign => {
                let (has_range, critical_high, critical_low) = match field {
                    None => (true, true, true),
                    Some(id) => {
                        let vital = self.vitals.get(id).ok_or_else(|| Self::unknown(domain, id))?;
                        let bands: Vec<ReferenceRange> = vital
                            .all_ranges()
                            .iter()
                            .flat_map(|banded| banded.bands())
                            .collect();
                        (
                            !bands.is_empty(),
                            bands.iter().any(|r| r.critical_high.is_some()),
                            bands.iter().any(|r| r.critical_low.is_some()),
                        )
                    }
                };
                let mut ops = NUMERIC_COMPARISON.to_vec();
                if has_range {
                    ops.push(Operator::Abnormal);
                }
                if critical_high {
                    ops.push(Operator::CriticalHigh);
                }
                if critical_low {
                    ops.push(Operator::CriticalLow);
                }
                ops.extend(trend_and_presence());
                Ok(ops)
            }
            Domain::MedicalCondition | Domain::Medication => {
                if let Some(id) = field {
                    if id.trim().is_empty() {
                        return Err(Self::unknown(domain, id));
                    }
                }
                Ok(if domain == Domain::Medication {
                    MEDICATION_OPERATORS.to_vec()
                } else {
                    CONDITION_OPERATORS.to_vec()
                })
            }
        }
    }

    /// The operator a freshly created or field-reset leaf starts with.
    pub fn default_operator(
        &self,
        domain: Domain,
        field: Option<&str>,
    ) -> Result<Operator, RegistryError> {
        let ops = self.operators_for(domain, field)?;
        // Every domain lists at least the comparison or presence operators.
        Ok(ops.first().copied().unwrap_or(Operator::Exists))
    }

    pub fn is_valid_operator(&self, domain: Domain, field: Option<&str>, operator: Operator) -> bool {
        self.operators_for(domain, field)
            .map(|ops| ops.contains(&operator))
            .unwrap_or(false)
    }

    pub fn value_kind(&self, domain: Domain, field: Option<&str>) -> ValueKind {
        match (domain, field.and_then(DemographicField::from_id)) {
            (Domain::Demographic, Some(DemographicField::Gender)) => ValueKind::Text,
            _ => ValueKind::Numeric,
        }
    }

    /// Components of a multi-part measurement; empty for everything else.
    pub fn components_for(&self, domain: Domain, field: &str) -> &[VitalComponent] {
        match (domain, self.vitals.get(field)) {
            (Domain::VitalSign, Some(vital)) => &vital.components,
            _ => &[],
        }
    }

    pub fn default_component(&self, domain: Domain, field: &str) -> Option<String> {
        self.components_for(domain, field)
            .first()
            .map(|c| c.name.clone())
    }

    /// Checks that `component` is allowed for the field. `None` always passes, the default
    /// component applies.
    pub fn check_component(
        &self,
        domain: Domain,
        field: &str,
        component: Option<&str>,
    ) -> Result<(), RegistryError> {
        let Some(component) = component else {
            return Ok(());
        };
        if self
            .components_for(domain, field)
            .iter()
            .any(|c| c.name == component)
        {
            Ok(())
        } else {
            Err(RegistryError::UnsupportedComponent {
                field: field.to_string(),
                component: component.to_string(),
            })
        }
    }

    /// Reference range for a measured field. Vital signs are age adjusted; without an age
    /// band the adult range applies.
    pub fn reference_range_for(
        &self,
        domain: Domain,
        field: &str,
        component: Option<&str>,
        band: Option<AgeBand>,
    ) -> Option<ReferenceRange> {
        match domain {
            Domain::LabValue => self.labs.get(field)?.range,
            Domain::VitalSign => {
                let vital = self.vitals.get(field)?;
                let banded = if vital.components.is_empty() {
                    vital.ranges?
                } else {
                    let part = match component {
                        Some(name) => vital.component(name)?,
                        None => vital.default_component()?,
                    };
                    part.ranges?
                };
                Some(banded.for_band(band.unwrap_or(AgeBand::Adult)))
            }
            _ => None,
        }
    }
}

fn trend_and_presence() -> [Operator; 4] {
    [
        Operator::TrendingUp,
        Operator::TrendingDown,
        Operator::Missing,
        Operator::Exists,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_wire_names() {
        let json = serde_json::to_string(&Domain::MedicalCondition).unwrap();
        assert_eq!(json, "\"medical-condition\"");
        let domain: Domain = serde_json::from_str("\"vital-sign\"").unwrap();
        assert_eq!(domain, Domain::VitalSign);
    }

    #[test]
    fn first_operator_never_takes_two_values() {
        let registry = OperatorRegistry::new();
        for domain in Domain::ALL {
            let first = registry.default_operator(domain, None).unwrap();
            assert_ne!(first.arity(), Arity::Two, "{domain}");
        }
        for lab in registry.labs() {
            let first = registry.default_operator(Domain::LabValue, Some(&lab.id)).unwrap();
            assert_ne!(first.arity(), Arity::Two);
        }
        for vital in registry.vitals() {
            let first = registry.default_operator(Domain::VitalSign, Some(&vital.id)).unwrap();
            assert_ne!(first.arity(), Arity::Two);
        }
    }
}
