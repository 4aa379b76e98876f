use serde::{Deserialize, Serialize};

/// Age buckets used to adjust vital-sign reference ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeBand {
    /// Younger than 1 year.
    Infant,
    /// 1 to 11 years.
    Child,
    /// 12 to 17 years.
    Teen,
    /// 18 to 64 years.
    Adult,
    /// 65 years and older.
    Elderly,
}

impl AgeBand {
    pub fn from_age(years: f64) -> Self {
        if years < 1.0 {
            AgeBand::Infant
        } else if years < 12.0 {
            AgeBand::Child
        } else if years < 18.0 {
            AgeBand::Teen
        } else if years < 65.0 {
            AgeBand::Adult
        } else {
            AgeBand::Elderly
        }
    }
}

/// Normal and critical bounds for a measured quantity. Normal bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceRange {
    pub normal_low: f64,
    pub normal_high: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_low: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_high: Option<f64>,
}

impl ReferenceRange {
    pub const fn new(
        normal_low: f64,
        normal_high: f64,
        critical_low: Option<f64>,
        critical_high: Option<f64>,
    ) -> Self {
        Self {
            normal_low,
            normal_high,
            critical_low,
            critical_high,
        }
    }

    pub fn is_abnormal(&self, value: f64) -> bool {
        value < self.normal_low || value > self.normal_high
    }

    pub fn is_critical_high(&self, value: f64) -> bool {
        self.critical_high.is_some_and(|limit| value > limit)
    }

    pub fn is_critical_low(&self, value: f64) -> bool {
        self.critical_low.is_some_and(|limit| value < limit)
    }

    pub fn is_critical(&self, value: f64) -> bool {
        self.is_critical_high(value) || self.is_critical_low(value)
    }

    pub fn has_critical_bounds(&self) -> bool {
        self.critical_low.is_some() || self.critical_high.is_some()
    }
}

/// One reference range per age band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandedRange {
    pub infant: ReferenceRange,
    pub child: ReferenceRange,
    pub teen: ReferenceRange,
    pub adult: ReferenceRange,
    pub elderly: ReferenceRange,
}

impl BandedRange {
    /// The same range for every band.
    pub const fn uniform(range: ReferenceRange) -> Self {
        Self {
            infant: range,
            child: range,
            teen: range,
            adult: range,
            elderly: range,
        }
    }

    pub fn for_band(&self, band: AgeBand) -> ReferenceRange {
        match band {
            AgeBand::Infant => self.infant,
            AgeBand::Child => self.child,
            AgeBand::Teen => self.teen,
            AgeBand::Adult => self.adult,
            AgeBand::Elderly => self.elderly,
        }
    }

    pub(crate) fn bands(&self) -> [ReferenceRange; 5] {
        [self.infant, self.child, self.teen, self.adult, self.elderly]
    }
}

const fn r(low: f64, high: f64, crit_low: f64, crit_high: f64) -> ReferenceRange {
    ReferenceRange::new(low, high, Some(crit_low), Some(crit_high))
}

pub(crate) const HEART_RATE: BandedRange = BandedRange {
    infant: r(100.0, 160.0, 80.0, 200.0),
    child: r(70.0, 120.0, 50.0, 180.0),
    teen: r(60.0, 100.0, 40.0, 150.0),
    adult: r(60.0, 100.0, 40.0, 150.0),
    elderly: r(60.0, 100.0, 40.0, 150.0),
};

pub(crate) const RESPIRATORY_RATE: BandedRange = BandedRange {
    infant: r(30.0, 60.0, 20.0, 70.0),
    child: r(18.0, 30.0, 12.0, 40.0),
    teen: r(12.0, 20.0, 8.0, 30.0),
    adult: r(12.0, 20.0, 8.0, 30.0),
    elderly: r(12.0, 20.0, 8.0, 30.0),
};

pub(crate) const SYSTOLIC: BandedRange = BandedRange {
    infant: r(70.0, 100.0, 50.0, 130.0),
    child: r(90.0, 110.0, 70.0, 140.0),
    teen: r(100.0, 120.0, 80.0, 160.0),
    adult: r(90.0, 120.0, 70.0, 180.0),
    elderly: r(90.0, 140.0, 70.0, 180.0),
};

pub(crate) const DIASTOLIC: BandedRange = BandedRange {
    infant: r(40.0, 65.0, 30.0, 90.0),
    child: r(55.0, 75.0, 40.0, 100.0),
    teen: r(60.0, 80.0, 40.0, 110.0),
    adult: r(60.0, 80.0, 40.0, 120.0),
    elderly: r(60.0, 90.0, 40.0, 120.0),
};

pub(crate) const TEMPERATURE: BandedRange = BandedRange {
    infant: r(36.5, 37.5, 35.0, 40.0),
    child: r(36.1, 37.2, 35.0, 40.0),
    teen: r(36.1, 37.2, 35.0, 40.0),
    adult: r(36.1, 37.2, 35.0, 40.0),
    elderly: r(36.1, 37.2, 35.0, 40.0),
};

pub(crate) const OXYGEN_SATURATION: BandedRange =
    BandedRange::uniform(ReferenceRange::new(95.0, 100.0, Some(88.0), None));

pub(crate) const BMI: BandedRange =
    BandedRange::uniform(ReferenceRange::new(18.5, 24.9, Some(15.0), Some(40.0)));
