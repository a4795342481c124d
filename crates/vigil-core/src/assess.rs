//! Patient risk scoring.
//!
//! Three vitals are banded independently and summed:
//!
//! | Vital | 0 | 1 | 2 | 3 |
//! |---|---|---|---|---|
//! | age (years) | < 40 | 40..66 | >= 66 | |
//! | temperature (F) | < 99.6 | 99.6..101.0 | >= 101.0 | |
//! | blood pressure | below the rest | sys >= 120 and dia < 80 | sys >= 130 or dia >= 80 | sys >= 140 or dia >= 90 |
//!
//! Blood-pressure bands are tested from the highest down and the first match
//! wins. A vital that cannot be read scores 0 and marks the record as a
//! data-quality issue.
//!
//! Thresholds are fixed clinical rules and deliberately not configurable.

use regex::Regex;
use serde_json::Value;

use vigil_types::report::MalformedCounts;
use vigil_types::{AlertSets, PatientRecord, RiskFactors};

/// A reading is `SYS/DIA`, two or three ASCII digits each, nothing else.
const BLOOD_PRESSURE_PATTERN: &str = r"^[0-9]{2,3}/[0-9]{2,3}$";

/// Run-level output of [`RiskAssessor::assess`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assessment {
    pub alerts: AlertSets,
    /// Records whose field failed validation, per field.
    pub malformed: MalformedCounts,
    pub records: usize,
}

/// Pure, deterministic scorer. Holds no state between calls.
#[derive(Debug, Clone)]
pub struct RiskAssessor {
    blood_pressure: Regex,
}

impl RiskAssessor {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            blood_pressure: Regex::new(BLOOD_PRESSURE_PATTERN)?,
        })
    }

    /// Score every record and group the identifiers by alert.
    pub fn assess(&self, records: &[PatientRecord]) -> Assessment {
        let mut malformed = MalformedCounts::default();

        let scored: Vec<(&str, RiskFactors)> = records
            .iter()
            .map(|record| {
                let factors = self.score(record);
                malformed.age += u32::from(!factors.age_valid);
                malformed.temperature += u32::from(!factors.temp_valid);
                malformed.blood_pressure += u32::from(!factors.bp_valid);
                (record.patient_id.as_str(), factors)
            })
            .collect();

        Assessment {
            alerts: AlertSets::from_factors(scored),
            malformed,
            records: records.len(),
        }
    }

    /// Band the three vitals of one record.
    pub fn score(&self, record: &PatientRecord) -> RiskFactors {
        let age = coerce_number(&record.age);
        let temp = coerce_number(&record.temperature);
        let bp = self.parse_blood_pressure(&record.blood_pressure);

        RiskFactors {
            age_risk: age.map_or(0, age_risk),
            temp_risk: temp.map_or(0, temperature_risk),
            bp_risk: bp.map_or(0, |(sys, dia)| blood_pressure_risk(sys, dia)),
            age_valid: age.is_some(),
            temp_valid: temp.is_some(),
            bp_valid: bp.is_some(),
        }
    }

    /// `(systolic, diastolic)` when `value` is a well-formed reading.
    pub fn parse_blood_pressure(&self, value: &Value) -> Option<(u32, u32)> {
        let text = value.as_str()?;
        if !self.blood_pressure.is_match(text) {
            return None;
        }
        let (sys, dia) = text.split_once('/')?;
        Some((sys.parse().ok()?, dia.parse().ok()?))
    }
}

/// A finite number from a JSON number or numeric string.
pub fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    n.is_finite().then_some(n)
}

pub fn age_risk(age: f64) -> u8 {
    if age >= 66.0 {
        2
    } else if age >= 40.0 {
        1
    } else {
        0
    }
}

pub fn temperature_risk(temp: f64) -> u8 {
    if temp >= 101.0 {
        2
    } else if temp >= 99.6 {
        1
    } else {
        0
    }
}

pub fn blood_pressure_risk(systolic: u32, diastolic: u32) -> u8 {
    if systolic >= 140 || diastolic >= 90 {
        3
    } else if systolic >= 130 || diastolic >= 80 {
        2
    } else if systolic >= 120 && diastolic < 80 {
        1
    } else {
        0
    }
}
