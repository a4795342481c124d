//! Risk scoring output types.
//!
//! [`RiskFactors`] is the per-patient breakdown, recomputed on every
//! assessment and never stored. [`AlertSets`] is the run-level result, and
//! [`AssessmentPayload`] is its wire shape for `POST /submit-assessment`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Total risk at or above which a patient is flagged high-risk.
pub const HIGH_RISK_THRESHOLD: u8 = 4;

/// Risk bands for one patient.
///
/// A component that failed validation carries risk 0 and a `false` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RiskFactors {
    /// 0..=2
    pub age_risk: u8,
    /// 0..=2
    pub temp_risk: u8,
    /// 0..=3
    pub bp_risk: u8,
    pub age_valid: bool,
    pub temp_valid: bool,
    pub bp_valid: bool,
}

impl RiskFactors {
    pub fn total(&self) -> u8 {
        self.age_risk + self.temp_risk + self.bp_risk
    }

    pub fn is_high_risk(&self) -> bool {
        self.total() >= HIGH_RISK_THRESHOLD
    }

    /// A valid temperature in the 99.6 F band or above.
    pub fn has_fever(&self) -> bool {
        self.temp_valid && self.temp_risk >= 1
    }

    pub fn has_data_quality_issue(&self) -> bool {
        !(self.age_valid && self.temp_valid && self.bp_valid)
    }
}

/// Patient identifiers grouped by alert.
///
/// Order follows the order patients were recorded. An identifier is kept
/// at most once per set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSets {
    pub high_risk: Vec<String>,
    pub fever: Vec<String>,
    pub data_quality: Vec<String>,
}

impl AlertSets {
    /// Build the sets from `(patient_id, factors)` pairs in input order.
    pub fn from_factors<'a, I>(scored: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, RiskFactors)>,
    {
        let mut sets = Self::default();
        let mut seen = [HashSet::new(), HashSet::new(), HashSet::new()];

        for (id, factors) in scored {
            let flags = [
                factors.is_high_risk(),
                factors.has_fever(),
                factors.has_data_quality_issue(),
            ];
            let targets = [&mut sets.high_risk, &mut sets.fever, &mut sets.data_quality];

            for ((flag, target), seen) in flags.into_iter().zip(targets).zip(seen.iter_mut()) {
                if flag && seen.insert(id) {
                    target.push(id.to_owned());
                }
            }
        }

        sets
    }

    pub fn is_empty(&self) -> bool {
        self.high_risk.is_empty() && self.fever.is_empty() && self.data_quality.is_empty()
    }
}

/// JSON body of the assessment submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentPayload {
    pub high_risk_patients: Vec<String>,
    pub fever_patients: Vec<String>,
    pub data_quality_issues: Vec<String>,
}

impl From<&AlertSets> for AssessmentPayload {
    fn from(sets: &AlertSets) -> Self {
        Self {
            high_risk_patients: sets.high_risk.clone(),
            fever_patients: sets.fever.clone(),
            data_quality_issues: sets.data_quality.clone(),
        }
    }
}
