//! Patient records as delivered by the clinical API.
//!
//! The API is only semi-trusted: vitals arrive as numbers, numeric strings,
//! free text, `null`, or not at all. [`PatientRecord`] therefore keeps the
//! three scored vitals as raw [`serde_json::Value`]s and leaves coercion to
//! the assessor. The identifier is the one field that must be usable, since
//! a record that cannot be named cannot be reported.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One patient entry from a page of `/patients`.
///
/// Read-only after receipt. Both snake_case and camelCase keys are read;
/// when an entry carries both spellings the snake_case value wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireRecord")]
pub struct PatientRecord {
    /// Opaque identifier. Accepts a JSON string or number.
    pub patient_id: String,

    /// Age in years, in whatever shape the API sent it.
    pub age: Value,

    /// Body temperature in Fahrenheit.
    pub temperature: Value,

    /// Expected shape `"SYS/DIA"`.
    pub blood_pressure: Value,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub medications: Option<String>,
}

impl PatientRecord {
    /// Build a record from its scored fields only.
    pub fn new(
        patient_id: impl Into<String>,
        age: Value,
        temperature: Value,
        blood_pressure: Value,
    ) -> Self {
        Self {
            patient_id: patient_id.into(),
            age,
            temperature,
            blood_pressure,
            name: None,
            gender: None,
            visit_date: None,
            diagnosis: None,
            medications: None,
        }
    }
}

/// The entry exactly as received, with each key spelling kept apart.
#[derive(Deserialize)]
struct WireRecord {
    #[serde(default)]
    patient_id: Option<Value>,
    #[serde(default, rename = "patientId")]
    patient_id_camel: Option<Value>,
    #[serde(default)]
    age: Value,
    #[serde(default)]
    temperature: Value,
    #[serde(default)]
    blood_pressure: Option<Value>,
    #[serde(default, rename = "bloodPressure")]
    blood_pressure_camel: Option<Value>,
    #[serde(default)]
    name: Option<Value>,
    #[serde(default)]
    gender: Option<Value>,
    #[serde(default)]
    visit_date: Option<Value>,
    #[serde(default, rename = "visitDate")]
    visit_date_camel: Option<Value>,
    #[serde(default)]
    diagnosis: Option<Value>,
    #[serde(default)]
    medications: Option<Value>,
}

impl TryFrom<WireRecord> for PatientRecord {
    type Error = String;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        let patient_id = match wire.patient_id.or(wire.patient_id_camel) {
            Some(Value::String(s)) if !s.trim().is_empty() => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => {
                return Err(format!(
                    "patient_id must be a non-empty string or a number, got {other}"
                ));
            }
            None => return Err("missing patient_id".to_string()),
        };

        Ok(Self {
            patient_id,
            age: wire.age,
            temperature: wire.temperature,
            blood_pressure: wire
                .blood_pressure
                .or(wire.blood_pressure_camel)
                .unwrap_or(Value::Null),
            name: text(wire.name),
            gender: text(wire.gender),
            visit_date: text(wire.visit_date.or(wire.visit_date_camel)),
            diagnosis: text(wire.diagnosis),
            medications: text(wire.medications),
        })
    }
}

/// Keep strings, drop anything else instead of rejecting the record.
fn text(value: Option<Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) => Some(s),
        _ => None,
    }
}
