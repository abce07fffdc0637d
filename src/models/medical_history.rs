use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::Priority;

/// Per-patient clinical record, keyed by patient id.
///
/// One continuously-upserted document per patient: triage overwrites the
/// triage block on each assignment, staff amend the list fields afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct MedicalHistory {
    pub patient_id: Uuid,
    /// Last doctor assigned by triage.
    pub doctor_id: Option<Uuid>,
    pub triage_data: Option<TriageData>,
    pub allergies: Vec<String>,
    pub chronic_conditions: Vec<String>,
    pub surgeries: Vec<Surgery>,
    pub family_history: Option<String>,
    pub immunizations: Vec<Immunization>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub last_updated: NaiveDateTime,
}

/// Vitals and notes recorded by the triage staff member who processed
/// the patient's most recent booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageData {
    pub vitals: Option<serde_json::Value>,
    pub triage_id: Uuid,
    pub triage_date: NaiveDateTime,
    pub priority: Priority,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surgery {
    pub name: String,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Immunization {
    pub vaccine: String,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}
