use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A prescription issued by a doctor during a scheduled appointment.
/// Immutable once written, apart from the `is_active` flag.
#[derive(Debug, Clone, Serialize)]
pub struct Prescription {
    pub id: Uuid,
    pub appointment_id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub medications: Vec<MedicationItem>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
    pub date: NaiveDateTime,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationItem {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
    pub instructions: Option<String>,
}
