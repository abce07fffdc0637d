use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_json, parse_uuid};
use crate::db::DatabaseError;
use crate::models::{Immunization, MedicalHistory, Surgery, TriageData};

const HISTORY_COLS: &str = "patient_id, doctor_id, triage_data, allergies, \
     chronic_conditions, surgeries, family_history, immunizations, diagnosis, \
     treatment, last_updated";

/// Upsert the triage block and assigned doctor for a patient.
/// Creates the record on first assignment, overwrites the triage data on
/// every subsequent one; list fields are preserved.
pub fn upsert_triage_data(
    conn: &Connection,
    patient_id: &Uuid,
    doctor_id: &Uuid,
    triage: &TriageData,
) -> Result<(), DatabaseError> {
    let triage_json = serde_json::to_string(triage)
        .map_err(|e| DatabaseError::InvalidValue {
            field: "medical_histories.triage_data".into(),
            value: e.to_string(),
        })?;
    conn.execute(
        "INSERT INTO medical_histories (patient_id, doctor_id, triage_data, last_updated)
         VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(patient_id) DO UPDATE SET
             doctor_id = excluded.doctor_id,
             triage_data = excluded.triage_data,
             last_updated = excluded.last_updated",
        params![
            patient_id.to_string(),
            doctor_id.to_string(),
            triage_json,
            Utc::now().naive_utc(),
        ],
    )?;
    Ok(())
}

pub fn get_medical_history(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Option<MedicalHistory>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HISTORY_COLS} FROM medical_histories WHERE patient_id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![patient_id.to_string()], raw_history)?;
    rows.next().transpose()?.map(history_from_raw).transpose()
}

/// Fields staff may amend after the record exists. `None` leaves a field
/// untouched, mirroring a partial update body.
#[derive(Debug, Default)]
pub struct MedicalHistoryUpdate {
    pub allergies: Option<Vec<String>>,
    pub chronic_conditions: Option<Vec<String>>,
    pub surgeries: Option<Vec<Surgery>>,
    pub family_history: Option<String>,
    pub immunizations: Option<Vec<Immunization>>,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
}

/// Amend an existing record. Returns the updated record, or None when no
/// record exists yet (triage must process the patient first).
pub fn update_medical_history(
    conn: &Connection,
    patient_id: &Uuid,
    update: &MedicalHistoryUpdate,
) -> Result<Option<MedicalHistory>, DatabaseError> {
    let Some(mut history) = get_medical_history(conn, patient_id)? else {
        return Ok(None);
    };

    if let Some(v) = &update.allergies {
        history.allergies = v.clone();
    }
    if let Some(v) = &update.chronic_conditions {
        history.chronic_conditions = v.clone();
    }
    if let Some(v) = &update.surgeries {
        history.surgeries = v.clone();
    }
    if let Some(v) = &update.family_history {
        history.family_history = Some(v.clone());
    }
    if let Some(v) = &update.immunizations {
        history.immunizations = v.clone();
    }
    if let Some(v) = &update.diagnosis {
        history.diagnosis = Some(v.clone());
    }
    if let Some(v) = &update.treatment {
        history.treatment = Some(v.clone());
    }
    history.last_updated = Utc::now().naive_utc();

    conn.execute(
        "UPDATE medical_histories SET
             allergies = ?2, chronic_conditions = ?3, surgeries = ?4,
             family_history = ?5, immunizations = ?6, diagnosis = ?7,
             treatment = ?8, last_updated = ?9
         WHERE patient_id = ?1",
        params![
            patient_id.to_string(),
            to_json(&history.allergies)?,
            to_json(&history.chronic_conditions)?,
            to_json(&history.surgeries)?,
            history.family_history,
            to_json(&history.immunizations)?,
            history.diagnosis,
            history.treatment,
            history.last_updated,
        ],
    )?;
    Ok(Some(history))
}

/// Doctor ids that have ever been linked to this patient through the
/// medical history or an appointment.
pub fn list_patient_doctor_ids(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Uuid>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT doctor_id FROM medical_histories WHERE patient_id = ?1 AND doctor_id IS NOT NULL
         UNION
         SELECT doctor_id FROM appointments WHERE patient_id = ?1",
    )?;
    let rows: Vec<rusqlite::Result<String>> = stmt
        .query_map(params![patient_id.to_string()], |row| row.get(0))?
        .collect();

    let mut ids = Vec::new();
    for row in rows {
        ids.push(parse_uuid("doctor_id", &row?)?);
    }
    Ok(ids)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::InvalidValue {
        field: "medical_histories".into(),
        value: e.to_string(),
    })
}

// ── Row mapping ──

struct RawHistory {
    patient_id: String,
    doctor_id: Option<String>,
    triage_data: Option<String>,
    allergies: String,
    chronic_conditions: String,
    surgeries: String,
    family_history: Option<String>,
    immunizations: String,
    diagnosis: Option<String>,
    treatment: Option<String>,
    last_updated: NaiveDateTime,
}

fn raw_history(row: &rusqlite::Row) -> rusqlite::Result<RawHistory> {
    Ok(RawHistory {
        patient_id: row.get(0)?,
        doctor_id: row.get(1)?,
        triage_data: row.get(2)?,
        allergies: row.get(3)?,
        chronic_conditions: row.get(4)?,
        surgeries: row.get(5)?,
        family_history: row.get(6)?,
        immunizations: row.get(7)?,
        diagnosis: row.get(8)?,
        treatment: row.get(9)?,
        last_updated: row.get(10)?,
    })
}

fn history_from_raw(raw: RawHistory) -> Result<MedicalHistory, DatabaseError> {
    Ok(MedicalHistory {
        patient_id: parse_uuid("medical_histories.patient_id", &raw.patient_id)?,
        doctor_id: raw
            .doctor_id
            .as_deref()
            .map(|s| parse_uuid("medical_histories.doctor_id", s))
            .transpose()?,
        triage_data: raw
            .triage_data
            .as_deref()
            .map(|s| parse_json::<TriageData>("medical_histories.triage_data", s))
            .transpose()?,
        allergies: parse_json("medical_histories.allergies", &raw.allergies)?,
        chronic_conditions: parse_json(
            "medical_histories.chronic_conditions",
            &raw.chronic_conditions,
        )?,
        surgeries: parse_json("medical_histories.surgeries", &raw.surgeries)?,
        family_history: raw.family_history,
        immunizations: parse_json("medical_histories.immunizations", &raw.immunizations)?,
        diagnosis: raw.diagnosis,
        treatment: raw.treatment,
        last_updated: raw.last_updated,
    })
}
