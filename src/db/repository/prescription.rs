use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::{parse_json, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Prescription;

const PRESCRIPTION_COLS: &str =
    "id, appointment_id, patient_id, doctor_id, medications, diagnosis, notes, date, is_active";

pub fn insert_prescription(
    conn: &Connection,
    prescription: &Prescription,
) -> Result<(), DatabaseError> {
    let medications = serde_json::to_string(&prescription.medications).map_err(|e| {
        DatabaseError::InvalidValue {
            field: "prescriptions.medications".into(),
            value: e.to_string(),
        }
    })?;
    conn.execute(
        "INSERT INTO prescriptions (id, appointment_id, patient_id, doctor_id,
         medications, diagnosis, notes, date, is_active)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            prescription.id.to_string(),
            prescription.appointment_id.to_string(),
            prescription.patient_id.to_string(),
            prescription.doctor_id.to_string(),
            medications,
            prescription.diagnosis,
            prescription.notes,
            prescription.date,
            prescription.is_active as i32,
        ],
    )?;
    Ok(())
}

/// A patient's prescriptions, newest first, paginated.
pub fn list_patient_prescriptions(
    conn: &Connection,
    patient_id: &Uuid,
    limit: u32,
    offset: u32,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLS} FROM prescriptions
         WHERE patient_id = ?1 ORDER BY date DESC LIMIT ?2 OFFSET ?3"
    ))?;
    let raws: Vec<_> = stmt
        .query_map(params![patient_id.to_string(), limit, offset], raw_prescription)?
        .collect();

    let mut prescriptions = Vec::new();
    for raw in raws {
        prescriptions.push(prescription_from_raw(raw?)?);
    }
    Ok(prescriptions)
}

pub fn count_patient_prescriptions(conn: &Connection, patient_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM prescriptions WHERE patient_id = ?1",
        params![patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Row mapping ──

struct RawPrescription {
    id: String,
    appointment_id: String,
    patient_id: String,
    doctor_id: String,
    medications: String,
    diagnosis: Option<String>,
    notes: Option<String>,
    date: NaiveDateTime,
    is_active: bool,
}

fn raw_prescription(row: &rusqlite::Row) -> rusqlite::Result<RawPrescription> {
    Ok(RawPrescription {
        id: row.get(0)?,
        appointment_id: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        medications: row.get(4)?,
        diagnosis: row.get(5)?,
        notes: row.get(6)?,
        date: row.get(7)?,
        is_active: row.get(8)?,
    })
}

fn prescription_from_raw(raw: RawPrescription) -> Result<Prescription, DatabaseError> {
    Ok(Prescription {
        id: parse_uuid("prescriptions.id", &raw.id)?,
        appointment_id: parse_uuid("prescriptions.appointment_id", &raw.appointment_id)?,
        patient_id: parse_uuid("prescriptions.patient_id", &raw.patient_id)?,
        doctor_id: parse_uuid("prescriptions.doctor_id", &raw.doctor_id)?,
        medications: parse_json("prescriptions.medications", &raw.medications)?,
        diagnosis: raw.diagnosis,
        notes: raw.notes,
        date: raw.date,
        is_active: raw.is_active,
    })
}
