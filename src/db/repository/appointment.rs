use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_uuid;
use super::user::{raw_user, user_from_raw};
use crate::db::DatabaseError;
use crate::models::enums::{AppointmentStatus, Priority};
use crate::models::{Appointment, User};

const APPOINTMENT_COLS: &str = "id, booking_id, patient_id, doctor_id, date, time, \
     status, reason, priority, notes, created_at, updated_at";

pub fn insert_appointment(
    conn: &Connection,
    appointment: &Appointment,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, booking_id, patient_id, doctor_id, date, time,
         status, reason, priority, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            appointment.id.to_string(),
            appointment.booking_id.to_string(),
            appointment.patient_id.to_string(),
            appointment.doctor_id.to_string(),
            appointment.date,
            appointment.time,
            appointment.status.as_str(),
            appointment.reason,
            appointment.priority.as_str(),
            appointment.notes,
            appointment.created_at,
            appointment.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_appointment(
    conn: &Connection,
    id: &Uuid,
) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLS} FROM appointments WHERE id = ?1"
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], raw_appointment)?;
    rows.next()
        .transpose()?
        .map(appointment_from_raw)
        .transpose()
}

/// Conditional status update: transitions a scheduled appointment owned by
/// `doctor_id`. Returns the updated appointment, or None when the row does
/// not exist, belongs to another doctor, or is already terminal.
pub fn transition_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
    doctor_id: &Uuid,
    to: AppointmentStatus,
) -> Result<Option<Appointment>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?3, updated_at = ?4
         WHERE id = ?1 AND doctor_id = ?2 AND status = 'scheduled'",
        params![
            appointment_id.to_string(),
            doctor_id.to_string(),
            to.as_str(),
            Utc::now().naive_utc(),
        ],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_appointment(conn, appointment_id)
}

/// The shared records-access predicate: a doctor may see a patient's data
/// iff an appointment links them with status scheduled or completed.
pub fn doctor_treats_patient(
    conn: &Connection,
    doctor_id: &Uuid,
    patient_id: &Uuid,
) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE doctor_id = ?1 AND patient_id = ?2
         AND status IN ('scheduled', 'completed')",
        params![doctor_id.to_string(), patient_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// The scheduled appointment linking doctor and patient, if any.
/// Prescriptions may only be issued against this.
pub fn get_active_appointment(
    conn: &Connection,
    appointment_id: &Uuid,
    doctor_id: &Uuid,
    patient_id: &Uuid,
) -> Result<Option<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLS} FROM appointments
         WHERE id = ?1 AND doctor_id = ?2 AND patient_id = ?3 AND status = 'scheduled'"
    ))?;
    let mut rows = stmt.query_map(
        params![
            appointment_id.to_string(),
            doctor_id.to_string(),
            patient_id.to_string()
        ],
        raw_appointment,
    )?;
    rows.next()
        .transpose()?
        .map(appointment_from_raw)
        .transpose()
}

pub fn list_doctor_appointments(
    conn: &Connection,
    doctor_id: &Uuid,
    status: Option<AppointmentStatus>,
    date: Option<NaiveDate>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql = format!(
        "SELECT {APPOINTMENT_COLS} FROM appointments WHERE doctor_id = ?1"
    );
    let mut values: Vec<Box<dyn rusqlite::ToSql>> =
        vec![Box::new(doctor_id.to_string())];
    if let Some(s) = status {
        values.push(Box::new(s.as_str()));
        sql.push_str(&format!(" AND status = ?{}", values.len()));
    }
    if let Some(d) = date {
        values.push(Box::new(d));
        sql.push_str(&format!(" AND date = ?{}", values.len()));
    }
    sql.push_str(" ORDER BY date ASC, time ASC");

    query_appointments(conn, &sql, &values)
}

pub fn list_patient_appointments(
    conn: &Connection,
    patient_id: &Uuid,
    status: Option<AppointmentStatus>,
    upcoming_after: Option<NaiveDate>,
    limit: Option<u32>,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut sql = format!(
        "SELECT {APPOINTMENT_COLS} FROM appointments WHERE patient_id = ?1"
    );
    let mut values: Vec<Box<dyn rusqlite::ToSql>> =
        vec![Box::new(patient_id.to_string())];
    if let Some(s) = status {
        values.push(Box::new(s.as_str()));
        sql.push_str(&format!(" AND status = ?{}", values.len()));
    }
    if let Some(after) = upcoming_after {
        values.push(Box::new(after));
        sql.push_str(&format!(" AND date >= ?{}", values.len()));
    }
    sql.push_str(" ORDER BY date ASC, time ASC");
    if let Some(n) = limit {
        values.push(Box::new(n));
        sql.push_str(&format!(" LIMIT ?{}", values.len()));
    }

    query_appointments(conn, &sql, &values)
}

/// Appointments of one status (or all), paginated, date ascending.
/// Admin oversight view.
pub fn list_appointments_by_status(
    conn: &Connection,
    status: Option<AppointmentStatus>,
    limit: u32,
    offset: u32,
) -> Result<Vec<Appointment>, DatabaseError> {
    match status {
        Some(s) => {
            let sql = format!(
                "SELECT {APPOINTMENT_COLS} FROM appointments WHERE status = ?1
                 ORDER BY date ASC LIMIT ?2 OFFSET ?3"
            );
            let values: Vec<Box<dyn rusqlite::ToSql>> =
                vec![Box::new(s.as_str()), Box::new(limit), Box::new(offset)];
            query_appointments(conn, &sql, &values)
        }
        None => {
            let sql = format!(
                "SELECT {APPOINTMENT_COLS} FROM appointments
                 ORDER BY date ASC LIMIT ?1 OFFSET ?2"
            );
            let values: Vec<Box<dyn rusqlite::ToSql>> =
                vec![Box::new(limit), Box::new(offset)];
            query_appointments(conn, &sql, &values)
        }
    }
}

pub fn count_appointments_by_status(
    conn: &Connection,
    status: Option<AppointmentStatus>,
) -> Result<i64, DatabaseError> {
    let count = match status {
        Some(s) => conn.query_row(
            "SELECT COUNT(*) FROM appointments WHERE status = ?1",
            params![s.as_str()],
            |row| row.get(0),
        )?,
        None => conn.query_row("SELECT COUNT(*) FROM appointments", [], |row| row.get(0))?,
    };
    Ok(count)
}

/// Distinct patients a doctor has appointments with, name ascending.
pub fn list_doctor_patients(
    conn: &Connection,
    doctor_id: &Uuid,
) -> Result<Vec<User>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT u.id, u.name, u.email, u.password_hash, u.role, u.date_of_birth,
                u.gender, u.phone_number, u.address, u.blood_group, u.emergency_contact_name,
                u.emergency_contact_number, u.specialization, u.department, u.qualifications,
                u.license_number, u.created_at, u.updated_at
         FROM users u
         JOIN appointments a ON a.patient_id = u.id
         WHERE a.doctor_id = ?1
         ORDER BY u.name ASC",
    )?;
    let raws: Vec<_> = stmt
        .query_map(params![doctor_id.to_string()], raw_user)?
        .collect();

    let mut patients = Vec::new();
    for raw in raws {
        patients.push(user_from_raw(raw?)?);
    }
    Ok(patients)
}

fn query_appointments(
    conn: &Connection,
    sql: &str,
    values: &[Box<dyn rusqlite::ToSql>],
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let param_refs: Vec<&dyn rusqlite::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let raws: Vec<_> = stmt
        .query_map(param_refs.as_slice(), raw_appointment)?
        .collect();

    let mut appointments = Vec::new();
    for raw in raws {
        appointments.push(appointment_from_raw(raw?)?);
    }
    Ok(appointments)
}

// ── Row mapping ──

pub(super) struct RawAppointment {
    id: String,
    booking_id: String,
    patient_id: String,
    doctor_id: String,
    date: NaiveDate,
    time: String,
    status: String,
    reason: Option<String>,
    priority: String,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub(super) fn raw_appointment(row: &rusqlite::Row) -> rusqlite::Result<RawAppointment> {
    Ok(RawAppointment {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        patient_id: row.get(2)?,
        doctor_id: row.get(3)?,
        date: row.get(4)?,
        time: row.get(5)?,
        status: row.get(6)?,
        reason: row.get(7)?,
        priority: row.get(8)?,
        notes: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

pub(super) fn appointment_from_raw(raw: RawAppointment) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: parse_uuid("appointments.id", &raw.id)?,
        booking_id: parse_uuid("appointments.booking_id", &raw.booking_id)?,
        patient_id: parse_uuid("appointments.patient_id", &raw.patient_id)?,
        doctor_id: parse_uuid("appointments.doctor_id", &raw.doctor_id)?,
        date: raw.date,
        time: raw.time,
        status: AppointmentStatus::from_str(&raw.status)?,
        reason: raw.reason,
        priority: Priority::from_str(&raw.priority)?,
        notes: raw.notes,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}
