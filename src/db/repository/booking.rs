use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::enums::{BookingStatus, Gender, Priority};
use crate::models::{Booking, PatientSummary, PendingBooking};

const BOOKING_COLS: &str = "id, patient_id, symptoms, looking_for, priority, \
     preferred_date, preferred_time, status, notes, created_at, updated_at";

pub fn insert_booking(conn: &Connection, booking: &Booking) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO bookings (id, patient_id, symptoms, looking_for, priority,
         preferred_date, preferred_time, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            booking.id.to_string(),
            booking.patient_id.to_string(),
            booking.symptoms,
            booking.looking_for,
            booking.priority.as_str(),
            booking.preferred_date,
            booking.preferred_time,
            booking.status.as_str(),
            booking.notes,
            booking.created_at,
            booking.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_booking(conn: &Connection, id: &Uuid) -> Result<Option<Booking>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {BOOKING_COLS} FROM bookings WHERE id = ?1"))?;
    let mut rows = stmt.query_map(params![id.to_string()], raw_booking)?;
    rows.next().transpose()?.map(booking_from_raw).transpose()
}

/// Conditional cancel: flips pending → cancelled for the owning patient.
/// Returns the updated booking, or None if it was missing, owned by
/// someone else, or already processed.
pub fn cancel_booking(
    conn: &Connection,
    booking_id: &Uuid,
    patient_id: &Uuid,
) -> Result<Option<Booking>, DatabaseError> {
    let changed = conn.execute(
        "UPDATE bookings SET status = 'cancelled', updated_at = ?3
         WHERE id = ?1 AND patient_id = ?2 AND status = 'pending'",
        params![
            booking_id.to_string(),
            patient_id.to_string(),
            Utc::now().naive_utc(),
        ],
    )?;
    if changed == 0 {
        return Ok(None);
    }
    get_booking(conn, booking_id)
}

/// Atomic claim: flips pending → assigned iff still pending.
/// Returns false when another actor already processed the booking,
/// so concurrent duplicate triage calls cannot both succeed.
pub fn claim_booking(conn: &Connection, booking_id: &Uuid) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE bookings SET status = 'assigned', updated_at = ?2
         WHERE id = ?1 AND status = 'pending'",
        params![booking_id.to_string(), Utc::now().naive_utc()],
    )?;
    Ok(changed == 1)
}

pub fn list_patient_bookings(
    conn: &Connection,
    patient_id: &Uuid,
    status: Option<BookingStatus>,
) -> Result<Vec<Booking>, DatabaseError> {
    let mut stmt;
    let raws: Vec<rusqlite::Result<RawBooking>> = match status {
        Some(s) => {
            stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLS} FROM bookings
                 WHERE patient_id = ?1 AND status = ?2 ORDER BY created_at DESC"
            ))?;
            stmt.query_map(params![patient_id.to_string(), s.as_str()], raw_booking)?
                .collect()
        }
        None => {
            stmt = conn.prepare(&format!(
                "SELECT {BOOKING_COLS} FROM bookings
                 WHERE patient_id = ?1 ORDER BY created_at DESC"
            ))?;
            stmt.query_map(params![patient_id.to_string()], raw_booking)?
                .collect()
        }
    };

    let mut bookings = Vec::new();
    for raw in raws {
        bookings.push(booking_from_raw(raw?)?);
    }
    Ok(bookings)
}

/// Pending bookings joined with their patient, oldest first, for the
/// triage review queue.
pub fn list_pending_with_patient(
    conn: &Connection,
    limit: u32,
    offset: u32,
) -> Result<Vec<PendingBooking>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT b.id, b.patient_id, b.symptoms, b.looking_for, b.priority,
                b.preferred_date, b.preferred_time, b.status, b.notes,
                b.created_at, b.updated_at,
                u.name, u.email, u.date_of_birth, u.gender, u.blood_group
         FROM bookings b
         JOIN users u ON u.id = b.patient_id
         WHERE b.status = 'pending'
         ORDER BY b.created_at ASC
         LIMIT ?1 OFFSET ?2",
    )?;

    let rows: Vec<rusqlite::Result<(RawBooking, RawPatient)>> = stmt
        .query_map(params![limit, offset], |row| {
            Ok((
                raw_booking(row)?,
                RawPatient {
                    name: row.get(11)?,
                    email: row.get(12)?,
                    date_of_birth: row.get(13)?,
                    gender: row.get(14)?,
                    blood_group: row.get(15)?,
                },
            ))
        })?
        .collect();

    let mut pending = Vec::new();
    for row in rows {
        let (raw, patient) = row?;
        let booking = booking_from_raw(raw)?;
        let patient = PatientSummary {
            id: booking.patient_id,
            name: patient.name,
            email: patient.email,
            date_of_birth: patient.date_of_birth,
            gender: patient
                .gender
                .as_deref()
                .map(Gender::from_str)
                .transpose()?,
            blood_group: patient.blood_group,
        };
        pending.push(PendingBooking { booking, patient });
    }
    Ok(pending)
}

pub fn count_pending(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE status = 'pending'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

// ── Row mapping ──

struct RawPatient {
    name: String,
    email: String,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    blood_group: Option<String>,
}

pub(super) struct RawBooking {
    id: String,
    patient_id: String,
    symptoms: String,
    looking_for: Option<String>,
    priority: String,
    preferred_date: Option<NaiveDate>,
    preferred_time: Option<String>,
    status: String,
    notes: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub(super) fn raw_booking(row: &rusqlite::Row) -> rusqlite::Result<RawBooking> {
    Ok(RawBooking {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        symptoms: row.get(2)?,
        looking_for: row.get(3)?,
        priority: row.get(4)?,
        preferred_date: row.get(5)?,
        preferred_time: row.get(6)?,
        status: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

pub(super) fn booking_from_raw(raw: RawBooking) -> Result<Booking, DatabaseError> {
    Ok(Booking {
        id: parse_uuid("bookings.id", &raw.id)?,
        patient_id: parse_uuid("bookings.patient_id", &raw.patient_id)?,
        symptoms: raw.symptoms,
        looking_for: raw.looking_for,
        priority: Priority::from_str(&raw.priority)?,
        preferred_date: raw.preferred_date,
        preferred_time: raw.preferred_time,
        status: BookingStatus::from_str(&raw.status)?,
        notes: raw.notes,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}
