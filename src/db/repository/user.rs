use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection};
use uuid::Uuid;

use super::parse_uuid;
use crate::db::DatabaseError;
use crate::models::enums::{Gender, Role};
use crate::models::{DoctorSummary, User};

const USER_COLS: &str = "id, name, email, password_hash, role, date_of_birth, gender, \
     phone_number, address, blood_group, emergency_contact_name, emergency_contact_number, \
     specialization, department, qualifications, license_number, created_at, updated_at";

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, name, email, password_hash, role, date_of_birth, gender,
         phone_number, address, blood_group, emergency_contact_name, emergency_contact_number,
         specialization, department, qualifications, license_number, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            user.id.to_string(),
            user.name,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.date_of_birth,
            user.gender.map(|g| g.as_str()),
            user.phone_number,
            user.address,
            user.blood_group,
            user.emergency_contact_name,
            user.emergency_contact_number,
            user.specialization,
            user.department,
            user.qualifications,
            user.license_number,
            user.created_at,
            user.updated_at,
        ],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLS} FROM users WHERE id = ?1"))?;
    let mut rows = stmt.query_map(params![id.to_string()], raw_user)?;
    rows.next().transpose()?.map(user_from_raw).transpose()
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLS} FROM users WHERE email = ?1"))?;
    let mut rows = stmt.query_map(params![email], raw_user)?;
    rows.next().transpose()?.map(user_from_raw).transpose()
}

/// Look up a user that must hold the doctor role. Used by triage to
/// validate assignment targets.
pub fn get_doctor(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLS} FROM users WHERE id = ?1 AND role = 'doctor'"
    ))?;
    let mut rows = stmt.query_map(params![id.to_string()], raw_user)?;
    rows.next().transpose()?.map(user_from_raw).transpose()
}

pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Doctors available for assignment, optionally filtered by department.
pub fn list_doctors(
    conn: &Connection,
    department: Option<&str>,
) -> Result<Vec<DoctorSummary>, DatabaseError> {
    let mut sql = String::from(
        "SELECT id, name, specialization, department FROM users WHERE role = 'doctor'",
    );
    if department.is_some() {
        sql.push_str(" AND department = ?1");
    }
    sql.push_str(" ORDER BY name ASC");

    let mut stmt = conn.prepare(&sql)?;
    let map = |row: &rusqlite::Row| -> rusqlite::Result<(String, String, Option<String>, Option<String>)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
    };
    let rows = match department {
        Some(dep) => stmt.query_map(params![dep], map)?.collect::<Vec<_>>(),
        None => stmt.query_map([], map)?.collect::<Vec<_>>(),
    };

    let mut doctors = Vec::new();
    for row in rows {
        let (id, name, specialization, department) = row?;
        doctors.push(DoctorSummary {
            id: parse_uuid("users.id", &id)?,
            name,
            specialization,
            department,
        });
    }
    Ok(doctors)
}

/// Users of one role, paginated, with optional name/email substring search.
pub fn list_users_by_role(
    conn: &Connection,
    role: Role,
    search: Option<&str>,
    limit: u32,
    offset: u32,
) -> Result<Vec<User>, DatabaseError> {
    let mut stmt;
    let raws: Vec<rusqlite::Result<RawUser>> = match search {
        Some(term) => {
            stmt = conn.prepare(&format!(
                "SELECT {USER_COLS} FROM users WHERE role = ?1
                 AND (name LIKE '%' || ?2 || '%' OR email LIKE '%' || ?2 || '%')
                 ORDER BY name ASC LIMIT ?3 OFFSET ?4"
            ))?;
            stmt.query_map(params![role.as_str(), term, limit, offset], raw_user)?
                .collect()
        }
        None => {
            stmt = conn.prepare(&format!(
                "SELECT {USER_COLS} FROM users WHERE role = ?1
                 ORDER BY name ASC LIMIT ?2 OFFSET ?3"
            ))?;
            stmt.query_map(params![role.as_str(), limit, offset], raw_user)?
                .collect()
        }
    };

    let mut users = Vec::new();
    for raw in raws {
        users.push(user_from_raw(raw?)?);
    }
    Ok(users)
}

pub fn count_users_by_role(
    conn: &Connection,
    role: Role,
    search: Option<&str>,
) -> Result<i64, DatabaseError> {
    let count = match search {
        Some(term) => conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1
             AND (name LIKE '%' || ?2 || '%' OR email LIKE '%' || ?2 || '%')",
            params![role.as_str(), term],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![role.as_str()],
            |row| row.get(0),
        )?,
    };
    Ok(count)
}

// ── Row mapping ──

pub(super) struct RawUser {
    id: String,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    date_of_birth: Option<NaiveDate>,
    gender: Option<String>,
    phone_number: Option<String>,
    address: Option<String>,
    blood_group: Option<String>,
    emergency_contact_name: Option<String>,
    emergency_contact_number: Option<String>,
    specialization: Option<String>,
    department: Option<String>,
    qualifications: Option<String>,
    license_number: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub(super) fn raw_user(row: &rusqlite::Row) -> rusqlite::Result<RawUser> {
    Ok(RawUser {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
        date_of_birth: row.get(5)?,
        gender: row.get(6)?,
        phone_number: row.get(7)?,
        address: row.get(8)?,
        blood_group: row.get(9)?,
        emergency_contact_name: row.get(10)?,
        emergency_contact_number: row.get(11)?,
        specialization: row.get(12)?,
        department: row.get(13)?,
        qualifications: row.get(14)?,
        license_number: row.get(15)?,
        created_at: row.get(16)?,
        updated_at: row.get(17)?,
    })
}

pub(super) fn user_from_raw(raw: RawUser) -> Result<User, DatabaseError> {
    Ok(User {
        id: parse_uuid("users.id", &raw.id)?,
        name: raw.name,
        email: raw.email,
        password_hash: raw.password_hash,
        role: Role::from_str(&raw.role)?,
        date_of_birth: raw.date_of_birth,
        gender: raw.gender.as_deref().map(Gender::from_str).transpose()?,
        phone_number: raw.phone_number,
        address: raw.address,
        blood_group: raw.blood_group,
        emergency_contact_name: raw.emergency_contact_name,
        emergency_contact_number: raw.emergency_contact_number,
        specialization: raw.specialization,
        department: raw.department,
        qualifications: raw.qualifications,
        license_number: raw.license_number,
        created_at: raw.created_at,
        updated_at: raw.updated_at,
    })
}
