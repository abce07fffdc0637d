//! Cliniflow: clinic management backend.
//!
//! Patients book care requests, triage staff turn pending bookings into
//! scheduled appointments, doctors run the appointments and issue
//! prescriptions. The REST surface lives in [`api`], lifecycle rules in
//! [`lifecycle`], persistence in [`db`].

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod models;
pub mod triage;
