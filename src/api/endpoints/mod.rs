pub mod admin;
pub mod auth;
pub mod doctor;
pub mod patient;
pub mod triage;
