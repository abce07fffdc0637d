pub mod appointment;
pub mod booking;
pub mod enums;
pub mod medical_history;
pub mod prescription;
pub mod user;

pub use appointment::Appointment;
pub use booking::{Booking, PendingBooking};
pub use medical_history::{Immunization, MedicalHistory, Surgery, TriageData};
pub use prescription::{MedicationItem, Prescription};
pub use user::{DoctorSummary, PatientSummary, User};
