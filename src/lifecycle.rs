//! Booking → Triage → Appointment lifecycle rules.
//!
//! Every status mutation in the system funnels through these checks, so the
//! forward-only guarantee lives in one place:
//!
//! Booking:     pending → assigned | cancelled,   assigned → completed
//! Appointment: scheduled → completed | cancelled | no-show
//!
//! Cancelled/completed bookings and all non-scheduled appointments are
//! terminal. Nothing ever returns to `pending`.

use thiserror::Error;

use crate::models::enums::{AppointmentStatus, BookingStatus};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("Booking is {current}, expected pending")]
    BookingNotPending { current: &'static str },

    #[error("Invalid booking transition: {from} -> {to}")]
    InvalidBookingTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Invalid appointment transition: {from} -> {to}")]
    InvalidAppointmentTransition {
        from: &'static str,
        to: &'static str,
    },
}

/// Valid next states for a booking.
pub fn booking_transitions(current: BookingStatus) -> &'static [BookingStatus] {
    match current {
        BookingStatus::Pending => &[BookingStatus::Assigned, BookingStatus::Cancelled],
        BookingStatus::Assigned => &[BookingStatus::Completed],
        // Terminal
        BookingStatus::Cancelled | BookingStatus::Completed => &[],
    }
}

/// Valid next states for an appointment.
pub fn appointment_transitions(current: AppointmentStatus) -> &'static [AppointmentStatus] {
    match current {
        AppointmentStatus::Scheduled => &[
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ],
        // Terminal
        AppointmentStatus::Completed
        | AppointmentStatus::Cancelled
        | AppointmentStatus::NoShow => &[],
    }
}

pub fn validate_booking_transition(
    from: BookingStatus,
    to: BookingStatus,
) -> Result<(), LifecycleError> {
    if booking_transitions(from).contains(&to) {
        Ok(())
    } else {
        tracing::warn!(from = from.as_str(), to = to.as_str(), "invalid booking transition");
        Err(LifecycleError::InvalidBookingTransition {
            from: from.as_str(),
            to: to.as_str(),
        })
    }
}

pub fn validate_appointment_transition(
    from: AppointmentStatus,
    to: AppointmentStatus,
) -> Result<(), LifecycleError> {
    if appointment_transitions(from).contains(&to) {
        Ok(())
    } else {
        tracing::warn!(
            from = from.as_str(),
            to = to.as_str(),
            "invalid appointment transition"
        );
        Err(LifecycleError::InvalidAppointmentTransition {
            from: from.as_str(),
            to: to.as_str(),
        })
    }
}

/// Only a pending booking may be cancelled or assigned.
pub fn require_pending(current: BookingStatus) -> Result<(), LifecycleError> {
    if current == BookingStatus::Pending {
        Ok(())
    } else {
        Err(LifecycleError::BookingNotPending {
            current: current.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_booking_can_be_assigned_or_cancelled() {
        assert!(validate_booking_transition(BookingStatus::Pending, BookingStatus::Assigned).is_ok());
        assert!(
            validate_booking_transition(BookingStatus::Pending, BookingStatus::Cancelled).is_ok()
        );
    }

    #[test]
    fn assigned_booking_can_only_complete() {
        assert!(
            validate_booking_transition(BookingStatus::Assigned, BookingStatus::Completed).is_ok()
        );
        assert!(
            validate_booking_transition(BookingStatus::Assigned, BookingStatus::Cancelled).is_err()
        );
        assert!(
            validate_booking_transition(BookingStatus::Assigned, BookingStatus::Pending).is_err()
        );
    }

    #[test]
    fn no_booking_state_returns_to_pending() {
        for from in [
            BookingStatus::Pending,
            BookingStatus::Assigned,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert!(!booking_transitions(from).contains(&BookingStatus::Pending));
        }
    }

    #[test]
    fn terminal_bookings_have_no_transitions() {
        assert!(booking_transitions(BookingStatus::Cancelled).is_empty());
        assert!(booking_transitions(BookingStatus::Completed).is_empty());
    }

    #[test]
    fn scheduled_appointment_transitions() {
        for to in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert!(validate_appointment_transition(AppointmentStatus::Scheduled, to).is_ok());
        }
    }

    #[test]
    fn terminal_appointments_reject_all_transitions() {
        for from in [
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            for to in [
                AppointmentStatus::Scheduled,
                AppointmentStatus::Completed,
                AppointmentStatus::Cancelled,
                AppointmentStatus::NoShow,
            ] {
                assert!(
                    validate_appointment_transition(from, to).is_err(),
                    "{} -> {} should fail",
                    from.as_str(),
                    to.as_str()
                );
            }
        }
    }

    #[test]
    fn require_pending_rejects_processed_bookings() {
        assert!(require_pending(BookingStatus::Pending).is_ok());
        assert_eq!(
            require_pending(BookingStatus::Assigned),
            Err(LifecycleError::BookingNotPending { current: "assigned" })
        );
        assert!(require_pending(BookingStatus::Cancelled).is_err());
    }
}
