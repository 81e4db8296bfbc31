//! Appointment booking: conflict-safe creation, queries and cancellation.
//!
//! At most one active appointment may hold a (business, date, time) slot.
//! The checks below reject the common cases early; the partial unique index
//! `unique_active_appointment_slot` decides the races between them and the
//! insert.
//!
//! Nothing here logs or retries. Callers decide what to do with a conflict.

mod query;

pub use query::{
    check_slot, get_appointment_for_customer, get_appointment_for_provider, grouped_for_customer,
    provider_appointments, AppointmentDetails, AppointmentFilter,
};

pub(crate) use query::details_of;
use query::is_slot_available;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::SqliteConnection;

use crate::{
    database::assert,
    error::{ServiceError, ServiceResult},
    identity::{self, Caller},
    models::{
        accounts::Role,
        appointments::{Appointment, NewAppointment},
        participants::NewParticipant,
    },
};

pub struct NewBooking {
    pub business_id: i32,
    pub customer_ids: Vec<i32>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub notes: String,
}

fn slot_taken(booking: &NewBooking) -> ServiceError {
    ServiceError::SlotConflict(format!(
        "Time slot {} {} is already booked for business {}",
        booking.date.format("%Y-%m-%d"),
        booking.time.format("%H:%M"),
        booking.business_id
    ))
}

/// Books a slot for one or more customers.
///
/// Preconditions are checked in order and the first failure is returned:
/// customers present, slot in the future, business exists, every customer
/// exists, slot free.
pub fn create_appointment(
    conn: &mut SqliteConnection,
    booking: NewBooking,
    now: NaiveDateTime,
) -> ServiceResult<AppointmentDetails> {
    if booking.customer_ids.is_empty() {
        return Err(ServiceError::invalid(
            "At least one customer is required for an appointment",
        ));
    }
    if booking.date.and_time(booking.time) <= now {
        return Err(ServiceError::invalid(
            "Appointment date and time must be in the future",
        ));
    }
    assert::assert_business(conn, booking.business_id)?;
    for &customer_id in &booking.customer_ids {
        assert::assert_customer(conn, customer_id)?;
    }
    if !is_slot_available(conn, booking.business_id, booking.date, booking.time)? {
        return Err(slot_taken(&booking));
    }

    let appointment = insert_appointment(conn, &booking, now)?;
    query::details_of(conn, appointment)
}

/// The write half of [`create_appointment`]: the appointment row and its
/// participant rows, all or nothing.
pub(crate) fn insert_appointment(
    conn: &mut SqliteConnection,
    booking: &NewBooking,
    now: NaiveDateTime,
) -> ServiceResult<Appointment> {
    use crate::schema::{appointment_participants, appointments};

    conn.immediate_transaction(|conn| {
        let appointment = diesel::insert_into(appointments::table)
            .values(NewAppointment::active(
                booking.business_id,
                booking.date,
                booking.time,
                booking.notes.clone(),
                now,
            ))
            .returning(Appointment::as_returning())
            .get_result(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    slot_taken(booking)
                }
                err => err.into(),
            })?;

        let participants: Vec<NewParticipant> = booking
            .customer_ids
            .iter()
            .map(|&customer_id| NewParticipant {
                appointment_id: appointment.id,
                customer_id,
                joined_at: now,
            })
            .collect();
        diesel::insert_into(appointment_participants::table)
            .values(&participants)
            .execute(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    ServiceError::invalid("A customer may only be listed once per appointment")
                }
                err => err.into(),
            })?;

        Ok(appointment)
    })
}

fn already_cancelled(appointment_id: i32) -> ServiceError {
    ServiceError::invalid(format!(
        "Appointment {} is already cancelled",
        appointment_id
    ))
}

/// Applies `Active -> Cancelled` to a row already loaded in the current
/// transaction.
fn apply_cancel(
    conn: &mut SqliteConnection,
    appointment: Appointment,
    now: NaiveDateTime,
) -> ServiceResult<Appointment> {
    use crate::schema::appointments;

    let status = appointment
        .status
        .cancel()
        .ok_or_else(|| already_cancelled(appointment.id))?;

    Ok(diesel::update(appointments::table.find(appointment.id))
        .set((
            appointments::status.eq(status),
            appointments::updated_at.eq(now),
        ))
        .returning(Appointment::as_returning())
        .get_result(conn)?)
}

pub fn cancel_by_customer(
    conn: &mut SqliteConnection,
    customer_id: i32,
    appointment_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<Appointment> {
    conn.immediate_transaction(|conn| {
        let appointment = query::find_appointment(conn, appointment_id)?;
        assert::assert_participant(conn, appointment_id, customer_id)?;
        apply_cancel(conn, appointment, now)
    })
}

pub fn cancel_by_provider(
    conn: &mut SqliteConnection,
    provider_id: i32,
    appointment_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<Appointment> {
    conn.immediate_transaction(|conn| {
        let appointment = query::find_appointment(conn, appointment_id)?;
        assert::assert_owner(conn, provider_id, appointment.business_id)?;
        apply_cancel(conn, appointment, now)
    })
}

/// Cancels on behalf of whichever side `caller` is on.
pub fn cancel(
    conn: &mut SqliteConnection,
    caller: &Caller,
    appointment_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<AppointmentDetails> {
    let appointment = match caller.role {
        Role::Customer => {
            let customer_id = identity::require_customer(conn, caller)?;
            cancel_by_customer(conn, customer_id, appointment_id, now)?
        }
        Role::Provider => {
            let provider_id = identity::require_provider(conn, caller)?;
            cancel_by_provider(conn, provider_id, appointment_id, now)?
        }
    };
    query::details_of(conn, appointment)
}

/// Replaces the notes of an appointment. Participants and the owning
/// provider may do this; the status, slot and participants never change
/// here.
pub fn update_notes(
    conn: &mut SqliteConnection,
    caller: &Caller,
    appointment_id: i32,
    notes: String,
    now: NaiveDateTime,
) -> ServiceResult<AppointmentDetails> {
    use crate::schema::appointments;

    let appointment = conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        let appointment = query::find_appointment(conn, appointment_id)?;
        match caller.role {
            Role::Customer => {
                assert::assert_participant(conn, appointment_id, caller.account_id)?;
            }
            Role::Provider => {
                assert::assert_owner(conn, caller.account_id, appointment.business_id)?;
            }
        }

        Ok(diesel::update(appointments::table.find(appointment.id))
            .set((
                appointments::notes.eq(notes),
                appointments::updated_at.eq(now),
            ))
            .returning(Appointment::as_returning())
            .get_result(conn)?)
    })?;

    query::details_of(conn, appointment)
}

#[cfg(test)]
mod tests;
