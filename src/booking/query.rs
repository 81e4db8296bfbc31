use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::{
    database::assert,
    error::{ServiceError, ServiceResult},
    models::{
        appointments::{Appointment, AppointmentStatus},
        businesses::BusinessRef,
        participants::Participant,
    },
};

/// Optional narrowing applied to every appointment listing. Date bounds are
/// inclusive and independent of each other.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
}

/// An appointment with its business and participants resolved.
#[derive(Debug, Clone)]
pub struct AppointmentDetails {
    pub appointment: Appointment,
    pub business: BusinessRef,
    pub participants: Vec<Participant>,
}

impl AppointmentDetails {
    pub fn has_participant(&self, customer_id: i32) -> bool {
        self.participants
            .iter()
            .any(|p| p.customer_id == customer_id)
    }
}

#[derive(Debug, Default)]
pub struct Grouped {
    pub upcoming: Vec<AppointmentDetails>,
    pub past: Vec<AppointmentDetails>,
}

enum Scope {
    Business(i32),
    Customer(i32),
    Provider(i32),
}

fn load_scoped(
    conn: &mut SqliteConnection,
    scope: Scope,
    filter: &AppointmentFilter,
) -> ServiceResult<Vec<Appointment>> {
    use crate::schema::{appointment_participants, appointments, businesses};

    let mut query = appointments::table.into_boxed();
    query = match scope {
        Scope::Business(business_id) => query.filter(appointments::business_id.eq(business_id)),
        Scope::Customer(customer_id) => query.filter(
            appointments::id.eq_any(
                appointment_participants::table
                    .filter(appointment_participants::customer_id.eq(customer_id))
                    .select(appointment_participants::appointment_id),
            ),
        ),
        Scope::Provider(provider_id) => query.filter(
            appointments::business_id.eq_any(
                businesses::table
                    .filter(businesses::provider_id.eq(provider_id))
                    .select(businesses::id),
            ),
        ),
    };

    if let Some(start) = filter.start_date {
        query = query.filter(appointments::appointment_date.ge(start));
    }
    if let Some(end) = filter.end_date {
        query = query.filter(appointments::appointment_date.le(end));
    }
    if let Some(status) = filter.status {
        query = query.filter(appointments::status.eq(status));
    }

    Ok(query
        .order((
            appointments::appointment_date.asc(),
            appointments::appointment_time.asc(),
            appointments::id.asc(),
        ))
        .load::<Appointment>(conn)?)
}

/// Resolves businesses and participants for a batch of appointments with one
/// query each, preserving the input order.
pub fn load_details(
    conn: &mut SqliteConnection,
    appointments: Vec<Appointment>,
) -> ServiceResult<Vec<AppointmentDetails>> {
    use crate::schema::{appointment_participants, businesses, customer_profiles};

    if appointments.is_empty() {
        return Ok(Vec::new());
    }

    let business_ids: Vec<i32> = appointments.iter().map(|a| a.business_id).collect();
    let appointment_ids: Vec<i32> = appointments.iter().map(|a| a.id).collect();

    let business_map: HashMap<i32, BusinessRef> = businesses::table
        .filter(businesses::id.eq_any(business_ids))
        .select(BusinessRef::as_select())
        .load::<BusinessRef>(conn)?
        .into_iter()
        .map(|b| (b.id, b))
        .collect();

    let mut participant_map: HashMap<i32, Vec<Participant>> = HashMap::new();
    let participants = appointment_participants::table
        .inner_join(customer_profiles::table)
        .filter(appointment_participants::appointment_id.eq_any(appointment_ids))
        .order((
            appointment_participants::appointment_id.asc(),
            appointment_participants::id.asc(),
        ))
        .select((
            appointment_participants::appointment_id,
            appointment_participants::customer_id,
            customer_profiles::full_name,
            appointment_participants::joined_at,
        ))
        .load::<Participant>(conn)?;
    for participant in participants {
        participant_map
            .entry(participant.appointment_id)
            .or_default()
            .push(participant);
    }

    appointments
        .into_iter()
        .map(|appointment| {
            // an appointment's business cannot disappear while the row exists
            let business = match business_map.get(&appointment.business_id) {
                Some(business) => business.clone(),
                None => {
                    return Err(ServiceError::Internal(anyhow::anyhow!(
                        "business {} of appointment {} is missing",
                        appointment.business_id,
                        appointment.id
                    )))
                }
            };
            let participants = participant_map.remove(&appointment.id).unwrap_or_default();
            Ok(AppointmentDetails {
                appointment,
                business,
                participants,
            })
        })
        .collect()
}

pub(crate) fn details_of(
    conn: &mut SqliteConnection,
    appointment: Appointment,
) -> ServiceResult<AppointmentDetails> {
    let appointment_id = appointment.id;
    load_details(conn, vec![appointment])?.pop().ok_or_else(|| {
        ServiceError::not_found(format!("Appointment with ID {} not found", appointment_id))
    })
}

pub(crate) fn find_appointment(
    conn: &mut SqliteConnection,
    appointment_id: i32,
) -> ServiceResult<Appointment> {
    use crate::schema::appointments;

    appointments::table
        .find(appointment_id)
        .select(Appointment::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            ServiceError::not_found(format!("Appointment with ID {} not found", appointment_id))
        })
}

pub fn get_appointment(
    conn: &mut SqliteConnection,
    appointment_id: i32,
) -> ServiceResult<AppointmentDetails> {
    let appointment = find_appointment(conn, appointment_id)?;
    details_of(conn, appointment)
}

/// Only participants may look at an appointment from the customer side.
pub fn get_appointment_for_customer(
    conn: &mut SqliteConnection,
    customer_id: i32,
    appointment_id: i32,
) -> ServiceResult<AppointmentDetails> {
    let details = get_appointment(conn, appointment_id)?;
    if !details.has_participant(customer_id) {
        return Err(ServiceError::unauthorized(format!(
            "Customer {} is not a participant of appointment {}",
            customer_id, appointment_id
        )));
    }
    Ok(details)
}

pub fn get_appointment_for_provider(
    conn: &mut SqliteConnection,
    provider_id: i32,
    appointment_id: i32,
) -> ServiceResult<AppointmentDetails> {
    let appointment = find_appointment(conn, appointment_id)?;
    assert::assert_owner(conn, provider_id, appointment.business_id)?;
    details_of(conn, appointment)
}

/// Every appointment of the business, any status, in (date, time) order.
pub fn appointments_by_business(
    conn: &mut SqliteConnection,
    business_id: i32,
    filter: &AppointmentFilter,
) -> ServiceResult<Vec<AppointmentDetails>> {
    assert::assert_business(conn, business_id)?;
    let appointments = load_scoped(conn, Scope::Business(business_id), filter)?;
    load_details(conn, appointments)
}

pub fn appointments_by_customer(
    conn: &mut SqliteConnection,
    customer_id: i32,
    filter: &AppointmentFilter,
) -> ServiceResult<Vec<AppointmentDetails>> {
    let appointments = load_scoped(conn, Scope::Customer(customer_id), filter)?;
    load_details(conn, appointments)
}

/// Appointments across every business the provider owns.
pub fn appointments_by_provider(
    conn: &mut SqliteConnection,
    provider_id: i32,
    filter: &AppointmentFilter,
) -> ServiceResult<Vec<AppointmentDetails>> {
    let appointments = load_scoped(conn, Scope::Provider(provider_id), filter)?;
    load_details(conn, appointments)
}

/// The provider's appointments, optionally narrowed to one of their
/// businesses.
pub fn provider_appointments(
    conn: &mut SqliteConnection,
    provider_id: i32,
    business_id: Option<i32>,
    filter: &AppointmentFilter,
) -> ServiceResult<Vec<AppointmentDetails>> {
    match business_id {
        Some(business_id) => {
            assert::assert_owner(conn, provider_id, business_id)?;
            appointments_by_business(conn, business_id, filter)
        }
        None => appointments_by_provider(conn, provider_id, filter),
    }
}

/// Splits appointments into upcoming (active, strictly after `now`) and
/// past (everything else). Order within each half is kept.
pub fn partition(appointments: Vec<AppointmentDetails>, now: NaiveDateTime) -> Grouped {
    let (upcoming, past) = appointments
        .into_iter()
        .partition(|d| d.appointment.is_upcoming(now));
    Grouped { upcoming, past }
}

pub fn grouped_for_customer(
    conn: &mut SqliteConnection,
    customer_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<Grouped> {
    let appointments = appointments_by_customer(conn, customer_id, &AppointmentFilter::default())?;
    Ok(partition(appointments, now))
}

/// True iff no active appointment holds the slot.
pub fn is_slot_available(
    conn: &mut SqliteConnection,
    business_id: i32,
    date: NaiveDate,
    time: NaiveTime,
) -> ServiceResult<bool> {
    use crate::schema::appointments;

    let taken = appointments::table
        .filter(appointments::business_id.eq(business_id))
        .filter(appointments::appointment_date.eq(date))
        .filter(appointments::appointment_time.eq(time))
        .filter(appointments::status.eq(AppointmentStatus::Active))
        .count()
        .get_result::<i64>(conn)?;

    Ok(taken == 0)
}

/// [`is_slot_available`] for callers that may name an unknown business.
pub fn check_slot(
    conn: &mut SqliteConnection,
    business_id: i32,
    date: NaiveDate,
    time: NaiveTime,
) -> ServiceResult<bool> {
    assert::assert_business(conn, business_id)?;
    is_slot_available(conn, business_id, date, time)
}
