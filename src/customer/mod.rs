mod requests;
mod responses;

use actix_web::web;
use chrono::Utc;
use tracing::info;

use crate::{
    booking::{self, NewBooking},
    database::with_conn,
    error::{ServiceError, ServiceResult},
    identity::{self, Caller},
    protocol::{AppointmentItem, AppointmentResponse, Empty},
    utils::{parse_date_str, parse_time_str},
    DbPool,
};

use self::{requests::*, responses::*};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(appoint)
        .service(search_appoint)
        .service(view_appoint)
        .service(cancel_appoint)
        .service(modify_appoint);
}

crate::post_funcs! {
    @auth
    (appoint, "/appoint", AppointRequest, AppointmentResponse),
    (search_appoint, "/search_appoint", Empty, GroupedAppointResponse),
    (view_appoint, "/view_appoint", AppointIdRequest, AppointmentResponse),
    (cancel_appoint, "/cancel_appoint", AppointIdRequest, AppointmentResponse),
    (modify_appoint, "/modify_appoint", ModifyAppointRequest, AppointmentResponse),
}

async fn appoint_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: AppointRequest,
) -> ServiceResult<AppointmentResponse> {
    let date = parse_date_str(&info.date)?;
    let time = parse_time_str(&info.time)?;
    let customer_ids = info.customers.unwrap_or_else(|| vec![caller.account_id]);
    if !customer_ids.is_empty() && !customer_ids.contains(&caller.account_id) {
        return Err(ServiceError::unauthorized(
            "Customers can only book appointments they take part in",
        ));
    }

    let business_id = info.business_id;
    let notes = info.notes;
    let details = with_conn(&pool, move |conn| {
        identity::require_customer(conn, &caller)?;
        booking::create_appointment(
            conn,
            NewBooking {
                business_id,
                customer_ids,
                date,
                time,
                notes,
            },
            Utc::now().naive_utc(),
        )
    })
    .await?;
    info!(
        appointment_id = details.appointment.id,
        business_id,
        participants = details.participants.len(),
        "booked appointment"
    );

    Ok(AppointmentResponse {
        appointment: AppointmentItem::new(details, Utc::now().naive_utc()),
    })
}

async fn search_appoint_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    _: Empty,
) -> ServiceResult<GroupedAppointResponse> {
    let now = Utc::now().naive_utc();
    let grouped = with_conn(&pool, move |conn| {
        let customer_id = identity::require_customer(conn, &caller)?;
        booking::grouped_for_customer(conn, customer_id, now)
    })
    .await?;

    Ok(GroupedAppointResponse {
        upcoming: AppointmentItem::list(grouped.upcoming, now),
        past: AppointmentItem::list(grouped.past, now),
    })
}

async fn view_appoint_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: AppointIdRequest,
) -> ServiceResult<AppointmentResponse> {
    let details = with_conn(&pool, move |conn| {
        let customer_id = identity::require_customer(conn, &caller)?;
        booking::get_appointment_for_customer(conn, customer_id, info.appointment_id)
    })
    .await?;

    Ok(AppointmentResponse {
        appointment: AppointmentItem::new(details, Utc::now().naive_utc()),
    })
}

async fn cancel_appoint_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: AppointIdRequest,
) -> ServiceResult<AppointmentResponse> {
    let customer_id = caller.account_id;
    let details = with_conn(&pool, move |conn| {
        let customer_id = identity::require_customer(conn, &caller)?;
        let appointment = booking::cancel_by_customer(
            conn,
            customer_id,
            info.appointment_id,
            Utc::now().naive_utc(),
        )?;
        booking::details_of(conn, appointment)
    })
    .await?;
    info!(
        appointment_id = details.appointment.id,
        customer_id, "customer cancelled appointment"
    );

    Ok(AppointmentResponse {
        appointment: AppointmentItem::new(details, Utc::now().naive_utc()),
    })
}

async fn modify_appoint_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: ModifyAppointRequest,
) -> ServiceResult<AppointmentResponse> {
    let details = with_conn(&pool, move |conn| {
        identity::require_customer(conn, &caller)?;
        booking::update_notes(
            conn,
            &caller,
            info.appointment_id,
            info.notes,
            Utc::now().naive_utc(),
        )
    })
    .await?;

    Ok(AppointmentResponse {
        appointment: AppointmentItem::new(details, Utc::now().naive_utc()),
    })
}
