mod requests;
mod responses;

use actix_web::web;
use chrono::Utc;
use tracing::info;

use crate::{
    booking::{self, AppointmentFilter},
    catalog::{
        self,
        availability::{self, WindowChanges, WindowSpec},
        BusinessChanges, BusinessInput,
    },
    database::with_conn,
    error::ServiceResult,
    identity::{self, Caller},
    protocol::{
        AppointmentItem, AppointmentResponse, AppointmentsResponse, BusinessResponse,
        BusinessesResponse, Done, Empty, WindowItem,
    },
    utils::{parse_date_opt, parse_status_opt, parse_time_opt, parse_time_str},
    DbPool,
};

use self::{requests::*, responses::*};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(add_business)
        .service(modify_business)
        .service(delete_business)
        .service(search_business)
        .service(set_availability)
        .service(search_availability)
        .service(view_availability)
        .service(modify_availability)
        .service(delete_availability)
        .service(search_appoint)
        .service(view_appoint)
        .service(cancel_appoint)
        .service(modify_appoint);
}

crate::post_funcs! {
    @auth
    (add_business, "/add_business", AddBusinessRequest, BusinessResponse),
    (modify_business, "/modify_business", ModifyBusinessRequest, BusinessResponse),
    (delete_business, "/delete_business", BusinessIdRequest, Done),
    (search_business, "/search_business", Empty, BusinessesResponse),
    (set_availability, "/set_availability", SetAvailabilityRequest, WindowsResponse),
    (search_availability, "/search_availability", BusinessIdRequest, WindowsResponse),
    (view_availability, "/view_availability", WindowIdRequest, WindowResponse),
    (modify_availability, "/modify_availability", ModifyAvailabilityRequest, WindowResponse),
    (delete_availability, "/delete_availability", WindowIdRequest, Done),
    (search_appoint, "/search_appoint", SearchAppointRequest, AppointmentsResponse),
    (view_appoint, "/view_appoint", AppointIdRequest, AppointmentResponse),
    (cancel_appoint, "/cancel_appoint", AppointIdRequest, AppointmentResponse),
    (modify_appoint, "/modify_appoint", ModifyAppointRequest, AppointmentResponse),
}

async fn add_business_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: AddBusinessRequest,
) -> ServiceResult<BusinessResponse> {
    let business = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        catalog::create_business(
            conn,
            provider_id,
            BusinessInput {
                name: info.name,
                summary: info.summary,
                logo: info.logo.filter(|logo| !logo.is_empty()),
                description: info.description,
                phone: info.phone,
                email: info.email,
                address: info.address,
            },
            Utc::now().naive_utc(),
        )
    })
    .await?;

    Ok(BusinessResponse {
        business: business.into(),
    })
}

async fn modify_business_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: ModifyBusinessRequest,
) -> ServiceResult<BusinessResponse> {
    let business = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        let changes = BusinessChanges {
            name: info.name,
            summary: info.summary,
            logo: info
                .logo
                .map(|logo| if logo.is_empty() { None } else { Some(logo) }),
            description: info.description,
            phone: info.phone,
            email: info.email,
            address: info.address,
        };
        catalog::update_business(
            conn,
            provider_id,
            info.business_id,
            changes,
            Utc::now().naive_utc(),
        )
    })
    .await?;

    Ok(BusinessResponse {
        business: business.into(),
    })
}

async fn delete_business_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: BusinessIdRequest,
) -> ServiceResult<Done> {
    with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        catalog::delete_business(conn, provider_id, info.business_id)
    })
    .await?;
    Ok(Done {})
}

async fn search_business_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    _: Empty,
) -> ServiceResult<BusinessesResponse> {
    let businesses = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        catalog::businesses_by_provider(conn, provider_id)
    })
    .await?;

    Ok(BusinessesResponse {
        businesses: businesses.into_iter().map(Into::into).collect(),
    })
}

async fn set_availability_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: SetAvailabilityRequest,
) -> ServiceResult<WindowsResponse> {
    let windows = info
        .windows
        .iter()
        .map(|w| {
            Ok(WindowSpec {
                day_of_week: w.day_of_week,
                start_time: parse_time_str(&w.start_time)?,
                end_time: parse_time_str(&w.end_time)?,
            })
        })
        .collect::<ServiceResult<Vec<_>>>()?;

    let windows = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        availability::replace_windows(
            conn,
            provider_id,
            info.business_id,
            windows,
            Utc::now().naive_utc(),
        )
    })
    .await?;

    Ok(WindowsResponse {
        windows: windows.into_iter().map(WindowItem::from).collect(),
    })
}

async fn search_availability_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: BusinessIdRequest,
) -> ServiceResult<WindowsResponse> {
    let windows = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        availability::windows_for_business(conn, provider_id, info.business_id)
    })
    .await?;

    Ok(WindowsResponse {
        windows: windows.into_iter().map(WindowItem::from).collect(),
    })
}

async fn view_availability_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: WindowIdRequest,
) -> ServiceResult<WindowResponse> {
    let window = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        availability::get_window(conn, provider_id, info.window_id)
    })
    .await?;

    Ok(WindowResponse {
        window: window.into(),
    })
}

async fn modify_availability_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: ModifyAvailabilityRequest,
) -> ServiceResult<WindowResponse> {
    let changes = WindowChanges {
        day_of_week: info.day_of_week,
        start_time: parse_time_opt(info.start_time)?,
        end_time: parse_time_opt(info.end_time)?,
    };

    let window = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        availability::update_window(
            conn,
            provider_id,
            info.window_id,
            changes,
            Utc::now().naive_utc(),
        )
    })
    .await?;

    Ok(WindowResponse {
        window: window.into(),
    })
}

async fn delete_availability_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: WindowIdRequest,
) -> ServiceResult<Done> {
    with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        availability::delete_window(conn, provider_id, info.window_id)
    })
    .await?;
    Ok(Done {})
}

async fn search_appoint_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: SearchAppointRequest,
) -> ServiceResult<AppointmentsResponse> {
    let filter = AppointmentFilter {
        start_date: parse_date_opt(info.start_date)?,
        end_date: parse_date_opt(info.end_date)?,
        status: parse_status_opt(info.status)?,
    };

    let appointments = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        booking::provider_appointments(conn, provider_id, info.business_id, &filter)
    })
    .await?;

    Ok(AppointmentsResponse {
        appointments: AppointmentItem::list(appointments, Utc::now().naive_utc()),
    })
}

async fn view_appoint_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: AppointIdRequest,
) -> ServiceResult<AppointmentResponse> {
    let details = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        booking::get_appointment_for_provider(conn, provider_id, info.appointment_id)
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
    let provider_id = caller.account_id;
    let details = with_conn(&pool, move |conn| {
        let provider_id = identity::require_provider(conn, &caller)?;
        let appointment = booking::cancel_by_provider(
            conn,
            provider_id,
            info.appointment_id,
            Utc::now().naive_utc(),
        )?;
        booking::details_of(conn, appointment)
    })
    .await?;
    info!(
        appointment_id = details.appointment.id,
        provider_id, "provider cancelled appointment"
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
        identity::require_provider(conn, &caller)?;
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
