use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    booking::AppointmentDetails,
    models::{availability::AvailabilityWindow, availability::DAY_NAMES, businesses::Business},
    utils::{format_date, format_time, format_time_str},
};

#[derive(Default, Serialize)]
pub struct SimpleResponse {
    pub success: bool,
    pub err: String,
}

impl SimpleResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            err: "".to_string(),
        }
    }

    pub fn err<S: ToString>(err: S) -> Self {
        Self {
            success: false,
            err: err.to_string(),
        }
    }
}

/// Success envelope: `success`/`err` next to the payload's own fields.
#[derive(Serialize)]
pub struct DataResponse<T: Serialize> {
    #[serde(flatten)]
    pub status: SimpleResponse,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: SimpleResponse::ok(),
            data,
        }
    }
}

/// Payload for routes that only report success.
#[derive(Default, Serialize)]
pub struct Done {}

/// Body of routes that take nothing beyond the bearer token.
#[derive(Default, Deserialize)]
pub struct Empty {}

#[derive(Serialize)]
pub struct BusinessItem {
    pub id: i32,
    pub provider_id: i32,
    pub name: String,
    pub summary: String,
    pub logo: Option<String>,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Business> for BusinessItem {
    fn from(b: Business) -> Self {
        Self {
            id: b.id,
            provider_id: b.provider_id,
            name: b.name,
            summary: b.summary,
            logo: b.logo.map(|file| format!("/media/{}", file)),
            description: b.description,
            phone: b.phone,
            email: b.email,
            address: b.address,
            created_at: format_time_str(&b.created_at),
            updated_at: format_time_str(&b.updated_at),
        }
    }
}

#[derive(Serialize)]
pub struct WindowItem {
    pub id: i32,
    pub business_id: i32,
    pub day_of_week: i32,
    pub day_name: String,
    pub start_time: String,
    pub end_time: String,
}

impl From<AvailabilityWindow> for WindowItem {
    fn from(w: AvailabilityWindow) -> Self {
        let day_name = usize::try_from(w.day_of_week)
            .ok()
            .and_then(|day| DAY_NAMES.get(day))
            .copied()
            .unwrap_or_default();
        Self {
            id: w.id,
            business_id: w.business_id,
            day_of_week: w.day_of_week,
            day_name: day_name.to_string(),
            start_time: format_time(&w.start_time),
            end_time: format_time(&w.end_time),
        }
    }
}

#[derive(Serialize)]
pub struct ParticipantItem {
    pub customer_id: i32,
    pub full_name: String,
    pub joined_at: String,
}

#[derive(Serialize)]
pub struct AppointmentItem {
    pub id: i32,
    pub business_id: i32,
    pub business_name: String,
    pub provider_id: i32,
    pub date: String,
    pub time: String,
    pub status: String,
    pub notes: String,
    pub is_upcoming: bool,
    pub participants: Vec<ParticipantItem>,
    pub created_at: String,
    pub updated_at: String,
}

impl AppointmentItem {
    /// `is_upcoming` is computed against `now`, never stored.
    pub fn new(details: AppointmentDetails, now: NaiveDateTime) -> Self {
        let AppointmentDetails {
            appointment,
            business,
            participants,
        } = details;
        Self {
            id: appointment.id,
            business_id: business.id,
            business_name: business.name,
            provider_id: business.provider_id,
            date: format_date(&appointment.appointment_date),
            time: format_time(&appointment.appointment_time),
            status: appointment.status.to_string(),
            is_upcoming: appointment.is_upcoming(now),
            notes: appointment.notes,
            participants: participants
                .into_iter()
                .map(|p| ParticipantItem {
                    customer_id: p.customer_id,
                    full_name: p.full_name,
                    joined_at: format_time_str(&p.joined_at),
                })
                .collect(),
            created_at: format_time_str(&appointment.created_at),
            updated_at: format_time_str(&appointment.updated_at),
        }
    }

    pub fn list(appointments: Vec<AppointmentDetails>, now: NaiveDateTime) -> Vec<Self> {
        appointments
            .into_iter()
            .map(|details| Self::new(details, now))
            .collect()
    }
}

#[derive(Serialize)]
pub struct BusinessResponse {
    pub business: BusinessItem,
}

#[derive(Serialize)]
pub struct BusinessesResponse {
    pub businesses: Vec<BusinessItem>,
}

#[derive(Serialize)]
pub struct AppointmentResponse {
    pub appointment: AppointmentItem,
}

#[derive(Serialize)]
pub struct AppointmentsResponse {
    pub appointments: Vec<AppointmentItem>,
}

/// Declares `POST` handlers that deserialize a JSON body, call the matching
/// `<name>_impl` function and wrap its result in a [`DataResponse`].
///
/// The `@auth` form additionally resolves the bearer token into a
/// [`crate::identity::Caller`] before the body is handled.
#[macro_export]
macro_rules! post_funcs {
    ( @auth $( ( $func_name:ident, $url:literal, $request:ty, $response:ty ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[actix_web::post($url)]
                async fn $func_name(
                    pool: actix_web::web::Data<$crate::DbPool>,
                    caller: $crate::identity::Caller,
                    info: actix_web::web::Json<$request>,
                ) -> Result<actix_web::HttpResponse, $crate::error::ServiceError> {
                    let response: $response =
                        [<$func_name _impl>](pool, caller, info.into_inner()).await?;
                    Ok(actix_web::HttpResponse::Ok()
                        .json($crate::protocol::DataResponse::ok(response)))
                }
            }
        )+
    };
    ( $( ( $func_name:ident, $url:literal, $request:ty, $response:ty ) ),+ $(,)? ) => {
        $(
            paste::paste! {
                #[actix_web::post($url)]
                async fn $func_name(
                    pool: actix_web::web::Data<$crate::DbPool>,
                    info: actix_web::web::Json<$request>,
                ) -> Result<actix_web::HttpResponse, $crate::error::ServiceError> {
                    let response: $response = [<$func_name _impl>](pool, info.into_inner()).await?;
                    Ok(actix_web::HttpResponse::Ok()
                        .json($crate::protocol::DataResponse::ok(response)))
                }
            }
        )+
    };
}
