//! Routes open to anyone, logged in or not.

mod requests;
mod responses;

use actix_web::web;

use crate::{
    booking, catalog,
    database::with_conn,
    error::ServiceResult,
    protocol::{BusinessResponse, BusinessesResponse},
    utils::{format_date, format_time, parse_date_str, parse_time_str},
    DbPool,
};

use self::{requests::*, responses::*};

const DEFAULT_PAGE_SIZE: i64 = 20;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(search_business)
        .service(list_business)
        .service(view_business)
        .service(check_slot);
}

crate::post_funcs! {
    (search_business, "/search_business", SearchBusinessRequest, BusinessesResponse),
    (list_business, "/list_business", ListBusinessRequest, BusinessesResponse),
    (view_business, "/view_business", ViewBusinessRequest, BusinessResponse),
    (check_slot, "/check_slot", CheckSlotRequest, CheckSlotResponse),
}

async fn search_business_impl(
    pool: web::Data<DbPool>,
    info: SearchBusinessRequest,
) -> ServiceResult<BusinessesResponse> {
    let businesses =
        with_conn(&pool, move |conn| catalog::search_businesses(conn, &info.query)).await?;

    Ok(BusinessesResponse {
        businesses: businesses.into_iter().map(Into::into).collect(),
    })
}

async fn list_business_impl(
    pool: web::Data<DbPool>,
    info: ListBusinessRequest,
) -> ServiceResult<BusinessesResponse> {
    let limit = info.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = info.offset.unwrap_or(0);
    let businesses =
        with_conn(&pool, move |conn| catalog::list_businesses(conn, limit, offset)).await?;

    Ok(BusinessesResponse {
        businesses: businesses.into_iter().map(Into::into).collect(),
    })
}

async fn view_business_impl(
    pool: web::Data<DbPool>,
    info: ViewBusinessRequest,
) -> ServiceResult<BusinessResponse> {
    let business =
        with_conn(&pool, move |conn| catalog::get_business(conn, info.business_id)).await?;

    Ok(BusinessResponse {
        business: business.into(),
    })
}

async fn check_slot_impl(
    pool: web::Data<DbPool>,
    info: CheckSlotRequest,
) -> ServiceResult<CheckSlotResponse> {
    let date = parse_date_str(&info.date)?;
    let time = parse_time_str(&info.time)?;
    let business_id = info.business_id;

    let available =
        with_conn(&pool, move |conn| booking::check_slot(conn, business_id, date, time)).await?;

    Ok(CheckSlotResponse {
        business_id,
        date: format_date(&date),
        time: format_time(&time),
        available,
    })
}
