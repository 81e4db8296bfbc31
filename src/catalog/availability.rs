//! Weekly opening hours of a business.
//!
//! Windows are informational: bookings are not required to fall inside one.

use std::collections::HashSet;

use chrono::{NaiveDateTime, NaiveTime};
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::{
    database::assert,
    error::{ServiceError, ServiceResult},
    models::availability::{AvailabilityWindow, NewWindow, UpdateWindow},
};

#[derive(Debug, Clone, Copy)]
pub struct WindowSpec {
    /// 0 = Monday .. 6 = Sunday
    pub day_of_week: i32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowChanges {
    pub day_of_week: Option<i32>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

fn check_window(window: &WindowSpec) -> ServiceResult<()> {
    if !(0..=6).contains(&window.day_of_week) {
        return Err(ServiceError::invalid(format!(
            "Day of week must be between 0 and 6 (got {})",
            window.day_of_week
        )));
    }
    if window.end_time <= window.start_time {
        return Err(ServiceError::invalid("End time must be after start time"));
    }
    Ok(())
}

/// Replaces every window of the business with `windows`.
pub fn replace_windows(
    conn: &mut SqliteConnection,
    provider_id: i32,
    business_id: i32,
    windows: Vec<WindowSpec>,
    now: NaiveDateTime,
) -> ServiceResult<Vec<AvailabilityWindow>> {
    use crate::schema::availability_windows;

    if windows.is_empty() {
        return Err(ServiceError::invalid(
            "At least one availability window is required",
        ));
    }
    let mut seen = HashSet::new();
    for window in &windows {
        check_window(window)?;
        if !seen.insert((window.day_of_week, window.start_time)) {
            return Err(ServiceError::invalid(
                "Duplicate availability window for the same day and start time",
            ));
        }
    }

    let rows: Vec<NewWindow> = windows
        .into_iter()
        .map(|w| NewWindow {
            business_id,
            day_of_week: w.day_of_week,
            start_time: w.start_time,
            end_time: w.end_time,
            created_at: now,
            updated_at: now,
        })
        .collect();

    conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        assert::assert_owner(conn, provider_id, business_id)?;

        diesel::delete(
            availability_windows::table.filter(availability_windows::business_id.eq(business_id)),
        )
        .execute(conn)?;
        diesel::insert_into(availability_windows::table)
            .values(&rows)
            .execute(conn)?;

        Ok(())
    })?;

    info!(business_id, count = rows.len(), "replaced availability");
    load_windows(conn, business_id)
}

fn load_windows(
    conn: &mut SqliteConnection,
    business_id: i32,
) -> ServiceResult<Vec<AvailabilityWindow>> {
    use crate::schema::availability_windows;

    Ok(availability_windows::table
        .filter(availability_windows::business_id.eq(business_id))
        .order((
            availability_windows::day_of_week.asc(),
            availability_windows::start_time.asc(),
        ))
        .select(AvailabilityWindow::as_select())
        .load(conn)?)
}

/// Ordered by day, then start time.
pub fn windows_for_business(
    conn: &mut SqliteConnection,
    provider_id: i32,
    business_id: i32,
) -> ServiceResult<Vec<AvailabilityWindow>> {
    assert::assert_owner(conn, provider_id, business_id)?;
    load_windows(conn, business_id)
}

fn find_window(conn: &mut SqliteConnection, window_id: i32) -> ServiceResult<AvailabilityWindow> {
    use crate::schema::availability_windows;

    availability_windows::table
        .find(window_id)
        .select(AvailabilityWindow::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            ServiceError::not_found(format!("Availability window {} not found", window_id))
        })
}

pub fn get_window(
    conn: &mut SqliteConnection,
    provider_id: i32,
    window_id: i32,
) -> ServiceResult<AvailabilityWindow> {
    let window = find_window(conn, window_id)?;
    assert::assert_owner(conn, provider_id, window.business_id)?;
    Ok(window)
}

/// Partial update; the merged window is validated as a whole.
pub fn update_window(
    conn: &mut SqliteConnection,
    provider_id: i32,
    window_id: i32,
    changes: WindowChanges,
    now: NaiveDateTime,
) -> ServiceResult<AvailabilityWindow> {
    use crate::schema::availability_windows;

    conn.immediate_transaction(|conn| {
        let current = get_window(conn, provider_id, window_id)?;
        let merged = WindowSpec {
            day_of_week: changes.day_of_week.unwrap_or(current.day_of_week),
            start_time: changes.start_time.unwrap_or(current.start_time),
            end_time: changes.end_time.unwrap_or(current.end_time),
        };
        check_window(&merged)?;

        let clash = availability_windows::table
            .filter(availability_windows::business_id.eq(current.business_id))
            .filter(availability_windows::day_of_week.eq(merged.day_of_week))
            .filter(availability_windows::start_time.eq(merged.start_time))
            .filter(availability_windows::id.ne(window_id))
            .count()
            .get_result::<i64>(conn)?;
        if clash > 0 {
            return Err(ServiceError::invalid(
                "Duplicate availability window for the same day and start time",
            ));
        }

        let data = UpdateWindow {
            day_of_week: changes.day_of_week,
            start_time: changes.start_time,
            end_time: changes.end_time,
            updated_at: Some(now),
        };
        let window = diesel::update(availability_windows::table.find(window_id))
            .set(&data)
            .returning(AvailabilityWindow::as_returning())
            .get_result(conn)?;

        Ok(window)
    })
}

pub fn delete_window(
    conn: &mut SqliteConnection,
    provider_id: i32,
    window_id: i32,
) -> ServiceResult<()> {
    use crate::schema::availability_windows;

    conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        get_window(conn, provider_id, window_id)?;
        diesel::delete(availability_windows::table.find(window_id)).execute(conn)?;
        Ok(())
    })
}
