use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::{
    error::{ServiceError, ServiceResult},
    models::appointments::AppointmentStatus,
};

const DATE_FMT: &str = "%Y-%m-%d";
const TIME_FMT: &str = "%H:%M";

pub fn parse_date_str<S: AsRef<str>>(s: S) -> ServiceResult<NaiveDate> {
    NaiveDate::parse_from_str(s.as_ref().trim(), DATE_FMT)
        .map_err(|_| ServiceError::invalid("Invalid date format. Use YYYY-MM-DD"))
}

pub fn parse_time_str<S: AsRef<str>>(s: S) -> ServiceResult<NaiveTime> {
    NaiveTime::parse_from_str(s.as_ref().trim(), TIME_FMT)
        .map_err(|_| ServiceError::invalid("Invalid time format. Use HH:MM"))
}

pub fn parse_date_opt<S: AsRef<str>>(s: Option<S>) -> ServiceResult<Option<NaiveDate>> {
    s.map(parse_date_str).transpose()
}

pub fn parse_time_opt<S: AsRef<str>>(s: Option<S>) -> ServiceResult<Option<NaiveTime>> {
    s.map(parse_time_str).transpose()
}

/// `active` / `cancelled` in any letter case.
pub fn parse_status_opt<S: AsRef<str>>(s: Option<S>) -> ServiceResult<Option<AppointmentStatus>> {
    s.map(|s| {
        s.as_ref().trim().to_uppercase().parse().map_err(|_| {
            ServiceError::invalid(format!(
                "Invalid status: {}. Must be 'active' or 'cancelled'",
                s.as_ref()
            ))
        })
    })
    .transpose()
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

pub fn format_time(time: &NaiveTime) -> String {
    time.format(TIME_FMT).to_string()
}

pub fn format_time_str(time: &NaiveDateTime) -> String {
    const STAMP_FMT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    format!("{}+00:00", time.format(STAMP_FMT))
}

/// `LIKE` pattern matching `s` anywhere, with `\` as the escape character.
pub fn get_str_pattern<S: AsRef<str>>(s: S) -> String {
    let mut escaped = String::with_capacity(s.as_ref().len() + 2);
    escaped.push('%');
    for c in s.as_ref().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Rejects values longer than `max` characters.
pub fn check_len(field: &str, value: &str, max: usize) -> ServiceResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(ServiceError::invalid(format!(
            "{} exceeds maximum length of {} characters (got {})",
            field, max, len
        )));
    }
    Ok(())
}
