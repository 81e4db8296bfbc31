//! Existence and ownership checks shared by the services.

use diesel::prelude::*;
use diesel::SqliteConnection;

use crate::{
    error::{ServiceError, ServiceResult},
    models::businesses::Business,
};

pub fn assert_business(conn: &mut SqliteConnection, business_id: i32) -> ServiceResult<()> {
    use crate::schema::businesses;

    let res = businesses::table
        .filter(businesses::id.eq(business_id))
        .count()
        .get_result::<i64>(conn)?;

    if res == 0 {
        return Err(ServiceError::not_found(format!(
            "Business with ID {} not found",
            business_id
        )));
    }

    Ok(())
}

/// A booking that names an unknown customer is bad input, not a missing
/// resource: the caller supplied the id.
pub fn assert_customer(conn: &mut SqliteConnection, customer_id: i32) -> ServiceResult<()> {
    use crate::schema::customer_profiles;

    let res = customer_profiles::table
        .filter(customer_profiles::account_id.eq(customer_id))
        .count()
        .get_result::<i64>(conn)?;

    if res == 0 {
        return Err(ServiceError::invalid(format!(
            "Customer with ID {} not found",
            customer_id
        )));
    }

    Ok(())
}

pub fn assert_provider_profile(conn: &mut SqliteConnection, provider_id: i32) -> ServiceResult<()> {
    use crate::schema::provider_profiles;

    let res = provider_profiles::table
        .filter(provider_profiles::account_id.eq(provider_id))
        .count()
        .get_result::<i64>(conn)?;

    if res == 0 {
        return Err(ServiceError::not_found("Provider profile not found"));
    }

    Ok(())
}

pub fn assert_customer_profile(conn: &mut SqliteConnection, customer_id: i32) -> ServiceResult<()> {
    use crate::schema::customer_profiles;

    let res = customer_profiles::table
        .filter(customer_profiles::account_id.eq(customer_id))
        .count()
        .get_result::<i64>(conn)?;

    if res == 0 {
        return Err(ServiceError::not_found("Customer profile not found"));
    }

    Ok(())
}

pub fn assert_participant(
    conn: &mut SqliteConnection,
    appointment_id: i32,
    customer_id: i32,
) -> ServiceResult<()> {
    use crate::schema::appointment_participants;

    let res = appointment_participants::table
        .filter(appointment_participants::appointment_id.eq(appointment_id))
        .filter(appointment_participants::customer_id.eq(customer_id))
        .count()
        .get_result::<i64>(conn)?;

    if res == 0 {
        return Err(ServiceError::unauthorized(format!(
            "Customer {} is not a participant of appointment {}",
            customer_id, appointment_id
        )));
    }

    Ok(())
}

/// The single ownership predicate: does `provider_id` own `business`?
pub fn owns_business(provider_id: i32, business: &Business) -> bool {
    business.provider_id == provider_id
}

/// Loads a business and requires `provider_id` to own it.
pub fn assert_owner(
    conn: &mut SqliteConnection,
    provider_id: i32,
    business_id: i32,
) -> ServiceResult<Business> {
    use crate::schema::businesses;

    let business = businesses::table
        .find(business_id)
        .select(Business::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| {
            ServiceError::not_found(format!("Business with ID {} not found", business_id))
        })?;

    if !owns_business(provider_id, &business) {
        return Err(ServiceError::unauthorized(format!(
            "Provider {} does not own business {}",
            provider_id, business_id
        )));
    }

    Ok(business)
}
