//! Provider-owned business listings.

pub mod availability;

use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::SqliteConnection;
use tracing::info;

use crate::{
    database::assert,
    error::{ServiceError, ServiceResult},
    models::businesses::{Business, NewBusiness, UpdateBusiness},
    utils::{check_len, get_str_pattern},
};

const NAME_MAX: usize = 200;
const SUMMARY_MAX: usize = 512;
const DESCRIPTION_MAX: usize = 2000;
const PHONE_MAX: usize = 20;
const LOGO_MAX: usize = 255;

#[derive(Default)]
pub struct BusinessInput {
    pub name: String,
    pub summary: String,
    pub logo: Option<String>,
    pub description: String,
    pub phone: String,
    pub email: String,
    pub address: String,
}

#[derive(Default)]
pub struct BusinessChanges {
    pub name: Option<String>,
    pub summary: Option<String>,
    pub logo: Option<Option<String>>,
    pub description: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

fn check_name(name: &str) -> ServiceResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ServiceError::invalid(
            "Business name is required and cannot be empty",
        ));
    }
    check_len("Business name", name, NAME_MAX)?;
    Ok(name.to_string())
}

/// Logos are bare file names under the media directory.
fn check_logo(logo: &str) -> ServiceResult<()> {
    check_len("Business logo", logo, LOGO_MAX)?;
    if logo.contains('/') || logo.contains('\\') || logo.contains("..") {
        return Err(ServiceError::invalid(format!(
            "Invalid logo file name: {}",
            logo
        )));
    }
    Ok(())
}

fn check_details(
    summary: Option<&str>,
    logo: Option<&str>,
    description: Option<&str>,
    phone: Option<&str>,
) -> ServiceResult<()> {
    if let Some(logo) = logo {
        check_logo(logo)?;
    }
    if let Some(summary) = summary {
        check_len("Business summary", summary, SUMMARY_MAX)?;
    }
    if let Some(description) = description {
        check_len("Business description", description, DESCRIPTION_MAX)?;
    }
    if let Some(phone) = phone {
        check_len("Business phone", phone, PHONE_MAX)?;
    }
    Ok(())
}

pub fn create_business(
    conn: &mut SqliteConnection,
    provider_id: i32,
    input: BusinessInput,
    now: NaiveDateTime,
) -> ServiceResult<Business> {
    use crate::schema::businesses;

    let name = check_name(&input.name)?;
    check_details(
        Some(&input.summary),
        input.logo.as_deref(),
        Some(&input.description),
        Some(&input.phone),
    )?;
    assert::assert_provider_profile(conn, provider_id)?;

    let data = NewBusiness {
        provider_id,
        name,
        summary: input.summary,
        logo: input.logo,
        description: input.description,
        phone: input.phone,
        email: input.email,
        address: input.address,
        created_at: now,
        updated_at: now,
    };
    let business = diesel::insert_into(businesses::table)
        .values(data)
        .returning(Business::as_returning())
        .get_result(conn)?;

    info!(business_id = business.id, provider_id, "created business");
    Ok(business)
}

pub fn update_business(
    conn: &mut SqliteConnection,
    provider_id: i32,
    business_id: i32,
    changes: BusinessChanges,
    now: NaiveDateTime,
) -> ServiceResult<Business> {
    use crate::schema::businesses;

    let name = changes.name.as_deref().map(check_name).transpose()?;
    check_details(
        changes.summary.as_deref(),
        changes.logo.as_ref().and_then(|logo| logo.as_deref()),
        changes.description.as_deref(),
        changes.phone.as_deref(),
    )?;

    conn.immediate_transaction(|conn| {
        assert::assert_owner(conn, provider_id, business_id)?;

        let data = UpdateBusiness {
            name,
            summary: changes.summary,
            logo: changes.logo,
            description: changes.description,
            phone: changes.phone,
            email: changes.email,
            address: changes.address,
            updated_at: Some(now),
        };
        let business = diesel::update(businesses::table.find(business_id))
            .set(&data)
            .returning(Business::as_returning())
            .get_result(conn)?;

        Ok(business)
    })
}

/// Removes a business together with its appointments and availability.
pub fn delete_business(
    conn: &mut SqliteConnection,
    provider_id: i32,
    business_id: i32,
) -> ServiceResult<()> {
    use crate::schema::businesses;

    conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        assert::assert_owner(conn, provider_id, business_id)?;
        diesel::delete(businesses::table.find(business_id)).execute(conn)?;
        Ok(())
    })?;

    info!(business_id, provider_id, "deleted business");
    Ok(())
}

pub fn get_business(conn: &mut SqliteConnection, business_id: i32) -> ServiceResult<Business> {
    use crate::schema::businesses;

    businesses::table
        .find(business_id)
        .select(Business::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found(format!("Business with ID {} not found", business_id)))
}

/// Newest first.
pub fn businesses_by_provider(
    conn: &mut SqliteConnection,
    provider_id: i32,
) -> ServiceResult<Vec<Business>> {
    use crate::schema::businesses;

    Ok(businesses::table
        .filter(businesses::provider_id.eq(provider_id))
        .order((businesses::created_at.desc(), businesses::id.desc()))
        .select(Business::as_select())
        .load(conn)?)
}

pub fn list_businesses(
    conn: &mut SqliteConnection,
    limit: i64,
    offset: i64,
) -> ServiceResult<Vec<Business>> {
    use crate::schema::businesses;

    if limit < 1 {
        return Err(ServiceError::invalid("Limit must be at least 1"));
    }
    if offset < 0 {
        return Err(ServiceError::invalid("Offset must be non-negative"));
    }

    Ok(businesses::table
        .order((businesses::created_at.desc(), businesses::id.desc()))
        .offset(offset)
        .limit(limit)
        .select(Business::as_select())
        .load(conn)?)
}

/// Substring match on name or summary; SQLite's `LIKE` ignores ASCII case.
/// A blank query matches nothing.
pub fn search_businesses(conn: &mut SqliteConnection, query: &str) -> ServiceResult<Vec<Business>> {
    use crate::schema::businesses;

    let query = query.trim();
    if query.is_empty() {
        return Ok(Vec::new());
    }

    let pattern = get_str_pattern(query);
    Ok(businesses::table
        .filter(
            businesses::name
                .like(pattern.as_str())
                .escape('\\')
                .or(businesses::summary.like(pattern.as_str()).escape('\\')),
        )
        .order((businesses::created_at.desc(), businesses::id.desc()))
        .select(Business::as_select())
        .load(conn)?)
}
