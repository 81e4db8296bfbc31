//! Accounts, role-specific profiles and credentials.

pub mod session;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::SqliteConnection;
use tracing::info;

use crate::{
    database::assert,
    error::{ServiceError, ServiceResult},
    models::{
        accounts::{Account, NewAccount, Role},
        customers::{CustomerProfile, UpdateCustomer},
        providers::{ProviderProfile, UpdateProvider},
    },
    utils::check_len,
};

pub use session::Caller;

const MIN_PASSWORD_LEN: usize = 8;
const NAME_MAX: usize = 200;
const PHONE_MAX: usize = 20;
const BIO_MAX: usize = 4096;

pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub phone_number: Option<String>,
}

pub enum Profile {
    Provider(Account, ProviderProfile),
    Customer(Account, CustomerProfile),
}

#[derive(Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub bio: Option<String>,
    pub address: Option<String>,
    pub preferences: Option<String>,
}

/// Salted argon2 hash in PHC string form.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("hashing password: {}", e)))
}

pub fn verify_password(password: &str, stored: &str) -> ServiceResult<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| ServiceError::Internal(anyhow::anyhow!("stored password hash: {}", e)))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(ServiceError::Internal(anyhow::anyhow!(
            "verifying password: {}",
            e
        ))),
    }
}

fn email_local_part(email: &str) -> ServiceResult<&str> {
    match email.split_once('@') {
        Some((local, _)) if !local.is_empty() => Ok(local),
        _ => Err(ServiceError::invalid(format!(
            "Invalid email format: {}",
            email
        ))),
    }
}

/// Derives a unique username from the local part of `email`, appending
/// 1, 2, ... while the candidate is taken.
pub fn generate_username(conn: &mut SqliteConnection, email: &str) -> ServiceResult<String> {
    use crate::schema::accounts;

    let base = email_local_part(email)?;
    let mut username = base.to_string();
    let mut counter = 1;
    loop {
        let taken = accounts::table
            .filter(accounts::username.eq(&username))
            .count()
            .get_result::<i64>(conn)?;
        if taken == 0 {
            return Ok(username);
        }
        username = format!("{}{}", base, counter);
        counter += 1;
    }
}

/// Creates the account and its role-specific profile in one transaction.
pub fn register(
    conn: &mut SqliteConnection,
    info: Registration,
    now: NaiveDateTime,
) -> ServiceResult<Account> {
    use crate::schema::{accounts, customer_profiles, provider_profiles};

    let role = Role::parse_loose(&info.role).ok_or_else(|| {
        ServiceError::invalid(format!(
            "Invalid role: {}. Must be 'customer' or 'provider'",
            info.role
        ))
    })?;
    let email = info.email.trim().to_string();
    email_local_part(&email)?;
    if info.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::invalid(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    let full_name = info.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(ServiceError::invalid("Full name is required"));
    }
    check_len("Full name", &full_name, NAME_MAX)?;
    let phone_number = info.phone_number.unwrap_or_default();
    check_len("Phone number", &phone_number, PHONE_MAX)?;

    let password_hash = hash_password(&info.password)?;

    let account = conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        let res = accounts::table
            .filter(accounts::email.eq(&email))
            .count()
            .get_result::<i64>(conn)?;
        if res > 0 {
            return Err(ServiceError::invalid(format!(
                "User with email '{}' already exists",
                email
            )));
        }

        let username = generate_username(conn, &email)?;
        let data = NewAccount {
            password_hash,
            username,
            email: email.clone(),
            role,
            created_at: now,
            updated_at: now,
        };
        let account = diesel::insert_into(accounts::table)
            .values(data)
            .returning(Account::as_returning())
            .get_result(conn)
            .map_err(|err| match err {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    ServiceError::invalid(format!("User with email '{}' already exists", email))
                }
                err => err.into(),
            })?;

        match role {
            Role::Customer => {
                diesel::insert_into(customer_profiles::table)
                    .values(CustomerProfile {
                        account_id: account.id,
                        full_name: full_name.clone(),
                        phone_number: phone_number.clone(),
                        preferences: String::new(),
                    })
                    .execute(conn)?;
            }
            Role::Provider => {
                diesel::insert_into(provider_profiles::table)
                    .values(ProviderProfile {
                        account_id: account.id,
                        business_name: full_name.clone(),
                        bio: String::new(),
                        phone_number: phone_number.clone(),
                        address: String::new(),
                    })
                    .execute(conn)?;
            }
        }

        Ok(account)
    })?;

    info!(account_id = account.id, username = %account.username, role = %account.role, "registered account");
    Ok(account)
}

/// Checks an email/password pair. Unknown emails and wrong passwords are
/// indistinguishable to the caller.
pub fn authenticate(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
) -> ServiceResult<Account> {
    use crate::schema::accounts;

    let account = accounts::table
        .filter(accounts::email.eq(email.trim()))
        .select(Account::as_select())
        .first(conn)
        .optional()?;

    match account {
        Some(account) if verify_password(password, &account.password_hash)? => Ok(account),
        _ => Err(ServiceError::Unauthenticated(
            "Invalid email or password".to_string(),
        )),
    }
}

pub fn get_account(conn: &mut SqliteConnection, account_id: i32) -> ServiceResult<Account> {
    use crate::schema::accounts;

    accounts::table
        .find(account_id)
        .select(Account::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ServiceError::not_found(format!("User with ID {} not found", account_id)))
}

/// Resolves the caller's provider profile id, rejecting customers.
pub fn require_provider(conn: &mut SqliteConnection, caller: &Caller) -> ServiceResult<i32> {
    if caller.role != Role::Provider {
        return Err(ServiceError::unauthorized(
            "Only providers can perform this action",
        ));
    }
    assert::assert_provider_profile(conn, caller.account_id)?;
    Ok(caller.account_id)
}

/// Resolves the caller's customer profile id, rejecting providers.
pub fn require_customer(conn: &mut SqliteConnection, caller: &Caller) -> ServiceResult<i32> {
    if caller.role != Role::Customer {
        return Err(ServiceError::unauthorized(
            "Only customers can perform this action",
        ));
    }
    assert::assert_customer_profile(conn, caller.account_id)?;
    Ok(caller.account_id)
}

pub fn get_profile(conn: &mut SqliteConnection, caller: &Caller) -> ServiceResult<Profile> {
    use crate::schema::{customer_profiles, provider_profiles};

    let account = get_account(conn, caller.account_id)?;
    match account.role {
        Role::Provider => {
            let profile = provider_profiles::table
                .find(account.id)
                .select(ProviderProfile::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ServiceError::not_found("Provider profile not found"))?;
            Ok(Profile::Provider(account, profile))
        }
        Role::Customer => {
            let profile = customer_profiles::table
                .find(account.id)
                .select(CustomerProfile::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ServiceError::not_found("Customer profile not found"))?;
            Ok(Profile::Customer(account, profile))
        }
    }
}

/// Applies the fields that make sense for the caller's role; the rest are
/// rejected rather than silently dropped.
pub fn update_profile(
    conn: &mut SqliteConnection,
    caller: &Caller,
    changes: ProfileChanges,
    now: NaiveDateTime,
) -> ServiceResult<Profile> {
    use crate::schema::{accounts, customer_profiles, provider_profiles};

    if let Some(name) = &changes.name {
        if name.trim().is_empty() {
            return Err(ServiceError::invalid("Name cannot be empty"));
        }
        check_len("Name", name.trim(), NAME_MAX)?;
    }
    if let Some(phone) = &changes.phone_number {
        check_len("Phone number", phone, PHONE_MAX)?;
    }

    conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        match caller.role {
            Role::Provider => {
                if changes.preferences.is_some() {
                    return Err(ServiceError::invalid("Providers have no preferences field"));
                }
                if let Some(bio) = &changes.bio {
                    check_len("Bio", bio, BIO_MAX)?;
                }
                assert::assert_provider_profile(conn, caller.account_id)?;
                let data = UpdateProvider {
                    business_name: changes.name.map(|n| n.trim().to_string()),
                    bio: changes.bio,
                    phone_number: changes.phone_number,
                    address: changes.address,
                };
                if data.business_name.is_some()
                    || data.bio.is_some()
                    || data.phone_number.is_some()
                    || data.address.is_some()
                {
                    diesel::update(provider_profiles::table.find(caller.account_id))
                        .set(&data)
                        .execute(conn)?;
                }
            }
            Role::Customer => {
                if changes.bio.is_some() || changes.address.is_some() {
                    return Err(ServiceError::invalid(
                        "Customers have no bio or address fields",
                    ));
                }
                assert::assert_customer_profile(conn, caller.account_id)?;
                let data = UpdateCustomer {
                    full_name: changes.name.map(|n| n.trim().to_string()),
                    phone_number: changes.phone_number,
                    preferences: changes.preferences,
                };
                if data.full_name.is_some()
                    || data.phone_number.is_some()
                    || data.preferences.is_some()
                {
                    diesel::update(customer_profiles::table.find(caller.account_id))
                        .set(&data)
                        .execute(conn)?;
                }
            }
        }

        diesel::update(accounts::table.find(caller.account_id))
            .set(accounts::updated_at.eq(now))
            .execute(conn)?;
        Ok(())
    })?;

    get_profile(conn, caller)
}

pub fn change_password(
    conn: &mut SqliteConnection,
    caller: &Caller,
    password_old: &str,
    password_new: &str,
    now: NaiveDateTime,
) -> ServiceResult<()> {
    use crate::schema::accounts;

    if password_new.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::invalid(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let password_hash = hash_password(password_new)?;

    conn.immediate_transaction::<_, ServiceError, _>(|conn| {
        let account = get_account(conn, caller.account_id)?;
        if !verify_password(password_old, &account.password_hash)? {
            return Err(ServiceError::invalid("Wrong password"));
        }

        diesel::update(accounts::table.find(account.id))
            .set((
                accounts::password_hash.eq(&password_hash),
                accounts::updated_at.eq(now),
            ))
            .execute(conn)?;

        Ok(())
    })
}

/// Deletes the caller's account. Profiles, sessions, businesses and their
/// appointments follow through the foreign-key cascades.
pub fn delete_account(conn: &mut SqliteConnection, caller: &Caller) -> ServiceResult<()> {
    use crate::schema::accounts;

    let deleted = diesel::delete(accounts::table.find(caller.account_id)).execute(conn)?;
    if deleted == 0 {
        return Err(ServiceError::not_found(format!(
            "User with ID {} not found",
            caller.account_id
        )));
    }

    info!(account_id = caller.account_id, "deleted account");
    Ok(())
}

#[cfg(test)]
mod tests;
