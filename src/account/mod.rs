mod requests;
mod responses;

use actix_web::web;
use chrono::Utc;
use tracing::{info, warn};

use crate::{
    database::with_conn,
    error::{ServiceError, ServiceResult},
    identity::{self, session, Caller, Profile, ProfileChanges, Registration},
    protocol::{Done, Empty},
    utils::format_time_str,
    DbPool,
};

use self::{requests::*, responses::*};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(logout)
        .service(view_info)
        .service(modify_info)
        .service(modify_password)
        .service(delete);
}

crate::post_funcs! {
    (register, "/register", RegisterRequest, RegisterResponse),
    (login, "/login", LoginRequest, LoginResponse),
}

crate::post_funcs! {
    @auth
    (logout, "/logout", Empty, Done),
    (view_info, "/view_info", Empty, ViewInfoResponse),
    (modify_info, "/modify_info", ModifyInfoRequest, ViewInfoResponse),
    (modify_password, "/modify_password", ModifyPasswordRequest, Done),
    (delete, "/delete", Empty, Done),
}

async fn register_impl(
    pool: web::Data<DbPool>,
    info: RegisterRequest,
) -> ServiceResult<RegisterResponse> {
    let account = with_conn(&pool, move |conn| {
        identity::register(
            conn,
            Registration {
                full_name: info.full_name,
                email: info.email,
                password: info.password,
                role: info.role,
                phone_number: info.phone_number,
            },
            Utc::now().naive_utc(),
        )
    })
    .await?;

    Ok(RegisterResponse {
        account_id: account.id,
        username: account.username,
        role: account.role.to_string(),
    })
}

async fn login_impl(pool: web::Data<DbPool>, info: LoginRequest) -> ServiceResult<LoginResponse> {
    let email = info.email.clone();
    let res = with_conn(&pool, move |conn| {
        let account = identity::authenticate(conn, &info.email, &info.password)?;
        let token = session::issue(conn, &account, Utc::now().naive_utc())?;
        Ok((account, token))
    })
    .await;

    let (account, login_token) = match res {
        Ok(data) => data,
        Err(err @ ServiceError::Unauthenticated(_)) => {
            warn!(email = %email, "rejected login");
            return Err(err);
        }
        Err(err) => return Err(err),
    };
    info!(account_id = account.id, "logged in");

    Ok(LoginResponse {
        login_token,
        account_id: account.id,
        username: account.username,
        role: account.role.to_string(),
    })
}

async fn logout_impl(pool: web::Data<DbPool>, caller: Caller, _: Empty) -> ServiceResult<Done> {
    with_conn(&pool, move |conn| session::revoke(conn, &caller.token)).await?;
    Ok(Done {})
}

fn profile_response(profile: Profile) -> ViewInfoResponse {
    match profile {
        Profile::Provider(account, profile) => ViewInfoResponse {
            account_id: account.id,
            username: account.username,
            email: account.email,
            role: account.role.to_string(),
            name: profile.business_name,
            phone_number: profile.phone_number,
            bio: Some(profile.bio),
            address: Some(profile.address),
            preferences: None,
            created_at: format_time_str(&account.created_at),
        },
        Profile::Customer(account, profile) => ViewInfoResponse {
            account_id: account.id,
            username: account.username,
            email: account.email,
            role: account.role.to_string(),
            name: profile.full_name,
            phone_number: profile.phone_number,
            bio: None,
            address: None,
            preferences: Some(profile.preferences),
            created_at: format_time_str(&account.created_at),
        },
    }
}

async fn view_info_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    _: Empty,
) -> ServiceResult<ViewInfoResponse> {
    let profile = with_conn(&pool, move |conn| identity::get_profile(conn, &caller)).await?;
    Ok(profile_response(profile))
}

async fn modify_info_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: ModifyInfoRequest,
) -> ServiceResult<ViewInfoResponse> {
    let profile = with_conn(&pool, move |conn| {
        identity::update_profile(
            conn,
            &caller,
            ProfileChanges {
                name: info.name,
                phone_number: info.phone_number,
                bio: info.bio,
                address: info.address,
                preferences: info.preferences,
            },
            Utc::now().naive_utc(),
        )
    })
    .await?;
    Ok(profile_response(profile))
}

async fn modify_password_impl(
    pool: web::Data<DbPool>,
    caller: Caller,
    info: ModifyPasswordRequest,
) -> ServiceResult<Done> {
    with_conn(&pool, move |conn| {
        identity::change_password(
            conn,
            &caller,
            &info.password_old,
            &info.password_new,
            Utc::now().naive_utc(),
        )
    })
    .await?;
    Ok(Done {})
}

async fn delete_impl(pool: web::Data<DbPool>, caller: Caller, _: Empty) -> ServiceResult<Done> {
    with_conn(&pool, move |conn| identity::delete_account(conn, &caller)).await?;
    Ok(Done {})
}
