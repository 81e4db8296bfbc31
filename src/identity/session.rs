//! Bearer-token sessions and the request extractor that resolves them.

use std::{future::Future, pin::Pin};

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use blake2::{Blake2b512, Digest};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::SqliteConnection;
use rand::{rngs::OsRng, RngCore};
use tracing::debug;

use crate::{
    config::Config,
    database::with_conn,
    error::{ServiceError, ServiceResult},
    models::{
        accounts::{Account, Role},
        sessions::SessionData,
    },
    DbPool,
};

/// The authenticated identity every service call receives explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub account_id: i32,
    pub role: Role,
    pub token: String,
}

const TOKEN_BYTES: usize = 32;

/// The sessions table keys on this digest, never the token itself.
fn token_digest(token: &str) -> String {
    format!("{:x}", Blake2b512::digest(token.as_bytes()))
}

fn new_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

pub fn issue(
    conn: &mut SqliteConnection,
    account: &Account,
    now: NaiveDateTime,
) -> ServiceResult<String> {
    use crate::schema::sessions;

    let token = new_token();
    diesel::insert_into(sessions::table)
        .values(SessionData {
            token: token_digest(&token),
            account_id: account.id,
            login_time: now,
        })
        .execute(conn)?;

    Ok(token)
}

pub fn resolve(
    conn: &mut SqliteConnection,
    token: &str,
    ttl_secs: i64,
    now: NaiveDateTime,
) -> ServiceResult<Caller> {
    use crate::schema::{accounts, sessions};

    let data = sessions::table
        .inner_join(accounts::table)
        .filter(sessions::token.eq(token_digest(token)))
        .select((sessions::login_time, accounts::id, accounts::role))
        .first::<(NaiveDateTime, i32, Role)>(conn)
        .optional()?;

    match data {
        Some((login_time, account_id, role)) => {
            if now.signed_duration_since(login_time).num_seconds() <= ttl_secs {
                Ok(Caller {
                    account_id,
                    role,
                    token: token.to_string(),
                })
            } else {
                Err(ServiceError::Unauthenticated(
                    "Login has expired".to_string(),
                ))
            }
        }
        None => Err(ServiceError::Unauthenticated(
            "No such login token".to_string(),
        )),
    }
}

pub fn revoke(conn: &mut SqliteConnection, token: &str) -> ServiceResult<()> {
    use crate::schema::sessions;

    diesel::delete(sessions::table.filter(sessions::token.eq(token_digest(token)))).execute(conn)?;
    Ok(())
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

impl FromRequest for Caller {
    type Error = ServiceError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let pool = req.app_data::<web::Data<DbPool>>().cloned();
        let config = req.app_data::<web::Data<Config>>().cloned();

        Box::pin(async move {
            let token = token.ok_or_else(|| {
                ServiceError::Unauthenticated("You are not logged in".to_string())
            })?;
            let (pool, config) = match (pool, config) {
                (Some(pool), Some(config)) => (pool, config),
                _ => {
                    return Err(ServiceError::Internal(anyhow::anyhow!(
                        "app data for sessions is not configured"
                    )))
                }
            };

            let ttl = config.session_ttl_secs;
            let caller = with_conn(&pool, move |conn| {
                resolve(conn, &token, ttl, Utc::now().naive_utc())
            })
            .await?;
            debug!(account_id = caller.account_id, role = %caller.role, "resolved caller");
            Ok(caller)
        })
    }
}
