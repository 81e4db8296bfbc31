pub mod assert;

use std::time::Duration;

use crate::{error::ServiceResult, DbPool};
use actix_web::web;
use anyhow::Context;
use diesel::{connection::SimpleConnection, r2d2::ConnectionManager, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use r2d2::PooledConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

const BUSY_TIMEOUT_MS: u32 = 5000;

/// Per-connection settings. SQLite keeps `foreign_keys` off unless every
/// connection asks for it, and the cascade graph depends on it.
#[derive(Debug)]
struct SqlitePragmas;

impl r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA journal_mode = WAL; PRAGMA foreign_keys = ON;",
            BUSY_TIMEOUT_MS
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn build_pool(database_url: &str, max_size: u32) -> anyhow::Result<DbPool> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(max_size)
        .connection_timeout(Duration::from_secs(30))
        .connection_customizer(Box::new(SqlitePragmas))
        .build(manager)
        .context("Failed to create pool")?;

    let mut pooled = pool.get().context("DB connection")?;
    let conn: &mut SqliteConnection = &mut pooled;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow::anyhow!("running migrations: {}", err))?;

    Ok(pool)
}

pub fn get_db_conn(
    pool: &DbPool,
) -> ServiceResult<PooledConnection<ConnectionManager<SqliteConnection>>> {
    Ok(pool.get()?)
}

/// Runs `f` on a pooled connection on the blocking thread pool.
pub async fn with_conn<F, T>(pool: &web::Data<DbPool>, f: F) -> ServiceResult<T>
where
    F: FnOnce(&mut SqliteConnection) -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    web::block(move || {
        let mut conn = get_db_conn(&pool)?;
        f(&mut conn)
    })
    .await?
}
