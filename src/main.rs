#[macro_use]
extern crate diesel;

mod account;
mod booking;
mod catalog;
mod config;
mod customer;
mod database;
mod error;
mod identity;
mod models;
mod protocol;
mod provider;
mod public;
mod schema;
mod utils;

use actix_web::{get, middleware, web, App, HttpResponse, HttpServer, Responder};
use anyhow::Context;
use diesel::{r2d2::ConnectionManager, SqliteConnection};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::Config, error::ServiceError, protocol::SimpleResponse};

type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(SimpleResponse::ok())
}

/// Every route except static files; shared with the handler tests.
fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _| ServiceError::invalid(err.to_string()).into()),
    )
    .service(health)
    // accounts and sessions
    .service(web::scope("/account").configure(account::config))
    // providers
    .service(web::scope("/provider").configure(provider::config))
    // customers
    .service(web::scope("/customer").configure(customer::config))
    // anonymous
    .service(web::scope("/public").configure(public::config));
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let pool = database::build_pool(&config.database_url, config.pool_size)?;
    let bind = config.bind_addr.clone();
    let media_dir = config.media_dir.clone();
    let config = web::Data::new(config);
    let pool = web::Data::new(pool);

    info!(bind = %bind, "starting booking server");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(pool.clone())
            .app_data(config.clone())
            .configure(routes)
            .service(actix_files::Files::new("/media", &media_dir))
    })
    .bind(&bind)
    .with_context(|| format!("binding {}", bind))?
    .run()
    .await
    .context("server error")
}
