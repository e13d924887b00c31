//! An accounts server: registration, token authentication, and profiles.

use crate::config::{Cli, Command, ServeConfig};
use crate::jwt::TokenIssuer;
use crate::password::Hasher;
use crate::password_reset::LogSender;
use crate::policy::Validators;
use crate::state::AppState;
use crate::store::{MemoryStore, PgStore, Users};
use axum::http::header::AUTHORIZATION;
use chrono::TimeDelta;
use clap::Parser;
use color_eyre::eyre::WrapErr;
use sqlx::postgres::PgPoolOptions;
use std::{iter::once, sync::Arc};
use tokio::net::TcpListener;
use tower_http::{compression, decompression, limit, sensitive_headers, timeout, trace};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod extract;
mod handlers;
mod jwt;
mod password;
mod password_reset;
mod policy;
mod profile;
mod projection;
mod registration;
mod routes;
mod secret;
mod state;
mod store;
mod user;
mod validation;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Command::Serve(config) => serve(config).await,
        Command::GenerateSecret(config) => {
            secret::write(&config).await?;
            Ok(())
        }
    }
}

/// Connect to storage, migrating Postgres if we're using it.
async fn users(config: &ServeConfig) -> color_eyre::Result<Users> {
    let Some(database_url) = &config.database_url else {
        tracing::warn!("no database URL configured; users will be lost on restart");
        return Ok(Arc::new(MemoryStore::default()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await
        .wrap_err("could not connect to the database")?;

    sqlx::migrate!()
        .run(&pool)
        .await
        .wrap_err("could not run migrations")?;

    Ok(Arc::new(PgStore::new(pool)))
}

async fn serve(config: ServeConfig) -> color_eyre::Result<()> {
    let secret = config
        .jwt_secret()
        .await
        .wrap_err("could not read the JWT secret")?;

    let tokens = TokenIssuer::new(
        &secret,
        TimeDelta::from_std(config.access_token_lifetime)?,
        TimeDelta::from_std(config.refresh_token_lifetime)?,
    )
    .with_reset_lifetime(TimeDelta::from_std(config.password_reset_lifetime)?);

    let state = AppState::new(
        users(&config).await?,
        Arc::new(Validators::standard(config.min_password_length)),
        Hasher::default(),
        tokens,
        Arc::new(LogSender),
    );

    // TODO: opentelemetry
    let app = routes::router(state)
        .layer(trace::TraceLayer::new_for_http())
        .layer(compression::CompressionLayer::new())
        .layer(decompression::DecompressionLayer::new())
        .layer(limit::RequestBodyLimitLayer::new(config.body_limit))
        .layer(sensitive_headers::SetSensitiveHeadersLayer::new(once(
            AUTHORIZATION,
        )))
        .layer(timeout::TimeoutLayer::new(config.request_timeout));

    let listener = TcpListener::bind(&config.address).await?;
    tracing::info!(address = ?listener.local_addr(), "listening");

    axum::serve(listener, app).await?;

    Ok(())
}
