// ABOUTME: Server binary for the ledgerlink sample application
// ABOUTME: Boots logging, configuration, user storage and the HTTP router
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

//! # ledgerlink server binary

use anyhow::Result;
use clap::Parser;
use ledgerlink::{
    accounting::AccountingApi,
    config::environment::ServerConfig,
    database::UserStore,
    logging,
    oauth::{client::OauthClient, flow::AuthFlow},
    routes::{self, AppResources},
    session::SessionRegistry,
};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "ledgerlink-server")]
#[command(about = "Sample OAuth2 sign-up application for an accounting platform")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("starting ledgerlink");
    info!("{}", config.summary());
    if !config.oauth.validate_and_log() {
        warn!("oauth client credentials are incomplete; login will fail until configured");
    }

    let users = Arc::new(UserStore::new(&config.database.url).await?);
    users.migrate().await?;
    info!("user database ready: {}", config.database.url);

    let oauth_client = Arc::new(OauthClient::new(config.oauth.clone()));
    let flow = AuthFlow::new(
        oauth_client,
        users,
        config.oauth.client_id.clone(),
        config.flow,
    );

    let resources = Arc::new(AppResources {
        accounting: AccountingApi::new(config.oauth.api_base_url.clone()),
        sessions: SessionRegistry::new(),
        flow,
        config,
    });

    let port = resources.config.http_port;
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("listening on port {port}");

    axum::serve(listener, routes::router(resources)).await?;

    Ok(())
}
