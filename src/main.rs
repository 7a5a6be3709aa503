//! # WhatsApp OTP Bridge
//!
//! Main entry point. Starts the WhatsApp connection supervisor in the
//! background and serves the HTTP gateway that forwards OTP messages through
//! the live session.

#![recursion_limit = "256"]
pub mod api;
pub mod config;
pub mod connection;
pub mod consts;
pub mod front;
pub mod metric;
pub mod services;
pub mod utils;
pub mod whatsapp;

use anyhow::Context;
use logfire::config::{MetricsOptions, SendToLogfire};
use ntex::web;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::sync::Arc;

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration
    config::init_config()?;

    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;

    // Initialize logging and metrics, spans only leave the host with a token
    let mut logfire_builder = logfire::configure()
        .install_panic_handler()
        .with_metrics(Some(MetricsOptions::default()))
        .send_to_logfire(SendToLogfire::IfTokenPresent);
    if let Some(token) = &app_config.logfire_token {
        logfire_builder = logfire_builder.with_token(token);
    }
    let shutdown_handler = logfire_builder.finish()?;

    // Keep the WhatsApp session alive in the background
    let (publisher, connection) = connection::session_channel();
    let supervisor = connection::Supervisor::new(
        Arc::new(whatsapp::client::CloudApiConnector::new(
            app_config.client_options(),
        )?),
        Arc::new(services::storage::FileCredentialStore::new(
            &app_config.session_dir,
        )),
        publisher,
    )
    .with_retry_policy(app_config.retry_policy())
    .with_bootstrap_credentials(app_config.bootstrap_credentials())
    .with_startup_notification(app_config.notify_on_connect);
    supervisor.start();

    // Configure and start the web server
    configure_and_run_server(connection).await?;

    shutdown_handler.shutdown()?;

    Ok(())
}

/// Configures SSL acceptor for production environments
fn setup_ssl_acceptor() -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    let mut ssl_acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls_server())
        .map_err(|e| anyhow::anyhow!("Failed to create SSL acceptor: {}", e))?;

    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;
    ssl_acceptor
        .set_private_key_file(&app_config.private_key_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load private key from {}: {}",
                app_config.private_key_path,
                e
            )
        })?;

    ssl_acceptor
        .set_certificate_file(&app_config.certificate_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load certificate from {}: {}",
                app_config.certificate_path,
                e
            )
        })?;

    Ok(ssl_acceptor)
}

/// Configures and starts the web server with appropriate SSL settings
async fn configure_and_run_server(connection: connection::ConnectionHandle) -> anyhow::Result<()> {
    let app_config = config::APP_CONFIG
        .get()
        .context("failed to get app config")?;
    let server_addr = (
        app_config.web_server_host.to_string(),
        app_config.web_server_port,
    );

    let server = web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .wrap(web::middleware::Compress::default())
            .state(front::AppState {
                connection: connection.clone(),
            })
            .configure(front::routes::gateway)
            .default_service(web::route().to(front::server::serve_not_found))
    });

    let bound_server = if app_config.is_prod() {
        let ssl_acceptor = setup_ssl_acceptor()?;
        server.bind_openssl(server_addr, ssl_acceptor)?
    } else {
        server.bind(server_addr)?
    };

    tracing::info!(
        "gateway listening on {}:{}",
        app_config.web_server_host,
        app_config.web_server_port
    );

    bound_server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
