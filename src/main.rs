// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use exhala_server::{
    api::{cors_layer, router},
    clock::{Clock, SystemClock},
    config::{Config, MailDelivery},
    email::{EmailSender, LogEmailSender, SmtpEmailSender},
    state::AppState,
    storage::{GridFsImageStore, MongoAccountStore},
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let mailer: Arc<dyn EmailSender> = match config.mail_delivery {
        MailDelivery::Smtp => {
            info!(
                server = %config.mail.server,
                port = config.mail.port,
                "Sending email over SMTP"
            );
            Arc::new(SmtpEmailSender::new(&config.mail).context("Invalid mail settings")?)
        }
        MailDelivery::Log => {
            warn!("MAIL_DELIVERY=log; reset codes will only be logged");
            Arc::new(LogEmailSender)
        }
    };

    let policy = config.app_env.cookie_policy();
    let secret = config.secret_key.as_bytes();

    let state = match &config.mongo_uri {
        Some(uri) => {
            let accounts = MongoAccountStore::connect(uri, &config.mongo_database)
                .await
                .context("Failed to connect to MongoDB")?;
            let images = GridFsImageStore::new(accounts.database());
            AppState::new(
                Arc::new(accounts),
                Arc::new(images),
                mailer,
                clock,
                secret,
                policy,
            )
        }
        None => {
            warn!("MONGO_URI not set; using in-memory stores, data is lost on restart");
            AppState::in_memory(mailer, clock, secret, policy)
        }
    };

    let cors = cors_layer(&config.frontend_origin).context("Invalid FRONTEND_ORIGIN")?;
    let app = router(state, cors);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;

    info!(
        addr = %config.bind_addr,
        app_env = ?config.app_env,
        "Exhala server listening (docs at /docs)"
    );

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Gracefully shutting down");
}
