// SPDX-FileCopyrightText: 2026 Taskpulse Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `taskpulse serve` command implementation.
//!
//! Wires the realtime hub, optional cache/queue/SMTP subsystems, the mutation
//! dispatcher behind the ingest API, and the notification worker, then serves
//! until SIGINT or SIGTERM. Every optional subsystem that is not configured
//! is disabled with a log line, never an error.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use taskpulse_cache::Cache;
use taskpulse_config::TaskpulseConfig;
use taskpulse_core::{MailTransport, PulseError, TaskStore, TokenVerifier, UserStore};
use taskpulse_dispatch::Dispatcher;
use taskpulse_notify::{Branding, NotificationHandler, Notifier, NullMailer, SmtpMailer};
use taskpulse_queue::{JobQueue, Worker};
use taskpulse_realtime::{HmacTokenVerifier, RealtimeState, SocketHub};

use crate::directory::{PermissiveDirectory, SqliteDirectory};
use crate::ingest::{self, IngestState};
use crate::shutdown;

/// Runs the `taskpulse serve` command.
pub async fn run_serve(config: TaskpulseConfig) -> Result<(), PulseError> {
    init_tracing(&config.app.log_level);

    info!("starting taskpulse serve");

    let Some(secret) = config.auth.access_secret.as_deref() else {
        return Err(PulseError::Config(
            "auth.access_secret is required to verify socket tokens. \
             Set it in the config file or via TASKPULSE_AUTH_ACCESS_SECRET."
                .into(),
        ));
    };
    let verifier: Arc<dyn TokenVerifier> = Arc::new(HmacTokenVerifier::new(secret));
    let service_token = config
        .auth
        .service_token
        .clone()
        .unwrap_or_else(|| secret.to_string());

    // Record directory: a SQLite mirror when a database is configured,
    // otherwise token-trusting lookups that resolve no records.
    let mut mirror: Option<Arc<SqliteDirectory>> = None;
    let (tasks, users): (Arc<dyn TaskStore>, Arc<dyn UserStore>) =
        match config.queue.database_path.as_deref() {
            Some(path) => {
                let directory = Arc::new(SqliteDirectory::open(path).await?);
                info!(path, "record directory opened");
                mirror = Some(directory.clone());
                (directory.clone(), directory)
            }
            None => {
                warn!("no database configured, socket auth trusts token claims only");
                (Arc::new(PermissiveDirectory), Arc::new(PermissiveDirectory))
            }
        };

    let cache = Cache::connect(config.cache.redis_url.as_deref()).await;
    let queue = JobQueue::open(config.queue.database_path.as_deref()).await;

    let transport: Arc<dyn MailTransport> =
        match SmtpMailer::from_config(&config.app.name, &config.smtp) {
            Some(mailer) => Arc::new(mailer),
            None => Arc::new(NullMailer),
        };

    let branding = Branding::new(&config.app.name, &config.app.frontend_url);
    let notifier = Notifier::new(queue.clone(), transport.clone());
    let hub = Arc::new(SocketHub::new());

    let cancel = shutdown::install_signal_handler();

    // Drain the notification queue in the background. Without a mail
    // transport the worker could only churn jobs into the failed state, so
    // they stay pending until a transport is configured.
    if transport.is_enabled() {
        let handler = Arc::new(NotificationHandler::new(
            transport,
            tasks,
            users.clone(),
            branding.clone(),
        ));
        if let Some(worker) = Worker::new(
            queue,
            handler,
            Duration::from_secs(config.queue.poll_interval_secs),
        ) {
            let worker_cancel = cancel.clone();
            tokio::spawn(worker.run(worker_cancel));
        }
    } else {
        info!("mail transport disabled, notification worker not started");
    }

    let dispatcher = Dispatcher::new(
        hub.clone(),
        cache,
        notifier,
        users.clone(),
        branding,
        chrono::Duration::hours(config.app.reminder_lead_hours as i64),
    );

    let realtime_state = RealtimeState {
        hub,
        verifier,
        users,
    };
    let app = taskpulse_realtime::router(realtime_state).merge(ingest::router(IngestState {
        dispatcher,
        directory: mirror,
        service_token,
    }));
    taskpulse_realtime::serve_app(&config.server, app, cancel).await?;

    info!("taskpulse serve shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("taskpulse={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
